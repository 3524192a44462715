//! URL-safe slug derivation.

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use presspipe_shared::{PressPipeError, Result};

static INVALID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9-]+").expect("valid regex"));
static COLLAPSE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-+").expect("valid regex"));

/// Convert free text into a URL-friendly slug.
///
/// Accented characters are decomposed (NFKD) and reduced to their ASCII
/// base; anything still outside `[a-z0-9-]` collapses to a single hyphen.
/// Errors with [`PressPipeError::EmptySlug`] when nothing survives.
pub fn slugify(value: &str) -> Result<String> {
    let ascii: String = value.nfkd().filter(char::is_ascii).collect();
    let lowered = ascii.to_lowercase();
    let hyphenated = INVALID_RE.replace_all(&lowered, "-");
    let collapsed = COLLAPSE_RE.replace_all(&hyphenated, "-");
    let cleaned = collapsed.trim_matches('-');

    if cleaned.is_empty() {
        return Err(PressPipeError::EmptySlug {
            input: value.to_string(),
        });
    }
    Ok(cleaned.to_string())
}

/// Slugify each path component of `value` and rejoin with `/`.
///
/// An input with no components (empty or all separators) yields an empty
/// string rather than an error.
pub fn slugify_path(value: &str) -> Result<String> {
    let parts: Vec<&str> = value
        .split(['/', '\\'])
        .filter(|part| !part.is_empty())
        .collect();
    if parts.is_empty() {
        return Ok(String::new());
    }
    let slugs: Vec<String> = parts
        .into_iter()
        .map(slugify)
        .collect::<Result<Vec<_>>>()?;
    Ok(slugs.join("/"))
}

/// Slugify each path component and join with hyphens — the flat form used
/// for slug prefixes, since the article slug field holds no slashes.
pub fn slugify_flat(value: &str) -> Result<String> {
    Ok(slugify_path(value)?.replace('/', "-"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_slugs() {
        assert_eq!(slugify("Hello World").unwrap(), "hello-world");
        assert_eq!(slugify("  Rome -- Activities!  ").unwrap(), "rome-activities");
        assert_eq!(slugify("2-Day Itinerary").unwrap(), "2-day-itinerary");
    }

    #[test]
    fn accents_are_transliterated() {
        assert_eq!(slugify("Zürich").unwrap(), "zurich");
        assert_eq!(slugify("Ångström café").unwrap(), "angstrom-cafe");
    }

    #[test]
    fn all_symbol_input_is_an_error() {
        let err = slugify("!!! ???").unwrap_err();
        assert!(matches!(err, PressPipeError::EmptySlug { .. }));
        assert!(slugify("").is_err());
        // Non-ASCII with no decomposable base survives nothing.
        assert!(slugify("日本語").is_err());
    }

    #[test]
    fn slugify_is_idempotent() {
        for input in ["Zürich Local Culture", "a--b__c", "Switzerland Adventures"] {
            let once = slugify(input).unwrap();
            let twice = slugify(&once).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn slug_shape_invariant() {
        let re = regex::Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").unwrap();
        for input in ["Hello, World!", "¡Año nuevo!", "--x--", "A  B\tC"] {
            let slug = slugify(input).unwrap();
            assert!(re.is_match(&slug), "bad slug {slug:?} for {input:?}");
        }
    }

    #[test]
    fn path_variant_slugifies_each_segment() {
        assert_eq!(slugify_path("Italy/Bologna").unwrap(), "italy/bologna");
        assert_eq!(
            slugify_path(r"Switzerland Adventures\Zürich").unwrap(),
            "switzerland-adventures/zurich"
        );
    }

    #[test]
    fn empty_path_is_not_an_error() {
        assert_eq!(slugify_path("").unwrap(), "");
        assert_eq!(slugify_path("///").unwrap(), "");
    }

    #[test]
    fn flat_variant_joins_with_hyphens() {
        assert_eq!(slugify_flat("Italy/Bologna").unwrap(), "italy-bologna");
        assert_eq!(slugify_flat("").unwrap(), "");
    }
}
