//! Article file parsing: YAML front matter + HTML body.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use presspipe_shared::{PressPipeError, Result};

/// `---`-delimited metadata block followed by the body, DOTALL capture.
static FRONT_MATTER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\A---[^\S\n]*\n(?P<meta>.*?)\n---[^\S\n]*\n(?P<body>.*)\z")
        .expect("valid regex")
});

/// A parsed article file. Immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleDocument {
    /// Front-matter mapping, in source order.
    pub metadata: Map<String, Value>,
    /// The HTML body, verbatim from the capture — not trimmed here.
    pub body: String,
    /// The raw file contents.
    pub raw: String,
}

impl ArticleDocument {
    /// The trimmed slug metadata value under `field`, when present and
    /// non-empty. The field name is configurable, so callers pass the one
    /// their schema uses.
    pub fn slug(&self, field: &str) -> Option<String> {
        match self.metadata.get(field) {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        }
    }
}

/// Parse an article file that begins with a YAML front matter block.
///
/// A leading byte-order mark is stripped before matching. The metadata
/// block must parse as a YAML mapping (an empty block is an empty
/// mapping); anything else is [`PressPipeError::InvalidFrontMatter`].
pub fn parse_article_file(path: &Path) -> Result<ArticleDocument> {
    let raw = std::fs::read_to_string(path).map_err(|e| PressPipeError::io(path, e))?;
    let stripped = raw.strip_prefix('\u{feff}').unwrap_or(&raw);

    let captures = FRONT_MATTER_RE.captures(stripped).ok_or_else(|| {
        PressPipeError::MissingFrontMatter {
            path: path.to_path_buf(),
        }
    })?;

    let meta_text = captures.name("meta").expect("meta group").as_str().trim();
    let body = captures.name("body").expect("body group").as_str().to_string();

    let metadata = parse_metadata(meta_text).map_err(|message| {
        PressPipeError::InvalidFrontMatter {
            path: path.to_path_buf(),
            message,
        }
    })?;

    Ok(ArticleDocument {
        metadata,
        body,
        raw,
    })
}

fn parse_metadata(text: &str) -> std::result::Result<Map<String, Value>, String> {
    let value: Value =
        serde_yaml::from_str(text).map_err(|e| format!("YAML parse failed: {e}"))?;
    match value {
        Value::Object(map) => Ok(map),
        // An empty block parses as null; treat it as an empty mapping.
        Value::Null => Ok(Map::new()),
        other => Err(format!(
            "front matter must be a mapping, got: {}",
            type_name(&other)
        )),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "mapping",
    }
}
