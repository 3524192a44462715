//! Article payload construction.
//!
//! The payload is an ordered field map built from `defaults ∪ metadata`,
//! with a typed wrapper so the resolver never manipulates bare JSON maps.

use serde_json::{Map, Value};
use tracing::debug;

use presspipe_lexical::html_to_lexical;
use presspipe_shared::{PressPipeError, Result};

use crate::frontmatter::ArticleDocument;
use crate::slug::slugify;

// ---------------------------------------------------------------------------
// ArticlePayload
// ---------------------------------------------------------------------------

/// The mutable article payload rewritten during reference resolution.
///
/// After [`ArticlePayloadBuilder::build`], exactly one slug field is present
/// and non-empty. After resolution, reference fields hold backend IDs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArticlePayload {
    fields: Map<String, Value>,
}

impl ArticlePayload {
    /// Wrap an existing field map.
    pub fn from_map(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Field accessor.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Field accessor for string values.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// Insert or replace a field.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.fields.insert(key.into(), value);
    }

    /// Remove a field, returning its previous value. Preserves the order
    /// of the remaining fields.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.shift_remove(key)
    }

    /// Whether a field is present.
    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Borrow the underlying map for a store write.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Consume into the underlying map.
    pub fn into_map(self) -> Map<String, Value> {
        self.fields
    }
}

// ---------------------------------------------------------------------------
// Body format
// ---------------------------------------------------------------------------

/// How the HTML body is stored in the article document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BodyFormat {
    /// Convert to the Lexical editor node tree (rich-text schema field).
    #[default]
    Lexical,
    /// Store the trimmed HTML string as-is (text/code schema field).
    Html,
}

impl std::str::FromStr for BodyFormat {
    type Err = PressPipeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "lexical" => Ok(Self::Lexical),
            "html" => Ok(Self::Html),
            other => Err(PressPipeError::config(format!(
                "unknown body format '{other}' (expected 'lexical' or 'html')"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builds request payloads for creating or updating articles.
#[derive(Debug, Clone)]
pub struct ArticlePayloadBuilder {
    /// Field name for the article slug.
    pub slug_field: String,
    /// Field name for the article body.
    pub body_field: String,
    /// Default field values merged under the metadata.
    pub defaults: Map<String, Value>,
    /// Body storage format.
    pub body_format: BodyFormat,
}

impl Default for ArticlePayloadBuilder {
    fn default() -> Self {
        Self {
            slug_field: "slug".into(),
            body_field: "content".into(),
            defaults: Map::new(),
            body_format: BodyFormat::default(),
        }
    }
}

impl ArticlePayloadBuilder {
    /// Build a `(slug, payload)` pair for the parsed document.
    ///
    /// The slug comes from the metadata slug field when present, otherwise
    /// it is derived from the title. The trimmed slug is always written
    /// back so the payload carries the exact upsert key.
    pub fn build(&self, document: &ArticleDocument) -> Result<(String, ArticlePayload)> {
        let mut fields = self.defaults.clone();
        for (key, value) in &document.metadata {
            fields.insert(key.clone(), value.clone());
        }
        let mut payload = ArticlePayload::from_map(fields);

        let slug = match payload.get_str(&self.slug_field).map(str::trim) {
            Some(s) if !s.is_empty() => s.to_string(),
            _ => {
                let title = payload
                    .get_str("title")
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .ok_or_else(|| {
                        PressPipeError::parse(
                            "cannot infer slug: front matter must include either a slug or a title",
                        )
                    })?;
                slugify(title)?
            }
        };
        payload.set(&self.slug_field, Value::String(slug.clone()));

        let body = document.body.trim();
        let body_value = match self.body_format {
            BodyFormat::Lexical => html_to_lexical(body).to_value(),
            BodyFormat::Html => Value::String(body.to_string()),
        };
        payload.set(&self.body_field, body_value);

        debug!(%slug, body_format = ?self.body_format, "built article payload");
        Ok((slug, payload))
    }
}
