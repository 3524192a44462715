//! Core domain types shared across the PressPipe crates.
//!
//! The central type is [`Document`] — the one canonical shape every store
//! response is normalized into at the client boundary. Nothing past the
//! client ever branches on response shape.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{PressPipeError, Result};

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// A document returned by the store: an ordered field map.
///
/// Payload-style APIs sometimes wrap write responses in `{"doc": {...}}`;
/// [`Document::from_value`] unwraps that at the boundary so the rest of the
/// pipeline only ever sees this flat shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    /// All fields of the document, in response order.
    pub fields: Map<String, Value>,
}

impl Document {
    /// Normalize an arbitrary JSON response value into a `Document`.
    ///
    /// Unwraps a single `{"doc": {...}}` envelope when present. Errors when
    /// the value (or the envelope's payload) is not a JSON object.
    pub fn from_value(value: Value) -> Result<Self> {
        let obj = match value {
            Value::Object(mut map) => match map.get("doc") {
                Some(Value::Object(_)) => match map.remove("doc") {
                    Some(Value::Object(inner)) => inner,
                    _ => unreachable!(),
                },
                _ => map,
            },
            other => {
                return Err(PressPipeError::parse(format!(
                    "expected a JSON object document, got: {other}"
                )));
            }
        };
        Ok(Self { fields: obj })
    }

    /// The document's `id` value, if any. Store IDs may be strings or numbers.
    pub fn id(&self) -> Option<&Value> {
        self.fields.get("id").filter(|v| !v.is_null())
    }

    /// The `id` rendered as a URL path segment.
    pub fn id_string(&self) -> Option<String> {
        match self.id()? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Field accessor.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Field accessor for string values.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// A human-readable label for log lines: title, name, or filename,
    /// falling back to the id.
    pub fn display_label(&self) -> String {
        for key in ["title", "name", "filename"] {
            if let Some(s) = self.get_str(key) {
                return s.to_string();
            }
        }
        self.id_string().unwrap_or_else(|| "<no id>".into())
    }
}

// ---------------------------------------------------------------------------
// ListResponse
// ---------------------------------------------------------------------------

/// A page of documents from a `list` call, with the store's page info.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListResponse {
    /// The documents in this page.
    pub docs: Vec<Document>,
    /// Total documents matching the query, when reported.
    pub total_docs: Option<u64>,
    /// Total pages, when reported.
    pub total_pages: Option<u64>,
    /// Current page number, when reported.
    pub page: Option<u64>,
    /// Whether another page follows this one.
    pub has_next_page: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_value_plain_object() {
        let doc = Document::from_value(json!({"id": "abc", "title": "T"})).unwrap();
        assert_eq!(doc.id_string().as_deref(), Some("abc"));
        assert_eq!(doc.get_str("title"), Some("T"));
    }

    #[test]
    fn from_value_unwraps_doc_envelope() {
        let doc = Document::from_value(json!({
            "message": "created",
            "doc": {"id": 7, "slug": "travel"}
        }))
        .unwrap();
        assert_eq!(doc.id_string().as_deref(), Some("7"));
        assert_eq!(doc.get_str("slug"), Some("travel"));
        assert!(doc.get("message").is_none());
    }

    #[test]
    fn from_value_rejects_non_object() {
        let err = Document::from_value(json!([1, 2, 3])).unwrap_err();
        assert!(err.to_string().contains("expected a JSON object"));
    }

    #[test]
    fn numeric_id_renders_as_path_segment() {
        let doc = Document::from_value(json!({"id": 42})).unwrap();
        assert_eq!(doc.id_string().as_deref(), Some("42"));
    }

    #[test]
    fn display_label_prefers_title() {
        let doc =
            Document::from_value(json!({"id": "x", "filename": "a.webp", "title": "Hello"}))
                .unwrap();
        assert_eq!(doc.display_label(), "Hello");
    }

    #[test]
    fn list_response_parses_page_info() {
        let resp: ListResponse = serde_json::from_value(json!({
            "docs": [{"id": "1"}],
            "totalDocs": 1,
            "hasNextPage": false
        }))
        .unwrap();
        assert_eq!(resp.docs.len(), 1);
        assert_eq!(resp.total_docs, Some(1));
        assert_eq!(resp.has_next_page, Some(false));
    }
}
