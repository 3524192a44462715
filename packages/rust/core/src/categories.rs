//! Category resolution: labels → backend category IDs.
//!
//! Identity is the derived slug, never the display label. Two labels
//! normalizing to the same slug collapse to one record, first-seen label
//! wins. Existing records are reused as-is; only missing ones are created.

use serde_json::{Map, Value};
use tracing::{debug, instrument};

use presspipe_client::PayloadClient;
use presspipe_shared::{Document, PressPipeError, Result};

use crate::slug::slugify;

/// How category labels map onto the category collection.
#[derive(Debug, Clone)]
pub struct CategoryOptions {
    /// Collection name.
    pub collection: String,
    /// Unique slug field on category records.
    pub slug_field: String,
    /// Display-title field on category records.
    pub title_field: String,
    /// Parent-reference field. When set, hierarchy resolution is enabled.
    pub parent_field: Option<String>,
    /// Number of leading labels dropped before hierarchy resolution —
    /// generic top-level tags that must not enter the category tree.
    pub skip_first: usize,
    /// Extra fields applied to every created record.
    pub defaults: Map<String, Value>,
}

impl Default for CategoryOptions {
    fn default() -> Self {
        Self {
            collection: "categories".into(),
            slug_field: "slug".into(),
            title_field: "title".into(),
            parent_field: None,
            skip_first: 0,
            defaults: Map::new(),
        }
    }
}

/// Validate raw label values into trimmed strings.
///
/// Empty or non-string labels are [`PressPipeError::InvalidCategoryLabel`].
pub fn normalize_labels(values: &[Value]) -> Result<Vec<String>> {
    values
        .iter()
        .map(|value| match value {
            Value::String(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
            Value::String(_) => Err(PressPipeError::InvalidCategoryLabel {
                message: "category label is empty".into(),
            }),
            other => Err(PressPipeError::InvalidCategoryLabel {
                message: format!("category label must be a string, got: {other}"),
            }),
        })
        .collect()
}

fn record_id(doc: &Document, options: &CategoryOptions, slug: &str) -> Result<Value> {
    doc.id().cloned().ok_or_else(|| PressPipeError::MissingIdentifier {
        collection: options.collection.clone(),
        key: slug.to_string(),
    })
}

fn create_payload(
    options: &CategoryOptions,
    slug: &str,
    label: &str,
    parent: Option<&Value>,
) -> Map<String, Value> {
    let mut payload = options.defaults.clone();
    payload.insert(options.slug_field.clone(), Value::String(slug.into()));
    payload.insert(options.title_field.clone(), Value::String(label.into()));
    if let (Some(field), Some(parent_id)) = (&options.parent_field, parent) {
        payload.insert(field.clone(), parent_id.clone());
    }
    payload
}

/// Get-or-create a single category, optionally attached to a parent.
/// An existing record is reused untouched, even if its parent differs.
async fn ensure_category(
    client: &PayloadClient,
    options: &CategoryOptions,
    label: &str,
    parent: Option<&Value>,
) -> Result<Document> {
    let slug = slugify(label)?;
    if let Some(existing) = client
        .find_first_by_field(&options.collection, &options.slug_field, &slug, Some(0))
        .await?
    {
        debug!(%slug, "category exists, reusing");
        return Ok(existing);
    }
    debug!(%slug, %label, "creating category");
    client
        .create(&options.collection, &create_payload(options, &slug, label, parent))
        .await
}

/// Ensure a flat batch of labels exists, in first-seen order.
///
/// Deduplicates by slug, issues a single membership lookup for the whole
/// candidate set, and creates only the records not already present.
#[instrument(skip_all, fields(collection = %options.collection, labels = labels.len()))]
pub async fn ensure_categories(
    client: &PayloadClient,
    options: &CategoryOptions,
    labels: &[String],
) -> Result<Vec<Document>> {
    // Dedup by slug, keeping the first label seen for each. Labels are
    // trimmed here so the stored title never carries stray whitespace.
    let mut wanted: Vec<(String, String)> = Vec::new();
    for label in labels {
        let label = label.trim();
        if label.is_empty() {
            return Err(PressPipeError::InvalidCategoryLabel {
                message: "category label is empty".into(),
            });
        }
        let slug = slugify(label)?;
        if !wanted.iter().any(|(s, _)| s == &slug) {
            wanted.push((slug, label.to_string()));
        }
    }
    if wanted.is_empty() {
        return Ok(Vec::new());
    }

    let slugs: Vec<String> = wanted.iter().map(|(s, _)| s.clone()).collect();
    let existing = client
        .find_by_field_in(&options.collection, &options.slug_field, &slugs, Some(0))
        .await?;

    let mut resolved = Vec::with_capacity(wanted.len());
    for (slug, label) in &wanted {
        let found = existing
            .iter()
            .find(|doc| doc.get_str(&options.slug_field) == Some(slug.as_str()));
        let doc = match found {
            Some(doc) => doc.clone(),
            None => {
                debug!(%slug, %label, "creating category");
                client
                    .create(&options.collection, &create_payload(options, slug, label, None))
                    .await?
            }
        };
        resolved.push(doc);
    }
    Ok(resolved)
}

/// Resolve article category labels into an ordered list of backend IDs.
///
/// Flat mode (no parent field): every label is ensured and its ID returned.
/// Hierarchy mode: the first `skip_first` labels are dropped, the next
/// label becomes the parent, the one after it becomes its child, and the
/// rest resolve as flat siblings. Output order is parent, child, then the
/// remaining labels.
#[instrument(skip_all, fields(collection = %options.collection))]
pub async fn resolve_categories(
    client: &PayloadClient,
    options: &CategoryOptions,
    values: &[Value],
) -> Result<Vec<Value>> {
    let labels = normalize_labels(values)?;

    if options.parent_field.is_none() {
        let docs = ensure_categories(client, options, &labels).await?;
        return docs
            .iter()
            .map(|doc| record_id(doc, options, doc.get_str(&options.slug_field).unwrap_or("?")))
            .collect();
    }

    let remaining = labels.get(options.skip_first..).unwrap_or(&[]);
    let Some(parent_label) = remaining.first() else {
        return Ok(Vec::new());
    };

    let mut ids = Vec::new();
    let parent = ensure_category(client, options, parent_label, None).await?;
    let parent_id = record_id(&parent, options, parent_label)?;
    ids.push(parent_id.clone());

    if let Some(child_label) = remaining.get(1) {
        let child = ensure_category(client, options, child_label, Some(&parent_id)).await?;
        ids.push(record_id(&child, options, child_label)?);
    }

    if remaining.len() > 2 {
        let rest = ensure_categories(client, options, &remaining[2..]).await?;
        for doc in &rest {
            ids.push(record_id(doc, options, doc.get_str(&options.slug_field).unwrap_or("?"))?);
        }
    }
    Ok(ids)
}
