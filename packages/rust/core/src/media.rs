//! Featured-image resolution: local path → media record ID.
//!
//! Ordering matters: the media record must exist before the article that
//! references it is written. Reuse is keyed on filename; a fresh upload is
//! followed by one update attaching alt/caption, which the multipart
//! creation endpoint does not accept inline.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, instrument};

use presspipe_client::PayloadClient;
use presspipe_shared::{PressPipeError, Result};

use crate::payload::ArticlePayload;

/// How featured-image paths map onto the media collection.
#[derive(Debug, Clone)]
pub struct MediaOptions {
    /// Media collection name.
    pub collection: String,
    /// Unique filename field on media records.
    pub filename_field: String,
    /// Directory searched for relative image paths before the article's own
    /// directory.
    pub media_root: Option<PathBuf>,
    /// Default alt/caption values and extra upload form fields.
    pub defaults: Map<String, Value>,
    /// Relationship depth for media lookups and uploads.
    pub depth: Option<u32>,
}

impl Default for MediaOptions {
    fn default() -> Self {
        Self {
            collection: "media".into(),
            filename_field: "filename".into(),
            media_root: None,
            defaults: Map::new(),
            depth: None,
        }
    }
}

/// Turn a filename into display text: extension stripped, hyphens and
/// underscores become spaces, each word title-cased.
pub fn humanize_filename(filename: &str) -> String {
    let stem = filename.rsplit_once('.').map_or(filename, |(stem, _)| stem);
    stem.split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn locate_image(
    reference: &str,
    article_path: &Path,
    media_root: Option<&Path>,
) -> Result<PathBuf> {
    let literal = Path::new(reference);
    if literal.is_file() {
        return Ok(literal.to_path_buf());
    }

    let cleaned = reference.trim_start_matches(['/', '\\']);
    let mut bases: Vec<&Path> = Vec::new();
    if let Some(root) = media_root {
        bases.push(root);
    }
    if let Some(parent) = article_path.parent() {
        bases.push(parent);
    }
    for base in bases {
        let candidate = base.join(cleaned);
        if candidate.is_file() {
            return Ok(candidate);
        }
    }

    Err(PressPipeError::MediaNotFound {
        reference: reference.to_string(),
        article: article_path.to_path_buf(),
    })
}

fn text_value(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

/// Resolve the article's featured-image field into a media record ID.
///
/// The field's string path is located on disk (literal, then media root,
/// then the article's directory), matched against existing media by
/// filename, and uploaded only when absent. The `<field>Alt` and
/// `<field>Caption` companion fields are always consumed off the payload,
/// even when no image is processed, so they never leak into the article
/// document. When `output_field` differs from `field`, the ID lands under
/// the new name and the source key is removed.
#[instrument(skip_all, fields(field = %field, article = %article_path.display()))]
pub async fn resolve_featured_image(
    client: &PayloadClient,
    options: &MediaOptions,
    payload: &mut ArticlePayload,
    field: &str,
    output_field: Option<&str>,
    article_path: &Path,
) -> Result<()> {
    let companion_alt = text_value(payload.remove(&format!("{field}Alt")).as_ref());
    let companion_caption = text_value(payload.remove(&format!("{field}Caption")).as_ref());

    let Some(reference) = payload.get_str(field).map(str::trim).filter(|s| !s.is_empty())
    else {
        // Nothing to resolve; a non-path value passes through untouched.
        return Ok(());
    };
    let reference = reference.to_string();

    let resolved = locate_image(&reference, article_path, options.media_root.as_deref())?;
    let filename = resolved
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| PressPipeError::MediaNotFound {
            reference: reference.clone(),
            article: article_path.to_path_buf(),
        })?;

    let media_id = match client
        .find_first_by_field(&options.collection, &options.filename_field, &filename, options.depth)
        .await?
    {
        Some(existing) => {
            debug!(%filename, "media exists, reusing");
            existing.id().cloned().ok_or_else(|| PressPipeError::MissingIdentifier {
                collection: options.collection.clone(),
                key: filename.clone(),
            })?
        }
        None => {
            // Alt/caption go in the follow-up update; everything else rides
            // along as upload form fields.
            let mut form_fields = options.defaults.clone();
            form_fields.shift_remove("alt");
            form_fields.shift_remove("caption");

            debug!(%filename, "uploading media");
            let uploaded = client
                .upload_file(&options.collection, &resolved, &form_fields, options.depth)
                .await?;
            let id = uploaded.id().cloned().ok_or_else(|| {
                PressPipeError::MissingIdentifier {
                    collection: options.collection.clone(),
                    key: filename.clone(),
                }
            })?;
            let id_string = uploaded.id_string().ok_or_else(|| {
                PressPipeError::MissingIdentifier {
                    collection: options.collection.clone(),
                    key: filename.clone(),
                }
            })?;

            let alt = companion_alt
                .or_else(|| text_value(options.defaults.get("alt")))
                .unwrap_or_else(|| humanize_filename(&filename));
            let caption = companion_caption
                .or_else(|| text_value(options.defaults.get("caption")))
                .unwrap_or_else(|| humanize_filename(&filename));

            let mut companion = Map::new();
            companion.insert("alt".into(), Value::String(alt));
            companion.insert("caption".into(), Value::String(caption));
            client.update(&options.collection, &id_string, &companion).await?;
            id
        }
    };

    match output_field {
        Some(output) if output != field => {
            payload.remove(field);
            payload.set(output, media_id);
        }
        _ => payload.set(field, media_id),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> PayloadClient {
        PayloadClient::new(&server.uri(), "api", std::time::Duration::from_secs(5))
            .expect("client")
    }

    fn payload_with(fields: Value) -> ArticlePayload {
        ArticlePayload::from_map(serde_json::from_value(fields).unwrap())
    }

    /// Article file + image side by side in a temp directory.
    fn article_with_image(image_name: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join(image_name), b"fake-image-bytes").unwrap();
        let article = dir.path().join("article.html");
        std::fs::write(&article, "---\ntitle: T\n---\nbody").unwrap();
        (dir, article)
    }

    #[test]
    fn humanize_strips_extension_and_title_cases() {
        assert_eq!(humanize_filename("bologna-2-day-itinerary.webp"), "Bologna 2 Day Itinerary");
        assert_eq!(humanize_filename("zurich_old_town.jpg"), "Zurich Old Town");
        assert_eq!(humanize_filename("cover"), "Cover");
    }

    #[tokio::test]
    async fn existing_media_is_reused_without_uploading() {
        let (_dir, article) = article_with_image("cover.webp");
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/media"))
            .and(query_param("where[filename][equals]", "cover.webp"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "docs": [{"id": "m1", "filename": "cover.webp"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        // Any POST or PATCH would fail the test.
        Mock::given(method("POST"))
            .and(path("/api/media"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let mut payload = payload_with(json!({"title": "T", "featuredImage": "cover.webp"}));
        resolve_featured_image(
            &client,
            &MediaOptions::default(),
            &mut payload,
            "featuredImage",
            None,
            &article,
        )
        .await
        .expect("resolve");

        assert_eq!(payload.get("featuredImage"), Some(&json!("m1")));
    }

    #[tokio::test]
    async fn upload_then_update_attaches_alt_and_caption() {
        let (_dir, article) = article_with_image("bologna-day-trip.webp");
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/media"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"docs": []})))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/api/media"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "doc": {"id": "m7", "filename": "bologna-day-trip.webp"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        // Filename-derived fallback when no companion or default exists.
        Mock::given(method("PATCH"))
            .and(path("/api/media/m7"))
            .and(body_partial_json(json!({
                "alt": "Bologna Day Trip",
                "caption": "Bologna Day Trip"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "doc": {"id": "m7"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let mut payload =
            payload_with(json!({"title": "T", "featuredImage": "bologna-day-trip.webp"}));
        resolve_featured_image(
            &client,
            &MediaOptions::default(),
            &mut payload,
            "featuredImage",
            None,
            &article,
        )
        .await
        .expect("resolve");

        assert_eq!(payload.get("featuredImage"), Some(&json!("m7")));
    }

    #[tokio::test]
    async fn companion_fields_win_and_are_stripped() {
        let (_dir, article) = article_with_image("cover.webp");
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/media"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"docs": []})))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/api/media"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "doc": {"id": "m2", "filename": "cover.webp"}
            })))
            .mount(&server)
            .await;

        Mock::given(method("PATCH"))
            .and(path("/api/media/m2"))
            .and(body_partial_json(json!({
                "alt": "Bologna at dusk",
                "caption": "Default caption"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"doc": {"id": "m2"}})))
            .expect(1)
            .mount(&server)
            .await;

        let options = MediaOptions {
            defaults: serde_json::from_value(json!({"caption": "Default caption"})).unwrap(),
            ..MediaOptions::default()
        };
        let client = client_for(&server);
        let mut payload = payload_with(json!({
            "title": "T",
            "featuredImage": "cover.webp",
            "featuredImageAlt": "Bologna at dusk"
        }));
        resolve_featured_image(&client, &options, &mut payload, "featuredImage", None, &article)
            .await
            .expect("resolve");

        assert!(!payload.contains("featuredImageAlt"));
    }

    #[tokio::test]
    async fn output_field_renames_the_reference() {
        let (_dir, article) = article_with_image("cover.webp");
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/media"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "docs": [{"id": "m1", "filename": "cover.webp"}]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let mut payload = payload_with(json!({"title": "T", "featuredImage": "cover.webp"}));
        resolve_featured_image(
            &client,
            &MediaOptions::default(),
            &mut payload,
            "featuredImage",
            Some("heroImage"),
            &article,
        )
        .await
        .expect("resolve");

        assert!(!payload.contains("featuredImage"));
        assert_eq!(payload.get("heroImage"), Some(&json!("m1")));
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let article = dir.path().join("article.html");
        std::fs::write(&article, "x").unwrap();

        let server = MockServer::start().await;
        let client = client_for(&server);
        let mut payload = payload_with(json!({"featuredImage": "nope.webp"}));
        let err = resolve_featured_image(
            &client,
            &MediaOptions::default(),
            &mut payload,
            "featuredImage",
            None,
            &article,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, PressPipeError::MediaNotFound { .. }));
    }

    #[tokio::test]
    async fn companions_are_stripped_even_without_an_image() {
        let server = MockServer::start().await;
        // No mocks: no request may be issued when the field is absent.
        let client = client_for(&server);
        let article = PathBuf::from("does-not-matter.html");
        let mut payload = payload_with(json!({
            "title": "T",
            "featuredImageAlt": "Orphaned alt",
            "featuredImageCaption": "Orphaned caption"
        }));
        resolve_featured_image(
            &client,
            &MediaOptions::default(),
            &mut payload,
            "featuredImage",
            None,
            &article,
        )
        .await
        .expect("resolve");

        assert!(!payload.contains("featuredImageAlt"));
        assert!(!payload.contains("featuredImageCaption"));
        assert!(!payload.contains("featuredImage"));
    }
}
