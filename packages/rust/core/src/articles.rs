//! Single-article upload: parse, resolve references, upsert.

use std::path::Path;

use serde_json::Value;
use tracing::{debug, info, instrument};

use presspipe_client::PayloadClient;
use presspipe_shared::{Document, PressPipeError, Result};

use crate::categories::{CategoryOptions, resolve_categories};
use crate::frontmatter::parse_article_file;
use crate::media::{MediaOptions, resolve_featured_image};
use crate::payload::ArticlePayloadBuilder;
use crate::slug::{slugify, slugify_flat};

/// Everything configurable about a single article upload.
#[derive(Debug, Clone)]
pub struct ArticleUploadOptions {
    /// Article collection name.
    pub collection: String,
    /// Slug/body/defaults handling.
    pub builder: ArticlePayloadBuilder,
    /// Relationship depth for the article lookup and write.
    pub depth: Option<u32>,
    /// Payload field holding the featured-image path. `None` disables media
    /// handling entirely.
    pub featured_image_field: Option<String>,
    /// Schema field the resolved media ID is written under, when it differs
    /// from the source field.
    pub featured_image_output_field: Option<String>,
    /// Local path that overrides the payload's featured-image value.
    pub featured_image_override: Option<String>,
    /// Media collection behavior.
    pub media: MediaOptions,
    /// Payload field holding the category label list. `None` disables
    /// category handling.
    pub category_field: Option<String>,
    /// Schema field the resolved category IDs are written under, when it
    /// differs from the source field.
    pub category_output_field: Option<String>,
    /// Category collection behavior.
    pub categories: CategoryOptions,
    /// Slug prefix derived from the article's directory, hyphen-joined with
    /// the filename stem. An explicit front-matter slug always wins.
    pub slug_prefix: Option<String>,
}

impl Default for ArticleUploadOptions {
    fn default() -> Self {
        Self {
            collection: "posts".into(),
            builder: ArticlePayloadBuilder::default(),
            depth: None,
            featured_image_field: Some("featuredImage".into()),
            featured_image_output_field: None,
            featured_image_override: None,
            media: MediaOptions::default(),
            category_field: Some("categories".into()),
            category_output_field: None,
            categories: CategoryOptions::default(),
            slug_prefix: None,
        }
    }
}

fn prefixed_slug(prefix: &str, article_path: &Path) -> Result<Option<String>> {
    let flat = slugify_flat(prefix)?;
    let stem = article_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    if stem.is_empty() {
        return Ok(None);
    }
    let stem_slug = slugify(&stem)?;
    if flat.is_empty() {
        Ok(Some(stem_slug))
    } else {
        Ok(Some(format!("{flat}-{stem_slug}")))
    }
}

/// Parse an article file, resolve its category and media references, and
/// upsert it keyed on the slug field.
///
/// Resolution order is fixed: categories, then media, then the article
/// write — later steps depend on IDs produced by earlier ones, and the
/// article must never reference an entity that does not exist yet.
#[instrument(skip_all, fields(article = %article_path.display()))]
pub async fn upload_article_from_file(
    client: &PayloadClient,
    options: &ArticleUploadOptions,
    article_path: &Path,
) -> Result<Document> {
    let document = parse_article_file(article_path)?;
    let (mut slug, mut payload) = options.builder.build(&document)?;

    // Directory-derived slugs apply only when the front matter does not
    // pin one explicitly under the configured slug field.
    if document.slug(&options.builder.slug_field).is_none() {
        if let Some(prefix) = &options.slug_prefix {
            if let Some(derived) = prefixed_slug(prefix, article_path)? {
                slug = derived;
                payload.set(&options.builder.slug_field, Value::String(slug.clone()));
            }
        }
    }

    if let Some(field) = &options.category_field {
        if let Some(value) = payload.get(field).cloned() {
            let labels = match value {
                Value::Array(items) => items,
                other => {
                    return Err(PressPipeError::InvalidCategoryLabel {
                        message: format!("field '{field}' must be a list of labels, got: {other}"),
                    });
                }
            };
            let ids = resolve_categories(client, &options.categories, &labels).await?;
            debug!(count = ids.len(), "categories resolved");
            match &options.category_output_field {
                Some(output) if output != field => {
                    payload.remove(field);
                    payload.set(output, Value::Array(ids));
                }
                _ => payload.set(field, Value::Array(ids)),
            }
        }
    }

    if let Some(field) = &options.featured_image_field {
        if let Some(path) = &options.featured_image_override {
            payload.set(field, Value::String(path.clone()));
        }
        resolve_featured_image(
            client,
            &options.media,
            &mut payload,
            field,
            options.featured_image_output_field.as_deref(),
            article_path,
        )
        .await?;
    }

    let result = client
        .upsert_by_field(
            &options.collection,
            &options.builder.slug_field,
            &slug,
            payload.as_map(),
            options.depth,
        )
        .await?;
    info!(%slug, id = %result.id_string().unwrap_or_default(), "article upserted");
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> PayloadClient {
        PayloadClient::new(&server.uri(), "api", std::time::Duration::from_secs(5))
            .expect("client")
    }

    fn write_article(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    /// Options with reference handling disabled, for slug-focused tests.
    fn bare_options() -> ArticleUploadOptions {
        ArticleUploadOptions {
            featured_image_field: None,
            category_field: None,
            ..ArticleUploadOptions::default()
        }
    }

    #[tokio::test]
    async fn upserts_with_title_derived_slug() {
        let dir = tempfile::tempdir().unwrap();
        let article = write_article(
            dir.path(),
            "article.html",
            "---\ntitle: \"Venice Canals\"\n---\n<p>Body</p>\n",
        );

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/posts"))
            .and(query_param("where[slug][equals]", "venice-canals"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"docs": []})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/posts"))
            .and(body_partial_json(json!({"slug": "venice-canals", "title": "Venice Canals"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "doc": {"id": "p1", "slug": "venice-canals"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let doc = upload_article_from_file(&client, &bare_options(), &article)
            .await
            .expect("upload");
        assert_eq!(doc.id_string().as_deref(), Some("p1"));
    }

    #[tokio::test]
    async fn directory_prefix_joins_with_filename_stem() {
        let dir = tempfile::tempdir().unwrap();
        let article = write_article(
            dir.path(),
            "bologna-2-day-itinerary.html",
            "---\ntitle: \"Bologna in Two Days\"\n---\n<p>Body</p>\n",
        );

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/posts"))
            .and(query_param("where[slug][equals]", "italy-bologna-bologna-2-day-itinerary"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"docs": []})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/posts"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "doc": {"id": "p2", "slug": "italy-bologna-bologna-2-day-itinerary"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let options = ArticleUploadOptions {
            slug_prefix: Some("Italy/Bologna".into()),
            ..bare_options()
        };
        let client = client_for(&server);
        upload_article_from_file(&client, &options, &article)
            .await
            .expect("upload");
    }

    #[tokio::test]
    async fn explicit_front_matter_slug_ignores_the_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let article = write_article(
            dir.path(),
            "whatever.html",
            "---\ntitle: T\nslug: \"pinned-slug\"\n---\n<p>Body</p>\n",
        );

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/posts"))
            .and(query_param("where[slug][equals]", "pinned-slug"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "docs": [{"id": "p3", "slug": "pinned-slug"}]
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/api/posts/p3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "doc": {"id": "p3", "slug": "pinned-slug"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let options = ArticleUploadOptions {
            slug_prefix: Some("italy/bologna".into()),
            ..bare_options()
        };
        let client = client_for(&server);
        upload_article_from_file(&client, &options, &article)
            .await
            .expect("upload");
    }

    #[tokio::test]
    async fn pinned_slug_under_a_custom_field_ignores_the_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let article = write_article(
            dir.path(),
            "venice.html",
            "---\ntitle: T\nurlSlug: \"pinned-slug\"\n---\n<p>Body</p>\n",
        );

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/posts"))
            .and(query_param("where[urlSlug][equals]", "pinned-slug"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "docs": [{"id": "p5", "urlSlug": "pinned-slug"}]
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/api/posts/p5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "doc": {"id": "p5", "urlSlug": "pinned-slug"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let options = ArticleUploadOptions {
            builder: ArticlePayloadBuilder {
                slug_field: "urlSlug".into(),
                ..ArticlePayloadBuilder::default()
            },
            slug_prefix: Some("italy".into()),
            ..bare_options()
        };
        let client = client_for(&server);
        upload_article_from_file(&client, &options, &article)
            .await
            .expect("upload");
    }

    #[tokio::test]
    async fn resolves_categories_and_media_before_the_write() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("cover.webp"), b"fake-image").unwrap();
        let article = write_article(
            dir.path(),
            "article.html",
            concat!(
                "---\n",
                "title: \"Bologna Guide\"\n",
                "tags:\n  - \"Italy\"\n",
                "featuredImage: \"cover.webp\"\n",
                "---\n",
                "<p>Body</p>\n",
            ),
        );

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/categories"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "docs": [{"id": "c1", "slug": "italy"}]
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/media"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "docs": [{"id": "m1", "filename": "cover.webp"}]
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/posts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"docs": []})))
            .expect(1)
            .mount(&server)
            .await;
        // Resolved IDs land under the schema field names.
        Mock::given(method("POST"))
            .and(path("/api/posts"))
            .and(body_partial_json(json!({
                "categories": ["c1"],
                "heroImage": "m1"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "doc": {"id": "p4", "slug": "bologna-guide"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let options = ArticleUploadOptions {
            category_field: Some("tags".into()),
            category_output_field: Some("categories".into()),
            featured_image_output_field: Some("heroImage".into()),
            ..ArticleUploadOptions::default()
        };
        let client = client_for(&server);
        let doc = upload_article_from_file(&client, &options, &article)
            .await
            .expect("upload");
        assert_eq!(doc.id_string().as_deref(), Some("p4"));
    }

    #[tokio::test]
    async fn non_list_category_field_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let article = write_article(
            dir.path(),
            "article.html",
            "---\ntitle: T\ntags: \"not-a-list\"\n---\n<p>Body</p>\n",
        );

        let server = MockServer::start().await;
        let options = ArticleUploadOptions {
            category_field: Some("tags".into()),
            featured_image_field: None,
            ..ArticleUploadOptions::default()
        };
        let client = client_for(&server);
        let err = upload_article_from_file(&client, &options, &article)
            .await
            .unwrap_err();
        assert!(matches!(err, PressPipeError::InvalidCategoryLabel { .. }));
    }
}
