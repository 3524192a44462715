//! Ingestion core: parsing, reference resolution, and upsert orchestration.
//!
//! The pipeline per article is: parse front matter, build the payload,
//! resolve category labels and the featured image into backend IDs, then
//! upsert the article keyed on its slug. Everything runs strictly
//! sequentially; each step depends on IDs the previous one produced.

pub mod articles;
pub mod batch;
pub mod categories;
pub mod cleanup;
pub mod frontmatter;
pub mod media;
pub mod payload;
pub mod slug;

pub use articles::{ArticleUploadOptions, upload_article_from_file};
pub use batch::{BatchOptions, BatchOutcome, FailurePolicy, upload_articles_from_directory};
pub use categories::{CategoryOptions, ensure_categories, resolve_categories};
pub use cleanup::{SweepReport, clean_collections, delete_all_documents};
pub use frontmatter::{ArticleDocument, parse_article_file};
pub use media::{MediaOptions, resolve_featured_image};
pub use payload::{ArticlePayload, ArticlePayloadBuilder, BodyFormat};
pub use slug::{slugify, slugify_flat, slugify_path};
