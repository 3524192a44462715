//! Paginated list-then-delete sweep over a collection.

use tracing::{info, instrument, warn};

use presspipe_client::{ListParams, PayloadClient};
use presspipe_shared::Result;

/// Per-collection totals from a sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Documents actually deleted.
    pub deleted: u64,
    /// Documents skipped for lacking an `id`.
    pub skipped: u64,
    /// Per-document delete calls that failed.
    pub failed: u64,
}

/// Delete every document in `collection`, `batch_size` at a time.
///
/// Exhaustion is signalled by a batch smaller than `batch_size`, not by an
/// empty list: a final batch of exactly `batch_size` documents triggers one
/// more fetch that comes back empty. Individual delete failures are logged
/// and skipped; only the fetch itself is fatal.
#[instrument(skip(client), fields(collection = %collection))]
pub async fn delete_all_documents(
    client: &PayloadClient,
    collection: &str,
    batch_size: u32,
) -> Result<SweepReport> {
    let mut report = SweepReport::default();
    let params = ListParams::default().limit(batch_size).depth(Some(0));

    loop {
        let batch = client.list(collection, &params).await?.docs;
        let fetched = batch.len();

        for doc in batch {
            let Some(id) = doc.id_string() else {
                warn!(label = %doc.display_label(), "document has no id, skipping");
                report.skipped += 1;
                continue;
            };
            match client.delete(collection, &id).await {
                Ok(()) => report.deleted += 1,
                Err(err) => {
                    warn!(%id, %err, "delete failed, continuing");
                    report.failed += 1;
                }
            }
        }

        if (fetched as u32) < batch_size {
            break;
        }
    }

    info!(
        deleted = report.deleted,
        skipped = report.skipped,
        failed = report.failed,
        "collection swept"
    );
    Ok(report)
}

/// Sweep several collections in order, returning per-collection reports.
/// Articles should come before the media and categories they reference.
pub async fn clean_collections(
    client: &PayloadClient,
    collections: &[String],
    batch_size: u32,
) -> Result<Vec<(String, SweepReport)>> {
    let mut reports = Vec::with_capacity(collections.len());
    for collection in collections {
        let report = delete_all_documents(client, collection, batch_size).await?;
        reports.push((collection.clone(), report));
    }
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> PayloadClient {
        PayloadClient::new(&server.uri(), "api", std::time::Duration::from_secs(5))
            .expect("client")
    }

    #[tokio::test]
    async fn exactly_full_batch_triggers_one_extra_fetch() {
        let server = MockServer::start().await;

        // First fetch: a full batch of 2. Second fetch: empty, confirming
        // exhaustion. Stopping requires both calls.
        Mock::given(method("GET"))
            .and(path("/api/posts"))
            .and(query_param("limit", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "docs": [{"id": "a"}, {"id": "b"}]
            })))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/posts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"docs": []})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/posts/a"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "a"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/posts/b"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "b"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let report = delete_all_documents(&client, "posts", 2).await.expect("sweep");
        assert_eq!(report.deleted, 2);
        assert_eq!(report.failed, 0);
    }

    #[tokio::test]
    async fn short_batch_stops_without_another_fetch() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/posts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "docs": [{"id": "only"}]
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/posts/only"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "only"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let report = delete_all_documents(&client, "posts", 5).await.expect("sweep");
        assert_eq!(report.deleted, 1);
    }

    #[tokio::test]
    async fn delete_failures_and_missing_ids_do_not_abort() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/posts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "docs": [{"id": "ok"}, {"title": "no id"}, {"id": "locked"}]
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/posts/ok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "ok"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/posts/locked"))
            .respond_with(ResponseTemplate::new(423))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let report = delete_all_documents(&client, "posts", 10).await.expect("sweep");
        assert_eq!(report.deleted, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.failed, 1);
    }

    #[tokio::test]
    async fn empty_collection_sweeps_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/posts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"docs": []})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let report = delete_all_documents(&client, "posts", 25).await.expect("sweep");
        assert_eq!(report, SweepReport::default());
    }

    #[tokio::test]
    async fn collections_are_swept_in_order() {
        let server = MockServer::start().await;
        for collection in ["posts", "media"] {
            Mock::given(method("GET"))
                .and(path(format!("/api/{collection}")))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({"docs": []})))
                .expect(1)
                .mount(&server)
                .await;
        }

        let client = client_for(&server);
        let reports =
            clean_collections(&client, &["posts".into(), "media".into()], 25)
                .await
                .expect("clean");
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].0, "posts");
        assert_eq!(reports[1].0, "media");
    }
}
