//! REST client for the document store (Payload-style headless CMS).
//!
//! One request is in flight at a time — callers drive the pipeline
//! strictly sequentially, so the client holds no connection-level state
//! beyond the bearer token. Every response is normalized into the
//! canonical [`Document`] shape at this boundary; nothing downstream
//! branches on response shape.

use std::path::Path;
use std::time::Duration;

use reqwest::multipart;
use serde_json::{Map, Value, json};
use tracing::{debug, instrument};
use url::Url;

use presspipe_shared::{Credentials, Document, ListResponse, PressPipeError, Result};

/// User-Agent string for store requests.
const USER_AGENT: &str = concat!("PressPipe/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// ListParams
// ---------------------------------------------------------------------------

/// Query parameters for a `list` call.
#[derive(Debug, Clone, Default)]
pub struct ListParams {
    /// Equality filters, rendered as `where[field][equals]=value`.
    pub equals: Vec<(String, String)>,
    /// Membership filter, rendered as `where[field][in]=a,b,c`.
    pub within: Option<(String, Vec<String>)>,
    /// Maximum number of documents to return.
    pub limit: Option<u32>,
    /// Page number (1-based).
    pub page: Option<u32>,
    /// Relationship population depth.
    pub depth: Option<u32>,
}

impl ListParams {
    /// Filter on `field == value`.
    pub fn equals(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            equals: vec![(field.into(), value.into())],
            ..Self::default()
        }
    }

    /// Filter on `field in values`.
    pub fn within(field: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            within: Some((field.into(), values)),
            ..Self::default()
        }
    }

    /// Set the result-count limit.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set the population depth.
    pub fn depth(mut self, depth: Option<u32>) -> Self {
        self.depth = depth;
        self
    }

    fn apply(&self, url: &mut Url) {
        let mut query = url.query_pairs_mut();
        for (field, value) in &self.equals {
            query.append_pair(&format!("where[{field}][equals]"), value);
        }
        if let Some((field, values)) = &self.within {
            query.append_pair(&format!("where[{field}][in]"), &values.join(","));
        }
        if let Some(limit) = self.limit {
            query.append_pair("limit", &limit.to_string());
        }
        if let Some(page) = self.page {
            query.append_pair("page", &page.to_string());
        }
        if let Some(depth) = self.depth {
            query.append_pair("depth", &depth.to_string());
        }
    }
}

// ---------------------------------------------------------------------------
// PayloadClient
// ---------------------------------------------------------------------------

/// Minimal client for the store's REST endpoints.
#[derive(Debug, Clone)]
pub struct PayloadClient {
    http: reqwest::Client,
    base_url: String,
    api_prefix: String,
    token: Option<String>,
}

impl PayloadClient {
    /// Build a client for `base_url` with the given API prefix and
    /// per-request timeout.
    pub fn new(base_url: &str, api_prefix: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| PressPipeError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_prefix: api_prefix.trim_matches('/').to_string(),
            token: None,
        })
    }

    /// Use a pre-obtained bearer token instead of logging in.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Whether the client currently holds a bearer token.
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        let raw = format!(
            "{}/{}/{}",
            self.base_url,
            self.api_prefix,
            path.trim_start_matches('/')
        );
        Url::parse(&raw)
            .map_err(|e| PressPipeError::Network(format!("invalid endpoint URL '{raw}': {e}")))
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        let mut builder = self.http.request(method, url).header("Accept", "application/json");
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    /// Send a request and map the response into JSON per the error policy:
    /// 401/403 → `Auth`, other 4xx → `RemoteValidation` with the body,
    /// transport failures and 5xx → `Network`.
    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<Value> {
        let response = builder
            .send()
            .await
            .map_err(|e| PressPipeError::Network(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            return Err(PressPipeError::Auth(format!("status {status}: {body}")));
        }
        if status.is_client_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(PressPipeError::RemoteValidation {
                status: status.as_u16(),
                body,
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PressPipeError::Network(format!("status {status}: {body}")));
        }
        if status == reqwest::StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }

        response
            .json()
            .await
            .map_err(|e| PressPipeError::Network(format!("invalid JSON response: {e}")))
    }

    // -- auth ----------------------------------------------------------------

    /// Authenticate against an auth-enabled collection and store the bearer
    /// token for subsequent calls. Returns the login response document
    /// (user, token expiry) for display.
    #[instrument(skip_all, fields(collection = %user_collection))]
    pub async fn login(
        &mut self,
        user_collection: &str,
        credentials: &Credentials,
    ) -> Result<Document> {
        let url = self.endpoint(&format!("{user_collection}/login"))?;
        let body = json!({
            "email": credentials.email,
            "password": credentials.password,
        });
        let value = self.send(self.request(reqwest::Method::POST, url).json(&body)).await?;

        let token = value
            .get("token")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                PressPipeError::Auth("login response did not include a token string".into())
            })?
            .to_string();
        self.token = Some(token);
        debug!("login succeeded, bearer token stored");

        Document::from_value(value)
    }

    // -- reads ---------------------------------------------------------------

    /// List documents in a collection.
    pub async fn list(&self, collection: &str, params: &ListParams) -> Result<ListResponse> {
        let mut url = self.endpoint(collection)?;
        params.apply(&mut url);
        let value = self.send(self.request(reqwest::Method::GET, url)).await?;
        serde_json::from_value(value)
            .map_err(|e| PressPipeError::parse(format!("malformed list response: {e}")))
    }

    /// Return the first document whose `field` equals `value`, if any.
    pub async fn find_first_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &str,
        depth: Option<u32>,
    ) -> Result<Option<Document>> {
        let params = ListParams::equals(field, value).depth(depth);
        let mut response = self.list(collection, &params).await?;
        if response.docs.is_empty() {
            Ok(None)
        } else {
            Ok(Some(response.docs.swap_remove(0)))
        }
    }

    /// Return all documents whose `field` is one of `values` — a single
    /// lookup covering a whole candidate set.
    pub async fn find_by_field_in(
        &self,
        collection: &str,
        field: &str,
        values: &[String],
        depth: Option<u32>,
    ) -> Result<Vec<Document>> {
        if values.is_empty() {
            return Ok(Vec::new());
        }
        let params = ListParams::within(field, values.to_vec())
            .limit(values.len() as u32)
            .depth(depth);
        Ok(self.list(collection, &params).await?.docs)
    }

    // -- writes --------------------------------------------------------------

    /// Create a new document.
    #[instrument(skip(self, payload), fields(collection = %collection))]
    pub async fn create(&self, collection: &str, payload: &Map<String, Value>) -> Result<Document> {
        let url = self.endpoint(collection)?;
        let value = self
            .send(self.request(reqwest::Method::POST, url).json(payload))
            .await?;
        Document::from_value(value)
    }

    /// Partially update an existing document by id.
    #[instrument(skip(self, payload), fields(collection = %collection, id = %id))]
    pub async fn update(
        &self,
        collection: &str,
        id: &str,
        payload: &Map<String, Value>,
    ) -> Result<Document> {
        let url = self.endpoint(&format!("{collection}/{id}"))?;
        let value = self
            .send(self.request(reqwest::Method::PATCH, url).json(payload))
            .await?;
        Document::from_value(value)
    }

    /// Delete a document by id.
    #[instrument(skip(self), fields(collection = %collection, id = %id))]
    pub async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        let url = self.endpoint(&format!("{collection}/{id}"))?;
        self.send(self.request(reqwest::Method::DELETE, url)).await?;
        Ok(())
    }

    /// Upload a local file to a media collection via multipart, with extra
    /// form fields submitted alongside the binary.
    #[instrument(skip(self, fields), fields(collection = %collection, path = %file_path.display()))]
    pub async fn upload_file(
        &self,
        collection: &str,
        file_path: &Path,
        fields: &Map<String, Value>,
        depth: Option<u32>,
    ) -> Result<Document> {
        let bytes =
            std::fs::read(file_path).map_err(|e| PressPipeError::io(file_path, e))?;
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.bin".into());

        let mut form = multipart::Form::new().part(
            "file",
            multipart::Part::bytes(bytes).file_name(file_name),
        );
        for (key, value) in fields {
            let text = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            form = form.text(key.clone(), text);
        }

        let mut url = self.endpoint(collection)?;
        if let Some(depth) = depth {
            url.query_pairs_mut()
                .append_pair("depth", &depth.to_string());
        }
        let value = self
            .send(self.request(reqwest::Method::POST, url).multipart(form))
            .await?;
        Document::from_value(value)
    }

    // -- upsert --------------------------------------------------------------

    /// Create or update a document keyed by equality on `field`.
    ///
    /// An update is only ever issued after a successful lookup; a found
    /// document without an `id` is a [`PressPipeError::MissingIdentifier`].
    #[instrument(skip(self, payload), fields(collection = %collection, field = %field, value = %value))]
    pub async fn upsert_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &str,
        payload: &Map<String, Value>,
        depth: Option<u32>,
    ) -> Result<Document> {
        match self.find_first_by_field(collection, field, value, depth).await? {
            Some(existing) => {
                let id = existing.id_string().ok_or_else(|| {
                    PressPipeError::MissingIdentifier {
                        collection: collection.to_string(),
                        key: value.to_string(),
                    }
                })?;
                debug!(%id, "existing document found, updating");
                self.update(collection, &id, payload).await
            }
            None => {
                debug!("no existing document, creating");
                self.create(collection, payload).await
            }
        }
    }
}
