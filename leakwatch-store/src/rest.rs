//! Document store backed by a hosted JSON document API.
//!
//! ## Endpoints
//!
//! - `POST  {endpoint}/v1/collections/{collection}/documents` - create, returns `{"id": …}`
//! - `GET   {endpoint}/v1/collections/{collection}/documents?field=value…` - query
//! - `GET   {endpoint}/v1/collections/{collection}/documents/{id}` - fetch one
//! - `PATCH {endpoint}/v1/collections/{collection}/documents/{id}` - merge fields
//!
//! Timestamps come from the local [`Clock`]; the API does not expose a
//! server time endpoint.
//!
//! ## Example
//!
//! ```rust,no_run
//! use leakwatch_store::rest::RestStore;
//! use leakwatch_store::DocumentStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = RestStore::builder()
//!         .endpoint("https://docs.example.com")
//!         .token("secret")
//!         .build()?;
//!
//!     let leaks = store.query_records("leaks", &[]).await?;
//!     println!("{} leak records", leaks.len());
//!     Ok(())
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use leakwatch_types::EpochMillis;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use tracing::debug;

use crate::{Clock, Document, DocumentStore, Fields, Filter, StoreError, SystemClock};

/// HTTP client for the hosted document API.
#[derive(Debug, Clone)]
pub struct RestStore {
    client: Client,
    endpoint: String,
    base: Url,
    token: Option<String>,
    clock: Arc<dyn Clock>,
}

impl RestStore {
    /// Create a new builder for configuring the store.
    pub fn builder() -> RestStoreBuilder {
        RestStoreBuilder::default()
    }

    /// The base URL requests are sent to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn documents_url(&self, collection: &str) -> Result<Url, StoreError> {
        self.url(collection, None)
    }

    fn document_url(&self, collection: &str, id: &str) -> Result<Url, StoreError> {
        self.url(collection, Some(id))
    }

    // Path segments are percent-encoded by `Url`, so ids may hold any character
    fn url(&self, collection: &str, id: Option<&str>) -> Result<Url, StoreError> {
        let mut url = self.base.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                StoreError::Connection(format!("endpoint {} cannot hold a path", self.endpoint))
            })?;
            segments
                .pop_if_empty()
                .extend(["v1", "collections", collection, "documents"]);
            if let Some(id) = id {
                segments.push(id);
            }
        }
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(
        &self,
        request: RequestBuilder,
        collection: &str,
        id: Option<&str>,
    ) -> Result<Response, StoreError> {
        let response = self.authorized(request).send().await?;
        check_status(response, collection, id)
    }
}

fn check_status(
    response: Response,
    collection: &str,
    id: Option<&str>,
) -> Result<Response, StoreError> {
    match response.status() {
        status if status.is_success() => Ok(response),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(StoreError::Auth(format!(
            "API returned status {}",
            response.status()
        ))),
        StatusCode::NOT_FOUND => Err(StoreError::NotFound {
            collection: collection.to_string(),
            id: id.unwrap_or_default().to_string(),
        }),
        StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE => Err(
            StoreError::Unavailable(format!("API returned status {}", response.status())),
        ),
        status => Err(StoreError::Http(format!("API returned status {}", status))),
    }
}

#[async_trait]
impl DocumentStore for RestStore {
    async fn create_record(&self, collection: &str, fields: Fields) -> Result<String, StoreError> {
        let url = self.documents_url(collection)?;
        debug!("POST {}", url);

        let response = self
            .send(self.client.post(url).json(&fields), collection, None)
            .await?;
        let created: CreatedDocument = response
            .json()
            .await
            .map_err(|e| StoreError::Parse(e.to_string()))?;
        Ok(created.id)
    }

    async fn query_records(
        &self,
        collection: &str,
        filters: &[Filter],
    ) -> Result<Vec<Document>, StoreError> {
        let url = self.documents_url(collection)?;
        let params: Vec<(String, String)> = filters
            .iter()
            .map(|f| (f.field.clone(), f.query_value()))
            .collect();
        debug!("GET {} ({} filters)", url, params.len());

        let response = self
            .send(self.client.get(url).query(&params), collection, None)
            .await?;
        response
            .json()
            .await
            .map_err(|e| StoreError::Parse(e.to_string()))
    }

    async fn get_record(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Document>, StoreError> {
        let url = self.document_url(collection, id)?;
        debug!("GET {}", url);

        match self.send(self.client.get(url), collection, Some(id)).await {
            Ok(response) => response
                .json()
                .await
                .map(Some)
                .map_err(|e| StoreError::Parse(e.to_string())),
            Err(StoreError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn update_record(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> Result<(), StoreError> {
        let url = self.document_url(collection, id)?;
        debug!("PATCH {}", url);

        self.send(self.client.patch(url).json(&fields), collection, Some(id))
            .await?;
        Ok(())
    }

    fn now(&self) -> EpochMillis {
        self.clock.now()
    }
}

/// Builder for RestStore.
#[derive(Debug, Default)]
pub struct RestStoreBuilder {
    endpoint: Option<String>,
    token: Option<String>,
    timeout: Option<Duration>,
    clock: Option<Arc<dyn Clock>>,
}

impl RestStoreBuilder {
    /// Set the API base URL (e.g., "https://docs.example.com").
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set a bearer token sent with every request.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the request timeout (default: 10 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Use `clock` for timestamps instead of the system clock.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Build the store.
    pub fn build(self) -> Result<RestStore, StoreError> {
        let timeout = self.timeout.unwrap_or(Duration::from_secs(10));

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Connection(format!("failed to build HTTP client: {}", e)))?;

        let endpoint = self
            .endpoint
            .unwrap_or_else(|| "http://localhost:8080".to_string())
            .trim_end_matches('/')
            .to_string();
        let base = Url::parse(&endpoint)
            .map_err(|e| StoreError::Connection(format!("invalid endpoint {}: {}", endpoint, e)))?;
        if base.cannot_be_a_base() {
            return Err(StoreError::Connection(format!(
                "endpoint {} cannot hold a path",
                endpoint
            )));
        }

        Ok(RestStore {
            client,
            endpoint,
            base,
            token: self.token,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
        })
    }
}

#[derive(Debug, Deserialize)]
struct CreatedDocument {
    id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let store = RestStore::builder().build().unwrap();
        assert_eq!(store.endpoint(), "http://localhost:8080");
        assert!(store.token.is_none());
    }

    #[test]
    fn test_builder_custom() {
        let store = RestStore::builder()
            .endpoint("https://docs.example.com/")
            .token("secret")
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap();

        assert_eq!(store.endpoint(), "https://docs.example.com");
        assert_eq!(store.token.as_deref(), Some("secret"));
    }

    #[test]
    fn test_urls() {
        let store = RestStore::builder()
            .endpoint("http://db.local")
            .build()
            .unwrap();

        assert_eq!(
            store.documents_url("leaks").unwrap().as_str(),
            "http://db.local/v1/collections/leaks/documents"
        );
        assert_eq!(
            store.document_url("leaks", "a/b").unwrap().as_str(),
            "http://db.local/v1/collections/leaks/documents/a%2Fb"
        );
    }

    #[test]
    fn test_ids_are_escaped() {
        let store = RestStore::builder()
            .endpoint("http://db.local/api/")
            .build()
            .unwrap();

        assert_eq!(
            store.document_url("plant leaks", "rec 1?x#y%z").unwrap().as_str(),
            "http://db.local/api/v1/collections/plant%20leaks/documents/rec%201%3Fx%23y%25z"
        );
        assert_eq!(
            store.document_url("leaks", "simple").unwrap().as_str(),
            "http://db.local/api/v1/collections/leaks/documents/simple"
        );
    }

    #[test]
    fn test_invalid_endpoint() {
        assert!(RestStore::builder().endpoint("not a url").build().is_err());
        assert!(RestStore::builder().endpoint("mailto:ops@example.com").build().is_err());
    }

    #[test]
    fn test_clock_override() {
        let clock = Arc::new(crate::ManualClock::at_millis(77));
        let store = RestStore::builder().clock(clock).build().unwrap();
        assert_eq!(store.now().as_millis(), 77);
    }

    #[test]
    fn test_document_shape() {
        let json = r#"[{"id":"x1","fields":{"assetId":"A1"}},{"id":"x2"}]"#;
        let docs: Vec<Document> = serde_json::from_str(json).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].fields["assetId"], "A1");
        assert!(docs[1].fields.is_empty());
    }
}
