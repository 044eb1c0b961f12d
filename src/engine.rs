//! Search engine client: capability trait, wire types, and the HTTP
//! implementation speaking the Typesense protocol.
//!
//! The engine is a remote service; this module treats it strictly as a
//! schema/document/query capability. Storage internals (replication,
//! persistence, ranking) belong to the engine and are not modeled here.
//!
//! All write operations use insert-or-replace semantics keyed by the
//! document `id`, so any index operation is safe to repeat.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::config::EngineConfig;
use crate::error::{Result, SearchError};
use crate::schema::CollectionSchema;

/// One per-collection sub-query of a federated search request.
#[derive(Debug, Clone, Serialize)]
pub struct SearchRequest {
    pub collection: String,
    pub q: String,
    pub query_by: String,
    pub highlight_fields: String,
    pub highlight_full_fields: String,
    pub sort_by: String,
    pub per_page: u32,
    /// 1-based result page; engine default when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Prefix matching on the last query token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<bool>,
    /// Exact-match filter predicate; empty means "no filter" and is
    /// omitted from the wire request.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub filter_by: String,
}

/// A federated search request: ordered list of sub-queries answered in
/// one round trip.
#[derive(Debug, Clone, Serialize)]
pub struct MultiSearchRequest {
    pub searches: Vec<SearchRequest>,
}

/// One raw hit from the engine.
#[derive(Debug, Clone, Deserialize)]
pub struct Hit {
    pub document: Value,
    #[serde(default)]
    pub highlight: Value,
}

/// Ordered result set for one sub-query.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CollectionHits {
    #[serde(default)]
    pub found: i64,
    #[serde(default)]
    pub hits: Vec<Hit>,
}

/// Engine response to a federated request: one result set per
/// sub-query, in submission order.
#[derive(Debug, Clone, Deserialize)]
pub struct MultiSearchResponse {
    pub results: Vec<CollectionHits>,
}

/// One document the engine rejected during a bulk import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportFailure {
    /// Zero-based position of the document in the submitted batch.
    pub index: usize,
    pub reason: String,
}

/// Outcome of a bulk import. Partial failure is data, not an exception:
/// the writer decides whether any rejected document fails the operation.
#[derive(Debug, Clone)]
pub enum ImportReport {
    Success { count: usize },
    Failed { failures: Vec<ImportFailure> },
}

/// Remote search engine capability.
///
/// Implementations must be `Send + Sync`; handles are constructed once
/// and passed by reference into every component that needs them, which
/// keeps fakes substitutable in tests.
#[async_trait]
pub trait SearchEngine: Send + Sync {
    /// Create a collection from a schema descriptor.
    async fn create_collection(&self, schema: &CollectionSchema) -> Result<()>;

    /// Delete a collection. A collection that does not exist is a no-op,
    /// not an error.
    async fn drop_collection(&self, name: &str) -> Result<()>;

    /// Bulk insert-or-replace documents into a collection.
    async fn import_documents(&self, collection: &str, documents: Vec<Value>)
        -> Result<ImportReport>;

    /// Insert-or-replace a single document keyed by its `id`.
    async fn upsert_document(&self, collection: &str, document: Value) -> Result<()>;

    /// Search one collection.
    async fn search(&self, request: &SearchRequest) -> Result<CollectionHits>;

    /// Execute a federated request in one round trip.
    async fn multi_search(&self, request: &MultiSearchRequest) -> Result<MultiSearchResponse>;
}

const API_KEY_HEADER: &str = "x-typesense-api-key";

/// HTTP client for a Typesense-compatible search engine.
pub struct HttpSearchEngine {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpSearchEngine {
    /// Build a client from validated connection parameters. The
    /// connection timeout is fixed configuration, not a per-call knob.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connection_timeout_secs))
            .build()
            .map_err(|e| SearchError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: format!("{}://{}:{}", config.protocol, config.host, config.port),
            api_key: config.api_key.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Map a non-success response into an engine error carrying the body.
    async fn fail(operation: &str, response: reqwest::Response) -> SearchError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        SearchError::Engine(format!("{operation} failed with {status}: {body}"))
    }
}

#[async_trait]
impl SearchEngine for HttpSearchEngine {
    async fn create_collection(&self, schema: &CollectionSchema) -> Result<()> {
        let response = self
            .client
            .post(self.url("/collections"))
            .header(API_KEY_HEADER, &self.api_key)
            .json(schema)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::fail("create collection", response).await);
        }
        debug!(collection = %schema.name, "collection created");
        Ok(())
    }

    async fn drop_collection(&self, name: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.url(&format!("/collections/{name}")))
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;

        // A missing collection is fine; rebuilds always drop first
        if response.status() == StatusCode::NOT_FOUND {
            debug!(collection = name, "collection did not exist, nothing to drop");
            return Ok(());
        }
        if !response.status().is_success() {
            return Err(Self::fail("drop collection", response).await);
        }
        Ok(())
    }

    async fn import_documents(
        &self,
        collection: &str,
        documents: Vec<Value>,
    ) -> Result<ImportReport> {
        let count = documents.len();
        let body = documents
            .iter()
            .map(serde_json::to_string)
            .collect::<std::result::Result<Vec<_>, _>>()?
            .join("\n");

        let response = self
            .client
            .post(self.url(&format!("/collections/{collection}/documents/import")))
            .query(&[("action", "upsert")])
            .header(API_KEY_HEADER, &self.api_key)
            .body(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::fail("bulk import", response).await);
        }

        let body = response.text().await?;
        Ok(parse_import_report(&body, count))
    }

    async fn upsert_document(&self, collection: &str, document: Value) -> Result<()> {
        let response = self
            .client
            .post(self.url(&format!("/collections/{collection}/documents")))
            .query(&[("action", "upsert")])
            .header(API_KEY_HEADER, &self.api_key)
            .json(&document)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::fail("upsert document", response).await);
        }
        Ok(())
    }

    async fn search(&self, request: &SearchRequest) -> Result<CollectionHits> {
        let mut params: Vec<(&str, String)> = vec![
            ("q", request.q.clone()),
            ("query_by", request.query_by.clone()),
            ("highlight_fields", request.highlight_fields.clone()),
            ("highlight_full_fields", request.highlight_full_fields.clone()),
            ("sort_by", request.sort_by.clone()),
            ("per_page", request.per_page.to_string()),
        ];
        if let Some(page) = request.page {
            params.push(("page", page.to_string()));
        }
        if let Some(prefix) = request.prefix {
            params.push(("prefix", prefix.to_string()));
        }
        if !request.filter_by.is_empty() {
            params.push(("filter_by", request.filter_by.clone()));
        }

        let response = self
            .client
            .get(self.url(&format!(
                "/collections/{}/documents/search",
                request.collection
            )))
            .query(&params)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::fail("search", response).await);
        }

        Ok(response.json::<CollectionHits>().await?)
    }

    async fn multi_search(&self, request: &MultiSearchRequest) -> Result<MultiSearchResponse> {
        let response = self
            .client
            .post(self.url("/multi_search"))
            .header(API_KEY_HEADER, &self.api_key)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::fail("multi search", response).await);
        }

        Ok(response.json::<MultiSearchResponse>().await?)
    }
}

/// Per-line status in a bulk import response body (JSONL).
#[derive(Debug, Deserialize)]
struct ImportLine {
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Parse the engine's JSONL import response into an [`ImportReport`].
///
/// Each line reports one submitted document, in submission order. A line
/// that cannot be parsed counts as a failure for that position, and so
/// does any submitted document the response never reported on.
fn parse_import_report(body: &str, submitted: usize) -> ImportReport {
    let mut failures = Vec::new();
    let mut reported = 0;

    for (index, line) in body.lines().filter(|l| !l.trim().is_empty()).enumerate() {
        reported += 1;
        match serde_json::from_str::<ImportLine>(line) {
            Ok(status) if status.success => {}
            Ok(status) => failures.push(ImportFailure {
                index,
                reason: status.error.unwrap_or_else(|| "unknown error".to_string()),
            }),
            Err(e) => failures.push(ImportFailure {
                index,
                reason: format!("unparseable import status: {e}"),
            }),
        }
    }

    for index in reported..submitted {
        failures.push(ImportFailure {
            index,
            reason: "no import status returned".to_string(),
        });
    }

    if failures.is_empty() {
        ImportReport::Success { count: submitted }
    } else {
        ImportReport::Failed { failures }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(filter_by: &str) -> SearchRequest {
        SearchRequest {
            collection: "projects".to_string(),
            q: "atlas".to_string(),
            query_by: "project_name,description".to_string(),
            highlight_fields: "project_name,description".to_string(),
            highlight_full_fields: "project_name,description".to_string(),
            sort_by: "_text_match:desc".to_string(),
            per_page: 10,
            page: None,
            prefix: None,
            filter_by: filter_by.to_string(),
        }
    }

    #[test]
    fn test_filter_by_omitted_when_empty() {
        let json = serde_json::to_value(request("")).unwrap();
        assert!(json.get("filter_by").is_none());
        assert_eq!(json["sort_by"], "_text_match:desc");
    }

    #[test]
    fn test_filter_by_present_when_set() {
        let json = serde_json::to_value(request("team_user_ids:u1")).unwrap();
        assert_eq!(json["filter_by"], "team_user_ids:u1");
    }

    #[test]
    fn test_page_and_prefix_omitted_when_unset() {
        let json = serde_json::to_value(request("")).unwrap();
        assert!(json.get("page").is_none());
        assert!(json.get("prefix").is_none());
    }

    #[test]
    fn test_page_and_prefix_present_when_set() {
        let mut req = request("");
        req.page = Some(3);
        req.prefix = Some(true);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["page"], 3);
        assert_eq!(json["prefix"], true);
    }

    #[test]
    fn test_import_report_all_success() {
        let body = "{\"success\":true}\n{\"success\":true}\n{\"success\":true}";
        match parse_import_report(body, 3) {
            ImportReport::Success { count } => assert_eq!(count, 3),
            ImportReport::Failed { failures } => panic!("unexpected failures: {failures:?}"),
        }
    }

    #[test]
    fn test_import_report_partial_failure() {
        let body =
            "{\"success\":true}\n{\"success\":false,\"error\":\"bad field\"}\n{\"success\":true}";
        match parse_import_report(body, 3) {
            ImportReport::Success { .. } => panic!("expected failure report"),
            ImportReport::Failed { failures } => {
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].index, 1);
                assert_eq!(failures[0].reason, "bad field");
            }
        }
    }

    #[test]
    fn test_import_report_short_response_counts_missing_as_failed() {
        // The engine reported on only one of two submitted documents
        let body = "{\"success\":true}";
        match parse_import_report(body, 2) {
            ImportReport::Success { .. } => panic!("expected failure report"),
            ImportReport::Failed { failures } => {
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].index, 1);
                assert_eq!(failures[0].reason, "no import status returned");
            }
        }
    }

    #[test]
    fn test_import_report_unparseable_line() {
        let body = "{\"success\":true}\nnot json";
        match parse_import_report(body, 2) {
            ImportReport::Success { .. } => panic!("expected failure report"),
            ImportReport::Failed { failures } => {
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].index, 1);
            }
        }
    }

    #[test]
    fn test_multi_search_response_parsing() {
        let raw = serde_json::json!({
            "results": [
                {
                    "found": 1,
                    "hits": [
                        {
                            "document": { "id": "1", "project_name": "Atlas" },
                            "highlight": { "project_name": { "snippet": "<mark>Atlas</mark>" } }
                        }
                    ]
                },
                { "found": 0, "hits": [] }
            ]
        });

        let response: MultiSearchResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(response.results.len(), 2);
        assert_eq!(response.results[0].found, 1);
        assert_eq!(response.results[0].hits[0].document["id"], "1");
        assert_eq!(response.results[1].hits.len(), 0);
    }

    #[test]
    fn test_http_engine_requires_connection_params() {
        let config = EngineConfig {
            host: String::new(),
            port: 8108,
            protocol: "http".to_string(),
            api_key: "k".to_string(),
            connection_timeout_secs: 2,
        };
        assert!(matches!(
            HttpSearchEngine::from_config(&config),
            Err(SearchError::Configuration(_))
        ));
    }

    #[test]
    fn test_http_engine_base_url() {
        let config = EngineConfig {
            host: "search.internal".to_string(),
            port: 8108,
            protocol: "https".to_string(),
            api_key: "k".to_string(),
            connection_timeout_secs: 2,
        };
        let engine = HttpSearchEngine::from_config(&config).unwrap();
        assert_eq!(
            engine.url("/collections"),
            "https://search.internal:8108/collections"
        );
    }
}
