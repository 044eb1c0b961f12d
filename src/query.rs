//! Federated and per-collection query engines.
//!
//! The federated path builds one multi-collection request, applies
//! per-principal visibility filtering, and reshapes the engine's raw
//! hits into the unified result envelope. The per-collection path
//! searches a single content type with pagination, prefix matching, and
//! a caller-supplied sort. Result ordering within each bucket is
//! delegated entirely to the engine's relevance ranking; no secondary
//! sort is imposed here.
//!
//! Visibility rules:
//! - elevated principals search projects and discussions unfiltered and
//!   never receive the learning-content bucket (they browse that content
//!   through other means);
//! - identified non-elevated principals are restricted to documents
//!   whose access-control field contains their identifier, and get the
//!   extra learning-content bucket;
//! - unidentified principals search projects and discussions without a
//!   constructible filter and are excluded from learning content.

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::engine::{CollectionHits, MultiSearchRequest, SearchEngine, SearchRequest};
use crate::error::{Result, SearchError};
use crate::schema::ContentType;

/// Hard cap on accepted query length, in bytes.
pub const MAX_QUERY_LEN: usize = 512;

const PER_PAGE: u32 = 10;
const SORT_BY: &str = "_text_match:desc";
const ACL_FIELD: &str = "team_user_ids";

/// The acting identity for a query: an opaque identifier plus an
/// elevated-privilege flag. Elevated principals bypass access-control
/// filtering entirely.
#[derive(Debug, Clone, Default)]
pub struct Principal {
    pub id: Option<String>,
    pub elevated: bool,
}

impl Principal {
    /// Identified, non-elevated principal.
    pub fn member(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            elevated: false,
        }
    }

    /// Elevated (administrative) principal.
    pub fn admin(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            elevated: true,
        }
    }

    /// Principal with no known identity.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Build a principal from the identity attached to a request by the
    /// upstream auth layer.
    pub fn from_parts(id: Option<String>, role: Option<&str>) -> Self {
        let elevated = matches!(role, Some("admin") | Some("org:admin"));
        Self { id, elevated }
    }
}

/// Per-collection result buckets of one federated query. The
/// learning-content bucket exists only when that sub-query was
/// dispatched.
#[derive(Debug, Clone, Serialize)]
pub struct ResultBuckets {
    pub projects: Vec<Value>,
    pub discussions: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub learning_content: Option<Vec<Value>>,
}

/// Total hit counts per dispatched sub-query.
#[derive(Debug, Clone, Serialize)]
pub struct SearchMeta {
    pub projects_found: i64,
    pub discussions_found: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub learning_content_found: Option<i64>,
}

/// The unified result envelope returned to callers.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: ResultBuckets,
    pub meta: SearchMeta,
}

/// Validate a raw query string: trimmed, non-empty, bounded length.
fn validate_query(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(SearchError::InvalidQuery("query must not be empty".into()));
    }
    if trimmed.len() > MAX_QUERY_LEN {
        return Err(SearchError::InvalidQuery(format!(
            "query exceeds maximum length of {MAX_QUERY_LEN} bytes"
        )));
    }
    Ok(trimmed.to_string())
}

/// The access-control filter predicate for a principal. Empty means "no
/// filter": elevated principals see everything, and a principal with no
/// identifier has no constructible containment predicate.
fn visibility_filter(principal: &Principal) -> String {
    if principal.elevated {
        return String::new();
    }
    match &principal.id {
        Some(id) => format!("{ACL_FIELD}:{id}"),
        None => String::new(),
    }
}

fn sub_query(content_type: ContentType, query: &str, filter_by: String) -> SearchRequest {
    let (query_by, highlight) = match content_type {
        ContentType::Project => ("project_name,description", "project_name,description"),
        ContentType::Discussion => ("title,description", "title,description"),
        ContentType::LearningContent => ("title", "title"),
    };

    SearchRequest {
        collection: content_type.collection_name().to_string(),
        q: query.to_string(),
        query_by: query_by.to_string(),
        highlight_fields: highlight.to_string(),
        highlight_full_fields: highlight.to_string(),
        sort_by: SORT_BY.to_string(),
        per_page: PER_PAGE,
        page: None,
        prefix: None,
        filter_by,
    }
}

/// Build the fixed, ordered sub-query list for one federated request.
fn build_requests(query: &str, principal: &Principal) -> Vec<(ContentType, SearchRequest)> {
    let filter = visibility_filter(principal);

    let mut requests = vec![
        (
            ContentType::Project,
            sub_query(ContentType::Project, query, filter.clone()),
        ),
        (
            ContentType::Discussion,
            sub_query(ContentType::Discussion, query, filter),
        ),
    ];

    // Learning content only for identified, non-elevated principals
    if !principal.elevated && principal.id.is_some() {
        requests.push((
            ContentType::LearningContent,
            sub_query(ContentType::LearningContent, query, String::new()),
        ));
    }

    requests
}

/// Reshape raw hits into `{ ...document fields, type, highlights }`.
fn shape_hits(hits: &CollectionHits, content_type: ContentType) -> Vec<Value> {
    hits.hits
        .iter()
        .map(|hit| {
            let mut shaped = match &hit.document {
                Value::Object(map) => Value::Object(map.clone()),
                other => other.clone(),
            };
            if let Value::Object(map) = &mut shaped {
                map.insert(
                    "type".to_string(),
                    Value::String(content_type.result_tag().to_string()),
                );
                map.insert("highlights".to_string(), hit.highlight.clone());
            }
            shaped
        })
        .collect()
}

/// Execute one federated search for a principal.
///
/// Fails with [`SearchError::InvalidQuery`] before any network call when
/// the query is empty or oversized. The whole fan-out is a single round
/// trip; the engine returns one ordered result set per sub-query.
pub async fn global_search(
    engine: &dyn SearchEngine,
    raw_query: &str,
    principal: &Principal,
) -> Result<SearchResponse> {
    let query = validate_query(raw_query)?;
    let requests = build_requests(&query, principal);
    debug!(
        query = %query,
        sub_queries = requests.len(),
        elevated = principal.elevated,
        "dispatching federated search"
    );

    let request = MultiSearchRequest {
        searches: requests.iter().map(|(_, r)| r.clone()).collect(),
    };
    let response = engine.multi_search(&request).await?;

    if response.results.len() != requests.len() {
        return Err(SearchError::Engine(format!(
            "engine returned {} result sets for {} sub-queries",
            response.results.len(),
            requests.len()
        )));
    }

    let mut projects = Vec::new();
    let mut discussions = Vec::new();
    let mut learning_content = None;
    let mut projects_found = 0;
    let mut discussions_found = 0;
    let mut learning_content_found = None;

    for ((content_type, _), hits) in requests.iter().zip(&response.results) {
        let shaped = shape_hits(hits, *content_type);
        match content_type {
            ContentType::Project => {
                projects = shaped;
                projects_found = hits.found;
            }
            ContentType::Discussion => {
                discussions = shaped;
                discussions_found = hits.found;
            }
            ContentType::LearningContent => {
                learning_content = Some(shaped);
                learning_content_found = Some(hits.found);
            }
        }
    }

    Ok(SearchResponse {
        query,
        results: ResultBuckets {
            projects,
            discussions,
            learning_content,
        },
        meta: SearchMeta {
            projects_found,
            discussions_found,
            learning_content_found,
        },
    })
}

// ============ Per-collection search ============

/// Caller-tunable knobs of a single-collection search. Unset values fall
/// back to the defaults (`page` 1, `limit` 10, relevance sort).
#[derive(Debug, Clone, Default)]
pub struct CollectionParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    /// Verbatim engine sort expression, e.g. `title:asc`.
    pub sort: Option<String>,
    /// Learning content only: restrict to one category facet.
    pub category: Option<String>,
}

/// Total hit count and page position of one per-collection search.
#[derive(Debug, Clone, Serialize)]
pub struct PagedMeta {
    pub found: i64,
    pub page: u32,
    pub total_pages: i64,
}

/// Result envelope of one per-collection search.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionSearchResponse {
    pub query: String,
    pub results: Vec<Value>,
    pub meta: PagedMeta,
}

/// Build the engine request for one per-collection search.
///
/// Prefix matching is always on; visibility filtering follows the same
/// rules as the federated path, except that learning content filters on
/// the optional `category` facet instead of the access-control field.
fn build_collection_request(
    content_type: ContentType,
    query: &str,
    principal: &Principal,
    params: &CollectionParams,
) -> SearchRequest {
    let (query_by, highlight) = match content_type {
        ContentType::Project => ("project_name,description", "project_name,description"),
        ContentType::Discussion => ("title,description", "title,description"),
        ContentType::LearningContent => ("title,content", "title,content"),
    };

    let filter_by = match content_type {
        ContentType::LearningContent => params
            .category
            .as_ref()
            .map(|category| format!("category:{category}"))
            .unwrap_or_default(),
        _ => visibility_filter(principal),
    };

    SearchRequest {
        collection: content_type.collection_name().to_string(),
        q: query.to_string(),
        query_by: query_by.to_string(),
        highlight_fields: highlight.to_string(),
        highlight_full_fields: highlight.to_string(),
        sort_by: params.sort.clone().unwrap_or_else(|| SORT_BY.to_string()),
        per_page: params.limit.filter(|l| *l > 0).unwrap_or(PER_PAGE),
        page: Some(params.page.filter(|p| *p > 0).unwrap_or(1)),
        prefix: Some(true),
        filter_by,
    }
}

/// Search a single content type for a principal, with pagination.
///
/// Elevated principals asking for learning content get an empty page
/// without an engine call, mirroring their exclusion from that bucket on
/// the federated path.
pub async fn collection_search(
    engine: &dyn SearchEngine,
    content_type: ContentType,
    raw_query: &str,
    principal: &Principal,
    params: &CollectionParams,
) -> Result<CollectionSearchResponse> {
    let query = validate_query(raw_query)?;

    if content_type == ContentType::LearningContent && principal.elevated {
        return Ok(CollectionSearchResponse {
            query,
            results: Vec::new(),
            meta: PagedMeta {
                found: 0,
                page: 1,
                total_pages: 0,
            },
        });
    }

    let request = build_collection_request(content_type, &query, principal, params);
    let limit = i64::from(request.per_page);
    let page = request.page.unwrap_or(1);
    debug!(
        collection = %request.collection,
        page,
        limit,
        "dispatching collection search"
    );

    let hits = engine.search(&request).await?;
    let results = shape_hits(&hits, content_type);
    let total_pages = (hits.found + limit - 1) / limit;

    Ok(CollectionSearchResponse {
        query,
        results,
        meta: PagedMeta {
            found: hits.found,
            page,
            total_pages,
        },
    })
}
