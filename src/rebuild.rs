//! Full rebuild orchestration.
//!
//! A rebuild processes content types sequentially, never concurrently:
//! this bounds peak load on the engine and keeps per-type reporting
//! deterministic. Schema changes are not migrated in place; each type's
//! collection is dropped and recreated wholesale, accepting a window of
//! index unavailability for that collection.
//!
//! A failure in one type's pipeline is recorded and the orchestrator
//! moves on to the next type; the report lists every outcome.

use serde_json::Value;
use std::path::Path;
use tracing::{error, info};

use crate::config::Config;
use crate::content::load_learning_document;
use crate::engine::{HttpSearchEngine, SearchEngine};
use crate::error::{Result, SearchError};
use crate::mapper::{map_discussions, map_learning_sections, map_projects};
use crate::schema::{collection_schema, ContentType};
use crate::store::{SourceStore, SqliteStore};
use crate::writer::bulk_upsert;

/// Outcome of one content type's rebuild pipeline.
#[derive(Debug)]
pub struct TypeOutcome {
    pub content_type: ContentType,
    pub indexed: usize,
    pub error: Option<SearchError>,
}

impl TypeOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Per-type outcomes of a full rebuild, in processing order.
#[derive(Debug)]
pub struct RebuildReport {
    pub outcomes: Vec<TypeOutcome>,
}

impl RebuildReport {
    pub fn all_ok(&self) -> bool {
        self.outcomes.iter().all(TypeOutcome::is_ok)
    }
}

/// Rebuild every content type: recreate the collection, fetch all
/// source records, map, and bulk upsert. Failures are isolated per type.
pub async fn rebuild_all(
    engine: &dyn SearchEngine,
    store: &dyn SourceStore,
    learning_content_path: &Path,
) -> RebuildReport {
    let mut outcomes = Vec::with_capacity(ContentType::ALL.len());

    for content_type in ContentType::ALL {
        match rebuild_one(engine, store, learning_content_path, content_type).await {
            Ok(indexed) => {
                info!(%content_type, indexed, "rebuild complete");
                outcomes.push(TypeOutcome {
                    content_type,
                    indexed,
                    error: None,
                });
            }
            Err(err) => {
                error!(%content_type, %err, "rebuild failed");
                outcomes.push(TypeOutcome {
                    content_type,
                    indexed: 0,
                    error: Some(err),
                });
            }
        }
    }

    RebuildReport { outcomes }
}

/// One content type's pipeline: drop (not-found tolerated) → create →
/// fetch → map → bulk upsert.
async fn rebuild_one(
    engine: &dyn SearchEngine,
    store: &dyn SourceStore,
    learning_content_path: &Path,
    content_type: ContentType,
) -> Result<usize> {
    let schema = collection_schema(content_type);

    engine.drop_collection(&schema.name).await?;
    engine
        .create_collection(&schema)
        .await
        .map_err(|e| SearchError::Schema {
            collection: schema.name.clone(),
            message: e.to_string(),
        })?;

    let documents = collect_documents(store, learning_content_path, content_type).await?;
    bulk_upsert(engine, &schema.name, documents).await
}

/// Fetch and map every source record for one content type.
async fn collect_documents(
    store: &dyn SourceStore,
    learning_content_path: &Path,
    content_type: ContentType,
) -> Result<Vec<Value>> {
    let documents = match content_type {
        ContentType::Project => to_values(&map_projects(&store.projects().await?))?,
        ContentType::Discussion => to_values(&map_discussions(&store.discussions().await?))?,
        ContentType::LearningContent => {
            let document = load_learning_document(learning_content_path)?;
            to_values(&map_learning_sections(&document))?
        }
    };
    Ok(documents)
}

fn to_values<T: serde::Serialize>(docs: &[T]) -> Result<Vec<Value>> {
    docs.iter()
        .map(|doc| serde_json::to_value(doc).map_err(Into::into))
        .collect()
}

/// CLI entry point: run a full rebuild against the configured engine and
/// store. The store connection is released on every exit path; the
/// process exits nonzero when any content type failed.
pub async fn run_rebuild(config: &Config) -> anyhow::Result<()> {
    let engine = HttpSearchEngine::from_config(&config.engine)?;
    let store = SqliteStore::connect(&config.db).await?;

    let report = rebuild_all(&engine, &store, &config.content.learning_content_path).await;
    store.close().await;

    for outcome in &report.outcomes {
        match &outcome.error {
            None => println!("{}: ok ({} documents)", outcome.content_type, outcome.indexed),
            Some(err) => println!("{}: FAILED ({err})", outcome.content_type),
        }
    }

    if report.all_ok() {
        Ok(())
    } else {
        anyhow::bail!("rebuild completed with failures")
    }
}
