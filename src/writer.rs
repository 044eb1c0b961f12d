//! Index writes: bulk imports, single-document upserts, and the
//! change-notification reindex entry points.
//!
//! All writes are insert-or-replace keyed by document `id`, so repeating
//! any reindex is safe. Single-record reindexes always re-fetch the
//! record from the source of truth so the index reflects the latest
//! committed state at write time, never a caller-supplied stale copy.

use serde_json::Value;
use tracing::{info, warn};

use crate::config::Config;
use crate::engine::{HttpSearchEngine, ImportReport, SearchEngine};
use crate::error::{Result, SearchError};
use crate::mapper::{map_discussion, map_project};
use crate::schema::ContentType;
use crate::store::{SourceStore, SqliteStore};

/// Bulk insert-or-replace documents into a collection.
///
/// An empty batch is a logged no-op reporting zero written. Any rejected
/// document fails the whole operation; the error carries the per-row
/// detail the engine reported.
pub async fn bulk_upsert(
    engine: &dyn SearchEngine,
    collection: &str,
    documents: Vec<Value>,
) -> Result<usize> {
    if documents.is_empty() {
        info!(collection, "no documents to index");
        return Ok(0);
    }

    let total = documents.len();
    match engine.import_documents(collection, documents).await? {
        ImportReport::Success { count } => {
            info!(collection, count, "bulk upsert complete");
            Ok(count)
        }
        ImportReport::Failed { failures } => {
            warn!(
                collection,
                failed = failures.len(),
                total,
                "bulk upsert rejected documents"
            );
            Err(SearchError::Write {
                collection: collection.to_string(),
                failed: failures.len(),
                total,
                failures,
            })
        }
    }
}

/// Insert-or-replace a single document keyed by its `id`.
pub async fn upsert_one(engine: &dyn SearchEngine, collection: &str, document: Value) -> Result<()> {
    engine.upsert_document(collection, document).await
}

/// Refresh one project's index document after a source-of-truth change.
///
/// A project that no longer exists is benign: it may have been deleted
/// between notification and processing, so this logs and returns `Ok`.
pub async fn update_project_index(
    engine: &dyn SearchEngine,
    store: &dyn SourceStore,
    project_id: i64,
) -> Result<()> {
    let Some(record) = store.project(project_id).await? else {
        info!(project_id, "project not found, nothing to reindex");
        return Ok(());
    };

    let document = serde_json::to_value(map_project(&record))?;
    upsert_one(engine, ContentType::Project.collection_name(), document).await?;
    info!(project_id, "project index updated");
    Ok(())
}

/// Refresh one discussion's index document after a source-of-truth change.
pub async fn update_discussion_index(
    engine: &dyn SearchEngine,
    store: &dyn SourceStore,
    discussion_id: i64,
) -> Result<()> {
    let Some(record) = store.discussion(discussion_id).await? else {
        info!(discussion_id, "discussion not found, nothing to reindex");
        return Ok(());
    };

    let document = serde_json::to_value(map_discussion(&record))?;
    upsert_one(engine, ContentType::Discussion.collection_name(), document).await?;
    info!(discussion_id, "discussion index updated");
    Ok(())
}

/// CLI entry point: reindex one project. Releases the store connection
/// on every exit path.
pub async fn run_reindex_project(config: &Config, project_id: i64) -> anyhow::Result<()> {
    let engine = HttpSearchEngine::from_config(&config.engine)?;
    let store = SqliteStore::connect(&config.db).await?;

    let result = update_project_index(&engine, &store, project_id).await;
    store.close().await;

    result?;
    Ok(())
}

/// CLI entry point: reindex one discussion. Releases the store
/// connection on every exit path.
pub async fn run_reindex_discussion(config: &Config, discussion_id: i64) -> anyhow::Result<()> {
    let engine = HttpSearchEngine::from_config(&config.engine)?;
    let store = SqliteStore::connect(&config.db).await?;

    let result = update_discussion_index(&engine, &store, discussion_id).await;
    store.close().await;

    result?;
    Ok(())
}
