//! Relational source-of-truth accessor.
//!
//! The relational store is owned by the wider application; this module
//! only reads the records and nested relations the mapper needs:
//! projects and discussions with their teams→members graph. The
//! [`SourceStore`] trait keeps the store substitutable in tests.
//!
//! Expected tables (managed elsewhere):
//!
//! | Table | Columns used |
//! |-------|--------------|
//! | `projects` | `id`, `project_name`, `description` |
//! | `discussions` | `id`, `title`, `project_id`, `description` |
//! | `teams` | `id`, `project_id` |
//! | `team_members` | `team_id`, `user_id` |
//! | `users` | `id`, `clerk_id` |

use anyhow::Result as AnyResult;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::str::FromStr;

use crate::config::DbConfig;
use crate::error::Result;

/// One team and the principal identifiers of its members.
///
/// Team-level nesting is preserved so that a member on two teams appears
/// twice when flattened; the index field is containment-only, so the
/// duplicate is harmless and matches the observed source behavior.
#[derive(Debug, Clone)]
pub struct TeamRecord {
    pub members: Vec<String>,
}

/// A project row with the nested relations needed for mapping.
#[derive(Debug, Clone)]
pub struct ProjectRecord {
    pub id: i64,
    pub project_name: String,
    /// Rich-text description; either a plain string or a structured
    /// object with a `content` sub-field, both normalized by the mapper.
    pub description: Option<serde_json::Value>,
    pub teams: Vec<TeamRecord>,
}

/// A discussion row with its parent project's teams.
#[derive(Debug, Clone)]
pub struct DiscussionRecord {
    pub id: i64,
    pub title: String,
    pub project_id: Option<i64>,
    pub description: Option<String>,
    /// Teams of the parent project; empty when the discussion has none.
    pub project_teams: Vec<TeamRecord>,
}

/// Read access to the relational source of truth.
#[async_trait]
pub trait SourceStore: Send + Sync {
    /// Fetch every project with its teams→members graph.
    async fn projects(&self) -> Result<Vec<ProjectRecord>>;

    /// Fetch one project by primary key; `None` when it no longer exists.
    async fn project(&self, id: i64) -> Result<Option<ProjectRecord>>;

    /// Fetch every discussion with its parent project's teams.
    async fn discussions(&self) -> Result<Vec<DiscussionRecord>>;

    /// Fetch one discussion by primary key; `None` when it no longer exists.
    async fn discussion(&self, id: i64) -> Result<Option<DiscussionRecord>>;

    /// Release the store connection. Top-level entry points call this on
    /// every exit path.
    async fn close(&self);
}

/// SQLite-backed [`SourceStore`] implementation.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open a pool against the configured database file.
    pub async fn connect(config: &DbConfig) -> AnyResult<Self> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", config.path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Wrap an existing pool (used by tests that seed their own schema).
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Fetch the teams of one project, each with its member identifiers.
    ///
    /// The join yields one row per (team, member) pair, so a member on
    /// two teams of the same project contributes two rows.
    async fn project_teams(&self, project_id: i64) -> Result<Vec<TeamRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT t.id AS team_id, u.clerk_id
            FROM teams t
            JOIN team_members tm ON tm.team_id = t.id
            JOIN users u ON u.id = tm.user_id
            WHERE t.project_id = ?
            ORDER BY t.id, tm.user_id
            "#,
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        let mut teams: Vec<(i64, TeamRecord)> = Vec::new();
        for row in rows {
            let team_id: i64 = row.get("team_id");
            let clerk_id: String = row.get("clerk_id");
            match teams.last_mut() {
                Some((id, team)) if *id == team_id => team.members.push(clerk_id),
                _ => teams.push((
                    team_id,
                    TeamRecord {
                        members: vec![clerk_id],
                    },
                )),
            }
        }

        Ok(teams.into_iter().map(|(_, team)| team).collect())
    }

    async fn project_from_row(&self, row: &sqlx::sqlite::SqliteRow) -> Result<ProjectRecord> {
        let id: i64 = row.get("id");
        let raw_description: Option<String> = row.get("description");
        Ok(ProjectRecord {
            id,
            project_name: row.get("project_name"),
            description: parse_description(raw_description),
            teams: self.project_teams(id).await?,
        })
    }

    async fn discussion_from_row(&self, row: &sqlx::sqlite::SqliteRow) -> Result<DiscussionRecord> {
        let project_id: Option<i64> = row.get("project_id");
        let project_teams = match project_id {
            Some(pid) => self.project_teams(pid).await?,
            None => Vec::new(),
        };
        Ok(DiscussionRecord {
            id: row.get("id"),
            title: row.get("title"),
            project_id,
            description: row.get("description"),
            project_teams,
        })
    }
}

/// Normalize a raw description column into the mapper's input shape.
///
/// The column may hold a JSON object (structured rich text) or plain
/// text. Anything that does not parse as a JSON object is treated as the
/// plain-string form.
fn parse_description(raw: Option<String>) -> Option<serde_json::Value> {
    let raw = raw?;
    match serde_json::from_str::<serde_json::Value>(&raw) {
        Ok(value @ serde_json::Value::Object(_)) => Some(value),
        _ => Some(serde_json::Value::String(raw)),
    }
}

#[async_trait]
impl SourceStore for SqliteStore {
    async fn projects(&self) -> Result<Vec<ProjectRecord>> {
        let rows = sqlx::query("SELECT id, project_name, description FROM projects ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            records.push(self.project_from_row(row).await?);
        }
        Ok(records)
    }

    async fn project(&self, id: i64) -> Result<Option<ProjectRecord>> {
        let row = sqlx::query("SELECT id, project_name, description FROM projects WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(self.project_from_row(&row).await?)),
            None => Ok(None),
        }
    }

    async fn discussions(&self) -> Result<Vec<DiscussionRecord>> {
        let rows =
            sqlx::query("SELECT id, title, project_id, description FROM discussions ORDER BY id")
                .fetch_all(&self.pool)
                .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            records.push(self.discussion_from_row(row).await?);
        }
        Ok(records)
    }

    async fn discussion(&self, id: i64) -> Result<Option<DiscussionRecord>> {
        let row = sqlx::query("SELECT id, title, project_id, description FROM discussions WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(self.discussion_from_row(&row).await?)),
            None => Ok(None),
        }
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_description_none() {
        assert!(parse_description(None).is_none());
    }

    #[test]
    fn test_parse_description_plain_string() {
        let parsed = parse_description(Some("<p>plain</p>".to_string())).unwrap();
        assert_eq!(parsed, serde_json::Value::String("<p>plain</p>".to_string()));
    }

    #[test]
    fn test_parse_description_structured() {
        let parsed = parse_description(Some(r#"{"content":"<p>x</p>"}"#.to_string())).unwrap();
        assert_eq!(parsed["content"], "<p>x</p>");
    }

    #[test]
    fn test_parse_description_non_object_json_stays_raw() {
        // A bare JSON number or array is not the structured form
        let parsed = parse_description(Some("[1,2]".to_string())).unwrap();
        assert_eq!(parsed, serde_json::Value::String("[1,2]".to_string()));
    }
}
