//! SqliteStore tests against a seeded on-disk database.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tempfile::TempDir;

use team_search::mapper::{flatten_member_ids, map_project};
use team_search::store::{SourceStore, SqliteStore};

async fn seeded_pool(dir: &TempDir) -> SqlitePool {
    let path = dir.path().join("source.db");
    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))
        .unwrap()
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(2)
        .connect_with(options)
        .await
        .unwrap();

    sqlx::query(
        r#"
        CREATE TABLE projects (
            id INTEGER PRIMARY KEY,
            project_name TEXT NOT NULL,
            description TEXT
        );
        "#,
    )
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query(
        r#"
        CREATE TABLE discussions (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            project_id INTEGER,
            description TEXT
        );
        "#,
    )
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query("CREATE TABLE teams (id INTEGER PRIMARY KEY, project_id INTEGER NOT NULL)")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("CREATE TABLE team_members (team_id INTEGER NOT NULL, user_id INTEGER NOT NULL)")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("CREATE TABLE users (id INTEGER PRIMARY KEY, clerk_id TEXT NOT NULL)")
        .execute(&pool)
        .await
        .unwrap();

    pool
}

async fn seed_users(pool: &SqlitePool, users: &[(i64, &str)]) {
    for (id, clerk_id) in users {
        sqlx::query("INSERT INTO users (id, clerk_id) VALUES (?, ?)")
            .bind(id)
            .bind(clerk_id)
            .execute(pool)
            .await
            .unwrap();
    }
}

async fn seed_team(pool: &SqlitePool, team_id: i64, project_id: i64, user_ids: &[i64]) {
    sqlx::query("INSERT INTO teams (id, project_id) VALUES (?, ?)")
        .bind(team_id)
        .bind(project_id)
        .execute(pool)
        .await
        .unwrap();
    for user_id in user_ids {
        sqlx::query("INSERT INTO team_members (team_id, user_id) VALUES (?, ?)")
            .bind(team_id)
            .bind(user_id)
            .execute(pool)
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn test_project_with_nested_teams() {
    let dir = TempDir::new().unwrap();
    let pool = seeded_pool(&dir).await;

    sqlx::query("INSERT INTO projects (id, project_name, description) VALUES (1, 'Atlas', '<p>mapping tool</p>')")
        .execute(&pool)
        .await
        .unwrap();
    seed_users(&pool, &[(1, "u1"), (2, "u2")]).await;
    seed_team(&pool, 10, 1, &[1, 2]).await;
    seed_team(&pool, 11, 1, &[2]).await;

    let store = SqliteStore::from_pool(pool);
    let records = store.projects().await.unwrap();
    assert_eq!(records.len(), 1);

    let record = &records[0];
    assert_eq!(record.project_name, "Atlas");
    assert_eq!(record.teams.len(), 2);
    assert_eq!(record.teams[0].members, ["u1", "u2"]);
    assert_eq!(record.teams[1].members, ["u2"]);

    // Cross-team duplicates survive flattening
    assert_eq!(flatten_member_ids(&record.teams), ["u1", "u2", "u2"]);
}

#[tokio::test]
async fn test_project_by_id_and_missing() {
    let dir = TempDir::new().unwrap();
    let pool = seeded_pool(&dir).await;

    sqlx::query("INSERT INTO projects (id, project_name) VALUES (7, 'Borealis')")
        .execute(&pool)
        .await
        .unwrap();

    let store = SqliteStore::from_pool(pool);
    let record = store.project(7).await.unwrap().unwrap();
    assert_eq!(record.project_name, "Borealis");
    assert!(record.description.is_none());
    assert!(record.teams.is_empty());

    assert!(store.project(99).await.unwrap().is_none());
}

#[tokio::test]
async fn test_structured_description_round_trip() {
    let dir = TempDir::new().unwrap();
    let pool = seeded_pool(&dir).await;

    sqlx::query(
        r#"INSERT INTO projects (id, project_name, description)
           VALUES (1, 'Atlas', '{"content":"<p>mapping tool</p>"}')"#,
    )
    .execute(&pool)
    .await
    .unwrap();

    let store = SqliteStore::from_pool(pool);
    let record = store.project(1).await.unwrap().unwrap();
    assert_eq!(map_project(&record).description, "mapping tool");
}

#[tokio::test]
async fn test_discussion_inherits_parent_project_teams() {
    let dir = TempDir::new().unwrap();
    let pool = seeded_pool(&dir).await;

    sqlx::query("INSERT INTO projects (id, project_name) VALUES (1, 'Atlas')")
        .execute(&pool)
        .await
        .unwrap();
    seed_users(&pool, &[(1, "u1")]).await;
    seed_team(&pool, 10, 1, &[1]).await;
    sqlx::query(
        "INSERT INTO discussions (id, title, project_id, description)
         VALUES (5, 'Launch plan', 1, '<b>notes</b>')",
    )
    .execute(&pool)
    .await
    .unwrap();

    let store = SqliteStore::from_pool(pool);
    let record = store.discussion(5).await.unwrap().unwrap();
    assert_eq!(record.title, "Launch plan");
    assert_eq!(record.project_id, Some(1));
    assert_eq!(record.project_teams.len(), 1);
    assert_eq!(record.project_teams[0].members, ["u1"]);
}

#[tokio::test]
async fn test_orphan_discussion_has_no_teams() {
    let dir = TempDir::new().unwrap();
    let pool = seeded_pool(&dir).await;

    sqlx::query("INSERT INTO discussions (id, title) VALUES (3, 'General chat')")
        .execute(&pool)
        .await
        .unwrap();

    let store = SqliteStore::from_pool(pool);
    let records = store.discussions().await.unwrap();
    assert_eq!(records.len(), 1);
    assert!(records[0].project_id.is_none());
    assert!(records[0].project_teams.is_empty());
}
