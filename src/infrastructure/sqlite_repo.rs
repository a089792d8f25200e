use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use sqlx::{sqlite::{SqlitePoolOptions, SqliteRow}, Pool, Row, Sqlite};

use crate::domain::{
    repository::TodoRepository,
    todo::{format_due, StoredTodo, Todo, TodoId, TodoStatus},
};

#[derive(Clone)]
pub struct SqliteTodoRepository {
    pool: Arc<Pool<Sqlite>>,
}

impl SqliteTodoRepository {
    pub async fn connect(database_url: &str) -> Result<Self> {
        // Every connection to `sqlite::memory:` is its own database, so keep exactly one alive.
        let options = if database_url.starts_with("sqlite::memory:") {
            SqlitePoolOptions::new().max_connections(1).idle_timeout(None::<Duration>).max_lifetime(None::<Duration>)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = options
            .connect(database_url)
            .await
            .with_context(|| format!("connecting to {database_url}"))?;
        Ok(Self { pool: Arc::new(pool) })
    }
}

#[async_trait]
impl TodoRepository for SqliteTodoRepository {
    async fn init(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS todos (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL,
                text TEXT NOT NULL,
                due_at TEXT,
                status TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
        )
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<StoredTodo>> {
        let rows = sqlx::query("SELECT seq, id, text, due_at, status, created_at FROM todos ORDER BY seq")
            .fetch_all(&*self.pool)
            .await?;
        rows.into_iter().map(row_to_stored).collect()
    }

    async fn create(&self, todo: Todo) -> Result<StoredTodo> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO todos (id, text, due_at, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&todo.id.0)
        .bind(&todo.text)
        .bind(todo.when.map(format_due))
        .bind(todo.status.map(TodoStatus::as_str).unwrap_or(""))
        .bind(now.to_rfc3339())
        .execute(&*self.pool)
        .await?;
        Ok(StoredTodo::new(todo, meta(result.last_insert_rowid(), now)))
    }
}

fn meta(seq: i64, created_at: DateTime<Utc>) -> Map<String, Value> {
    let mut meta = Map::new();
    meta.insert("seq".into(), json!(seq));
    meta.insert("created".into(), json!(created_at.timestamp_millis()));
    meta
}

fn row_to_stored(row: SqliteRow) -> Result<StoredTodo> {
    let seq: i64 = row.try_get("seq")?;
    let id: String = row.try_get("id")?;
    let text: String = row.try_get("text")?;
    let due_at: Option<String> = row.try_get("due_at")?;
    let status_str: String = row.try_get("status")?;
    let created_at_str: String = row.try_get("created_at")?;

    let when = due_at.as_deref().map(parse_timestamp).transpose()?;
    let status = match status_str.as_str() {
        "" => None,
        s => Some(s.parse::<TodoStatus>().map_err(|e| anyhow!("todo {id} has unknown status {s:?}: {e}"))?),
    };
    let created_at = parse_timestamp(&created_at_str)?;

    let todo = Todo { text, when, status, id: TodoId(id) };
    Ok(StoredTodo::new(todo, meta(seq, created_at)))
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|at| at.with_timezone(&Utc))
        .with_context(|| format!("bad timestamp {s:?} in todos table"))
}

/// Makes sure a file-backed SQLite URL points at an existing file.
pub fn prepare_sqlite_file(database_url: &str) -> Result<()> {
    if database_url.starts_with("sqlite::memory:") { return Ok(()); }
    if let Some(path) = database_url.strip_prefix("sqlite://") {
        // On Windows, absolute paths may look like /C:/path; strip the leading slash
        let path = if cfg!(windows) && path.len() >= 3 && path.as_bytes()[0] == b'/' && path.as_bytes()[2] == b':' {
            &path[1..]
        } else {
            path
        };
        use std::{fs, fs::OpenOptions, path::Path};
        let p = Path::new(path);
        if let Some(parent) = p.parent() { if !parent.as_os_str().is_empty() { fs::create_dir_all(parent)?; } }
        if !p.exists() {
            OpenOptions::new().create(true).append(true).open(p)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    async fn repo() -> SqliteTodoRepository {
        let repo = SqliteTodoRepository::connect("sqlite::memory:").await.unwrap();
        repo.init().await.unwrap();
        repo
    }

    fn todo(text: &str, id: &str) -> Todo {
        Todo {
            text: text.into(),
            when: Some(Utc.with_ymd_and_hms(2021, 3, 22, 0, 0, 0).unwrap()),
            status: Some(TodoStatus::Late),
            id: TodoId::from(id),
        }
    }

    #[tokio::test]
    async fn create_then_list_preserves_fields_and_order() {
        let repo = repo().await;
        let first = repo.create(todo("plan trip", "a")).await.unwrap();
        repo.create(todo("pack bags", "b")).await.unwrap();

        assert_eq!(first.todo, todo("plan trip", "a"));
        assert_eq!(first.meta.get("seq"), Some(&json!(1)));
        assert!(first.meta.contains_key("created"));

        let listed = repo.list().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0], first);
        assert_eq!(listed[1].todo.text, "pack bags");
        assert_eq!(listed[1].meta.get("seq"), Some(&json!(2)));
    }

    #[tokio::test]
    async fn corrupt_status_is_an_error_not_a_panic() {
        let repo = repo().await;
        sqlx::query("INSERT INTO todos (id, text, due_at, status, created_at) VALUES ('x', 't', NULL, 'done', '2021-01-01T00:00:00Z')")
            .execute(&*repo.pool)
            .await
            .unwrap();
        let err = repo.list().await.unwrap_err();
        assert!(err.to_string().contains("unknown status"));
    }

    #[test]
    fn memory_urls_need_no_file() {
        prepare_sqlite_file("sqlite::memory:").unwrap();
    }
}
