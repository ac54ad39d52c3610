//! SQLite access.
//!
//! [`Db`] owns a single connection behind a mutex. Handlers never touch the
//! connection on the async executor: [`Db::run`] hops onto actix's blocking
//! pool, takes the lock and hands the closure a `&mut Connection`. Migrations
//! run once when the database is opened.

pub mod blog;
pub mod media;
pub mod orders;
pub mod products;
mod schema;
pub mod users;

use actix_web::web;
use log::info;
use rusqlite::types::Type;
use rusqlite::{Connection, Row};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::{Arc, Mutex};

use crate::error::{ApiError, ApiResult};

#[derive(Clone)]
pub struct Db {
    conn: Arc<Mutex<Connection>>,
}

impl Db {
    /// Opens (or creates) the database at `path`; `:memory:` gives a private
    /// in-memory database.
    pub fn open(path: &str) -> ApiResult<Self> {
        let conn = Connection::open(path)?;
        if path != ":memory:" {
            let mode: String =
                conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
            info!("Opened database {} (journal_mode={})", path, mode);
        }
        conn.pragma_update(None, "foreign_keys", "ON")?;
        schema::run_migrations(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> ApiResult<Self> {
        Self::open(":memory:")
    }

    /// Runs `f` against the connection on the blocking thread pool.
    pub async fn run<F, T>(&self, f: F) -> ApiResult<T>
    where
        F: FnOnce(&mut Connection) -> ApiResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        web::block(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| ApiError::Internal("database lock poisoned".to_string()))?;
            f(&mut guard)
        })
        .await?
    }

    /// Same as [`Db::run`] for callers already off the async executor.
    pub fn run_blocking<F, T>(&self, f: F) -> ApiResult<T>
    where
        F: FnOnce(&mut Connection) -> ApiResult<T>,
    {
        let mut guard = self
            .conn
            .lock()
            .map_err(|_| ApiError::Internal("database lock poisoned".to_string()))?;
        f(&mut guard)
    }
}

pub fn to_json<T: Serialize>(value: &T) -> ApiResult<String> {
    Ok(serde_json::to_string(value)?)
}

/// Reads a TEXT column holding JSON.
pub fn json_column<T: DeserializeOwned>(row: &Row<'_>, column: &str) -> rusqlite::Result<T> {
    let raw: String = row.get(column)?;
    serde_json::from_str(&raw).map_err(|e| {
        let index = row.as_ref().column_index(column).unwrap_or_default();
        rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(e))
    })
}

/// Reads an enum stored as its wire name.
pub fn parsed_column<T>(row: &Row<'_>, column: &str) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = String>,
{
    let raw: String = row.get(column)?;
    raw.parse().map_err(|e: String| {
        let index = row.as_ref().column_index(column).unwrap_or_default();
        rusqlite::Error::FromSqlConversionFailure(index, Type::Text, e.into())
    })
}

/// Escapes `%` and `_` for a `LIKE ... ESCAPE '\'` pattern and wraps it in `%`.
pub fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn migrations_seed_default_collections() {
        let db = Db::open_in_memory().unwrap();
        let count: i64 = db
            .run(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM product_collections", [], |r| r.get(0))?)
            })
            .await
            .unwrap();
        assert_eq!(count, 6);
    }

    #[test]
    fn reopening_a_file_database_keeps_schema_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ispeak.sqlite");
        let path = path.to_str().unwrap();
        Db::open(path).unwrap();
        let db = Db::open(path).unwrap();
        let collections: i64 = db
            .run_blocking(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM product_collections", [], |r| r.get(0))?)
            })
            .unwrap();
        assert_eq!(collections, 6);
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }
}
