//! SQLite persistence for users and observations.
//!
//! The database lives at `<data_dir>/specimen.db` by default and is migrated
//! on open. Timestamps are stored as fixed-width RFC 3339 UTC text so that
//! lexical order matches chronological order.

mod observations;
mod users;

use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use crate::error::StoreError;

pub use observations::{NewObservation, Observation, ObservationFilter};
pub use users::{hash_password, verify_password, User};

/// Destination for classification results.
///
/// The upload path only needs to append records; this trait keeps it
/// testable without a database.
#[async_trait]
pub trait ObservationSink: Send + Sync {
    async fn record(&self, observation: NewObservation) -> Result<Observation, StoreError>;
}

/// Connection pool with the schema applied.
#[derive(Clone, Debug)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if needed) and migrate the database at `url`.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)?
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(std::time::Duration::from_secs(5))
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        sqlx::migrate!().run(&pool).await?;
        tracing::debug!("Database ready at {}", url);
        Ok(Self { pool })
    }

    /// Open the database file at `path`, creating parent directories.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| StoreError::Media {
                path: parent.to_path_buf(),
                message: format!("cannot create database directory: {e}"),
            })?;
        }
        Self::connect(&format!("sqlite://{}?mode=rwc", path.display())).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl ObservationSink for Database {
    async fn record(&self, observation: NewObservation) -> Result<Observation, StoreError> {
        self.insert_observation(&observation).await
    }
}

pub(crate) fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_datetime(s: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Database(sqlx::Error::Decode(Box::new(e))))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Fresh migrated database in a temporary directory.
    pub(crate) async fn temp_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(&dir.path().join("test.db")).await.unwrap();
        (dir, db)
    }

    #[tokio::test]
    async fn test_open_creates_tables() {
        let (_dir, db) = temp_db().await;
        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type='table' AND name IN ('users', 'observations') ORDER BY name",
        )
        .fetch_all(db.pool())
        .await
        .unwrap();
        let names: Vec<_> = tables.into_iter().map(|(n,)| n).collect();
        assert_eq!(names, vec!["observations", "users"]);
    }

    #[tokio::test]
    async fn test_open_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/specimen.db");
        Database::open(&path).await.unwrap().close().await;
        Database::open(&path).await.unwrap();
    }

    #[test]
    fn test_datetime_round_trip_and_order() {
        let a = DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let b = a + chrono::Duration::milliseconds(1);
        let (sa, sb) = (format_datetime(&a), format_datetime(&b));
        assert!(sa < sb);
        assert_eq!(parse_datetime(&sa).unwrap(), a);
    }
}
