//! # Database Handle
//!
//! Opens the SQLite file that holds the shop's single state record.
//!
//! ```text
//! DbConfig::new(path) ──► Database::new(config) ──► db.snapshots()
//!                              │
//!                              ├─ file:   WAL, NORMAL sync, created if missing
//!                              ├─ memory: one connection (tests)
//!                              └─ migrations unless disabled
//! ```
//!
//! WAL journaling keeps the CLI's reads from blocking the running app's
//! writes when both open the same file.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::info;

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::SnapshotRepository;

/// Where the database lives and how it is opened.
///
/// ## Example
/// ```rust
/// use dokan_db::DbConfig;
///
/// let config = DbConfig::new("/path/to/dokan.db").run_migrations(false);
/// assert!(!config.run_migrations);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Database file. `None` opens a private in-memory database.
    pub path: Option<PathBuf>,

    /// One writer plus a reader for the CLI is plenty.
    pub max_connections: u32,

    pub run_migrations: bool,
}

impl DbConfig {
    /// A file-backed database; the file is created on first connect.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            path: Some(path.into()),
            max_connections: 2,
            run_migrations: true,
        }
    }

    /// An in-memory database. Every connection would see its own empty
    /// database, so the pool holds exactly one.
    pub fn in_memory() -> Self {
        DbConfig {
            path: None,
            max_connections: 1,
            run_migrations: true,
        }
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }
}

/// Shared handle to the pool. Clones share it.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        let options = match &config.path {
            Some(path) => {
                info!(path = %path.display(), "Opening database");
                SqliteConnectOptions::new()
                    .filename(path)
                    .create_if_missing(true)
                    .journal_mode(SqliteJournalMode::Wal)
                    .synchronous(SqliteSynchronous::Normal)
            }
            None => {
                info!("Opening in-memory database");
                SqliteConnectOptions::from_str("sqlite::memory:")
                    .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            }
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        let db = Database { pool };
        if config.run_migrations {
            migrations::run_migrations(&db.pool).await?;
        }
        Ok(db)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Repository for the persisted state record.
    pub fn snapshots(&self) -> SnapshotRepository {
        SnapshotRepository::new(self.pool.clone())
    }

    pub async fn close(&self) {
        info!("Closing database");
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dokan_core::{AppState, STORAGE_KEY};

    #[tokio::test]
    async fn test_in_memory_database_is_migrated() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let (total, applied) = migrations::migration_status(db.pool()).await.unwrap();
        assert_eq!(total, applied);
        assert!(total >= 1);
    }

    #[tokio::test]
    async fn test_migrations_can_be_skipped() {
        let config = DbConfig::in_memory().run_migrations(false);
        assert!(config.path.is_none());
        assert_eq!(config.max_connections, 1);

        let db = Database::new(config).await.unwrap();
        assert!(db.snapshots().load_state(STORAGE_KEY).await.is_err());
    }

    #[tokio::test]
    async fn test_record_survives_reopen() {
        let path = std::env::temp_dir().join(format!("dokan-{}.db", uuid::Uuid::new_v4()));

        let db = Database::new(DbConfig::new(path.clone())).await.unwrap();
        let state = AppState {
            linked_email: Some("owner@example.com".to_string()),
            ..Default::default()
        };
        db.snapshots().save_state(STORAGE_KEY, &state).await.unwrap();
        db.close().await;

        let reopened = Database::new(DbConfig::new(path.clone())).await.unwrap();
        let loaded = reopened.snapshots().load_state(STORAGE_KEY).await.unwrap();
        reopened.close().await;

        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
        }

        assert_eq!(loaded, Some(state));
    }
}
