//! # dokan-db: Local Persistence for Dokan
//!
//! The local persisted record: the full [`AppState`](dokan_core::AppState)
//! as one JSON document in SQLite, written after every change and read at
//! startup.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Dokan Data Flow                                  │
//! │                                                                         │
//! │  dokan-sync coordinator (save on every mutation)                       │
//! │  apps/dokan-cli         (read, import)                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     dokan-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repository   │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │◄───│ SnapshotRepo  │    │  (embedded)  │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  SQLite  <data dir>/dokan.db   table `snapshots`                │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dokan_core::STORAGE_KEY;
//! use dokan_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("dokan.db")).await?;
//! let state = db.snapshots().load_state(STORAGE_KEY).await?.unwrap_or_default();
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::SnapshotRepository;
