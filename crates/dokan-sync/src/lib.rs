//! # dokan-sync: Cloud Sync for Dokan
//!
//! Keeps one shop consistent between this device's local record and the
//! owner's remote document, and gives apps a [`Shop`] facade that runs the
//! ledger and triggers sync.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Sync Architecture                                │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Shop (shop.rs)                                                  │  │
//! │  │  Arc<RwLock<AppState>>  +  ledger operations  +  SyncHandle      │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │ notify_mutation / sync_now              │
//! │                               ▼                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  SyncCoordinator (coordinator.rs), one tokio task                │  │
//! │  │  select! over auth watch, remote watch, commands, debounce       │  │
//! │  └──────┬───────────────────────┬───────────────────────┬──────────┘  │
//! │         ▼                       ▼                       ▼             │
//! │  ┌──────────────┐      ┌─────────────────┐      ┌───────────────┐     │
//! │  │ LocalStore   │      │ RemoteDocument  │      │ Auth watch    │     │
//! │  │ (SQLite)     │      │ Store           │      │ Option<Owner> │     │
//! │  └──────────────┘      └─────────────────┘      └───────────────┘     │
//! │                                                                         │
//! │  CONFLICTS: whole-snapshot last writer wins, `lastSync` is the clock.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`auth`] - Owner identity boundary
//! - [`config`] - Debounce and storage configuration
//! - [`coordinator`] - The sync event loop and its handle
//! - [`error`] - Sync error types
//! - [`protocol`] - The remote document shape and the apply rule
//! - [`remote`] - Remote document store seam and in-memory implementation
//! - [`shop`] - App-facing facade
//! - [`store`] - Local record seam over `dokan-db`
//!
//! ## Usage
//! ```rust,ignore
//! let db = Database::new(DbConfig::new(path)).await?;
//! let store = SqliteLocalStore::new(db, &config.storage.key);
//! let (shop, _task) = Shop::open(store, remote, auth.subscribe(), &config, None).await?;
//!
//! shop.checkout(request)?;   // saved locally now, pushed after 10 quiet seconds
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod auth;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod protocol;
pub mod remote;
pub mod shop;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use auth::{AuthSession, Owner};
pub use config::SyncConfig;
pub use coordinator::{
    NoOpEmitter, SyncCoordinator, SyncEventEmitter, SyncHandle, SyncPhase, SyncStatus,
};
pub use error::{SyncError, SyncResult};
pub use protocol::RemoteSnapshot;
pub use remote::{MemoryRemote, RemoteDocumentStore};
pub use shop::Shop;
pub use store::{LocalStore, MemoryLocalStore, SqliteLocalStore};
