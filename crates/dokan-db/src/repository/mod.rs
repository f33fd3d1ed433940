//! # Repository Module
//!
//! Database repository implementations for Dokan.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Sync coordinator / CLI                                                │
//! │       │                                                                 │
//! │       │  db.snapshots().save_state(STORAGE_KEY, &state)                │
//! │       ▼                                                                 │
//! │  SnapshotRepository                                                    │
//! │  ├── load_state / save_state   (decoded AppState)                      │
//! │  ├── load_raw / save_raw       (payload text)                          │
//! │  ├── updated_at                                                        │
//! │  └── delete                                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite `snapshots` table                                              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`SnapshotRepository`] - The shop's single persisted record

pub mod snapshot;

pub use snapshot::SnapshotRepository;
