//! # Sync Error Types
//!
//! Errors raised by the sync coordinator and its collaborators.
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sync Error Categories                             │
//! │                                                                         │
//! │  CONFIG          InvalidConfig, ConfigLoadFailed, ConfigSaveFailed      │
//! │  AUTH            NotSignedIn                                            │
//! │  REMOTE          RemoteWriteFailed, RemoteUnavailable  (retryable)      │
//! │  LOCAL           LocalStore                                             │
//! │  SERIALIZATION   SerializationFailed                                    │
//! │  INTERNAL        ChannelError, ShuttingDown                             │
//! │                                                                         │
//! │  Automatic pushes never surface these to callers: the coordinator      │
//! │  logs them and the next mutation's debounce tries again.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Result alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Sync errors.
#[derive(Debug, Error)]
pub enum SyncError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// A config value is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Config file could not be read or parsed.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Config file could not be written.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Auth Errors
    // =========================================================================
    /// A push was requested with no owner signed in.
    #[error("No owner is signed in")]
    NotSignedIn,

    // =========================================================================
    // Remote Errors
    // =========================================================================
    /// The remote document rejected or lost the write.
    #[error("Remote write failed: {0}")]
    RemoteWriteFailed(String),

    /// The remote document store cannot be reached.
    #[error("Remote store unavailable: {0}")]
    RemoteUnavailable(String),

    // =========================================================================
    // Local Errors
    // =========================================================================
    /// Saving or loading the local record failed.
    #[error("Local store error: {0}")]
    LocalStore(String),

    // =========================================================================
    // Serialization Errors
    // =========================================================================
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// An internal channel closed unexpectedly.
    #[error("Channel error: {0}")]
    ChannelError(String),

    /// The coordinator has stopped.
    #[error("Sync coordinator is shutting down")]
    ShuttingDown,
}

// =============================================================================
// Conversions
// =============================================================================

impl From<dokan_db::DbError> for SyncError {
    fn from(err: dokan_db::DbError) -> Self {
        SyncError::LocalStore(err.to_string())
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::SerializationFailed(err.to_string())
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for SyncError {
    fn from(err: toml::ser::Error) -> Self {
        SyncError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl SyncError {
    /// Returns true if the same push may succeed later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SyncError::RemoteWriteFailed(_)
                | SyncError::RemoteUnavailable(_)
                | SyncError::LocalStore(_)
        )
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SyncError::InvalidConfig(_)
                | SyncError::ConfigLoadFailed(_)
                | SyncError::ConfigSaveFailed(_)
        )
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categorization() {
        assert!(SyncError::RemoteWriteFailed("offline".into()).is_retryable());
        assert!(SyncError::RemoteUnavailable("dns".into()).is_retryable());
        assert!(!SyncError::NotSignedIn.is_retryable());
        assert!(!SyncError::ShuttingDown.is_retryable());

        assert!(SyncError::InvalidConfig("test".into()).is_config_error());
        assert!(SyncError::ConfigLoadFailed("test".into()).is_config_error());
        assert!(!SyncError::RemoteWriteFailed("test".into()).is_config_error());
    }

    #[test]
    fn test_db_error_conversion() {
        let err: SyncError = dokan_db::DbError::QueryFailed("locked".into()).into();
        assert!(matches!(err, SyncError::LocalStore(ref m) if m.contains("locked")));
    }
}
