//! Error types for the access layer

use crate::catalog::Permission;
use std::time::Duration;
use thiserror::Error;

/// Access layer errors
#[derive(Debug, Error)]
pub enum AccessError {
    /// Role-grant store could not be reached or answered with an error
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Role string outside the closed role enumeration
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    /// Permission token outside the permission vocabulary
    #[error("Unknown permission: {0}")]
    UnknownPermission(String),

    /// Caller lacks the permission required for an action
    #[error("Permission denied: {permission} required")]
    PermissionDenied {
        /// Missing permission
        permission: Permission,
    },

    /// Role resolution did not complete in time
    #[error("Role resolution timed out after {0:?}")]
    Timeout(Duration),

    /// No profile exists for the given user or email
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// Session id is unknown or already signed out
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Staff members may not change or remove their own role
    #[error("Staff members cannot modify their own role")]
    SelfModification,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AccessError {
    /// Whether the caller may retry the same operation later
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AccessError::StoreUnavailable(_) | AccessError::Timeout(_) | AccessError::Database(_)
        )
    }
}

/// Result type for access operations
pub type Result<T> = std::result::Result<T, AccessError>;
