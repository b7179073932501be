//! Core access types

use crate::catalog::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque user identifier issued by the authentication provider
pub type UserId = String;

/// Session identifier
pub type SessionId = Uuid;

/// Role grant row as read from the store.
///
/// `role` stays a raw string here: the store may hold values written by an
/// older or newer schema, and validation happens in the resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleGrant {
    /// Grantee
    pub user_id: UserId,

    /// Stored role name (e.g. "finance")
    pub role: String,

    /// When the grant row was written
    pub created_at: DateTime<Utc>,
}

impl RoleGrant {
    /// Create a grant stamped with the current time
    pub fn new(user_id: impl Into<UserId>, role: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role: role.into(),
            created_at: Utc::now(),
        }
    }

    /// Parse the stored role against the closed enumeration
    pub fn parsed_role(&self) -> crate::Result<Role> {
        self.role.parse()
    }
}

/// Account profile kept by the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// User identifier
    pub id: UserId,

    /// Sign-in email
    pub email: String,

    /// Optional display name
    #[serde(default)]
    pub full_name: Option<String>,
}

impl UserProfile {
    /// Create a new profile
    pub fn new(id: impl Into<UserId>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            full_name: None,
        }
    }

    /// Set the display name
    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = Some(full_name.into());
        self
    }
}

/// Staff directory row
#[derive(Debug, Clone, Serialize)]
pub struct StaffMember {
    pub user_id: UserId,
    pub email: String,
    pub full_name: Option<String>,
    pub role: Role,
    pub label: &'static str,
    pub granted_at: DateTime<Utc>,
}
