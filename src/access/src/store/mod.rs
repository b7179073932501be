//! External store interface for role grants and profiles
//!
//! The store owns persistence. This crate reads grants through
//! [`RoleGrantStore`] and only the staff-management flow writes them.

use crate::catalog::Role;
use crate::error::Result;
use crate::types::{RoleGrant, UserId, UserProfile};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "postgres")]
pub use postgres::PostgresAccessStore;

/// Role grant storage
#[async_trait]
pub trait RoleGrantStore: Send + Sync {
    /// All grants held by a user, unordered, possibly empty or repeated
    async fn list_role_grants(&self, user_id: &str) -> Result<Vec<RoleGrant>>;

    /// All grants whose stored role is one of `roles`
    async fn list_grants_with_roles(&self, roles: &[Role]) -> Result<Vec<RoleGrant>>;

    /// Replace every grant the user holds with a single grant of `role`
    async fn upsert_role_grant(&self, user_id: &str, role: Role) -> Result<()>;

    /// Replace every grant the user holds with a single `customer` grant
    async fn downgrade_to_customer(&self, user_id: &str) -> Result<()> {
        self.upsert_role_grant(user_id, Role::Customer).await
    }
}

/// Account profile lookup
#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    /// Find a profile by sign-in email
    async fn find_by_email(&self, email: &str) -> Result<Option<UserProfile>>;

    /// Get a profile by user id
    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>>;
}

/// Combined store used by the server
pub trait AccessStore: RoleGrantStore + ProfileDirectory {}

impl<T: RoleGrantStore + ProfileDirectory> AccessStore for T {}

/// In-memory store implementation
#[derive(Clone, Default)]
pub struct InMemoryAccessStore {
    grants: Arc<RwLock<Vec<RoleGrant>>>,
    profiles: Arc<RwLock<HashMap<UserId, UserProfile>>>,
}

impl InMemoryAccessStore {
    /// Create an empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account profile (sign-up)
    pub async fn insert_profile(&self, profile: UserProfile) {
        let mut profiles = self.profiles.write().await;
        profiles.insert(profile.id.clone(), profile);
    }

    /// Append a raw grant row without replacing existing ones.
    ///
    /// Models rows written outside the staff flow, including duplicates and
    /// role names this build does not know.
    pub async fn push_grant(&self, grant: RoleGrant) {
        let mut grants = self.grants.write().await;
        grants.push(grant);
    }

    /// Number of grant rows currently stored
    pub async fn grant_count(&self) -> usize {
        self.grants.read().await.len()
    }
}

#[async_trait]
impl RoleGrantStore for InMemoryAccessStore {
    async fn list_role_grants(&self, user_id: &str) -> Result<Vec<RoleGrant>> {
        let grants = self.grants.read().await;
        Ok(grants.iter().filter(|g| g.user_id == user_id).cloned().collect())
    }

    async fn list_grants_with_roles(&self, roles: &[Role]) -> Result<Vec<RoleGrant>> {
        let grants = self.grants.read().await;
        Ok(grants
            .iter()
            .filter(|g| roles.iter().any(|r| r.as_str() == g.role))
            .cloned()
            .collect())
    }

    async fn upsert_role_grant(&self, user_id: &str, role: Role) -> Result<()> {
        let mut grants = self.grants.write().await;
        grants.retain(|g| g.user_id != user_id);
        grants.push(RoleGrant::new(user_id, role.as_str()));
        Ok(())
    }
}

#[async_trait]
impl ProfileDirectory for InMemoryAccessStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserProfile>> {
        let profiles = self.profiles.read().await;
        Ok(profiles
            .values()
            .find(|p| p.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>> {
        let profiles = self.profiles.read().await;
        Ok(profiles.get(user_id).cloned())
    }
}
