//! Access resolver
//!
//! Turns a user identity into a single effective role and answers
//! permission queries against it.
//!
//! - **Highest privilege wins**: among all grants a user holds, the role
//!   latest in [`staff_roles`] is picked; no grants means `customer`.
//! - **Fail closed**: store errors and timeouts resolve to `customer`,
//!   never to a cached or privileged role.
//! - **Closed enumeration**: grant rows naming an unknown role are skipped
//!   and logged.
//!
//! # Example
//!
//! ```rust
//! use storefront_access::resolver::AccessResolver;
//! use storefront_access::store::InMemoryAccessStore;
//! use storefront_access::types::RoleGrant;
//! use storefront_access::catalog::Role;
//! use std::sync::Arc;
//!
//! # async fn example() {
//! let store = InMemoryAccessStore::new();
//! store.push_grant(RoleGrant::new("user-1", "marketing")).await;
//! store.push_grant(RoleGrant::new("user-1", "finance")).await;
//!
//! let resolver = AccessResolver::new(Arc::new(store));
//! assert_eq!(resolver.resolve_effective_role("user-1").await, Role::Finance);
//! # }
//! ```

use crate::catalog::{staff_roles, Permission, Role};
use crate::error::{AccessError, Result};
use crate::metrics::MetricsCollector;
use crate::store::RoleGrantStore;
use crate::types::RoleGrant;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

/// Default deadline for one role-grant fetch
pub const DEFAULT_RESOLVE_TIMEOUT: Duration = Duration::from_secs(5);

/// Reduce held roles to the single highest-privilege role.
///
/// Order of the input and duplicates do not matter. `customer` grants carry
/// no rank, so a user holding only those (or nothing) resolves to `customer`.
pub fn reduce_grants<I>(roles: I) -> Role
where
    I: IntoIterator<Item = Role>,
{
    roles
        .into_iter()
        .filter_map(|role| role.staff_rank().map(|rank| (rank, role)))
        .max_by_key(|(rank, _)| *rank)
        .map(|(_, role)| role)
        .unwrap_or(Role::Customer)
}

/// Parse grant rows and reduce them, skipping unknown roles.
///
/// Returns the effective role and the number of rows that were ignored.
pub fn effective_role_from_grants(user_id: &str, grants: &[RoleGrant]) -> (Role, usize) {
    let mut unknown = 0;

    let roles = grants.iter().filter_map(|grant| match grant.parsed_role() {
        Ok(role) => Some(role),
        Err(_) => {
            warn!(
                "Ignoring grant with unknown role '{}' for user {}",
                grant.role, user_id
            );
            unknown += 1;
            None
        }
    });

    let role = reduce_grants(roles);
    (role, unknown)
}

/// Resolves effective roles from the role-grant store
#[derive(Clone)]
pub struct AccessResolver {
    store: Arc<dyn RoleGrantStore>,
    timeout: Duration,
    metrics: MetricsCollector,
}

impl AccessResolver {
    /// Create a resolver with the default timeout
    pub fn new(store: Arc<dyn RoleGrantStore>) -> Self {
        Self {
            store,
            timeout: DEFAULT_RESOLVE_TIMEOUT,
            metrics: MetricsCollector::new(),
        }
    }

    /// Override the per-resolution deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Share a metrics collector with other components
    pub fn with_metrics(mut self, metrics: MetricsCollector) -> Self {
        self.metrics = metrics;
        self
    }

    /// Configured deadline
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Metrics collector
    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    /// Role-grant store this resolver reads from
    pub fn store(&self) -> &Arc<dyn RoleGrantStore> {
        &self.store
    }

    /// Resolve the effective role, surfacing store errors and timeouts.
    ///
    /// Used where the caller must distinguish "customer" from "could not
    /// tell", such as administrative screens and privileged actions.
    pub async fn try_resolve(&self, user_id: &str) -> Result<Role> {
        let start = Instant::now();

        let grants = match tokio::time::timeout(self.timeout, self.store.list_role_grants(user_id)).await {
            Ok(Ok(grants)) => grants,
            Ok(Err(e)) => {
                error!("Role grant fetch failed for user {}: {}", user_id, e);
                self.metrics.record_store_failure().await;
                self.metrics.record_resolution(false, start.elapsed()).await;
                return Err(match e {
                    AccessError::StoreUnavailable(_) => e,
                    other => AccessError::StoreUnavailable(other.to_string()),
                });
            }
            Err(_) => {
                warn!("Role grant fetch for user {} timed out after {:?}", user_id, self.timeout);
                self.metrics.record_timeout().await;
                self.metrics.record_resolution(false, start.elapsed()).await;
                return Err(AccessError::Timeout(self.timeout));
            }
        };

        let (role, unknown) = effective_role_from_grants(user_id, &grants);
        self.metrics.record_unknown_roles(unknown as u64).await;
        self.metrics.record_resolution(role.is_staff(), start.elapsed()).await;

        debug!(
            "Resolved user {} to {} from {} grant(s)",
            user_id,
            role,
            grants.len()
        );

        Ok(role)
    }

    /// Resolve the effective role, failing closed to `customer`
    pub async fn resolve_effective_role(&self, user_id: &str) -> Role {
        match self.try_resolve(user_id).await {
            Ok(role) => role,
            Err(e) => {
                warn!("Falling back to customer for user {}: {}", user_id, e);
                Role::Customer
            }
        }
    }

    /// Re-derive the caller's role from the store and require a permission.
    ///
    /// Every state-changing operation goes through here instead of trusting
    /// session state or client-held hints.
    pub async fn require_permission(&self, user_id: &str, permission: Permission) -> Result<Role> {
        let role = self.try_resolve(user_id).await?;

        if role.grants(permission) {
            Ok(role)
        } else {
            warn!(
                "User {} ({}) denied: {} required",
                user_id, role, permission
            );
            self.metrics.record_denial().await;
            Err(AccessError::PermissionDenied { permission })
        }
    }

    /// Staff roles in ascending privilege order
    pub fn staff_roles(&self) -> &'static [Role] {
        staff_roles()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryAccessStore;

    #[test]
    fn test_reduce_empty_is_customer() {
        assert_eq!(reduce_grants(Vec::new()), Role::Customer);
    }

    #[test]
    fn test_reduce_picks_highest() {
        let roles = vec![Role::Finance, Role::Marketing];
        assert_eq!(reduce_grants(roles), Role::Finance);

        let roles = vec![Role::Admin, Role::Customer, Role::ProductStaff];
        assert_eq!(reduce_grants(roles), Role::Admin);
    }

    #[test]
    fn test_reduce_duplicates() {
        let roles = vec![Role::CustomerSupport, Role::CustomerSupport];
        assert_eq!(reduce_grants(roles), Role::CustomerSupport);
    }

    #[test]
    fn test_reduce_only_customer() {
        let roles = vec![Role::Customer, Role::Customer];
        assert_eq!(reduce_grants(roles), Role::Customer);
    }

    #[test]
    fn test_unknown_roles_are_skipped() {
        let grants = vec![
            RoleGrant::new("u1", "regional_director"),
            RoleGrant::new("u1", "order_fulfillment"),
            RoleGrant::new("u1", ""),
        ];

        let (role, unknown) = effective_role_from_grants("u1", &grants);
        assert_eq!(role, Role::OrderFulfillment);
        assert_eq!(unknown, 2);
    }

    #[tokio::test]
    async fn test_resolve_from_store() {
        let store = InMemoryAccessStore::new();
        store.push_grant(RoleGrant::new("u1", "product_staff")).await;

        let resolver = AccessResolver::new(Arc::new(store));
        assert_eq!(resolver.resolve_effective_role("u1").await, Role::ProductStaff);
        assert_eq!(resolver.resolve_effective_role("nobody").await, Role::Customer);

        let metrics = resolver.metrics().snapshot().await;
        assert_eq!(metrics.resolutions, 2);
        assert_eq!(metrics.staff_resolutions, 1);
    }

    #[tokio::test]
    async fn test_require_permission() {
        let store = InMemoryAccessStore::new();
        store.push_grant(RoleGrant::new("boss", "super_admin")).await;
        store.push_grant(RoleGrant::new("clerk", "order_fulfillment")).await;

        let resolver = AccessResolver::new(Arc::new(store));

        assert_eq!(
            resolver.require_permission("boss", Permission::ManageStaff).await.unwrap(),
            Role::SuperAdmin
        );

        let err = resolver
            .require_permission("clerk", Permission::ManageStaff)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AccessError::PermissionDenied { permission: Permission::ManageStaff }
        ));
        assert_eq!(resolver.metrics().snapshot().await.denials, 1);
    }
}
