//! Staff management
//!
//! Administrative writes to role grants. Every call re-derives the acting
//! user's role from the store and requires `manage_staff`; writes replace a
//! user's grants instead of adding to them, so "removing" a staff member
//! (downgrade to customer) cannot leave an older staff grant in place.

use crate::catalog::{staff_roles, Permission, Role};
use crate::error::{AccessError, Result};
use crate::resolver::{effective_role_from_grants, AccessResolver};
use crate::store::AccessStore;
use crate::types::{StaffMember, UserProfile};
use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Roles that `add_staff` may hand out
pub fn assignable_roles() -> Vec<Role> {
    staff_roles()
        .iter()
        .copied()
        .filter(|r| *r != Role::SuperAdmin)
        .collect()
}

/// Staff-management operations over the access store
#[derive(Clone)]
pub struct StaffManager {
    store: Arc<dyn AccessStore>,
    resolver: AccessResolver,
}

impl StaffManager {
    /// Create a staff manager.
    ///
    /// `resolver` should read from the same store so that writes are visible
    /// to the next resolution.
    pub fn new(store: Arc<dyn AccessStore>, resolver: AccessResolver) -> Self {
        Self { store, resolver }
    }

    /// Everyone whose effective role is a staff role
    pub async fn list_staff(&self, actor: &str) -> Result<Vec<StaffMember>> {
        self.resolver
            .require_permission(actor, Permission::ManageStaff)
            .await?;

        let grants = self.store.list_grants_with_roles(staff_roles()).await?;

        // Group by user so multi-grant users appear once, at their effective role
        let mut by_user: BTreeMap<String, Vec<_>> = BTreeMap::new();
        for grant in grants {
            by_user.entry(grant.user_id.clone()).or_default().push(grant);
        }

        let lookups = by_user.iter().map(|(user_id, _)| self.store.get_profile(user_id));
        let profiles = join_all(lookups).await;

        let mut staff = Vec::with_capacity(by_user.len());
        for ((user_id, grants), profile) in by_user.into_iter().zip(profiles) {
            let (role, _) = effective_role_from_grants(&user_id, &grants);
            let granted_at = grants
                .iter()
                .filter(|g| g.role == role.as_str())
                .map(|g| g.created_at)
                .min()
                .unwrap_or_else(chrono::Utc::now);

            let (email, full_name) = match profile? {
                Some(UserProfile { email, full_name, .. }) => (email, full_name),
                None => ("Unknown".to_string(), None),
            };

            staff.push(StaffMember {
                user_id,
                email,
                full_name,
                role,
                label: role.label(),
                granted_at,
            });
        }

        // Highest privilege first, then by email
        staff.sort_by(|a, b| b.role.cmp(&a.role).then_with(|| a.email.cmp(&b.email)));
        Ok(staff)
    }

    /// Give an existing account a staff role
    pub async fn add_staff(&self, actor: &str, email: &str, role: Role) -> Result<StaffMember> {
        self.resolver
            .require_permission(actor, Permission::ManageStaff)
            .await?;

        let email = email.trim();
        if email.is_empty() {
            return Err(AccessError::InvalidInput("Email is required".to_string()));
        }
        if !assignable_roles().contains(&role) {
            return Err(AccessError::InvalidInput(format!(
                "Role '{}' cannot be assigned when adding staff",
                role
            )));
        }

        let profile = self.store.find_by_email(email).await?.ok_or_else(|| {
            AccessError::UserNotFound(format!("{} (they must sign up first)", email))
        })?;

        if profile.id == actor {
            return Err(AccessError::SelfModification);
        }

        self.store.upsert_role_grant(&profile.id, role).await?;

        info!(
            "Staff added: actor={} user={} role={}",
            actor, profile.id, role
        );

        Ok(StaffMember {
            user_id: profile.id,
            email: profile.email,
            full_name: profile.full_name,
            role,
            label: role.label(),
            granted_at: chrono::Utc::now(),
        })
    }

    /// Change a staff member's role
    pub async fn change_role(&self, actor: &str, target: &str, role: Role) -> Result<()> {
        self.resolver
            .require_permission(actor, Permission::ManageStaff)
            .await?;

        if actor == target {
            warn!("User {} attempted to change their own role", actor);
            return Err(AccessError::SelfModification);
        }
        if !role.is_staff() {
            return Err(AccessError::InvalidInput(
                "Use remove_staff to downgrade a member to customer".to_string(),
            ));
        }
        self.require_staff_target(target).await?;

        self.store.upsert_role_grant(target, role).await?;

        info!("Staff role changed: actor={} user={} role={}", actor, target, role);
        Ok(())
    }

    /// Remove a staff member by downgrading them to customer
    pub async fn remove_staff(&self, actor: &str, target: &str) -> Result<()> {
        self.resolver
            .require_permission(actor, Permission::ManageStaff)
            .await?;

        if actor == target {
            warn!("User {} attempted to remove themselves from staff", actor);
            return Err(AccessError::SelfModification);
        }
        self.require_staff_target(target).await?;

        self.store.downgrade_to_customer(target).await?;

        info!("Staff removed: actor={} user={}", actor, target);
        Ok(())
    }

    /// Current role of a user who must already be staff.
    ///
    /// Promotions from customer go through `add_staff`, which checks the
    /// profile and the assignable roles.
    async fn require_staff_target(&self, target: &str) -> Result<Role> {
        let grants = self.store.list_role_grants(target).await?;
        let (role, _) = effective_role_from_grants(target, &grants);
        if role.is_staff() {
            return Ok(role);
        }

        if self.store.get_profile(target).await?.is_none() {
            return Err(AccessError::UserNotFound(target.to_string()));
        }
        Err(AccessError::InvalidInput(format!("User {} is not a staff member", target)))
    }
}
