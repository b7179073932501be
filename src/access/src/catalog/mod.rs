//! Role catalog
//!
//! The single source of truth for which roles exist, how they are labelled,
//! which permissions each one grants, and how they rank against each other.
//! Everything here is static and pure.
//!
//! # Example
//!
//! ```rust
//! use storefront_access::catalog::{has_permission, staff_roles, Role};
//!
//! assert_eq!(Role::Finance.label(), "Finance / Accounting");
//! assert!(has_permission(Some(Role::Finance), "view_analytics"));
//! assert!(!has_permission(Some(Role::Finance), "manage_staff"));
//! assert_eq!(staff_roles().last(), Some(&Role::SuperAdmin));
//! ```

pub mod permission;
pub mod role;

#[cfg(test)]
mod tests;

pub use permission::{has_permission, permissions_of, Permission};
pub use role::{is_staff_role, label_of, staff_roles, Role};

use serde::Serialize;

/// Serializable catalog entry for one role
#[derive(Debug, Clone, Serialize)]
pub struct RoleDefinition {
    pub role: Role,
    pub label: &'static str,
    pub permissions: Vec<Permission>,
    /// Position in the staff privilege order, `None` for customers
    pub staff_rank: Option<usize>,
}

impl RoleDefinition {
    pub fn of(role: Role) -> Self {
        Self {
            role,
            label: role.label(),
            permissions: role.permissions().to_vec(),
            staff_rank: role.staff_rank(),
        }
    }
}

/// Definitions for every role, lowest privilege first
pub fn definitions() -> Vec<RoleDefinition> {
    Role::ALL.iter().copied().map(RoleDefinition::of).collect()
}
