//! Permission vocabulary and the role → permission table

use super::role::Role;
use crate::error::AccessError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Back-office capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ManageStaff,
    ViewAnalytics,
    ManageProducts,
    ManageCategories,
    ViewAllOrders,
    UpdateOrders,
    ViewCustomers,
    ManageSettings,
    ViewFinancialReports,
    ManageMarketing,
}

impl Permission {
    /// The complete permission vocabulary
    pub const ALL: [Permission; 10] = [
        Permission::ManageStaff,
        Permission::ViewAnalytics,
        Permission::ManageProducts,
        Permission::ManageCategories,
        Permission::ViewAllOrders,
        Permission::UpdateOrders,
        Permission::ViewCustomers,
        Permission::ManageSettings,
        Permission::ViewFinancialReports,
        Permission::ManageMarketing,
    ];

    /// Permission token
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ManageStaff => "manage_staff",
            Permission::ViewAnalytics => "view_analytics",
            Permission::ManageProducts => "manage_products",
            Permission::ManageCategories => "manage_categories",
            Permission::ViewAllOrders => "view_all_orders",
            Permission::UpdateOrders => "update_orders",
            Permission::ViewCustomers => "view_customers",
            Permission::ManageSettings => "manage_settings",
            Permission::ViewFinancialReports => "view_financial_reports",
            Permission::ManageMarketing => "manage_marketing",
        }
    }

    /// Token with underscores replaced by spaces, e.g. "view all orders"
    pub fn display_name(&self) -> String {
        self.as_str().replace('_', " ")
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| AccessError::UnknownPermission(s.to_string()))
    }
}

use Permission::*;

const SUPER_ADMIN: &[Permission] = &[
    ManageStaff,
    ViewAnalytics,
    ManageProducts,
    ManageCategories,
    ViewAllOrders,
    UpdateOrders,
    ViewCustomers,
    ManageSettings,
    ViewFinancialReports,
    ManageMarketing,
];

const ADMIN: &[Permission] = &[
    ViewAnalytics,
    ManageProducts,
    ManageCategories,
    ViewAllOrders,
    UpdateOrders,
    ViewCustomers,
    ViewFinancialReports,
    ManageMarketing,
];

const PRODUCT_STAFF: &[Permission] = &[ManageProducts, ManageCategories];

const ORDER_FULFILLMENT: &[Permission] = &[ViewAllOrders, UpdateOrders];

const CUSTOMER_SUPPORT: &[Permission] = &[ViewAllOrders, ViewCustomers];

const FINANCE: &[Permission] = &[ViewAllOrders, ViewFinancialReports, ViewAnalytics];

const MARKETING: &[Permission] = &[ManageProducts, ManageMarketing, ViewAnalytics];

/// Permissions granted by a role; empty for `customer`
pub fn permissions_of(role: Role) -> &'static [Permission] {
    match role {
        Role::SuperAdmin => SUPER_ADMIN,
        Role::Admin => ADMIN,
        Role::ProductStaff => PRODUCT_STAFF,
        Role::OrderFulfillment => ORDER_FULFILLMENT,
        Role::CustomerSupport => CUSTOMER_SUPPORT,
        Role::Finance => FINANCE,
        Role::Marketing => MARKETING,
        Role::Customer => &[],
    }
}

impl Role {
    /// Permissions this role grants
    pub fn permissions(&self) -> &'static [Permission] {
        permissions_of(*self)
    }

    /// Typed membership check
    pub fn grants(&self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }
}

/// Point permission query against a raw token.
///
/// `None` (role not resolved) and tokens outside the vocabulary both answer
/// `false`; neither is an error.
pub fn has_permission(role: Option<Role>, permission: &str) -> bool {
    let Some(role) = role else {
        return false;
    };

    permission
        .parse::<Permission>()
        .map(|p| role.grants(p))
        .unwrap_or(false)
}
