//! Storefront roles and their privilege order

use crate::error::AccessError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Storefront role
///
/// Variants are declared from lowest to highest privilege, so the derived
/// `Ord` is the privilege order: `customer` first, `super_admin` last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Signed-up shopper, no back-office access
    Customer,
    /// Marketing staff
    Marketing,
    /// Finance / accounting
    Finance,
    /// Customer support
    CustomerSupport,
    /// Order fulfillment
    OrderFulfillment,
    /// Product catalogue staff
    ProductStaff,
    /// Store manager
    Admin,
    /// Owner account, manages staff and settings
    SuperAdmin,
}

/// Staff roles in ascending privilege order. Position is rank.
const STAFF_ROLES: [Role; 7] = [
    Role::Marketing,
    Role::Finance,
    Role::CustomerSupport,
    Role::OrderFulfillment,
    Role::ProductStaff,
    Role::Admin,
    Role::SuperAdmin,
];

impl Role {
    /// Every role, lowest privilege first
    pub const ALL: [Role; 8] = [
        Role::Customer,
        Role::Marketing,
        Role::Finance,
        Role::CustomerSupport,
        Role::OrderFulfillment,
        Role::ProductStaff,
        Role::Admin,
        Role::SuperAdmin,
    ];

    /// Wire name as stored in the `user_roles` table
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Marketing => "marketing",
            Role::Finance => "finance",
            Role::CustomerSupport => "customer_support",
            Role::OrderFulfillment => "order_fulfillment",
            Role::ProductStaff => "product_staff",
            Role::Admin => "admin",
            Role::SuperAdmin => "super_admin",
        }
    }

    /// Human-readable label shown in the back office
    pub fn label(&self) -> &'static str {
        match self {
            Role::Customer => "Customer",
            Role::Marketing => "Marketing Staff",
            Role::Finance => "Finance / Accounting",
            Role::CustomerSupport => "Customer Support",
            Role::OrderFulfillment => "Order Fulfillment",
            Role::ProductStaff => "Product Staff",
            Role::Admin => "Store Manager",
            Role::SuperAdmin => "Super Admin",
        }
    }

    /// Position in [`staff_roles`], or `None` for `customer`
    pub fn staff_rank(&self) -> Option<usize> {
        STAFF_ROLES.iter().position(|r| r == self)
    }

    /// Whether the role grants any back-office access
    pub fn is_staff(&self) -> bool {
        self.staff_rank().is_some()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .iter()
            .copied()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| AccessError::UnknownRole(s.to_string()))
    }
}

/// Staff roles in ascending privilege order; later position wins
pub fn staff_roles() -> &'static [Role] {
    &STAFF_ROLES
}

/// Display label for a role
pub fn label_of(role: Role) -> &'static str {
    role.label()
}

/// Staff classification that treats "no role yet" as not staff
pub fn is_staff_role(role: Option<Role>) -> bool {
    role.map(|r| r.is_staff()).unwrap_or(false)
}
