//! Back-office navigation and route guards

use crate::catalog::{Permission, Role};
use crate::session::RoleState;
use serde::Serialize;

/// Back-office section, each gated by one permission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminSection {
    Analytics,
    Orders,
    Customers,
    Products,
    Staff,
}

impl AdminSection {
    /// Sections in navigation order
    pub const ALL: [AdminSection; 5] = [
        AdminSection::Analytics,
        AdminSection::Orders,
        AdminSection::Customers,
        AdminSection::Products,
        AdminSection::Staff,
    ];

    pub fn required_permission(&self) -> Permission {
        match self {
            AdminSection::Analytics => Permission::ViewAnalytics,
            AdminSection::Orders => Permission::ViewAllOrders,
            AdminSection::Customers => Permission::ViewCustomers,
            AdminSection::Products => Permission::ManageProducts,
            AdminSection::Staff => Permission::ManageStaff,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            AdminSection::Analytics => "/admin/analytics",
            AdminSection::Orders => "/admin/orders",
            AdminSection::Customers => "/admin/customers",
            AdminSection::Products => "/admin/products",
            AdminSection::Staff => "/admin/staff",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AdminSection::Analytics => "Analytics",
            AdminSection::Orders => "Orders",
            AdminSection::Customers => "Customers",
            AdminSection::Products => "Products",
            AdminSection::Staff => "Staff",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            AdminSection::Analytics => "View store performance",
            AdminSection::Orders => "Manage all orders",
            AdminSection::Customers => "View customer details",
            AdminSection::Products => "Manage products",
            AdminSection::Staff => "Manage team members",
        }
    }

    /// Section owning a path, if any
    pub fn from_path(path: &str) -> Option<AdminSection> {
        let path = path.trim_end_matches('/');
        AdminSection::ALL.iter().copied().find(|s| {
            path == s.path() || path.starts_with(&format!("{}/", s.path()))
        })
    }
}

/// Navigation entry rendered on the dashboard
#[derive(Debug, Clone, Serialize)]
pub struct NavItem {
    pub section: AdminSection,
    pub href: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub permission: Permission,
}

impl From<AdminSection> for NavItem {
    fn from(section: AdminSection) -> Self {
        Self {
            section,
            href: section.path(),
            label: section.label(),
            description: section.description(),
            permission: section.required_permission(),
        }
    }
}

/// Sections a role may open, in navigation order
pub fn visible_sections(role: Role) -> Vec<NavItem> {
    AdminSection::ALL
        .iter()
        .copied()
        .filter(|s| role.grants(s.required_permission()))
        .map(NavItem::from)
        .collect()
}

/// "Your permissions" card
#[derive(Debug, Clone, Serialize)]
pub struct PermissionSummary {
    pub role: Role,
    pub label: &'static str,
    pub permissions: Vec<Permission>,
    /// Permission tokens with underscores turned into spaces
    pub display_names: Vec<String>,
}

impl PermissionSummary {
    pub fn for_role(role: Role) -> Self {
        let permissions = role.permissions().to_vec();
        let display_names = permissions.iter().map(|p| p.display_name()).collect();

        Self {
            role,
            label: role.label(),
            permissions,
            display_names,
        }
    }
}

/// Route guard outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "to", rename_all = "snake_case")]
pub enum GuardOutcome {
    /// Render the route
    Allow,
    /// Role not resolved yet; render nothing gated
    Pending,
    /// Navigate elsewhere
    Redirect(&'static str),
}

pub const SIGN_IN_PATH: &str = "/auth";
pub const DASHBOARD_PATH: &str = "/admin";

/// Decide whether a path may be rendered for the given session state.
///
/// `state` is `None` for an anonymous visitor.
pub fn guard_route(path: &str, state: Option<RoleState>) -> GuardOutcome {
    let trimmed = path.trim_end_matches('/');
    let is_dashboard = trimmed == DASHBOARD_PATH;
    let section = AdminSection::from_path(trimmed);

    if !is_dashboard && section.is_none() {
        return GuardOutcome::Allow;
    }

    let role = match state {
        None => return GuardOutcome::Redirect(SIGN_IN_PATH),
        Some(state) => match state.role() {
            Some(role) => role,
            None => return GuardOutcome::Pending,
        },
    };

    match section {
        Some(section) if role.grants(section.required_permission()) => GuardOutcome::Allow,
        Some(_) => GuardOutcome::Redirect(DASHBOARD_PATH),
        None if role.is_staff() => GuardOutcome::Allow,
        None => GuardOutcome::Redirect(SIGN_IN_PATH),
    }
}
