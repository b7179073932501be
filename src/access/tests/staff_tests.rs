//! Staff management tests
//!
//! Adding, re-roling and removing staff, the `manage_staff` gate, and
//! visibility of writes to the next resolution.

use std::sync::Arc;
use storefront_access::{
    catalog::{Permission, Role},
    error::AccessError,
    resolver::AccessResolver,
    session::SessionRegistry,
    staff::StaffManager,
    store::{InMemoryAccessStore, RoleGrantStore},
    types::{RoleGrant, UserProfile},
};

struct Fixture {
    store: Arc<InMemoryAccessStore>,
    resolver: AccessResolver,
    staff: StaffManager,
}

/// Owner `owner` (super_admin), manager `manager` (admin), shopper `ada`
/// (customer) and a profile-only account `grace`.
async fn fixture() -> Fixture {
    let store = Arc::new(InMemoryAccessStore::new());

    store
        .insert_profile(UserProfile::new("owner", "owner@shop.test").with_full_name("Olive Owner"))
        .await;
    store.insert_profile(UserProfile::new("manager", "manager@shop.test")).await;
    store
        .insert_profile(UserProfile::new("ada", "ada@shop.test").with_full_name("Ada Lovelace"))
        .await;
    store.insert_profile(UserProfile::new("grace", "grace@shop.test")).await;

    store.push_grant(RoleGrant::new("owner", "super_admin")).await;
    store.push_grant(RoleGrant::new("manager", "admin")).await;
    store.push_grant(RoleGrant::new("ada", "customer")).await;

    let resolver = AccessResolver::new(store.clone());
    let staff = StaffManager::new(store.clone(), resolver.clone());

    Fixture { store, resolver, staff }
}

// ============================================================================
// ADD STAFF
// ============================================================================

#[tokio::test]
async fn test_add_staff_grants_role() {
    let f = fixture().await;

    let member = f.staff.add_staff("owner", "ada@shop.test", Role::Finance).await.unwrap();

    assert_eq!(member.user_id, "ada");
    assert_eq!(member.role, Role::Finance);
    assert_eq!(member.label, "Finance / Accounting");
    assert_eq!(member.full_name.as_deref(), Some("Ada Lovelace"));

    // Visible to the very next resolution
    assert_eq!(f.resolver.resolve_effective_role("ada").await, Role::Finance);

    // Replaced, not appended: the old customer row is gone
    let grants = f.store.list_role_grants("ada").await.unwrap();
    assert_eq!(grants.len(), 1);
}

#[tokio::test]
async fn test_add_staff_email_is_trimmed_and_case_insensitive() {
    let f = fixture().await;

    let member = f
        .staff
        .add_staff("owner", "  GRACE@shop.test ", Role::ProductStaff)
        .await
        .unwrap();

    assert_eq!(member.user_id, "grace");
    assert_eq!(f.resolver.resolve_effective_role("grace").await, Role::ProductStaff);
}

#[tokio::test]
async fn test_add_staff_unknown_email() {
    let f = fixture().await;

    let err = f
        .staff
        .add_staff("owner", "nobody@shop.test", Role::Marketing)
        .await
        .unwrap_err();

    assert!(matches!(err, AccessError::UserNotFound(_)));
    assert_eq!(f.store.grant_count().await, 3);
}

#[tokio::test]
async fn test_add_staff_rejects_empty_email() {
    let f = fixture().await;

    let err = f.staff.add_staff("owner", "   ", Role::Marketing).await.unwrap_err();
    assert!(matches!(err, AccessError::InvalidInput(_)));
}

#[tokio::test]
async fn test_add_staff_rejects_non_assignable_roles() {
    let f = fixture().await;

    for role in [Role::SuperAdmin, Role::Customer] {
        let err = f.staff.add_staff("owner", "ada@shop.test", role).await.unwrap_err();
        assert!(matches!(err, AccessError::InvalidInput(_)), "{} should be rejected", role);
    }
    assert_eq!(f.resolver.resolve_effective_role("ada").await, Role::Customer);
}

#[tokio::test]
async fn test_add_staff_rejects_self() {
    let f = fixture().await;

    let err = f
        .staff
        .add_staff("owner", "owner@shop.test", Role::Admin)
        .await
        .unwrap_err();

    assert!(matches!(err, AccessError::SelfModification));
    assert_eq!(f.resolver.resolve_effective_role("owner").await, Role::SuperAdmin);
}

// ============================================================================
// PERMISSION GATE
// ============================================================================

#[tokio::test]
async fn test_admin_cannot_manage_staff() {
    let f = fixture().await;

    let denied = |err: AccessError| {
        matches!(err, AccessError::PermissionDenied { permission: Permission::ManageStaff })
    };

    assert!(denied(f.staff.list_staff("manager").await.unwrap_err()));
    assert!(denied(
        f.staff
            .add_staff("manager", "ada@shop.test", Role::Marketing)
            .await
            .unwrap_err()
    ));
    assert!(denied(f.staff.change_role("manager", "ada", Role::Marketing).await.unwrap_err()));
    assert!(denied(f.staff.remove_staff("manager", "owner").await.unwrap_err()));

    assert_eq!(f.resolver.resolve_effective_role("owner").await, Role::SuperAdmin);
}

#[tokio::test]
async fn test_customer_and_unknown_users_cannot_manage_staff() {
    let f = fixture().await;

    for actor in ["ada", "not-a-user"] {
        let err = f.staff.list_staff(actor).await.unwrap_err();
        assert!(matches!(err, AccessError::PermissionDenied { .. }));
    }
}

#[tokio::test]
async fn test_demoted_owner_loses_access_immediately() {
    let f = fixture().await;
    f.store.push_grant(RoleGrant::new("second-owner", "super_admin")).await;

    f.staff.remove_staff("second-owner", "owner").await.unwrap();

    let err = f.staff.list_staff("owner").await.unwrap_err();
    assert!(matches!(err, AccessError::PermissionDenied { .. }));
}

#[tokio::test]
async fn test_gate_ignores_stale_session_state() {
    let f = fixture().await;
    let sessions = SessionRegistry::new(f.resolver.clone());
    let owner_session = sessions.sign_in("owner").await.unwrap();
    assert!(sessions.has_permission(&owner_session.session_id, "manage_staff"));

    // Demoted behind the session's back
    f.store.upsert_role_grant("owner", Role::Marketing).await.unwrap();

    // The session still says super_admin, but the write path re-reads the store
    assert!(sessions.has_permission(&owner_session.session_id, "manage_staff"));
    let err = f
        .staff
        .add_staff("owner", "ada@shop.test", Role::Finance)
        .await
        .unwrap_err();
    assert!(matches!(err, AccessError::PermissionDenied { .. }));
}

// ============================================================================
// CHANGE AND REMOVE
// ============================================================================

#[tokio::test]
async fn test_change_role() {
    let f = fixture().await;

    f.staff.change_role("owner", "manager", Role::OrderFulfillment).await.unwrap();

    let role = f.resolver.resolve_effective_role("manager").await;
    assert_eq!(role, Role::OrderFulfillment);
    assert!(!role.grants(Permission::ViewCustomers));
}

#[tokio::test]
async fn test_change_role_can_promote_to_super_admin() {
    let f = fixture().await;

    f.staff.change_role("owner", "manager", Role::SuperAdmin).await.unwrap();
    assert!(f.staff.list_staff("manager").await.is_ok());
}

#[tokio::test]
async fn test_change_role_rejects_customer_and_self() {
    let f = fixture().await;

    let err = f.staff.change_role("owner", "manager", Role::Customer).await.unwrap_err();
    assert!(matches!(err, AccessError::InvalidInput(_)));

    let err = f.staff.change_role("owner", "owner", Role::Admin).await.unwrap_err();
    assert!(matches!(err, AccessError::SelfModification));
}

#[tokio::test]
async fn test_remove_staff_downgrades_to_customer() {
    let f = fixture().await;
    f.store.push_grant(RoleGrant::new("manager", "finance")).await;

    f.staff.remove_staff("owner", "manager").await.unwrap();

    // Both staff rows are gone, not just the highest one
    let role = f.resolver.resolve_effective_role("manager").await;
    assert_eq!(role, Role::Customer);
    assert!(role.permissions().is_empty());

    let grants = f.store.list_role_grants("manager").await.unwrap();
    assert_eq!(grants.len(), 1);
    assert_eq!(grants[0].role, "customer");
}

#[tokio::test]
async fn test_change_role_requires_existing_staff_member() {
    let f = fixture().await;

    let err = f
        .staff
        .change_role("owner", "ghost-no-profile", Role::Admin)
        .await
        .unwrap_err();
    assert!(matches!(err, AccessError::UserNotFound(_)));
    assert!(f.store.list_role_grants("ghost-no-profile").await.unwrap().is_empty());

    // Customers are promoted through add_staff, never straight to super_admin
    let err = f.staff.change_role("owner", "ada", Role::SuperAdmin).await.unwrap_err();
    assert!(matches!(err, AccessError::InvalidInput(_)));
    assert_eq!(f.resolver.resolve_effective_role("ada").await, Role::Customer);

    // Profile without any grant is not staff either
    let err = f.staff.change_role("owner", "grace", Role::Finance).await.unwrap_err();
    assert!(matches!(err, AccessError::InvalidInput(_)));

    let listed: Vec<_> = f
        .staff
        .list_staff("owner")
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.user_id)
        .collect();
    assert_eq!(listed, vec!["owner", "manager"]);
}

#[tokio::test]
async fn test_remove_staff_requires_existing_staff_member() {
    let f = fixture().await;

    let err = f.staff.remove_staff("owner", "ghost-no-profile").await.unwrap_err();
    assert!(matches!(err, AccessError::UserNotFound(_)));
    assert_eq!(f.store.grant_count().await, 3);

    let err = f.staff.remove_staff("owner", "ada").await.unwrap_err();
    assert!(matches!(err, AccessError::InvalidInput(_)));
}

#[tokio::test]
async fn test_remove_self_rejected() {
    let f = fixture().await;

    let err = f.staff.remove_staff("owner", "owner").await.unwrap_err();
    assert!(matches!(err, AccessError::SelfModification));
}

// ============================================================================
// LISTING
// ============================================================================

#[tokio::test]
async fn test_list_staff_orders_by_privilege() {
    let f = fixture().await;
    f.staff.add_staff("owner", "grace@shop.test", Role::Marketing).await.unwrap();

    let staff = f.staff.list_staff("owner").await.unwrap();
    let roles: Vec<_> = staff.iter().map(|m| (m.user_id.as_str(), m.role)).collect();

    assert_eq!(
        roles,
        vec![
            ("owner", Role::SuperAdmin),
            ("manager", Role::Admin),
            ("grace", Role::Marketing),
        ]
    );
    assert_eq!(staff[0].email, "owner@shop.test");
}

#[tokio::test]
async fn test_list_staff_collapses_multi_grant_users() {
    let f = fixture().await;
    f.store.push_grant(RoleGrant::new("manager", "finance")).await;
    f.store.push_grant(RoleGrant::new("manager", "admin")).await;
    f.store.push_grant(RoleGrant::new("ghost", "customer_support")).await;

    let staff = f.staff.list_staff("owner").await.unwrap();

    let manager: Vec<_> = staff.iter().filter(|m| m.user_id == "manager").collect();
    assert_eq!(manager.len(), 1);
    assert_eq!(manager[0].role, Role::Admin);

    // Grant without a profile still lists
    let ghost = staff.iter().find(|m| m.user_id == "ghost").unwrap();
    assert_eq!(ghost.email, "Unknown");
    assert_eq!(ghost.role, Role::CustomerSupport);

    assert!(staff.iter().all(|m| m.user_id != "ada"));
}
