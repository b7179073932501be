//! Exhaustive checks over the role catalog

use super::*;
use std::collections::HashSet;

#[test]
fn test_every_role_has_a_label() {
    for role in Role::ALL {
        assert!(!label_of(role).is_empty(), "{} has no label", role);
    }
}

#[test]
fn test_labels_are_distinct() {
    let labels: HashSet<_> = Role::ALL.iter().map(|r| r.label()).collect();
    assert_eq!(labels.len(), Role::ALL.len());
}

#[test]
fn test_permissions_within_vocabulary() {
    let vocabulary: HashSet<_> = Permission::ALL.iter().copied().collect();

    for role in Role::ALL {
        for permission in permissions_of(role) {
            assert!(vocabulary.contains(permission));
        }
    }
}

#[test]
fn test_customer_grants_nothing() {
    assert!(permissions_of(Role::Customer).is_empty());

    for permission in Permission::ALL {
        assert!(!has_permission(Some(Role::Customer), permission.as_str()));
    }
}

#[test]
fn test_no_duplicate_permissions_per_role() {
    for role in Role::ALL {
        let unique: HashSet<_> = permissions_of(role).iter().collect();
        assert_eq!(unique.len(), permissions_of(role).len(), "{} repeats a permission", role);
    }
}

#[test]
fn test_staff_roles_exclude_customer_exactly_once_each() {
    let staff = staff_roles();
    assert!(!staff.contains(&Role::Customer));
    assert_eq!(staff.len(), Role::ALL.len() - 1);

    let unique: HashSet<_> = staff.iter().collect();
    assert_eq!(unique.len(), staff.len());

    for role in Role::ALL.iter().filter(|r| **r != Role::Customer) {
        assert!(staff.contains(role));
    }
}

#[test]
fn test_staff_order() {
    assert_eq!(
        staff_roles(),
        &[
            Role::Marketing,
            Role::Finance,
            Role::CustomerSupport,
            Role::OrderFulfillment,
            Role::ProductStaff,
            Role::Admin,
            Role::SuperAdmin,
        ]
    );
}

#[test]
fn test_is_staff_classification() {
    assert!(!Role::Customer.is_staff());
    for role in staff_roles() {
        assert!(role.is_staff());
        assert!(is_staff_role(Some(*role)));
    }
}

#[test]
fn test_super_admin_holds_full_vocabulary() {
    for permission in Permission::ALL {
        assert!(Role::SuperAdmin.grants(permission));
    }
}

#[test]
fn test_definitions_cover_all_roles() {
    let defs = definitions();
    assert_eq!(defs.len(), Role::ALL.len());
    assert_eq!(defs[0].role, Role::Customer);
    assert_eq!(defs[0].staff_rank, None);
    assert_eq!(defs[7].role, Role::SuperAdmin);
    assert_eq!(defs[7].permissions.len(), Permission::ALL.len());
}
