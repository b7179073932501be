//! # Storefront Access
//!
//! Role-based access control for the storefront back office.
//!
//! ## Features
//!
//! - **Role catalog**: closed role enumeration, labels, permission table and
//!   a fixed privilege order
//! - **Access resolver**: highest-privilege-wins reduction over a user's role
//!   grants, failing closed to `customer`
//! - **Sessions**: per-session role state with cancellation on sign-out
//! - **Staff management**: role grant writes gated by `manage_staff`
//! - **REST surface** built on axum
//!
//! ## Example
//!
//! ```rust
//! use storefront_access::{AccessResolver, InMemoryAccessStore, Role, RoleGrant, SessionRegistry};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = InMemoryAccessStore::new();
//!     store.push_grant(RoleGrant::new("user-42", "finance")).await;
//!     store.push_grant(RoleGrant::new("user-42", "marketing")).await;
//!
//!     let sessions = SessionRegistry::new(AccessResolver::new(Arc::new(store)));
//!     let view = sessions.sign_in("user-42").await?;
//!
//!     assert_eq!(view.role, Some(Role::Finance));
//!     assert!(sessions.has_permission(&view.session_id, "view_analytics"));
//!     assert!(!sessions.has_permission(&view.session_id, "manage_staff"));
//!
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod http;
pub mod metrics;
pub mod resolver;
pub mod session;
pub mod staff;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use catalog::{has_permission, is_staff_role, label_of, permissions_of, staff_roles, Permission, Role};
pub use config::AccessConfig;
pub use error::{AccessError, Result};
pub use resolver::{reduce_grants, AccessResolver};
pub use session::{RoleState, SessionRegistry, SessionView};
pub use staff::StaffManager;
pub use store::{InMemoryAccessStore, ProfileDirectory, RoleGrantStore};
pub use types::{RoleGrant, SessionId, UserId, UserProfile};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
