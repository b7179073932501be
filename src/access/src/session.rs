//! Session-scoped role state
//!
//! Each session walks `Unresolved → Resolving → Resolved(role)`. A failed
//! fetch lands in `Resolved(customer)` with the `degraded` flag set, so no
//! permission check ever waits on a session forever. Results that arrive
//! after sign-out, or after a newer resolution started, are discarded.

use crate::catalog::{has_permission, Role};
use crate::error::{AccessError, Result};
use crate::resolver::AccessResolver;
use crate::types::{SessionId, UserId};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Role knowledge for one session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleState {
    /// Session established, grants not fetched yet
    Unresolved,
    /// Fetch in flight
    Resolving,
    /// Effective role known for the rest of the session
    Resolved(Role),
}

impl RoleState {
    /// Resolved role, if any
    pub fn role(&self) -> Option<Role> {
        match self {
            RoleState::Resolved(role) => Some(*role),
            _ => None,
        }
    }

    /// Whether permission-gated UI should still render as pending
    pub fn is_pending(&self) -> bool {
        self.role().is_none()
    }

    /// State name used on the wire
    pub fn name(&self) -> &'static str {
        match self {
            RoleState::Unresolved => "unresolved",
            RoleState::Resolving => "resolving",
            RoleState::Resolved(_) => "resolved",
        }
    }
}

/// Read-only view of a session
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session_id: SessionId,
    pub user_id: UserId,
    /// "unresolved", "resolving" or "resolved"
    pub state: &'static str,
    /// Effective role once resolved
    pub role: Option<Role>,
    /// Resolved to `customer` because the store could not be read
    pub degraded: bool,
}

/// Client-side rendering hint.
///
/// Safe to persist in the browser for fast "am I staff" rendering. Nothing in
/// this crate reads a hint back; privileged actions re-resolve from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleHint {
    pub role: Role,
    pub label: &'static str,
    pub is_staff: bool,
}

impl RoleHint {
    fn of(role: Role) -> Self {
        Self {
            role,
            label: role.label(),
            is_staff: role.is_staff(),
        }
    }
}

#[derive(Debug, Clone)]
struct SessionEntry {
    user_id: UserId,
    state: RoleState,
    /// Ticket of the resolution allowed to write back
    ticket: u64,
    degraded: bool,
}

/// Removes a session whose sign-in was abandoned before it completed
struct PendingSignIn {
    sessions: Arc<DashMap<SessionId, SessionEntry>>,
    session_id: SessionId,
    armed: bool,
}

impl Drop for PendingSignIn {
    fn drop(&mut self) {
        if self.armed && self.sessions.remove(&self.session_id).is_some() {
            debug!("Dropped abandoned sign-in session {}", self.session_id);
        }
    }
}

/// Registry of live sessions and their role state
#[derive(Clone)]
pub struct SessionRegistry {
    resolver: AccessResolver,
    sessions: Arc<DashMap<SessionId, SessionEntry>>,
    next_ticket: Arc<AtomicU64>,
}

impl SessionRegistry {
    /// Create an empty registry
    pub fn new(resolver: AccessResolver) -> Self {
        Self {
            resolver,
            sessions: Arc::new(DashMap::new()),
            next_ticket: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Resolver backing this registry
    pub fn resolver(&self) -> &AccessResolver {
        &self.resolver
    }

    /// Register an authenticated session without resolving its role
    pub fn establish(&self, user_id: impl Into<UserId>) -> SessionId {
        let session_id = Uuid::new_v4();
        let user_id = user_id.into();

        debug!("Session {} established for user {}", session_id, user_id);

        self.sessions.insert(
            session_id,
            SessionEntry {
                user_id,
                state: RoleState::Unresolved,
                ticket: 0,
                degraded: false,
            },
        );

        session_id
    }

    /// Establish a session and resolve its role.
    ///
    /// If the caller stops waiting before the role is known, the session id
    /// was never handed out, so the session is removed again.
    pub async fn sign_in(&self, user_id: impl Into<UserId>) -> Result<SessionView> {
        let session_id = self.establish(user_id);
        let mut pending = PendingSignIn {
            sessions: self.sessions.clone(),
            session_id,
            armed: true,
        };

        self.resolve(&session_id).await?;
        pending.armed = false;

        self.view(&session_id)
            .ok_or_else(|| AccessError::SessionNotFound(session_id.to_string()))
    }

    /// Fetch grants and move the session to `Resolved`.
    ///
    /// Also used to re-resolve after an administrator changed the user's
    /// role. Returns `SessionNotFound` if the session ended before the fetch
    /// completed; the result is dropped in that case.
    ///
    /// The fetch runs on its own task, so the session still settles when
    /// the caller's future is dropped mid-flight.
    pub async fn resolve(&self, session_id: &SessionId) -> Result<Role> {
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);

        let user_id = {
            let mut entry = self
                .sessions
                .get_mut(session_id)
                .ok_or_else(|| AccessError::SessionNotFound(session_id.to_string()))?;
            entry.state = RoleState::Resolving;
            entry.ticket = ticket;
            entry.user_id.clone()
        };

        let registry = self.clone();
        let id = *session_id;
        let task = tokio::spawn(async move {
            let (role, degraded) = match registry.resolver.try_resolve(&user_id).await {
                Ok(role) => (role, false),
                Err(e) => {
                    warn!("Session {} resolved to customer after failure: {}", id, e);
                    (Role::Customer, true)
                }
            };
            registry.settle(&id, ticket, role, degraded)
        });

        match task.await {
            Ok(result) => result,
            Err(e) => {
                error!("Resolution task for session {} failed: {}", session_id, e);
                self.settle(session_id, ticket, Role::Customer, true)?;
                Err(AccessError::StoreUnavailable(format!("resolution task failed: {}", e)))
            }
        }
    }

    /// Write a resolution back if it is still the latest for a live session
    fn settle(&self, session_id: &SessionId, ticket: u64, role: Role, degraded: bool) -> Result<Role> {
        match self.sessions.get_mut(session_id) {
            Some(mut entry) if entry.ticket == ticket => {
                entry.state = RoleState::Resolved(role);
                entry.degraded = degraded;
                info!("Session {} resolved: user={} role={}", session_id, entry.user_id, role);
                Ok(role)
            }
            Some(_) => {
                debug!("Discarding superseded resolution for session {}", session_id);
                Ok(role)
            }
            None => {
                debug!("Discarding resolution for ended session {}", session_id);
                Err(AccessError::SessionNotFound(session_id.to_string()))
            }
        }
    }

    /// End a session. Any in-flight resolution for it is discarded.
    pub fn sign_out(&self, session_id: &SessionId) -> bool {
        let removed = self.sessions.remove(session_id).is_some();
        if removed {
            info!("Session {} signed out", session_id);
        }
        removed
    }

    /// Current role state
    pub fn state(&self, session_id: &SessionId) -> Option<RoleState> {
        self.sessions.get(session_id).map(|e| e.state)
    }

    /// Snapshot of a session
    pub fn view(&self, session_id: &SessionId) -> Option<SessionView> {
        self.sessions.get(session_id).map(|e| SessionView {
            session_id: *session_id,
            user_id: e.user_id.clone(),
            state: e.state.name(),
            role: e.state.role(),
            degraded: e.degraded,
        })
    }

    /// User behind a session
    pub fn user_id(&self, session_id: &SessionId) -> Option<UserId> {
        self.sessions.get(session_id).map(|e| e.user_id.clone())
    }

    /// Effective role; `None` until the first resolution completes
    pub fn effective_role(&self, session_id: &SessionId) -> Option<Role> {
        self.state(session_id).and_then(|s| s.role())
    }

    /// Staff classification; `false` while pending
    pub fn is_staff(&self, session_id: &SessionId) -> bool {
        self.effective_role(session_id)
            .map(|r| r.is_staff())
            .unwrap_or(false)
    }

    /// Point permission query; `false` while pending or for unknown tokens
    pub fn has_permission(&self, session_id: &SessionId, permission: &str) -> bool {
        has_permission(self.effective_role(session_id), permission)
    }

    /// Rendering hint for the client, once resolved
    pub fn hint(&self, session_id: &SessionId) -> Option<RoleHint> {
        self.effective_role(session_id).map(RoleHint::of)
    }

    /// Number of live sessions
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no sessions are live
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
