//! REST surface
//!
//! ## Endpoints
//!
//! - `GET /health`, `GET /metrics`
//! - `GET /v1/roles` - Role catalog
//! - `POST /v1/sessions` - Establish and resolve a session
//! - `GET|DELETE /v1/sessions/:id`, `POST /v1/sessions/:id/refresh`
//! - `GET /v1/sessions/:id/permissions/:permission`
//! - `GET /v1/sessions/:id/dashboard`
//! - `GET|POST /v1/staff`, `PUT|DELETE /v1/staff/:user_id` (acting session in `x-session-id`)

use crate::catalog::{definitions, RoleDefinition, Role};
use crate::dashboard::{guard_route, visible_sections, GuardOutcome, NavItem, PermissionSummary, DASHBOARD_PATH};
use crate::error::AccessError;
use crate::metrics::MetricsCollector;
use crate::resolver::AccessResolver;
use crate::session::{RoleHint, SessionRegistry, SessionView};
use crate::staff::StaffManager;
use crate::store::AccessStore;
use crate::types::{StaffMember, UserId};
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{info, Level};
use uuid::Uuid;

/// Header carrying the acting session for staff endpoints
pub const SESSION_HEADER: &str = "x-session-id";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionRegistry,
    pub staff: StaffManager,
    pub metrics: MetricsCollector,
    pub start_time: Instant,
}

impl AppState {
    /// Wire resolver, sessions and staff management over one store
    pub fn new<S>(store: Arc<S>, resolve_timeout: Duration) -> Self
    where
        S: AccessStore + 'static,
    {
        let metrics = MetricsCollector::new();
        let resolver = AccessResolver::new(store.clone())
            .with_timeout(resolve_timeout)
            .with_metrics(metrics.clone());

        Self {
            sessions: SessionRegistry::new(resolver.clone()),
            staff: StaffManager::new(store, resolver),
            metrics,
            start_time: Instant::now(),
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    retryable: bool,
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    Access(AccessError),
    Unauthorized(String),
}

impl From<AccessError> for AppError {
    fn from(err: AccessError) -> Self {
        AppError::Access(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message, retryable) = match self {
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, false),
            AppError::Access(err) => {
                let retryable = err.is_retryable();
                let (status, error) = match &err {
                    AccessError::PermissionDenied { .. } => (StatusCode::FORBIDDEN, "permission_denied"),
                    AccessError::SessionNotFound(_) => (StatusCode::NOT_FOUND, "session_not_found"),
                    AccessError::UserNotFound(_) => (StatusCode::NOT_FOUND, "user_not_found"),
                    AccessError::InvalidInput(_)
                    | AccessError::UnknownRole(_)
                    | AccessError::UnknownPermission(_)
                    | AccessError::SelfModification => (StatusCode::BAD_REQUEST, "bad_request"),
                    AccessError::StoreUnavailable(_) | AccessError::Timeout(_) => {
                        (StatusCode::SERVICE_UNAVAILABLE, "store_unavailable")
                    }
                    _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
                };
                (status, error, err.to_string(), retryable)
            }
        };

        let body = Json(ErrorResponse {
            error: error.to_string(),
            message,
            retryable,
        });

        (status, body).into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<T>, AppError>;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    uptime_seconds: u64,
    version: String,
    sessions: usize,
}

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub user_id: UserId,
}

#[derive(Debug, Serialize)]
struct SessionResponse {
    #[serde(flatten)]
    session: SessionView,
    hint: Option<RoleHint>,
}

#[derive(Debug, Serialize)]
struct PermissionResponse {
    permission: String,
    allowed: bool,
}

#[derive(Debug, Serialize)]
struct DashboardResponse {
    /// "unresolved", "resolving" or "resolved"
    state: &'static str,
    guard: GuardOutcome,
    /// Empty until the role is resolved
    sections: Vec<NavItem>,
    summary: Option<PermissionSummary>,
}

#[derive(Debug, Deserialize)]
pub struct AddStaffRequest {
    pub email: String,
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangeRoleRequest {
    pub role: String,
}

fn session_response(state: &AppState, id: &Uuid) -> ApiResult<SessionResponse> {
    let session = state
        .sessions
        .view(id)
        .ok_or_else(|| AccessError::SessionNotFound(id.to_string()))?;
    let hint = state.sessions.hint(id);
    Ok(Json(SessionResponse { session, hint }))
}

/// Resolve the acting user from the session header
fn acting_user(state: &AppState, headers: &HeaderMap) -> std::result::Result<UserId, AppError> {
    let raw = headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized(format!("missing {} header", SESSION_HEADER)))?;

    let session_id = Uuid::parse_str(raw)
        .map_err(|_| AppError::Unauthorized(format!("malformed {} header", SESSION_HEADER)))?;

    state
        .sessions
        .user_id(&session_id)
        .ok_or_else(|| AccessError::SessionNotFound(session_id.to_string()).into())
}

/// GET /health
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        version: crate::VERSION.to_string(),
        sessions: state.sessions.len(),
    })
}

/// GET /metrics
async fn metrics(State(state): State<AppState>) -> Response {
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4")],
        state.metrics.export_prometheus().await,
    )
        .into_response()
}

/// GET /v1/roles
async fn list_roles() -> Json<Vec<RoleDefinition>> {
    Json(definitions())
}

/// POST /v1/sessions
async fn sign_in(
    State(state): State<AppState>,
    Json(req): Json<SignInRequest>,
) -> std::result::Result<(StatusCode, Json<SessionResponse>), AppError> {
    if req.user_id.trim().is_empty() {
        return Err(AccessError::InvalidInput("user_id is required".to_string()).into());
    }

    let view = state.sessions.sign_in(req.user_id).await?;
    info!("Session {} opened for {}", view.session_id, view.user_id);

    let Json(body) = session_response(&state, &view.session_id)?;
    Ok((StatusCode::CREATED, Json(body)))
}

/// GET /v1/sessions/:id
async fn get_session(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<SessionResponse> {
    session_response(&state, &id)
}

/// DELETE /v1/sessions/:id
async fn sign_out(State(state): State<AppState>, Path(id): Path<Uuid>) -> std::result::Result<StatusCode, AppError> {
    if state.sessions.sign_out(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AccessError::SessionNotFound(id.to_string()).into())
    }
}

/// POST /v1/sessions/:id/refresh
async fn refresh_session(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<SessionResponse> {
    state.sessions.resolve(&id).await?;
    session_response(&state, &id)
}

/// GET /v1/sessions/:id/permissions/:permission
async fn check_permission(
    State(state): State<AppState>,
    Path((id, permission)): Path<(Uuid, String)>,
) -> ApiResult<PermissionResponse> {
    if state.sessions.state(&id).is_none() {
        return Err(AccessError::SessionNotFound(id.to_string()).into());
    }

    let allowed = state.sessions.has_permission(&id, &permission);
    Ok(Json(PermissionResponse { permission, allowed }))
}

/// GET /v1/sessions/:id/dashboard
async fn dashboard(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<DashboardResponse> {
    let role_state = state
        .sessions
        .state(&id)
        .ok_or_else(|| AccessError::SessionNotFound(id.to_string()))?;
    let role = role_state.role();

    Ok(Json(DashboardResponse {
        state: role_state.name(),
        guard: guard_route(DASHBOARD_PATH, Some(role_state)),
        sections: role.map(visible_sections).unwrap_or_default(),
        summary: role.map(PermissionSummary::for_role),
    }))
}

/// GET /v1/staff
async fn list_staff(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Vec<StaffMember>> {
    let actor = acting_user(&state, &headers)?;
    Ok(Json(state.staff.list_staff(&actor).await?))
}

/// POST /v1/staff
async fn add_staff(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<AddStaffRequest>,
) -> std::result::Result<(StatusCode, Json<StaffMember>), AppError> {
    let actor = acting_user(&state, &headers)?;
    let role: Role = req.role.parse()?;
    let member = state.staff.add_staff(&actor, &req.email, role).await?;
    Ok((StatusCode::CREATED, Json(member)))
}

/// PUT /v1/staff/:user_id
async fn change_role(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(user_id): Path<UserId>,
    Json(req): Json<ChangeRoleRequest>,
) -> std::result::Result<StatusCode, AppError> {
    let actor = acting_user(&state, &headers)?;
    let role: Role = req.role.parse()?;
    state.staff.change_role(&actor, &user_id, role).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /v1/staff/:user_id
async fn remove_staff(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(user_id): Path<UserId>,
) -> std::result::Result<StatusCode, AppError> {
    let actor = acting_user(&state, &headers)?;
    state.staff.remove_staff(&actor, &user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Create the HTTP router with all endpoints
pub fn create_router(state: AppState, cors_enabled: bool) -> Router {
    let trace = TraceLayer::new_for_http()
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let router = Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route("/v1/roles", get(list_roles))
        .route("/v1/sessions", post(sign_in))
        .route("/v1/sessions/:id", get(get_session).delete(sign_out))
        .route("/v1/sessions/:id/refresh", post(refresh_session))
        .route("/v1/sessions/:id/permissions/:permission", get(check_permission))
        .route("/v1/sessions/:id/dashboard", get(dashboard))
        .route("/v1/staff", get(list_staff).post(add_staff))
        .route("/v1/staff/:user_id", put(change_role).delete(remove_staff));

    let router = if cors_enabled {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        router.layer(ServiceBuilder::new().layer(trace).layer(cors))
    } else {
        router.layer(ServiceBuilder::new().layer(trace))
    };

    router.with_state(state)
}
