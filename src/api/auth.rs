//! Login sessions and the auth middleware.
//!
//! All session persistence goes through this module: handlers elsewhere never
//! touch the sessions table or parse tokens themselves.

use axum::{
    async_trait,
    body::Body,
    extract::{FromRequestParts, State},
    http::{request::Parts, HeaderMap, Request, StatusCode},
    middleware::Next,
    response::Response,
    Json,
};
use rand::Rng;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::db::{DbPool, LoginRequest, LoginResponse, Session};
use crate::roles::{DemoUser, RolePermissions, DEMO_USERS};
use crate::AppState;

use super::error::ApiError;
use serde::{Deserialize, Serialize};

/// Generate a random token
fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();
    hex::encode(bytes)
}

/// Hash a token for storage
fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Constant-time comparison of the submitted password against the configured
/// admin password.
fn password_matches(configured: &str, provided: &str) -> bool {
    let configured = configured.as_bytes();
    let provided = provided.as_bytes();
    configured.len() == provided.len() && bool::from(configured.ct_eq(provided))
}

/// Extract the bearer token from request headers
fn extract_token(headers: &HeaderMap) -> Option<String> {
    let auth_header = headers.get("Authorization").and_then(|h| h.to_str().ok())?;
    auth_header
        .strip_prefix("Bearer ")
        .map(|token| token.to_string())
}

/// Extract a token from the query string. WebSocket clients cannot set custom
/// headers, so those routes pass `?token=`.
fn token_from_query(query: Option<&str>) -> Option<String> {
    query?.split('&').find_map(|pair| {
        let mut parts = pair.splitn(2, '=');
        let key = parts.next()?;
        let value = parts.next()?;
        if key == "token" {
            Some(value.to_string())
        } else {
            None
        }
    })
}

// -------------------------------------------------------------------------
// Session store
// -------------------------------------------------------------------------

/// Create a session row for a fresh login and return the cleartext token.
async fn create_session(pool: &DbPool, user: &DemoUser) -> Result<String, sqlx::Error> {
    let token = generate_token();
    let token_hash = hash_token(&token);
    let session_id = uuid::Uuid::new_v4().to_string();
    let created_at = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        "INSERT INTO sessions (id, token_hash, current_user_id, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(&session_id)
    .bind(&token_hash)
    .bind(user.id)
    .bind(&created_at)
    .execute(pool)
    .await?;

    Ok(token)
}

/// Look up the session for a token. Unknown tokens yield Ok(None); only a
/// database failure is an error.
pub async fn find_session(pool: &DbPool, token: &str) -> Result<Option<Session>, sqlx::Error> {
    let token_hash = hash_token(token);
    sqlx::query_as("SELECT * FROM sessions WHERE token_hash = ?")
        .bind(&token_hash)
        .fetch_optional(pool)
        .await
}

/// Delete the session for a token. Deleting an unknown token is a no-op.
async fn delete_session(pool: &DbPool, token: &str) -> Result<(), sqlx::Error> {
    let token_hash = hash_token(token);
    sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
        .bind(&token_hash)
        .execute(pool)
        .await?;
    Ok(())
}

/// Point a session at a different demo identity.
async fn set_session_identity(
    pool: &DbPool,
    session_id: &str,
    user: &DemoUser,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE sessions SET current_user_id = ? WHERE id = ?")
        .bind(user.id)
        .bind(session_id)
        .execute(pool)
        .await?;
    Ok(())
}

// -------------------------------------------------------------------------
// Handlers
// -------------------------------------------------------------------------

/// Login endpoint
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    if !password_matches(&state.config.auth.admin_password, &request.password) {
        return Err(ApiError::unauthorized("Invalid password"));
    }

    let user = DemoUser::default_identity();
    let token = create_session(&state.db, &user).await?;

    tracing::info!("Admin login succeeded");

    Ok(Json(LoginResponse { token, user }))
}

/// Validate token endpoint
pub async fn validate(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let token = match extract_token(&headers) {
        Some(token) => token,
        None => return Err(ApiError::unauthorized("Not authenticated")),
    };

    match find_session(&state.db, &token).await? {
        Some(_) => Ok(StatusCode::OK),
        None => Err(ApiError::unauthorized("Not authenticated")),
    }
}

/// Logout endpoint - destroys the session
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    if let Some(token) = extract_token(&headers) {
        delete_session(&state.db, &token).await?;
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Auth middleware that validates session tokens
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    // Authorization header first, query parameter as a fallback
    let token = match extract_token(request.headers()) {
        Some(token) => token,
        None => token_from_query(request.uri().query()).ok_or(StatusCode::UNAUTHORIZED)?,
    };

    let session = find_session(&state.db, &token)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    match session {
        Some(_) => Ok(next.run(request).await),
        None => Err(StatusCode::UNAUTHORIZED),
    }
}

/// Response for the current-identity endpoints
#[derive(Debug, Serialize)]
pub struct CurrentUserResponse {
    pub user: DemoUser,
    pub permissions: RolePermissions,
}

/// Request to switch the session to another demo identity
#[derive(Debug, Deserialize)]
pub struct SwitchUserRequest {
    pub user_id: String,
}

/// List the selectable demo identities
pub async fn list_users() -> Json<Vec<DemoUser>> {
    Json(DEMO_USERS.to_vec())
}

/// Get the session's current identity and its permissions
pub async fn me(user: CurrentUser) -> Json<CurrentUserResponse> {
    Json(CurrentUserResponse {
        user: user.0,
        permissions: user.0.role.permissions(),
    })
}

/// Switch the session's current identity
pub async fn switch_user(
    State(state): State<Arc<AppState>>,
    session: CurrentSession,
    Json(request): Json<SwitchUserRequest>,
) -> Result<Json<CurrentUserResponse>, ApiError> {
    let user = DemoUser::by_id(&request.user_id)
        .ok_or_else(|| ApiError::bad_request("Unknown user id"))?;

    set_session_identity(&state.db, &session.0.id, &user).await?;

    Ok(Json(CurrentUserResponse {
        permissions: user.role.permissions(),
        user,
    }))
}

// -------------------------------------------------------------------------
// Extractors
// -------------------------------------------------------------------------

/// Extractor for the session row behind the request's token.
pub struct CurrentSession(pub Session);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentSession {
    type Rejection = StatusCode;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = match extract_token(&parts.headers) {
            Some(token) => token,
            None => token_from_query(parts.uri.query()).ok_or(StatusCode::UNAUTHORIZED)?,
        };

        let session = find_session(&state.db, &token)
            .await
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

        session.map(CurrentSession).ok_or(StatusCode::UNAUTHORIZED)
    }
}

/// Extractor for the demo identity the session currently points at.
pub struct CurrentUser(pub DemoUser);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = StatusCode;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let CurrentSession(session) = CurrentSession::from_request_parts(parts, state).await?;
        // A stored id outside the demo set means the session is unusable
        DemoUser::by_id(&session.current_user_id)
            .map(CurrentUser)
            .ok_or(StatusCode::UNAUTHORIZED)
    }
}
