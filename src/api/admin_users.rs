//! Admin user API endpoints.
//!
//! These rows describe the staff accounts shown in the settings screens.
//! Authentication itself runs on the shared admin password, so nothing here
//! checks credentials; the email UNIQUE constraint is the only identity rule.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::db::{AdminUser, CreateAdminUserRequest, UpdateAdminUserRequest};
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};
use super::search::{filter_rows, SearchQuery};
use super::validation::{validate_email, validate_required_text, validate_uuid};

fn validate_create_request(req: &CreateAdminUserRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if let Err(e) = validate_email(&req.email) {
        errors.add("email", &e);
    }
    if let Err(e) = validate_required_text(&req.full_name, "full_name", 100) {
        errors.add("full_name", &e);
    }

    errors.finish()
}

fn validate_update_request(req: &UpdateAdminUserRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if let Some(ref email) = req.email {
        if let Err(e) = validate_email(email) {
            errors.add("email", &e);
        }
    }
    if let Some(ref full_name) = req.full_name {
        if let Err(e) = validate_required_text(full_name, "full_name", 100) {
            errors.add("full_name", &e);
        }
    }

    errors.finish()
}

/// List all admin users, optionally filtered by `?q=`
pub async fn list_admin_users(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<AdminUser>>, ApiError> {
    let users =
        sqlx::query_as::<_, AdminUser>("SELECT * FROM admin_users ORDER BY created_at DESC")
            .fetch_all(&state.db)
            .await?;

    let users = filter_rows(users, query.q.as_deref(), |u| {
        vec![Some(u.email.as_str()), Some(u.full_name.as_str())]
    });

    Ok(Json(users))
}

/// Create a new admin user. A duplicate email is a 409.
pub async fn create_admin_user(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateAdminUserRequest>,
) -> Result<(StatusCode, Json<AdminUser>), ApiError> {
    validate_create_request(&req)?;

    let id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO admin_users (id, email, full_name, role, is_active, last_login, created_at)
        VALUES (?, ?, ?, ?, ?, NULL, ?)
        "#,
    )
    .bind(&id)
    .bind(req.email.trim())
    .bind(req.full_name.trim())
    .bind(req.role)
    .bind(req.is_active)
    .bind(&now)
    .execute(&state.db)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create admin user: {}", e);
        ApiError::from(e)
    })?;

    let user = sqlx::query_as::<_, AdminUser>("SELECT * FROM admin_users WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// Update an admin user (partial patch)
pub async fn update_admin_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateAdminUserRequest>,
) -> Result<Json<AdminUser>, ApiError> {
    validate_uuid(&id, "user_id").map_err(|e| ApiError::validation_field("user_id", &e))?;
    validate_update_request(&req)?;

    let existing = sqlx::query_as::<_, AdminUser>("SELECT * FROM admin_users WHERE id = ?")
        .bind(&id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Admin user not found"))?;

    let email = req
        .email
        .map(|e| e.trim().to_string())
        .unwrap_or(existing.email);
    let full_name = req
        .full_name
        .map(|n| n.trim().to_string())
        .unwrap_or(existing.full_name);
    let role = req.role.unwrap_or(existing.role);
    let is_active = req.is_active.unwrap_or(existing.is_active);
    let last_login = match req.last_login {
        Some(l) => Some(l),
        None => existing.last_login,
    };

    sqlx::query(
        r#"
        UPDATE admin_users SET
            email = ?, full_name = ?, role = ?, is_active = ?, last_login = ?
        WHERE id = ?
        "#,
    )
    .bind(&email)
    .bind(&full_name)
    .bind(role)
    .bind(is_active)
    .bind(&last_login)
    .bind(&id)
    .execute(&state.db)
    .await
    .map_err(|e| {
        tracing::error!("Failed to update admin user {}: {}", id, e);
        ApiError::from(e)
    })?;

    let user = sqlx::query_as::<_, AdminUser>("SELECT * FROM admin_users WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    Ok(Json(user))
}

/// Delete an admin user
pub async fn delete_admin_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let result = sqlx::query("DELETE FROM admin_users WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Admin user not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}
