//! Subjects API endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::db::{CreateSubjectRequest, Subject, UpdateSubjectRequest};
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};
use super::search::{filter_rows, SearchQuery};
use super::validation::{normalize_optional, validate_hex_color, validate_required_text};

fn validate_create_request(req: &CreateSubjectRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if let Err(e) = validate_required_text(&req.name, "name", 100) {
        errors.add("name", &e);
    }
    if let Err(e) = validate_hex_color(&req.color) {
        errors.add("color", &e);
    }

    errors.finish()
}

fn validate_update_request(req: &UpdateSubjectRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if let Some(ref name) = req.name {
        if let Err(e) = validate_required_text(name, "name", 100) {
            errors.add("name", &e);
        }
    }
    if let Err(e) = validate_hex_color(&req.color) {
        errors.add("color", &e);
    }

    errors.finish()
}

/// List all subjects, optionally filtered by `?q=`
pub async fn list_subjects(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Subject>>, ApiError> {
    let subjects =
        sqlx::query_as::<_, Subject>("SELECT * FROM subjects ORDER BY created_at DESC")
            .fetch_all(&state.db)
            .await?;

    let subjects = filter_rows(subjects, query.q.as_deref(), |s| {
        vec![Some(s.name.as_str())]
    });

    Ok(Json(subjects))
}

/// Create a new subject
pub async fn create_subject(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateSubjectRequest>,
) -> Result<(StatusCode, Json<Subject>), ApiError> {
    validate_create_request(&req)?;

    let now = chrono::Utc::now().to_rfc3339();

    let result = sqlx::query(
        r#"
        INSERT INTO subjects (name, icon, color, level, display_order, active, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(req.name.trim())
    .bind(normalize_optional(req.icon))
    .bind(normalize_optional(req.color))
    .bind(req.level)
    .bind(req.display_order)
    .bind(req.active)
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create subject: {}", e);
        ApiError::from(e)
    })?;

    let id = result.last_insert_rowid();
    let subject = sqlx::query_as::<_, Subject>("SELECT * FROM subjects WHERE id = ?")
        .bind(id)
        .fetch_one(&state.db)
        .await?;

    Ok((StatusCode::CREATED, Json(subject)))
}

/// Update a subject (partial patch)
pub async fn update_subject(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateSubjectRequest>,
) -> Result<Json<Subject>, ApiError> {
    validate_update_request(&req)?;

    let existing = sqlx::query_as::<_, Subject>("SELECT * FROM subjects WHERE id = ?")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Subject not found"))?;

    let name = req
        .name
        .map(|n| n.trim().to_string())
        .unwrap_or(existing.name);
    let icon = match req.icon {
        Some(i) => normalize_optional(Some(i)),
        None => existing.icon,
    };
    let color = match req.color {
        Some(c) => normalize_optional(Some(c)),
        None => existing.color,
    };
    let level = req.level.unwrap_or(existing.level);
    let display_order = req.display_order.unwrap_or(existing.display_order);
    let active = req.active.unwrap_or(existing.active);
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        UPDATE subjects SET
            name = ?, icon = ?, color = ?, level = ?,
            display_order = ?, active = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&name)
    .bind(&icon)
    .bind(&color)
    .bind(level)
    .bind(display_order)
    .bind(active)
    .bind(&now)
    .bind(id)
    .execute(&state.db)
    .await
    .map_err(|e| {
        tracing::error!("Failed to update subject: {}", e);
        ApiError::from(e)
    })?;

    let subject = sqlx::query_as::<_, Subject>("SELECT * FROM subjects WHERE id = ?")
        .bind(id)
        .fetch_one(&state.db)
        .await?;

    Ok(Json(subject))
}

/// Delete a subject
pub async fn delete_subject(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let result = sqlx::query("DELETE FROM subjects WHERE id = ?")
        .bind(id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Subject not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}
