//! Book request API endpoints.
//!
//! Requests are submitted by students asking for a title the library does not
//! hold yet, then worked through the PENDING -> APPROVED/REJECTED -> FULFILLED
//! lifecycle by staff. `date_updated` is bumped on every patch.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::db::{BookRequest, CreateBookRequestRequest, RequestStatus, UpdateBookRequestRequest};
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};
use super::search::{filter_rows, SearchQuery};
use super::validation::{
    normalize_optional, validate_optional_email, validate_required_text, validate_uuid,
};

fn validate_create_request(req: &CreateBookRequestRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if let Err(e) = validate_required_text(&req.book_title, "book_title", 200) {
        errors.add("book_title", &e);
    }
    if let Err(e) = validate_required_text(&req.author, "author", 200) {
        errors.add("author", &e);
    }
    if let Err(e) = validate_required_text(&req.subject, "subject", 100) {
        errors.add("subject", &e);
    }
    if let Err(e) = validate_required_text(&req.class_level, "class_level", 50) {
        errors.add("class_level", &e);
    }
    if let Err(e) = validate_required_text(&req.reason, "reason", 1000) {
        errors.add("reason", &e);
    }
    if let Err(e) = validate_optional_email(&req.student_email) {
        errors.add("student_email", &e);
    }

    errors.finish()
}

fn validate_update_request(req: &UpdateBookRequestRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if let Some(ref title) = req.book_title {
        if let Err(e) = validate_required_text(title, "book_title", 200) {
            errors.add("book_title", &e);
        }
    }
    if let Some(ref author) = req.author {
        if let Err(e) = validate_required_text(author, "author", 200) {
            errors.add("author", &e);
        }
    }
    if let Err(e) = validate_optional_email(&req.student_email) {
        errors.add("student_email", &e);
    }

    errors.finish()
}

/// List all book requests, optionally filtered by `?q=`
pub async fn list_requests(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<BookRequest>>, ApiError> {
    let requests =
        sqlx::query_as::<_, BookRequest>("SELECT * FROM book_requests ORDER BY date_requested DESC")
            .fetch_all(&state.db)
            .await?;

    let requests = filter_rows(requests, query.q.as_deref(), |r| {
        vec![
            Some(r.book_title.as_str()),
            Some(r.author.as_str()),
            r.student_name.as_deref(),
        ]
    });

    Ok(Json(requests))
}

/// Submit a new book request. Fresh requests always start PENDING.
pub async fn create_request(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateBookRequestRequest>,
) -> Result<(StatusCode, Json<BookRequest>), ApiError> {
    validate_create_request(&req)?;

    let id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO book_requests (
            id, book_title, author, subject, class_level, reason,
            student_name, student_email, status, admin_notes,
            date_requested, date_updated
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, NULL, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(req.book_title.trim())
    .bind(req.author.trim())
    .bind(req.subject.trim())
    .bind(req.class_level.trim())
    .bind(req.reason.trim())
    .bind(normalize_optional(req.student_name))
    .bind(normalize_optional(req.student_email))
    .bind(RequestStatus::Pending)
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create book request: {}", e);
        ApiError::from(e)
    })?;

    let request = sqlx::query_as::<_, BookRequest>("SELECT * FROM book_requests WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    Ok((StatusCode::CREATED, Json(request)))
}

/// Update a book request (partial patch). Any patch bumps `date_updated`,
/// so status changes and note edits both show as fresh activity.
pub async fn update_request(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateBookRequestRequest>,
) -> Result<Json<BookRequest>, ApiError> {
    validate_uuid(&id, "request_id").map_err(|e| ApiError::validation_field("request_id", &e))?;
    validate_update_request(&req)?;

    let existing = sqlx::query_as::<_, BookRequest>("SELECT * FROM book_requests WHERE id = ?")
        .bind(&id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Book request not found"))?;

    // Merge the patch over the stored row. Optional text fields submitted as
    // empty strings clear to NULL; fields absent keep their stored value.
    let book_title = req
        .book_title
        .map(|t| t.trim().to_string())
        .unwrap_or(existing.book_title);
    let author = req
        .author
        .map(|a| a.trim().to_string())
        .unwrap_or(existing.author);
    let subject = req
        .subject
        .map(|s| s.trim().to_string())
        .unwrap_or(existing.subject);
    let class_level = req
        .class_level
        .map(|c| c.trim().to_string())
        .unwrap_or(existing.class_level);
    let reason = req
        .reason
        .map(|r| r.trim().to_string())
        .unwrap_or(existing.reason);
    let student_name = match req.student_name {
        Some(n) => normalize_optional(Some(n)),
        None => existing.student_name,
    };
    let student_email = match req.student_email {
        Some(e) => normalize_optional(Some(e)),
        None => existing.student_email,
    };
    let status = req.status.unwrap_or(existing.status);
    let admin_notes = match req.admin_notes {
        Some(n) => normalize_optional(Some(n)),
        None => existing.admin_notes,
    };
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        UPDATE book_requests SET
            book_title = ?, author = ?, subject = ?, class_level = ?, reason = ?,
            student_name = ?, student_email = ?, status = ?, admin_notes = ?,
            date_updated = ?
        WHERE id = ?
        "#,
    )
    .bind(&book_title)
    .bind(&author)
    .bind(&subject)
    .bind(&class_level)
    .bind(&reason)
    .bind(&student_name)
    .bind(&student_email)
    .bind(status)
    .bind(&admin_notes)
    .bind(&now)
    .bind(&id)
    .execute(&state.db)
    .await
    .map_err(|e| {
        tracing::error!("Failed to update book request {}: {}", id, e);
        ApiError::from(e)
    })?;

    let request = sqlx::query_as::<_, BookRequest>("SELECT * FROM book_requests WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    Ok(Json(request))
}

/// Delete a book request
pub async fn delete_request(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let result = sqlx::query("DELETE FROM book_requests WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Book request not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_state() -> (Arc<AppState>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let pool = crate::db::init(dir.path()).await.unwrap();
        let state = Arc::new(AppState::new(crate::config::Config::default(), pool));
        (state, dir)
    }

    fn sample_request() -> CreateBookRequestRequest {
        CreateBookRequestRequest {
            book_title: "Understanding Pure Mathematics".to_string(),
            author: "A. J. Sadler".to_string(),
            subject: "Mathematics".to_string(),
            class_level: "Form 5".to_string(),
            reason: "Needed for the upcoming exam series".to_string(),
            student_name: Some("Kwame Mensah".to_string()),
            student_email: Some("kwame@students.wnss.edu".to_string()),
        }
    }

    #[tokio::test]
    async fn new_requests_start_pending() {
        let (state, _dir) = test_state().await;

        let (status, Json(request)) =
            create_request(State(state), Json(sample_request())).await.unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(request.status, RequestStatus::Pending);
        assert_eq!(request.admin_notes, None);
        assert_eq!(request.date_requested, request.date_updated);
    }

    #[tokio::test]
    async fn rejects_blank_reason_and_bad_email() {
        let (state, _dir) = test_state().await;

        let mut req = sample_request();
        req.reason = "   ".to_string();
        req.student_email = Some("not-an-email".to_string());

        let result = create_request(State(state), Json(req)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn approving_sets_status_and_keeps_fields() {
        let (state, _dir) = test_state().await;
        let (_, Json(request)) =
            create_request(State(state.clone()), Json(sample_request())).await.unwrap();

        let Json(updated) = update_request(
            State(state.clone()),
            Path(request.id.clone()),
            Json(UpdateBookRequestRequest {
                book_title: None,
                author: None,
                subject: None,
                class_level: None,
                reason: None,
                student_name: None,
                student_email: None,
                status: Some(RequestStatus::Approved),
                admin_notes: Some("Ordering two copies".to_string()),
            }),
        )
        .await
        .unwrap();

        assert_eq!(updated.status, RequestStatus::Approved);
        assert_eq!(updated.admin_notes, Some("Ordering two copies".to_string()));
        assert_eq!(updated.book_title, "Understanding Pure Mathematics");
    }

    #[tokio::test]
    async fn patch_clears_student_email_with_empty_string() {
        let (state, _dir) = test_state().await;
        let (_, Json(request)) =
            create_request(State(state.clone()), Json(sample_request())).await.unwrap();

        let Json(updated) = update_request(
            State(state),
            Path(request.id),
            Json(UpdateBookRequestRequest {
                book_title: None,
                author: None,
                subject: None,
                class_level: None,
                reason: None,
                student_name: None,
                student_email: Some("".to_string()),
                status: None,
                admin_notes: None,
            }),
        )
        .await
        .unwrap();

        assert_eq!(updated.student_email, None);
        assert_eq!(updated.student_name, Some("Kwame Mensah".to_string()));
    }

    #[tokio::test]
    async fn search_matches_student_name() {
        let (state, _dir) = test_state().await;
        create_request(State(state.clone()), Json(sample_request()))
            .await
            .unwrap();

        let mut other = sample_request();
        other.book_title = "Organic Chemistry".to_string();
        other.student_name = Some("Ama Owusu".to_string());
        create_request(State(state.clone()), Json(other)).await.unwrap();

        let Json(hits) = list_requests(
            State(state),
            Query(SearchQuery {
                q: Some("owusu".to_string()),
            }),
        )
        .await
        .unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].book_title, "Organic Chemistry");
    }

    #[tokio::test]
    async fn delete_unknown_request_is_404() {
        let (state, _dir) = test_state().await;
        let result = delete_request(
            State(state),
            Path("550e8400-e29b-41d4-a716-446655440000".to_string()),
        )
        .await;
        assert!(result.is_err());
    }
}
