//! Books API endpoints.
//!
//! Every successful mutation broadcasts a change event that the snapshot feed
//! in `ws` turns into a fresh full listing for connected clients.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{Book, BookResponse, CreateBookRequest, UpdateBookRequest};
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};
use super::search::{filter_rows, SearchQuery};
use super::validation::{normalize_optional, validate_required_text, validate_uuid};

/// What happened to a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BookChange {
    Created,
    Updated,
    Deleted,
}

/// Change event broadcast after each successful books mutation.
#[derive(Debug, Clone, Serialize)]
pub struct BookEvent {
    pub change: BookChange,
    pub book_id: String,
}

fn broadcast_change(state: &AppState, change: BookChange, book_id: &str) {
    // No subscribers is fine
    let _ = state.book_events.send(BookEvent {
        change,
        book_id: book_id.to_string(),
    });
}

/// Convert comma-separated keywords into the stored JSON array form.
/// Splits on commas, trims each entry, drops empties. An empty result is
/// stored as NULL, not as an empty list.
fn keywords_to_stored(input: Option<&str>) -> Option<String> {
    let raw = input?;
    let words: Vec<String> = raw
        .split(',')
        .map(|w| w.trim())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_string())
        .collect();

    if words.is_empty() {
        None
    } else {
        serde_json::to_string(&words).ok()
    }
}

/// Validate a CreateBookRequest
fn validate_create_request(req: &CreateBookRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if let Err(e) = validate_required_text(&req.title, "title", 200) {
        errors.add("title", &e);
    }
    if let Err(e) = validate_required_text(&req.author, "author", 200) {
        errors.add("author", &e);
    }
    if let Err(e) = validate_required_text(&req.subject, "subject", 100) {
        errors.add("subject", &e);
    }

    errors.finish()
}

/// Validate an UpdateBookRequest
fn validate_update_request(req: &UpdateBookRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if let Some(ref title) = req.title {
        if let Err(e) = validate_required_text(title, "title", 200) {
            errors.add("title", &e);
        }
    }
    if let Some(ref author) = req.author {
        if let Err(e) = validate_required_text(author, "author", 200) {
            errors.add("author", &e);
        }
    }
    if let Some(ref subject) = req.subject {
        if let Err(e) = validate_required_text(subject, "subject", 100) {
            errors.add("subject", &e);
        }
    }

    errors.finish()
}

/// Fetch the full book list, newest first.
pub async fn fetch_all_books(pool: &sqlx::SqlitePool) -> Result<Vec<Book>, sqlx::Error> {
    sqlx::query_as::<_, Book>("SELECT * FROM books ORDER BY created_at DESC")
        .fetch_all(pool)
        .await
}

/// List all books, optionally filtered by `?q=`
pub async fn list_books(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<BookResponse>>, ApiError> {
    let books = fetch_all_books(&state.db).await?;

    let books = filter_rows(books, query.q.as_deref(), |b| {
        vec![
            Some(b.title.as_str()),
            Some(b.author.as_str()),
            Some(b.subject.as_str()),
        ]
    });

    Ok(Json(books.into_iter().map(BookResponse::from).collect()))
}

/// Create a new book
pub async fn create_book(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateBookRequest>,
) -> Result<(StatusCode, Json<BookResponse>), ApiError> {
    validate_create_request(&req)?;

    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();
    let keywords = keywords_to_stored(req.keywords.as_deref());

    sqlx::query(
        r#"
        INSERT INTO books (id, title, author, level, class, subject, description,
                           keywords, cover_url, file_url, featured, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(req.title.trim())
    .bind(req.author.trim())
    .bind(req.level)
    .bind(normalize_optional(req.class))
    .bind(req.subject.trim())
    .bind(normalize_optional(req.description))
    .bind(&keywords)
    .bind(normalize_optional(req.cover_url))
    .bind(normalize_optional(req.file_url))
    .bind(req.featured)
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create book: {}", e);
        ApiError::from(e)
    })?;

    let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    broadcast_change(&state, BookChange::Created, &book.id);

    Ok((StatusCode::CREATED, Json(BookResponse::from(book))))
}

/// Update a book (partial patch)
pub async fn update_book(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateBookRequest>,
) -> Result<Json<BookResponse>, ApiError> {
    if let Err(e) = validate_uuid(&id, "book_id") {
        return Err(ApiError::validation_field("book_id", e));
    }

    validate_update_request(&req)?;

    let existing = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = ?")
        .bind(&id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Book not found"))?;

    // Merge the patch over the stored row. Optional text fields submitted as
    // empty strings clear to NULL; fields absent from the patch keep their
    // stored value.
    let title = req
        .title
        .map(|t| t.trim().to_string())
        .unwrap_or(existing.title);
    let author = req
        .author
        .map(|a| a.trim().to_string())
        .unwrap_or(existing.author);
    let subject = req
        .subject
        .map(|s| s.trim().to_string())
        .unwrap_or(existing.subject);
    let level = req.level.unwrap_or(existing.level);
    let class = match req.class {
        Some(c) => normalize_optional(Some(c)),
        None => existing.class,
    };
    let description = match req.description {
        Some(d) => normalize_optional(Some(d)),
        None => existing.description,
    };
    let keywords = match req.keywords {
        Some(k) => keywords_to_stored(Some(&k)),
        None => existing.keywords,
    };
    let cover_url = match req.cover_url {
        Some(u) => normalize_optional(Some(u)),
        None => existing.cover_url,
    };
    let file_url = match req.file_url {
        Some(u) => normalize_optional(Some(u)),
        None => existing.file_url,
    };
    let featured = req.featured.unwrap_or(existing.featured);
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        UPDATE books SET
            title = ?, author = ?, level = ?, class = ?, subject = ?,
            description = ?, keywords = ?, cover_url = ?, file_url = ?,
            featured = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&title)
    .bind(&author)
    .bind(level)
    .bind(&class)
    .bind(&subject)
    .bind(&description)
    .bind(&keywords)
    .bind(&cover_url)
    .bind(&file_url)
    .bind(featured)
    .bind(&now)
    .bind(&id)
    .execute(&state.db)
    .await
    .map_err(|e| {
        tracing::error!("Failed to update book: {}", e);
        ApiError::from(e)
    })?;

    let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    broadcast_change(&state, BookChange::Updated, &book.id);

    Ok(Json(BookResponse::from(book)))
}

/// Delete a book
pub async fn delete_book(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if let Err(e) = validate_uuid(&id, "book_id") {
        return Err(ApiError::validation_field("book_id", e));
    }

    let result = sqlx::query("DELETE FROM books WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Book not found"));
    }

    broadcast_change(&state, BookChange::Deleted, &id);

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::BookLevel;

    #[test]
    fn keywords_split_trim_and_drop_empties() {
        assert_eq!(
            keywords_to_stored(Some("algebra, geometry ,,  trig")),
            Some("[\"algebra\",\"geometry\",\"trig\"]".to_string())
        );
        assert_eq!(keywords_to_stored(Some("")), None);
        assert_eq!(keywords_to_stored(Some(" , , ")), None);
        assert_eq!(keywords_to_stored(None), None);
    }

    async fn test_state() -> (Arc<AppState>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let pool = crate::db::init(dir.path()).await.unwrap();
        let state = Arc::new(AppState::new(crate::config::Config::default(), pool));
        (state, dir)
    }

    fn sample_request() -> CreateBookRequest {
        CreateBookRequest {
            title: "Advanced Level Physics".to_string(),
            author: "Nelkon & Parker".to_string(),
            level: BookLevel::A,
            class: Some("".to_string()),
            subject: "Physics".to_string(),
            description: None,
            keywords: Some("mechanics, waves".to_string()),
            cover_url: Some("  ".to_string()),
            file_url: None,
            featured: true,
        }
    }

    #[tokio::test]
    async fn create_then_list_round_trips_with_normalization() {
        let (state, _dir) = test_state().await;

        let (status, Json(created)) =
            create_book(State(state.clone()), Json(sample_request()))
                .await
                .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created.title, "Advanced Level Physics");
        // Empty-string optionals land as NULL
        assert_eq!(created.class, None);
        assert_eq!(created.cover_url, None);
        assert_eq!(
            created.keywords,
            Some(vec!["mechanics".to_string(), "waves".to_string()])
        );

        let Json(listed) = list_books(State(state.clone()), Query(SearchQuery::default()))
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, created.id);
        assert!(listed[0].featured);
    }

    #[tokio::test]
    async fn search_filters_across_title_author_subject() {
        let (state, _dir) = test_state().await;
        create_book(State(state.clone()), Json(sample_request()))
            .await
            .unwrap();
        let mut other = sample_request();
        other.title = "Organic Chemistry".to_string();
        other.author = "Morrison".to_string();
        other.subject = "Chemistry".to_string();
        create_book(State(state.clone()), Json(other)).await.unwrap();

        let q = |s: &str| SearchQuery {
            q: Some(s.to_string()),
        };

        let Json(hits) = list_books(State(state.clone()), Query(q("nelkon")))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].author, "Nelkon & Parker");

        let Json(hits) = list_books(State(state.clone()), Query(q("CHEMISTRY")))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);

        let Json(hits) = list_books(State(state.clone()), Query(SearchQuery { q: None }))
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn update_patches_and_clears_optionals() {
        let (state, _dir) = test_state().await;
        let (_, Json(created)) = create_book(State(state.clone()), Json(sample_request()))
            .await
            .unwrap();

        let patch = UpdateBookRequest {
            title: Some("Advanced Level Physics, 7th ed.".to_string()),
            author: None,
            level: None,
            class: None,
            subject: None,
            description: Some("Standard sixth-form text".to_string()),
            keywords: Some("".to_string()),
            cover_url: None,
            file_url: None,
            featured: Some(false),
        };

        let Json(updated) = update_book(
            State(state.clone()),
            Path(created.id.clone()),
            Json(patch),
        )
        .await
        .unwrap();

        assert_eq!(updated.title, "Advanced Level Physics, 7th ed.");
        assert_eq!(updated.author, "Nelkon & Parker");
        assert_eq!(
            updated.description,
            Some("Standard sixth-form text".to_string())
        );
        // Empty keyword patch clears the stored list
        assert_eq!(updated.keywords, None);
        assert!(!updated.featured);
        assert_ne!(updated.updated_at, created.updated_at);
    }

    #[tokio::test]
    async fn delete_removes_exactly_one_and_404s_on_unknown() {
        let (state, _dir) = test_state().await;
        let (_, Json(a)) = create_book(State(state.clone()), Json(sample_request()))
            .await
            .unwrap();
        let mut other = sample_request();
        other.title = "Second".to_string();
        let (_, Json(b)) = create_book(State(state.clone()), Json(other)).await.unwrap();

        let status = delete_book(State(state.clone()), Path(a.id.clone()))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        let Json(listed) = list_books(State(state.clone()), Query(SearchQuery::default()))
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, b.id);

        // Deleting again is a 404
        assert!(delete_book(State(state.clone()), Path(a.id)).await.is_err());
    }

    #[tokio::test]
    async fn mutations_broadcast_change_events() {
        let (state, _dir) = test_state().await;
        let mut events = state.book_events.subscribe();

        let (_, Json(created)) = create_book(State(state.clone()), Json(sample_request()))
            .await
            .unwrap();

        let event = events.recv().await.unwrap();
        assert_eq!(event.change, BookChange::Created);
        assert_eq!(event.book_id, created.id);

        delete_book(State(state.clone()), Path(created.id.clone()))
            .await
            .unwrap();
        let event = events.recv().await.unwrap();
        assert_eq!(event.change, BookChange::Deleted);
        assert_eq!(event.book_id, created.id);
    }
}
