//! WebSocket feed for the books collection.
//!
//! Clients receive the full book list as a snapshot on connect and again
//! after every mutation. Sending whole snapshots keeps clients correct even
//! if they miss an event while reconnecting.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::Arc;

use crate::db::BookResponse;
use crate::AppState;

use super::auth::find_session;
use super::books::fetch_all_books;

#[derive(Deserialize)]
pub struct WsAuthQuery {
    token: Option<String>,
}

/// Validate a token from query params. WebSocket clients cannot set an
/// Authorization header, so the token always arrives as `?token=`.
async fn validate_ws_token(state: &AppState, query: &WsAuthQuery) -> bool {
    let token = match &query.token {
        Some(t) => t,
        None => return false,
    };

    find_session(&state.db, token)
        .await
        .ok()
        .flatten()
        .is_some()
}

/// Build the snapshot message for the current book list.
async fn snapshot_message(state: &AppState) -> Result<String, sqlx::Error> {
    let books: Vec<BookResponse> = fetch_all_books(&state.db)
        .await?
        .into_iter()
        .map(BookResponse::from)
        .collect();

    Ok(serde_json::json!({
        "type": "snapshot",
        "books": books,
    })
    .to_string())
}

/// WebSocket endpoint for the live books feed
/// GET /api/books/stream
pub async fn books_ws(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<WsAuthQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    if !validate_ws_token(&state, &query).await {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(ws.on_upgrade(move |socket| handle_books_feed(socket, state)))
}

async fn handle_books_feed(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    // Subscribe before the initial snapshot so no mutation lands between them
    let mut events = state.book_events.subscribe();

    match snapshot_message(&state).await {
        Ok(msg) => {
            if sender.send(Message::Text(msg)).await.is_err() {
                return;
            }
        }
        Err(e) => {
            let error_msg = serde_json::json!({
                "type": "error",
                "message": format!("Database error: {}", e),
            });
            let _ = sender.send(Message::Text(error_msg.to_string())).await;
            return;
        }
    }

    loop {
        tokio::select! {
            event = events.recv() => {
                match event {
                    // Snapshots are rebuilt from the database, so a lagged
                    // receiver still ends up with the current list.
                    Ok(_) | Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => {
                        match snapshot_message(&state).await {
                            Ok(msg) => {
                                if sender.send(Message::Text(msg)).await.is_err() {
                                    return;
                                }
                            }
                            Err(e) => {
                                tracing::warn!("Failed to build books snapshot: {}", e);
                            }
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                        let _ = sender.send(Message::Text(r#"{"type":"end"}"#.to_string())).await;
                        return;
                    }
                }
            }

            // Handle incoming messages (for ping/pong or close)
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            return;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        return;
                    }
                    _ => {}
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::books::create_book;
    use crate::db::{BookLevel, CreateBookRequest};
    use axum::extract::{Json, State};

    async fn test_state() -> (Arc<AppState>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let pool = crate::db::init(dir.path()).await.unwrap();
        let state = Arc::new(AppState::new(crate::config::Config::default(), pool));
        (state, dir)
    }

    #[tokio::test]
    async fn rejects_missing_and_unknown_tokens() {
        let (state, _dir) = test_state().await;

        assert!(!validate_ws_token(&state, &WsAuthQuery { token: None }).await);
        assert!(
            !validate_ws_token(
                &state,
                &WsAuthQuery {
                    token: Some("bogus".to_string())
                }
            )
            .await
        );
    }

    #[tokio::test]
    async fn snapshot_reflects_current_rows() {
        let (state, _dir) = test_state().await;

        let empty = snapshot_message(&state).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&empty).unwrap();
        assert_eq!(parsed["type"], "snapshot");
        assert_eq!(parsed["books"].as_array().unwrap().len(), 0);

        create_book(
            State(state.clone()),
            Json(CreateBookRequest {
                title: "Advanced Physics".to_string(),
                author: "R. Muncaster".to_string(),
                level: BookLevel::A,
                class: None,
                subject: "Physics".to_string(),
                description: None,
                keywords: None,
                cover_url: None,
                file_url: None,
                featured: false,
            }),
        )
        .await
        .unwrap();

        let one = snapshot_message(&state).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&one).unwrap();
        assert_eq!(parsed["books"].as_array().unwrap().len(), 1);
        assert_eq!(parsed["books"][0]["title"], "Advanced Physics");

        assert_eq!(fetch_all_books(&state.db).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn snapshot_after_burst_shows_only_the_final_state() {
        let (state, _dir) = test_state().await;

        // Events pile up unconsumed while mutations run back to back
        let mut events = state.book_events.subscribe();

        let mut ids = Vec::new();
        for title in ["First", "Second", "Third"] {
            let (_, Json(book)) = create_book(
                State(state.clone()),
                Json(CreateBookRequest {
                    title: title.to_string(),
                    author: "Author".to_string(),
                    level: BookLevel::O,
                    class: None,
                    subject: "Mathematics".to_string(),
                    description: None,
                    keywords: None,
                    cover_url: None,
                    file_url: None,
                    featured: false,
                }),
            )
            .await
            .unwrap();
            ids.push(book.id);
        }
        crate::api::books::delete_book(State(state.clone()), axum::extract::Path(ids[0].clone()))
            .await
            .unwrap();

        // However many events queued, the snapshot is rebuilt from the
        // database and never mixes two fetches
        let snapshot = snapshot_message(&state).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&snapshot).unwrap();
        let titles: Vec<&str> = parsed["books"]
            .as_array()
            .unwrap()
            .iter()
            .map(|b| b["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles.len(), 2);
        assert!(!titles.contains(&"First"));

        let mut seen = 0;
        while events.try_recv().is_ok() {
            seen += 1;
        }
        assert_eq!(seen, 4);
    }
}
