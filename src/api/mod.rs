mod admin_users;
pub mod auth;
pub mod books;
pub mod error;
mod notifications;
mod requests;
mod search;
mod subjects;
mod system;
mod validation;
mod ws;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Auth routes (public, or guarded by their own extractors)
    let auth_routes = Router::new()
        .route("/login", post(auth::login))
        .route("/validate", get(auth::validate))
        .route("/logout", post(auth::logout))
        .route("/users", get(auth::list_users))
        .route("/me", get(auth::me))
        .route("/me", put(auth::switch_user));

    // WebSocket routes (auth handled in handlers via query param)
    let ws_routes = Router::new().route("/books/stream", get(ws::books_ws));

    // Protected API routes
    let api_routes = Router::new()
        // Books
        .route("/books", get(books::list_books))
        .route("/books", post(books::create_book))
        .route("/books/:id", put(books::update_book))
        .route("/books/:id", delete(books::delete_book))
        // Subjects
        .route("/subjects", get(subjects::list_subjects))
        .route("/subjects", post(subjects::create_subject))
        .route("/subjects/:id", put(subjects::update_subject))
        .route("/subjects/:id", delete(subjects::delete_subject))
        // Book requests
        .route("/book-requests", get(requests::list_requests))
        .route("/book-requests", post(requests::create_request))
        .route("/book-requests/:id", put(requests::update_request))
        .route("/book-requests/:id", delete(requests::delete_request))
        // Admin users
        .route("/admin-users", get(admin_users::list_admin_users))
        .route("/admin-users", post(admin_users::create_admin_user))
        .route("/admin-users/:id", put(admin_users::update_admin_user))
        .route("/admin-users/:id", delete(admin_users::delete_admin_user))
        // Dashboard and analytics
        .route("/dashboard", get(system::get_dashboard))
        .route("/analytics", get(system::get_analytics))
        // Notifications
        .route("/notifications", get(notifications::list_notifications))
        // Protected by auth
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ))
        // Merge WS routes (they handle their own auth)
        .merge(ws_routes);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/auth", auth_routes)
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
