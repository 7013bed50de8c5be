//! System-level API endpoints for dashboard and analytics data.
//!
//! The counters that come from the catalog are real; the usage figures are
//! the fixed demo numbers the admin panel has always shown.

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::db::{Book, BookResponse, SubjectLevel};
use crate::AppState;

use super::error::ApiError;

/// Demo figure: monthly active users shown on the dashboard.
const DEMO_ACTIVE_USERS: u32 = 1248;
/// Demo figure: month-over-month book growth percentage.
const DEMO_BOOKS_GROWTH: u32 = 12;
/// Demo figure: total downloads shown on the analytics page.
const DEMO_TOTAL_DOWNLOADS: u32 = 1248;
/// Demo figure: downloads growth percentage.
const DEMO_DOWNLOADS_GROWTH: u32 = 12;
/// Demo figure: active users shown on the analytics page.
const DEMO_ANALYTICS_ACTIVE_USERS: u32 = 892;
/// Demo figure: active users growth percentage.
const DEMO_USERS_GROWTH: u32 = 8;
/// Demo figure: most downloaded subject and its download count.
const DEMO_POPULAR_SUBJECT: &str = "Mathematics";
const DEMO_POPULAR_SUBJECT_DOWNLOADS: u32 = 284;

/// Dashboard statistics
#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    /// Total number of books in the catalog
    pub total_books: i64,
    /// Monthly active users (demo figure)
    pub active_users: u32,
    /// Book count growth percentage (demo figure)
    pub books_growth: u32,
}

/// Dashboard payload: real catalog counts plus the recent additions list
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub stats: DashboardStats,
    pub recent_books: Vec<BookResponse>,
}

/// A single analytics metric with its growth figure
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsMetric {
    pub value: u32,
    pub growth_percent: u32,
}

/// Subject counts per level, computed from the subjects table
#[derive(Debug, Clone, Serialize)]
pub struct SubjectLevelCounts {
    pub o_level: i64,
    pub a_level: i64,
    pub both: i64,
}

/// Analytics payload
#[derive(Debug, Serialize)]
pub struct AnalyticsResponse {
    pub total_downloads: AnalyticsMetric,
    pub active_users: AnalyticsMetric,
    pub popular_subject: String,
    pub popular_subject_downloads: u32,
    pub subjects_by_level: SubjectLevelCounts,
}

/// Get dashboard statistics and the five most recent books
/// GET /api/dashboard
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DashboardResponse>, ApiError> {
    let total_books: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
        .fetch_one(&state.db)
        .await?;

    let recent: Vec<Book> =
        sqlx::query_as("SELECT * FROM books ORDER BY created_at DESC LIMIT 5")
            .fetch_all(&state.db)
            .await?;

    Ok(Json(DashboardResponse {
        stats: DashboardStats {
            total_books,
            active_users: DEMO_ACTIVE_USERS,
            books_growth: DEMO_BOOKS_GROWTH,
        },
        recent_books: recent.into_iter().map(BookResponse::from).collect(),
    }))
}

async fn count_subjects_at_level(
    state: &AppState,
    level: SubjectLevel,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM subjects WHERE level = ?")
        .bind(level)
        .fetch_one(&state.db)
        .await
}

/// Get analytics data
/// GET /api/analytics
pub async fn get_analytics(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AnalyticsResponse>, ApiError> {
    let o_level = count_subjects_at_level(&state, SubjectLevel::O).await?;
    let a_level = count_subjects_at_level(&state, SubjectLevel::A).await?;
    let both = count_subjects_at_level(&state, SubjectLevel::Both).await?;

    Ok(Json(AnalyticsResponse {
        total_downloads: AnalyticsMetric {
            value: DEMO_TOTAL_DOWNLOADS,
            growth_percent: DEMO_DOWNLOADS_GROWTH,
        },
        active_users: AnalyticsMetric {
            value: DEMO_ANALYTICS_ACTIVE_USERS,
            growth_percent: DEMO_USERS_GROWTH,
        },
        popular_subject: DEMO_POPULAR_SUBJECT.to_string(),
        popular_subject_downloads: DEMO_POPULAR_SUBJECT_DOWNLOADS,
        subjects_by_level: SubjectLevelCounts {
            o_level,
            a_level,
            both,
        },
    }))
}
