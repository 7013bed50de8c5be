//! Notifications API endpoint.
//!
//! The notification drawer shows a fixed demo list; nothing is persisted and
//! read state lives in the client.

use axum::Json;
use serde::Serialize;

/// Severity of a notification, mirrored by the drawer's icon choice
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub id: &'static str,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: &'static str,
    pub message: &'static str,
    pub time: &'static str,
    pub read: bool,
}

/// The demo notifications shown in the admin panel drawer.
const DEMO_NOTIFICATIONS: [Notification; 4] = [
    Notification {
        id: "1",
        kind: NotificationKind::Success,
        title: "New book added",
        message: "Advanced Mathematics has been successfully added to the library.",
        time: "5 minutes ago",
        read: false,
    },
    Notification {
        id: "2",
        kind: NotificationKind::Info,
        title: "System update",
        message: "The admin panel has been updated to version 1.0.1.",
        time: "1 hour ago",
        read: false,
    },
    Notification {
        id: "3",
        kind: NotificationKind::Warning,
        title: "Storage warning",
        message: "You are using 85% of your storage quota.",
        time: "2 hours ago",
        read: false,
    },
    Notification {
        id: "4",
        kind: NotificationKind::Success,
        title: "Book updated",
        message: "Physics Fundamentals has been updated successfully.",
        time: "1 day ago",
        read: true,
    },
];

/// List the demo notifications
/// GET /api/notifications
pub async fn list_notifications() -> Json<Vec<Notification>> {
    Json(DEMO_NOTIFICATIONS.to_vec())
}
