//! Book request models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Review state of a student book request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
    Fulfilled,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BookRequest {
    pub id: String,
    pub book_title: String,
    pub author: String,
    pub subject: String,
    pub class_level: String,
    pub reason: String,
    pub status: RequestStatus,
    pub student_name: Option<String>,
    pub student_email: Option<String>,
    pub date_requested: String,
    pub date_updated: String,
    pub admin_notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateBookRequestRequest {
    pub book_title: String,
    pub author: String,
    pub subject: String,
    pub class_level: String,
    pub reason: String,
    pub student_name: Option<String>,
    pub student_email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateBookRequestRequest {
    pub book_title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub class_level: Option<String>,
    pub reason: Option<String>,
    pub status: Option<RequestStatus>,
    pub student_name: Option<String>,
    pub student_email: Option<String>,
    pub admin_notes: Option<String>,
}
