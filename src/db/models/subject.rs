//! Subject models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Level a subject is offered at. `Both` covers O and A level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum SubjectLevel {
    O,
    A,
    Both,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Subject {
    pub id: i64,
    pub name: String,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub level: SubjectLevel,
    pub display_order: i64,
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateSubjectRequest {
    pub name: String,
    pub icon: Option<String>,
    pub color: Option<String>,
    #[serde(default = "default_subject_level")]
    pub level: SubjectLevel,
    #[serde(default)]
    pub display_order: i64,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_subject_level() -> SubjectLevel {
    SubjectLevel::Both
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct UpdateSubjectRequest {
    pub name: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub level: Option<SubjectLevel>,
    pub display_order: Option<i64>,
    pub active: Option<bool>,
}
