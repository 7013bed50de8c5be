//! Admin user models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum AdminRole {
    Admin,
    Moderator,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AdminUser {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub role: AdminRole,
    pub is_active: bool,
    pub last_login: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateAdminUserRequest {
    pub email: String,
    pub full_name: String,
    #[serde(default = "default_admin_role")]
    pub role: AdminRole,
    #[serde(default = "default_is_active")]
    pub is_active: bool,
}

fn default_admin_role() -> AdminRole {
    AdminRole::Moderator
}

fn default_is_active() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct UpdateAdminUserRequest {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub role: Option<AdminRole>,
    pub is_active: Option<bool>,
    pub last_login: Option<String>,
}
