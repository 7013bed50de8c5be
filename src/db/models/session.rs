//! Session model and login DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::roles::DemoUser;

/// A login session. Rows have no expiry; they persist until logout.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    pub id: String,
    pub token_hash: String,
    pub current_user_id: String,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: DemoUser,
}
