/// Account management system
///
/// Handles registration, login, and token-backed sessions.

mod manager;

pub use manager::AccountManager;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Registration request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 150))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Registration response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub id: i64,
    pub username: String,
    pub is_active: bool,
}

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response carrying the credential for later requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Validated session from a request credential
#[derive(Debug, Clone)]
pub struct ValidatedSession {
    pub account_id: i64,
    pub session_id: String,
    pub is_staff: bool,
}
