//! Client (smart refrigerator) authentication DTOs
//!
//! Request/response bodies for `/api/client/register`, `/api/client/login`
//! and `/api/client/refresh`.

use serde::{Deserialize, Serialize};

/// Device registration request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterClientRequest {
    pub device_id: String,
    pub password: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub device_id: String,
    pub password: String,
}

/// Login response: a short-lived access token and a long-lived refresh token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
}

/// Refresh response (the refresh token itself is not rotated)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub access_token: String,
}
