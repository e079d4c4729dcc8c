//! Data Transfer Objects - request/response types for the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Body of `POST /api/insights` and `PUT /api/insights/{id}`.
///
/// Every field is optional on the wire so that missing fields can be
/// reported alongside rule violations instead of failing deserialisation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InsightRequest {
    pub title: Option<String>,
    pub category: Option<String>,
    pub body: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Body of `PATCH /api/insights/{id}`. Absent fields keep their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InsightPatchRequest {
    pub title: Option<String>,
    pub category: Option<String>,
    pub body: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Query string of `GET /api/insights`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InsightListQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub tag: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatorResponse {
    pub id: Uuid,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightResponse {
    pub id: Uuid,
    pub title: String,
    pub category: String,
    pub body: String,
    pub tags: Vec<String>,
    pub created_by: CreatorResponse,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightListResponse {
    pub count: usize,
    pub results: Vec<InsightResponse>,
}

/// Query string of `GET /api/analytics/top-tags`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopTagsQuery {
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCountResponse {
    pub name: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopTagsResponse {
    pub tags: Vec<TagCountResponse>,
}

/// Request to register a new user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignupRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

/// Request to login.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Response containing authentication tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

impl AuthResponse {
    pub fn bearer(access_token: String, expires_in: u64) -> Self {
        Self {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in,
        }
    }
}

/// Response containing a user's public information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub storage: String,
}
