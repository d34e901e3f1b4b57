//! Data shapes returned by the poetry backend
//!
//! Records mirror the server's JSON field names. Every field defaults when
//! absent, so older or trimmed-down responses still decode.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Catalog records
// ─────────────────────────────────────────────────────────────────────────────

/// Poetry collection a work belongs to (e.g. `quantangshi` / 全唐诗)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Category {
    pub id: u64,
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub created_at: String,
}

/// Historical period used to group authors
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dynasty {
    pub id: String,
    pub name: String,
    pub name_en: String,
    pub description: String,
    pub period: String,
    pub sort_order: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Author {
    pub id: u64,
    pub name: String,
    pub dynasty: String,
    pub biography: String,
    pub created_at: String,
}

/// Annotation attached to a work: note, comment or translation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Comment {
    pub id: u64,
    pub work_id: u64,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub commenter: String,
    pub paragraph_index: i32,
    pub created_at: String,
}

/// A single poem (the backend calls them works)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Work {
    pub id: u64,
    pub category_id: u64,
    pub author_id: u64,
    pub category: Category,
    pub author: Author,
    pub title: String,
    /// Tune pattern name for ci/qu poems
    pub rhythmic: String,
    pub volume: String,
    pub section: String,
    /// One entry per line or stanza
    pub content: Vec<String>,
    pub prologue: String,
    pub original_id: String,
    pub comments: Vec<Comment>,
    pub created_at: String,
}

impl Work {
    /// Title, falling back to the tune name for untitled ci
    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            &self.rhythmic
        } else {
            &self.title
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Paged collections
// ─────────────────────────────────────────────────────────────────────────────

/// One page of poems
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoemCollection {
    #[serde(alias = "poems")]
    pub works: Vec<Work>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

/// One page of authors
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorCollection {
    pub authors: Vec<Author>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

/// Full-text search page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchResults {
    pub works: Vec<Work>,
    pub authors: Vec<Author>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub query: String,
    pub duration_ms: i64,
}

/// `GET /poems/random` payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomPoems {
    pub poems: Vec<Work>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Request parameters
// ─────────────────────────────────────────────────────────────────────────────

/// Pagination, forwarded as `page` / `page_size`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PageParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

impl PageParams {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: Some(page),
            page_size: Some(page_size),
        }
    }
}

/// `GET /poems` filters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PoemQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// `GET /authors` filters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuthorQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dynasty: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Accounts
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub nickname: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub email: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub phone: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Profile of the logged-in user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserInfo {
    pub id: u64,
    pub username: String,
    pub nickname: String,
    pub avatar_url: String,
    pub email: String,
    pub phone: String,
    /// 0 unknown, 1 male, 2 female
    pub gender: i32,
    pub level: i32,
    pub experience: i64,
    pub coins: i64,
    pub vip_level: i32,
    pub status: i32,
    pub created_at: String,
    /// Profile fields this client does not model (province, city, ...)
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl UserInfo {
    /// Nickname if set, otherwise username
    pub fn display_name(&self) -> &str {
        if self.nickname.is_empty() {
            &self.username
        } else {
            &self.nickname
        }
    }
}

/// Token issued by register/login
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginResponse {
    pub token: String,
    /// Unix seconds
    pub expires_at: i64,
    pub user: UserInfo,
}

impl LoginResponse {
    pub fn expires_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.expires_at, 0)
    }
}

/// Partial profile update; unset fields are left unchanged on the server
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateProfileRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub province: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

impl UpdateProfileRequest {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Publicly visible subset of a profile (`GET /users/:id`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublicProfile {
    pub id: u64,
    pub username: String,
    pub nickname: String,
    pub avatar_url: String,
    pub level: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefreshRequest {
    pub token: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RefreshResponse {
    pub token: String,
}
