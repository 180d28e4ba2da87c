/// Data models for shorts-service
///
/// This module defines structures for:
/// - Shorts: an uploaded short video and its encoding lifecycle
/// - Encoding callbacks: webhook payloads from the encoding provider
/// - Post: the aggregate a Shorts gets attached to
///
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

// ========================================
// Shorts Models
// ========================================

/// Encoding lifecycle state of a Shorts record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShortsState {
    InProgress,
    Ok,
    Fail,
}

impl ShortsState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "IN_PROGRESS",
            Self::Ok => "OK",
            Self::Fail => "FAIL",
        }
    }
}

/// Shorts database entity
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Shorts {
    pub id: Uuid,
    pub upload_key: String,
    pub shorts_url: String,
    pub thumbnail_url: String,
    pub state: ShortsState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a Shorts row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewShorts {
    pub upload_key: String,
    pub shorts_url: String,
    pub thumbnail_url: String,
    pub state: ShortsState,
}

/// Shorts response DTO
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortsResponse {
    pub id: String,
    pub upload_key: String,
    pub shorts_url: String,
    pub thumbnail_url: String,
    pub state: ShortsState,
    pub updated_at: i64,
}

impl From<Shorts> for ShortsResponse {
    fn from(shorts: Shorts) -> Self {
        Self {
            id: shorts.id.to_string(),
            upload_key: shorts.upload_key,
            shorts_url: shorts.shorts_url,
            thumbnail_url: shorts.thumbnail_url,
            state: shorts.state,
            updated_at: shorts.updated_at.timestamp(),
        }
    }
}

// ========================================
// Encoding Callback Models
// ========================================

/// Status reported by the encoding provider.
///
/// Provider sequence is `WAITING -> RUNNING -> COMPLETE | FAILURE`. Values
/// outside that vocabulary are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EncodingStatus {
    Waiting,
    Running,
    Failure,
    Complete,
    Other(String),
}

impl From<String> for EncodingStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "WAITING" => Self::Waiting,
            "RUNNING" => Self::Running,
            "FAILURE" => Self::Failure,
            "COMPLETE" => Self::Complete,
            _ => Self::Other(raw),
        }
    }
}

impl From<EncodingStatus> for String {
    fn from(status: EncodingStatus) -> Self {
        match status {
            EncodingStatus::Waiting => "WAITING".to_string(),
            EncodingStatus::Running => "RUNNING".to_string(),
            EncodingStatus::Failure => "FAILURE".to_string(),
            EncodingStatus::Complete => "COMPLETE".to_string(),
            EncodingStatus::Other(raw) => raw,
        }
    }
}

/// Webhook body sent by the encoding provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodingCallback {
    #[serde(rename = "filePath")]
    pub file_path: String,
    pub status: EncodingStatus,
}

/// What an encoding callback did to the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// WAITING: placeholder ensured; `created` is false if it already existed
    Registered { created: bool },
    /// RUNNING: informational only
    Ignored,
    Failed,
    Completed,
    UnrecognizedStatus(String),
}

/// Push payload for an encoding state change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodeStateNotice {
    pub upload_key: String,
    pub state: ShortsState,
}

// ========================================
// Post Models
// ========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PostCategory {
    Tour,
    Restaurant,
    Cafe,
}

impl FromStr for PostCategory {
    type Err = AppError;

    /// Case-insensitive, surrounding whitespace ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TOUR" => Ok(Self::Tour),
            "RESTAURANT" => Ok(Self::Restaurant),
            "CAFE" => Ok(Self::Cafe),
            _ => Err(AppError::ValidationError(format!(
                "unknown post category: {}",
                s
            ))),
        }
    }
}

/// Post database entity
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category: PostCategory,
    pub hashtags: Vec<String>,
    pub shorts_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// A post that has not been persisted yet
    pub fn new(user_id: Uuid, category: PostCategory, hashtags: Vec<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            category,
            hashtags,
            shorts_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Point this post at `shorts`. Persisting the post is the caller's job.
    pub fn attach_shorts(mut self, shorts: &Shorts) -> Self {
        self.shorts_id = Some(shorts.id);
        self
    }
}

/// Create post request DTO
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePostRequest {
    pub category: String,
    #[serde(default)]
    pub hashtags: Vec<String>,
    /// Key the client received when uploading the video; absent for posts without video
    #[serde(default)]
    pub upload_key: Option<String>,
}

/// Post response DTO
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: String,
    pub user_id: String,
    pub category: PostCategory,
    pub hashtags: Vec<String>,
    pub shorts_id: Option<String>,
    pub created_at: i64,
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        Self {
            id: post.id.to_string(),
            user_id: post.user_id.to_string(),
            category: post.category,
            hashtags: post.hashtags,
            shorts_id: post.shorts_id.map(|id| id.to_string()),
            created_at: post.created_at.timestamp(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoding_status_keeps_unknown_values() {
        let cb: EncodingCallback =
            serde_json::from_str(r#"{"filePath":"/v/abc_1.mp4","status":"PAUSED"}"#).unwrap();
        assert_eq!(cb.status, EncodingStatus::Other("PAUSED".to_string()));

        let cb: EncodingCallback =
            serde_json::from_str(r#"{"filePath":"/v/abc_1.mp4","status":"COMPLETE"}"#).unwrap();
        assert_eq!(cb.status, EncodingStatus::Complete);
    }

    #[test]
    fn shorts_state_wire_names() {
        assert_eq!(
            serde_json::to_string(&ShortsState::InProgress).unwrap(),
            "\"IN_PROGRESS\""
        );
        assert_eq!(ShortsState::Fail.as_str(), "FAIL");
    }

    #[test]
    fn post_category_is_case_insensitive() {
        assert_eq!("cafe".parse::<PostCategory>().unwrap(), PostCategory::Cafe);
        assert_eq!(" TOUR ".parse::<PostCategory>().unwrap(), PostCategory::Tour);
        assert!(matches!(
            "museum".parse::<PostCategory>(),
            Err(AppError::ValidationError(_))
        ));
    }
}
