//! Primary-store record types.

use serde::{Deserialize, Serialize};
use skillgraph_core::{ContentKind, RoleCategory};

/// Input for user registration.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: RoleCategory,
    pub skills: Vec<String>,
    pub interests: Vec<String>,
}

/// A stored user document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub skills: Vec<String>,
    pub interests: Vec<String>,
    pub created_at: i64,
}

/// Input for content creation in any of the three collections.
#[derive(Debug, Clone)]
pub struct NewContent {
    pub kind: ContentKind,
    pub owner_id: String,
    pub title: String,
    pub body: Option<String>,
    pub required_tags: Vec<String>,
}

/// A stored content document (feed post, job or question).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentRecord {
    pub id: String,
    pub kind: ContentKind,
    pub owner_id: String,
    pub title: String,
    pub body: Option<String>,
    pub required_tags: Vec<String>,
    pub created_at: i64,
}

/// A stored comment; replies carry the parent comment's id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentRecord {
    pub id: String,
    pub content_id: String,
    pub parent_id: Option<String>,
    pub author_id: String,
    pub text: String,
    pub created_at: i64,
}

/// Lifecycle state of an outbox row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutboxStatus {
    Pending,
    Dead,
}

impl OutboxStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutboxStatus::Pending => "pending",
            OutboxStatus::Dead => "dead",
        }
    }
}

/// One pending (or dead-lettered) sync event.
#[derive(Debug, Clone)]
pub struct OutboxEntry {
    pub id: i64,
    pub payload: serde_json::Value,
    pub status: OutboxStatus,
    pub attempts: u32,
    pub last_error: Option<String>,
}
