use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Response of `GET /admin/analytics`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analytics {
    /// Registered users.
    pub user_count: u64,

    /// Chat sessions across all users.
    pub session_count: u64,

    /// Messages across all sessions.
    pub message_count: u64,

    /// Most recently updated sessions, as raw documents.
    #[serde(default)]
    pub recent_sessions: Vec<serde_json::Value>,

    /// Most recently created users, as raw documents.
    #[serde(default)]
    pub recent_users: Vec<serde_json::Value>,
}

/// A system prompt managed by administrators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminPrompt {
    pub id: String,
    pub name: String,
    pub content: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub created_by: String,
    #[serde(with = "crate::utils::time")]
    pub created_at: OffsetDateTime,
}

fn default_active() -> bool {
    true
}

/// Body of `POST /admin/prompts` and `PUT /admin/prompts/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminPromptCreate {
    pub name: String,
    pub content: String,
}

impl AdminPromptCreate {
    /// Create a new prompt body.
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}
