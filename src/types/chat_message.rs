use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Who authored a message.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Written by the signed-in user.
    User,

    /// Produced by the assistant.
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One entry of a session transcript.
///
/// Messages fetched from the server carry their identifiers; messages built
/// locally (the optimistic user message, the assistant reply, the fallback
/// apology) leave them empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Server-side message identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Session the message belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    /// Raw message text.
    pub content: String,

    /// Author of the message.
    pub role: Role,

    /// When the message was written.
    #[serde(with = "crate::utils::time")]
    pub timestamp: OffsetDateTime,

    /// Language the conversation was held in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl ChatMessage {
    /// Create a message with the given role and timestamp.
    pub fn new(content: impl Into<String>, role: Role, timestamp: OffsetDateTime) -> Self {
        Self {
            id: None,
            session_id: None,
            content: content.into(),
            role,
            timestamp,
            language: None,
        }
    }

    /// Create a user message stamped with the current time.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(content, Role::User, OffsetDateTime::now_utc())
    }

    /// Create an assistant message stamped with the current time.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(content, Role::Assistant, OffsetDateTime::now_utc())
    }

    /// Returns true if the user wrote this message.
    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }
}
