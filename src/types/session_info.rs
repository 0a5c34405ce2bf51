use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A persisted conversation thread, as listed in the sidebar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    /// Unique session identifier, minted by the server on the first message.
    pub id: String,

    /// Owner of the session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    /// Title shown in the session list.
    pub title: String,

    /// When the session was created.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::utils::time::option"
    )]
    pub created_at: Option<OffsetDateTime>,

    /// When the session last received a message.
    #[serde(with = "crate::utils::time")]
    pub updated_at: OffsetDateTime,
}

impl SessionInfo {
    /// Create a new session record.
    pub fn new(id: impl Into<String>, title: impl Into<String>, updated_at: OffsetDateTime) -> Self {
        Self {
            id: id.into(),
            user_id: None,
            title: title.into(),
            created_at: None,
            updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn session_from_server_json() {
        let json = serde_json::json!({
            "id": "s-1",
            "user_id": "u-1",
            "title": "New Chat",
            "created_at": "2024-04-10T09:00:00",
            "updated_at": "2024-04-10T09:05:30.250000"
        });
        let session: SessionInfo = serde_json::from_value(json).unwrap();
        assert_eq!(session.id, "s-1");
        assert_eq!(session.user_id.as_deref(), Some("u-1"));
        assert_eq!(session.updated_at, datetime!(2024-04-10 09:05:30.25 UTC));
    }

    #[test]
    fn session_serializes_rfc3339() {
        let session = SessionInfo::new("s-2", "Rust questions", datetime!(2024-04-10 09:00:00 UTC));
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": "s-2",
                "title": "Rust questions",
                "updated_at": "2024-04-10T09:00:00Z"
            })
        );
    }
}
