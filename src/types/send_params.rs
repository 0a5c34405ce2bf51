use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Language tag sent with every message unless configured otherwise.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Body of `POST /chat/send`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendRequest {
    /// The user's message text.
    pub message: String,

    /// Session to append to; `None` asks the server to start a new one.
    pub session_id: Option<String>,

    /// Language the assistant should answer in.
    pub language: String,
}

impl SendRequest {
    /// Create a new send request.
    pub fn new(
        message: impl Into<String>,
        session_id: Option<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            session_id,
            language: language.into(),
        }
    }
}

/// Response of `POST /chat/send`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendResponse {
    /// Echo of the user's message.
    #[serde(default)]
    pub message: String,

    /// Session the exchange was stored in; newly minted for a new chat.
    pub session_id: String,

    /// The assistant's reply.
    pub ai_response: String,

    /// Server time of the reply.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::utils::time::option"
    )]
    pub timestamp: Option<OffsetDateTime>,
}

/// Acknowledgement body returned by deletes, updates and the health check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    /// Human-readable acknowledgement.
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_value};

    #[test]
    fn new_chat_sends_null_session() {
        let request = SendRequest::new("Silav", None, DEFAULT_LANGUAGE);
        assert_eq!(
            to_value(&request).unwrap(),
            json!({"message": "Silav", "session_id": null, "language": "en"})
        );
    }

    #[test]
    fn send_response_deserialization() {
        let response: SendResponse = serde_json::from_value(json!({
            "message": "Silav",
            "session_id": "s-9",
            "ai_response": "Silav! Çawa dikarim alîkariya te bikim?",
            "timestamp": "2024-04-10T09:05:30.000001"
        }))
        .unwrap();
        assert_eq!(response.session_id, "s-9");
        assert!(response.timestamp.is_some());
    }
}
