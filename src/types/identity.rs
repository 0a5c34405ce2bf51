use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// The authenticated user, as returned by `/auth/me` and `/auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Unique user identifier.
    pub id: String,

    /// Email address used to sign in.
    pub email: String,

    /// Display name chosen at registration.
    pub username: String,

    /// Whether the user may call the admin endpoints.
    #[serde(default)]
    pub is_admin: bool,

    /// When the account was created.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::utils::time::option"
    )]
    pub created_at: Option<OffsetDateTime>,
}

impl Identity {
    /// Create a new identity without a creation time.
    pub fn new(
        id: impl Into<String>,
        email: impl Into<String>,
        username: impl Into<String>,
        is_admin: bool,
    ) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            username: username.into(),
            is_admin,
            created_at: None,
        }
    }

    /// The upper-cased first character of the username, used as an avatar.
    pub fn initial(&self) -> Option<char> {
        self.username.chars().next().and_then(|c| c.to_uppercase().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn identity_deserialization() {
        let json = serde_json::json!({
            "id": "5b0e6a9c-1a2b-4c3d-8e9f-001122334455",
            "email": "dilan@example.com",
            "username": "dilan",
            "is_admin": true,
            "created_at": "2024-03-02T08:15:00.500000"
        });
        let identity: Identity = serde_json::from_value(json).unwrap();
        assert_eq!(identity.username, "dilan");
        assert!(identity.is_admin);
        assert_eq!(
            identity.created_at,
            Some(datetime!(2024-03-02 08:15:00.5 UTC))
        );
    }

    #[test]
    fn identity_minimal() {
        let json = serde_json::json!({
            "id": "u1",
            "email": "a@b.c",
            "username": "ava"
        });
        let identity: Identity = serde_json::from_value(json).unwrap();
        assert!(!identity.is_admin);
        assert!(identity.created_at.is_none());
        assert_eq!(identity.initial(), Some('A'));
    }
}
