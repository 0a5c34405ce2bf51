use serde::{Deserialize, Serialize};

use crate::types::Identity;

/// Body of `POST /auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Email address of the account.
    pub email: String,

    /// Plain-text password; only ever sent to the server.
    pub password: String,
}

impl LoginRequest {
    /// Create a new login request.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Body of `POST /auth/register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// Email address of the new account.
    pub email: String,

    /// Display name of the new account.
    pub username: String,

    /// Plain-text password; only ever sent to the server.
    pub password: String,
}

impl RegisterRequest {
    /// Create a new registration request.
    pub fn new(
        email: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Response of `POST /auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Bearer token for subsequent requests.
    pub access_token: String,

    /// Token scheme; always `bearer`.
    #[serde(default = "default_token_type")]
    pub token_type: String,

    /// The signed-in user.
    pub user: Identity,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_value};

    #[test]
    fn login_request_shape() {
        let request = LoginRequest::new("a@b.c", "hunter2");
        assert_eq!(
            to_value(&request).unwrap(),
            json!({"email": "a@b.c", "password": "hunter2"})
        );
    }

    #[test]
    fn register_request_shape() {
        let request = RegisterRequest::new("a@b.c", "ava", "hunter2");
        assert_eq!(
            to_value(&request).unwrap(),
            json!({"email": "a@b.c", "username": "ava", "password": "hunter2"})
        );
    }

    #[test]
    fn login_response_without_token_type() {
        let response: LoginResponse = serde_json::from_value(json!({
            "access_token": "tok",
            "user": {"id": "u1", "email": "a@b.c", "username": "ava", "is_admin": false}
        }))
        .unwrap();
        assert_eq!(response.access_token, "tok");
        assert_eq!(response.token_type, "bearer");
        assert_eq!(response.user.username, "ava");
    }
}
