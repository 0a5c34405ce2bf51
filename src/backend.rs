//! The remote operations the chat client depends on.
//!
//! [`ChatApi`](crate::ChatApi) implements this over HTTP.  The auth store, the
//! session registry and the chat controller are written against the trait so
//! they can run against any implementation.

use crate::credential::Credential;
use crate::error::Result;
use crate::types::{
    ChatMessage, Identity, LoginRequest, LoginResponse, RegisterRequest, SendRequest,
    SendResponse, SessionInfo,
};

/// Remote chat API.
///
/// Authenticated operations take the credential explicitly.  Passing `None`
/// sends the request without an `Authorization` header, which the server
/// rejects.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    /// `POST /auth/login`.
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse>;

    /// `POST /auth/register`.
    async fn register(&self, request: &RegisterRequest) -> Result<Identity>;

    /// `GET /auth/me`.
    async fn me(&self, credential: Option<&Credential>) -> Result<Identity>;

    /// `GET /chat/sessions`, most recently updated first.
    async fn list_sessions(&self, credential: Option<&Credential>) -> Result<Vec<SessionInfo>>;

    /// `GET /chat/sessions/{id}/messages`, oldest first.
    async fn session_messages(
        &self,
        credential: Option<&Credential>,
        session_id: &str,
    ) -> Result<Vec<ChatMessage>>;

    /// `POST /chat/send`.
    async fn send_message(
        &self,
        credential: Option<&Credential>,
        request: &SendRequest,
    ) -> Result<SendResponse>;

    /// `DELETE /chat/sessions/{id}`.
    async fn delete_session(&self, credential: Option<&Credential>, session_id: &str)
    -> Result<()>;
}
