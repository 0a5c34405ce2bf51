//! Scripted in-memory [`Backend`] for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use time::macros::datetime;

use crate::backend::Backend;
use crate::credential::Credential;
use crate::error::{Error, Result};
use crate::types::{
    ChatMessage, Identity, LoginRequest, LoginResponse, RegisterRequest, Role, SendRequest,
    SendResponse, SessionInfo,
};

#[derive(Default)]
pub(crate) struct FakeBackend {
    pub login: Mutex<Option<Result<LoginResponse>>>,
    pub register: Mutex<Option<Result<Identity>>>,
    pub me: Mutex<Option<Result<Identity>>>,
    pub sessions: Mutex<Option<Result<Vec<SessionInfo>>>>,
    pub messages: Mutex<Option<Result<Vec<ChatMessage>>>>,
    pub sends: Mutex<VecDeque<Result<SendResponse>>>,
    pub delete: Mutex<Option<Result<()>>>,
    /// Operation name and bearer token of every call, in order.
    pub calls: Mutex<Vec<(String, Option<String>)>>,
    /// Bodies of every send.
    pub sent: Mutex<Vec<SendRequest>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_login(self, result: Result<LoginResponse>) -> Self {
        *self.login.lock().unwrap() = Some(result);
        self
    }

    pub fn with_register(self, result: Result<Identity>) -> Self {
        *self.register.lock().unwrap() = Some(result);
        self
    }

    pub fn with_me(self, result: Result<Identity>) -> Self {
        *self.me.lock().unwrap() = Some(result);
        self
    }

    pub fn with_sessions(self, result: Result<Vec<SessionInfo>>) -> Self {
        *self.sessions.lock().unwrap() = Some(result);
        self
    }

    pub fn with_messages(self, result: Result<Vec<ChatMessage>>) -> Self {
        *self.messages.lock().unwrap() = Some(result);
        self
    }

    pub fn with_send(self, result: Result<SendResponse>) -> Self {
        self.sends.lock().unwrap().push_back(result);
        self
    }

    pub fn with_delete(self, result: Result<()>) -> Self {
        *self.delete.lock().unwrap() = Some(result);
        self
    }

    pub fn call_names(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn count(&self, name: &str) -> usize {
        self.call_names().iter().filter(|n| *n == name).count()
    }

    fn record(&self, name: &str, credential: Option<&Credential>) {
        self.calls.lock().unwrap().push((
            name.to_string(),
            credential.map(|c| c.as_str().to_string()),
        ));
    }

    fn scripted<T: Clone>(slot: &Mutex<Option<Result<T>>>, name: &str) -> Result<T> {
        slot.lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Err(Error::unknown(format!("{name} not scripted"))))
    }
}

#[async_trait::async_trait]
impl Backend for FakeBackend {
    async fn login(&self, _request: &LoginRequest) -> Result<LoginResponse> {
        self.record("login", None);
        Self::scripted(&self.login, "login")
    }

    async fn register(&self, _request: &RegisterRequest) -> Result<Identity> {
        self.record("register", None);
        Self::scripted(&self.register, "register")
    }

    async fn me(&self, credential: Option<&Credential>) -> Result<Identity> {
        self.record("me", credential);
        Self::scripted(&self.me, "me")
    }

    async fn list_sessions(&self, credential: Option<&Credential>) -> Result<Vec<SessionInfo>> {
        self.record("list_sessions", credential);
        Self::scripted(&self.sessions, "list_sessions")
    }

    async fn session_messages(
        &self,
        credential: Option<&Credential>,
        _session_id: &str,
    ) -> Result<Vec<ChatMessage>> {
        self.record("session_messages", credential);
        Self::scripted(&self.messages, "session_messages")
    }

    async fn send_message(
        &self,
        credential: Option<&Credential>,
        request: &SendRequest,
    ) -> Result<SendResponse> {
        self.record("send_message", credential);
        self.sent.lock().unwrap().push(request.clone());
        self.sends
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::unknown("send_message not scripted")))
    }

    async fn delete_session(
        &self,
        credential: Option<&Credential>,
        _session_id: &str,
    ) -> Result<()> {
        self.record("delete_session", credential);
        Self::scripted(&self.delete, "delete_session")
    }
}

pub(crate) fn identity() -> Identity {
    Identity::new("u-1", "dilan@example.com", "dilan", false)
}

pub(crate) fn session(id: &str, title: &str) -> SessionInfo {
    SessionInfo::new(id, title, datetime!(2024-04-10 09:00:00 UTC))
}

pub(crate) fn server_message(content: &str, role: Role) -> ChatMessage {
    let mut message = ChatMessage::new(content, role, datetime!(2024-04-10 09:00:00 UTC));
    message.id = Some(format!("m-{content}"));
    message
}

pub(crate) fn reply(session_id: &str, text: &str) -> SendResponse {
    SendResponse {
        message: String::new(),
        session_id: session_id.to_string(),
        ai_response: text.to_string(),
        timestamp: None,
    }
}
