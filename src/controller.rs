//! The send loop of the chat screen.
//!
//! [`ChatController`] owns the transcript of the active session and a small
//! state machine:
//!
//! - [`ControllerState::Idle`]: a message may be sent.
//! - [`ControllerState::Sending`]: one send is outstanding; further sends are
//!   rejected with [`SendRejected::Busy`].
//!
//! A send is split in two so that a front end may await the network however it
//! likes: [`ChatController::begin_send`] appends the user's message and hands
//! back a [`PendingSend`] ticket, and [`ChatController::complete_send`] applies
//! the server's answer.  Every session switch bumps an epoch; a ticket from an
//! older epoch is discarded on completion instead of landing in whatever
//! session happens to be active.  [`ChatController::send_message`] runs both
//! halves back to back.

use std::fmt;

use crate::backend::Backend;
use crate::credential::Credential;
use crate::error::{Error, Result};
use crate::observability::{
    CHAT_REJECTED_SENDS, CHAT_SEND_FAILURES, CHAT_SENDS, CHAT_STALE_REPLIES,
};
use crate::registry::SessionRegistry;
use crate::types::{ChatMessage, DEFAULT_LANGUAGE, SendRequest, SendResponse, SessionInfo};

/// Assistant text appended to the transcript when a send fails.
pub const FALLBACK_REPLY: &str = "Sorry, I encountered an error. Please try again.";

/// Whether a send is outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// Ready to send.
    Idle,

    /// A send started in `epoch` has not completed.
    Sending {
        /// Epoch the outstanding send belongs to.
        epoch: u64,
    },
}

/// Why a send was refused before anything happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendRejected {
    /// The text was empty or whitespace only.
    Empty,

    /// Another send is still outstanding.
    Busy,
}

impl fmt::Display for SendRejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendRejected::Empty => write!(f, "message is empty"),
            SendRejected::Busy => write!(f, "a message is already being sent"),
        }
    }
}

impl From<SendRejected> for Error {
    fn from(rejected: SendRejected) -> Self {
        match rejected {
            SendRejected::Empty => Error::validation(rejected.to_string(), Some("message".to_string())),
            SendRejected::Busy => Error::busy(rejected.to_string()),
        }
    }
}

/// Ticket for a send that has started and not yet completed.
#[derive(Debug)]
#[must_use = "a pending send must be completed to return the controller to idle"]
pub struct PendingSend {
    epoch: u64,
    request: SendRequest,
}

impl PendingSend {
    /// The request to send to the server.
    pub fn request(&self) -> &SendRequest {
        &self.request
    }

    /// Epoch the send was started in.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

/// What became of a send.
#[derive(Debug)]
pub enum SendOutcome {
    /// Nothing was sent.
    Rejected(SendRejected),

    /// The assistant answered; its reply is the last message.
    Replied {
        /// Session the exchange belongs to.
        session_id: String,
    },

    /// The send failed; the fallback reply is the last message.
    Failed(Error),

    /// The answer belonged to a session that is no longer active.
    Discarded,
}

impl SendOutcome {
    /// Returns true if the assistant's answer was appended.
    pub fn is_replied(&self) -> bool {
        matches!(self, SendOutcome::Replied { .. })
    }
}

/// Transcript, active session and send state of the chat screen.
#[derive(Debug)]
pub struct ChatController {
    language: String,
    messages: Vec<ChatMessage>,
    active_session: Option<String>,
    input: String,
    state: ControllerState,
    epoch: u64,
    registry: SessionRegistry,
}

impl Default for ChatController {
    fn default() -> Self {
        Self::new(DEFAULT_LANGUAGE)
    }
}

impl ChatController {
    /// Create a controller for a fresh, empty chat.
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            messages: Vec::new(),
            active_session: None,
            input: String::new(),
            state: ControllerState::Idle,
            epoch: 0,
            registry: SessionRegistry::new(),
        }
    }

    /// Language sent with every message.
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Change the language sent with subsequent messages.
    pub fn set_language(&mut self, language: impl Into<String>) {
        self.language = language.into();
    }

    /// Transcript of the active session.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Id of the active session; `None` for a chat the server has not seen yet.
    pub fn active_session(&self) -> Option<&str> {
        self.active_session.as_deref()
    }

    /// Current send state.
    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Returns true while a send is outstanding.
    pub fn is_sending(&self) -> bool {
        matches!(self.state, ControllerState::Sending { .. })
    }

    /// Current session epoch.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// The unsent input buffer.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Replace the unsent input buffer.
    pub fn set_input(&mut self, input: impl Into<String>) {
        self.input = input.into();
    }

    /// The user's sessions.
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Start a send of `text`.
    ///
    /// On success the user's message has been appended, the input buffer is
    /// cleared and the controller is [`ControllerState::Sending`].
    pub fn begin_send(&mut self, text: &str) -> std::result::Result<PendingSend, SendRejected> {
        if text.trim().is_empty() {
            return Err(SendRejected::Empty);
        }
        if self.is_sending() {
            return Err(SendRejected::Busy);
        }

        self.messages.push(ChatMessage::user(text));
        self.input.clear();
        self.state = ControllerState::Sending { epoch: self.epoch };
        CHAT_SENDS.click();

        Ok(PendingSend {
            epoch: self.epoch,
            request: SendRequest::new(text, self.active_session.clone(), self.language.clone()),
        })
    }

    /// Apply the server's answer to a send started with [`Self::begin_send`].
    pub fn complete_send(
        &mut self,
        pending: PendingSend,
        result: Result<SendResponse>,
    ) -> SendOutcome {
        if self.state != (ControllerState::Sending { epoch: pending.epoch }) {
            CHAT_STALE_REPLIES.click();
            tracing::debug!(
                epoch = pending.epoch,
                current = self.epoch,
                "discarding reply for an inactive session"
            );
            return SendOutcome::Discarded;
        }
        self.state = ControllerState::Idle;

        match result {
            Ok(response) => {
                let mut reply = ChatMessage::assistant(response.ai_response);
                if let Some(timestamp) = response.timestamp {
                    reply.timestamp = timestamp;
                }
                reply.session_id = Some(response.session_id.clone());
                self.messages.push(reply);
                self.active_session = Some(response.session_id.clone());
                SendOutcome::Replied {
                    session_id: response.session_id,
                }
            }
            Err(err) => {
                CHAT_SEND_FAILURES.click();
                tracing::warn!(error = %err, "sending message failed");
                self.messages.push(ChatMessage::assistant(FALLBACK_REPLY));
                SendOutcome::Failed(err)
            }
        }
    }

    /// Send `text` and wait for the answer.
    ///
    /// After a reply the session list is refreshed, since the server may have
    /// created a session or changed its order.
    pub async fn send_message<B: Backend + ?Sized>(
        &mut self,
        backend: &B,
        credential: Option<&Credential>,
        text: &str,
    ) -> SendOutcome {
        let pending = match self.begin_send(text) {
            Ok(pending) => pending,
            Err(rejected) => {
                CHAT_REJECTED_SENDS.click();
                return SendOutcome::Rejected(rejected);
            }
        };
        let result = backend.send_message(credential, pending.request()).await;
        let outcome = self.complete_send(pending, result);
        if outcome.is_replied() {
            self.registry.refresh(backend, credential).await;
        }
        outcome
    }

    /// Send the contents of the input buffer.
    pub async fn submit<B: Backend + ?Sized>(
        &mut self,
        backend: &B,
        credential: Option<&Credential>,
    ) -> SendOutcome {
        let text = self.input.clone();
        self.send_message(backend, credential, &text).await
    }

    /// Leave the active session for a fresh, empty chat.
    ///
    /// A send still outstanding will be discarded when it completes.
    pub fn start_new_chat(&mut self) {
        self.messages.clear();
        self.active_session = None;
        self.switch_epoch();
    }

    /// Forget the transcript and the session list, as on sign-out.
    pub fn reset(&mut self) {
        self.start_new_chat();
        self.input.clear();
        self.registry.clear();
    }

    /// Refetch the session list; failures leave it empty.
    pub async fn refresh_sessions<B: Backend + ?Sized>(
        &mut self,
        backend: &B,
        credential: Option<&Credential>,
    ) -> &[SessionInfo] {
        self.registry.refresh(backend, credential).await
    }

    /// Make `session_id` the active session, replacing the transcript.
    ///
    /// On failure the active session and transcript are left untouched.
    pub async fn load_session<B: Backend + ?Sized>(
        &mut self,
        backend: &B,
        credential: Option<&Credential>,
        session_id: &str,
    ) -> Result<()> {
        match self
            .registry
            .fetch_messages(backend, credential, session_id)
            .await
        {
            Ok(messages) => {
                self.messages = messages;
                self.active_session = Some(session_id.to_string());
                self.switch_epoch();
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, session_id, "could not load session");
                Err(err)
            }
        }
    }

    /// Delete a session; deleting the active one starts a new chat.
    pub async fn delete_session<B: Backend + ?Sized>(
        &mut self,
        backend: &B,
        credential: Option<&Credential>,
        session_id: &str,
    ) -> Result<()> {
        if let Err(err) = self.registry.delete(backend, credential, session_id).await {
            tracing::warn!(error = %err, session_id, "could not delete session");
            return Err(err);
        }
        if self.active_session.as_deref() == Some(session_id) {
            self.start_new_chat();
        }
        Ok(())
    }

    fn switch_epoch(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
        self.state = ControllerState::Idle;
    }
}
