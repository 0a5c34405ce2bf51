// Public modules
pub mod auth;
pub mod backend;
pub mod client;
pub mod commands;
pub mod config;
pub mod controller;
pub mod credential;
pub mod error;
pub mod format;
pub mod registry;
pub mod render;
pub mod types;
pub mod utils;
pub mod view;

mod observability;

#[cfg(test)]
mod testing;

// Re-exports
pub use auth::{AuthFailure, AuthState, AuthStore};
pub use backend::Backend;
pub use client::ChatApi;
pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig, ConfigFile};
pub use controller::{ChatController, ControllerState, PendingSend, SendOutcome, SendRejected};
pub use credential::{Credential, CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use error::{Error, Result};
pub use format::{Span, to_markup, tokenize};
pub use observability::register_biometrics;
pub use registry::SessionRegistry;
pub use render::{PlainTextRenderer, Renderer};
pub use types::*;
pub use view::{AuthForm, AuthMode, FormOutcome, Screen};
