// Public modules
pub mod admin;
pub mod auth_params;
pub mod chat_message;
pub mod identity;
pub mod send_params;
pub mod session_info;

// Re-exports
pub use admin::{AdminPrompt, AdminPromptCreate, Analytics};
pub use auth_params::{LoginRequest, LoginResponse, RegisterRequest};
pub use chat_message::{ChatMessage, Role};
pub use identity::Identity;
pub use send_params::{DEFAULT_LANGUAGE, SendRequest, SendResponse, StatusMessage};
pub use session_info::SessionInfo;
