//! Slash command parsing for the chat REPL.
//!
//! Input starting with `/` controls the client and is never sent to the
//! assistant.

/// A parsed chat command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// Start a new, empty chat.
    New,

    /// List the user's sessions.
    Sessions,

    /// Open a session by list position or id.
    Open(String),

    /// Delete a session by list position or id.
    Delete(String),

    /// Reprint the active session's transcript.
    History,

    /// Show the signed-in user.
    WhoAmI,

    /// Show the current language, or change it.
    Language(Option<String>),

    /// Sign out and return to the login prompt.
    Logout,

    /// Show usage analytics (administrators only).
    Analytics,

    /// List system prompts (administrators only).
    Prompts,

    /// Create a system prompt.
    AddPrompt {
        /// Display name of the prompt.
        name: String,
        /// Prompt text.
        content: String,
    },

    /// Replace a system prompt's name and text.
    UpdatePrompt {
        /// Id of the prompt to replace.
        id: String,
        /// New display name.
        name: String,
        /// New prompt text.
        content: String,
    },

    /// Delete a system prompt.
    DeletePrompt(String),

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

impl ChatCommand {
    /// Returns true for commands reserved to administrators.
    pub fn requires_admin(&self) -> bool {
        matches!(
            self,
            ChatCommand::Analytics
                | ChatCommand::Prompts
                | ChatCommand::AddPrompt { .. }
                | ChatCommand::UpdatePrompt { .. }
                | ChatCommand::DeletePrompt(_)
        )
    }
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a command, or `None` if it
/// should be sent as a message.
///
/// # Examples
///
/// ```
/// # use kurdcine_chat::commands::{parse_command, ChatCommand};
/// assert_eq!(parse_command("/new"), Some(ChatCommand::New));
/// assert_eq!(parse_command("/open 2"), Some(ChatCommand::Open("2".to_string())));
/// assert!(parse_command("Silav!").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();
    let rest = input.strip_prefix('/')?;

    let mut parts = rest.splitn(2, char::is_whitespace);
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(str::trim).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "new" => ChatCommand::New,
        "sessions" | "ls" => ChatCommand::Sessions,
        "open" => match argument {
            Some(selector) => ChatCommand::Open(selector.to_string()),
            None => ChatCommand::Invalid("/open requires a session number or id".to_string()),
        },
        "delete" | "rm" => match argument {
            Some(selector) => ChatCommand::Delete(selector.to_string()),
            None => ChatCommand::Invalid("/delete requires a session number or id".to_string()),
        },
        "history" => ChatCommand::History,
        "whoami" | "me" => ChatCommand::WhoAmI,
        "language" | "lang" => ChatCommand::Language(argument.map(str::to_string)),
        "logout" => ChatCommand::Logout,
        "analytics" => ChatCommand::Analytics,
        "prompts" => ChatCommand::Prompts,
        "prompt" => parse_prompt_command(argument),
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        _ => ChatCommand::Invalid(format!("Unknown command: /{command}")),
    };

    Some(result)
}

fn parse_prompt_command(argument: Option<&str>) -> ChatCommand {
    let Some(arg) = argument else {
        return ChatCommand::Invalid(
            "/prompt requires 'add', 'update', or 'delete'".to_string(),
        );
    };

    let mut parts = arg.splitn(2, char::is_whitespace);
    let action = parts.next().unwrap_or_default().to_lowercase();
    let rest = parts.next().map(str::trim).filter(|s| !s.is_empty());
    match action.as_str() {
        "add" => match rest.and_then(split_name_content) {
            Some((name, content)) => ChatCommand::AddPrompt { name, content },
            None => ChatCommand::Invalid("/prompt add expects <name> | <content>".to_string()),
        },
        "update" => {
            let parsed = rest.and_then(|rest| {
                let (id, body) = rest.split_once(char::is_whitespace)?;
                let (name, content) = split_name_content(body)?;
                Some(ChatCommand::UpdatePrompt {
                    id: id.to_string(),
                    name,
                    content,
                })
            });
            parsed.unwrap_or_else(|| {
                ChatCommand::Invalid("/prompt update expects <id> <name> | <content>".to_string())
            })
        }
        "delete" => match rest {
            Some(id) => ChatCommand::DeletePrompt(id.to_string()),
            None => ChatCommand::Invalid("/prompt delete requires a prompt id".to_string()),
        },
        _ => ChatCommand::Invalid(
            "Unrecognized /prompt action (use add, update, or delete)".to_string(),
        ),
    }
}

fn split_name_content(text: &str) -> Option<(String, String)> {
    let (name, content) = text.split_once('|')?;
    let (name, content) = (name.trim(), content.trim());
    if name.is_empty() || content.is_empty() {
        return None;
    }
    Some((name.to_string(), content.to_string()))
}

/// Returns help text describing available commands.
pub fn help_text(is_admin: bool) -> String {
    let mut help = String::from(
        r#"Available commands:
  /new                   Start a new chat
  /sessions              List your chats
  /open <n|id>           Open a chat from the list
  /delete <n|id>         Delete a chat
  /history               Show the current chat again
  /language [tag]        Show or set the reply language (e.g. /language ku)
  /whoami                Show the signed-in user
  /logout                Sign out
  /help                  Show this help message
  /quit                  Exit the chat"#,
    );
    if is_admin {
        help.push_str(
            r#"

Administrator commands:
  /analytics                           Show usage counts
  /prompts                             List system prompts
  /prompt add <name> | <content>       Create a system prompt
  /prompt update <id> <name> | <text>  Replace a system prompt
  /prompt delete <id>                  Delete a system prompt"#,
        );
    }
    help
}
