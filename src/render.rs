//! Terminal rendering for the chat REPL.
//!
//! Messages are printed as labelled blocks.  Assistant text goes through
//! [`crate::format::tokenize`], so fenced code gets a header line carrying
//! its language and inline code is highlighted.

use std::io::{self, Stdout, Write};

use time::OffsetDateTime;

use crate::format::{Span, tokenize};
use crate::types::{ChatMessage, Role, SessionInfo};

/// ANSI escape code for dim text (used for timestamps).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code for bold text (used for speaker labels).
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for cyan text (used for code headers).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for yellow text (used for inline code).
const ANSI_YELLOW: &str = "\x1b[33m";

/// ANSI escape code for green text (used for the active session marker).
const ANSI_GREEN: &str = "\x1b[32m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// Label of assistant messages.
pub const ASSISTANT_LABEL: &str = "Assistant";

/// Trait for rendering chat output.
pub trait Renderer: Send {
    /// Print one message of the transcript.
    fn print_message(&mut self, message: &ChatMessage);

    /// Print the session list, marking the active session.
    fn print_sessions(&mut self, sessions: &[SessionInfo], active: Option<&str>);

    /// Show that a reply is on its way.
    fn print_pending(&mut self);

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);

    /// Print a whole transcript.
    fn print_transcript(&mut self, messages: &[ChatMessage]) {
        for message in messages {
            self.print_message(message);
        }
    }
}

/// Format a timestamp as `HH:MM`.
pub fn clock(timestamp: OffsetDateTime) -> String {
    format!("{:02}:{:02}", timestamp.hour(), timestamp.minute())
}

/// Plain text renderer with optional ANSI styling.
pub struct PlainTextRenderer<W: Write + Send = Stdout> {
    out: W,
    use_color: bool,
    user_label: String,
}

impl PlainTextRenderer<Stdout> {
    /// Creates a new PlainTextRenderer on stdout with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer on stdout with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self::with_writer(io::stdout(), use_color)
    }
}

impl Default for PlainTextRenderer<Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write + Send> PlainTextRenderer<W> {
    /// Creates a renderer writing to `out`.
    pub fn with_writer(out: W, use_color: bool) -> Self {
        Self {
            out,
            use_color,
            user_label: "You".to_string(),
        }
    }

    /// Label printed above the user's own messages.
    pub fn set_user_label(&mut self, label: impl Into<String>) {
        self.user_label = label.into();
    }

    /// Consume the renderer, returning its writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn style(&self, code: &'static str) -> &'static str {
        if self.use_color { code } else { "" }
    }

    fn write_message(&mut self, message: &ChatMessage) -> io::Result<()> {
        let label = match message.role {
            Role::User => self.user_label.clone(),
            Role::Assistant => ASSISTANT_LABEL.to_string(),
        };
        let (bold, dim, reset) = (
            self.style(ANSI_BOLD),
            self.style(ANSI_DIM),
            self.style(ANSI_RESET),
        );
        writeln!(
            self.out,
            "{bold}{label}{reset} {dim}{}{reset}",
            clock(message.timestamp)
        )?;

        if message.role == Role::User {
            writeln!(self.out, "{}", message.content)?;
        } else {
            self.write_spans(&message.content)?;
        }
        writeln!(self.out)?;
        self.out.flush()
    }

    fn write_spans(&mut self, text: &str) -> io::Result<()> {
        let (cyan, yellow, reset) = (
            self.style(ANSI_CYAN),
            self.style(ANSI_YELLOW),
            self.style(ANSI_RESET),
        );
        let mut at_line_start = true;
        for span in tokenize(text) {
            match span {
                Span::Text(text) => {
                    write!(self.out, "{text}")?;
                    at_line_start = text.ends_with('\n');
                }
                Span::InlineCode(code) => {
                    if self.use_color {
                        write!(self.out, "{yellow}{code}{reset}")?;
                    } else {
                        write!(self.out, "`{code}`")?;
                    }
                    at_line_start = false;
                }
                Span::CodeBlock { code, .. } => {
                    if !at_line_start {
                        writeln!(self.out)?;
                    }
                    let label = span.label().unwrap_or_default();
                    writeln!(self.out, "{cyan}--- {label} ---{reset}")?;
                    for line in code.lines() {
                        writeln!(self.out, "  {line}")?;
                    }
                    writeln!(self.out, "{cyan}---{reset}")?;
                    at_line_start = true;
                }
            }
        }
        if !at_line_start {
            writeln!(self.out)?;
        }
        Ok(())
    }

    fn write_sessions(&mut self, sessions: &[SessionInfo], active: Option<&str>) -> io::Result<()> {
        if sessions.is_empty() {
            writeln!(self.out, "No chats yet.")?;
            return self.out.flush();
        }
        let (green, dim, reset) = (
            self.style(ANSI_GREEN),
            self.style(ANSI_DIM),
            self.style(ANSI_RESET),
        );
        for (index, session) in sessions.iter().enumerate() {
            let marker = if active == Some(session.id.as_str()) {
                format!("{green}*{reset}")
            } else {
                " ".to_string()
            };
            let date = session.updated_at.date();
            writeln!(
                self.out,
                "{marker} {:>2}. {} {dim}({date} {}){reset}",
                index + 1,
                session.title,
                clock(session.updated_at)
            )?;
        }
        self.out.flush()
    }
}

impl<W: Write + Send> Renderer for PlainTextRenderer<W> {
    fn print_message(&mut self, message: &ChatMessage) {
        let _ = self.write_message(message);
    }

    fn print_sessions(&mut self, sessions: &[SessionInfo], active: Option<&str>) {
        let _ = self.write_sessions(sessions, active);
    }

    fn print_pending(&mut self) {
        let (dim, reset) = (self.style(ANSI_DIM), self.style(ANSI_RESET));
        let _ = writeln!(self.out, "{dim}{ASSISTANT_LABEL} is typing...{reset}");
        let _ = self.out.flush();
    }

    fn print_error(&mut self, error: &str) {
        let (red, reset) = (self.style(ANSI_RED), self.style(ANSI_RESET));
        let _ = writeln!(self.out, "{red}Error: {error}{reset}");
        let _ = self.out.flush();
    }

    fn print_info(&mut self, info: &str) {
        let _ = writeln!(self.out, "{info}");
        let _ = self.out.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn render(f: impl FnOnce(&mut PlainTextRenderer<Vec<u8>>)) -> String {
        let mut renderer = PlainTextRenderer::with_writer(Vec::new(), false);
        f(&mut renderer);
        String::from_utf8(renderer.into_inner()).unwrap()
    }

    #[test]
    fn renderer_default_has_color() {
        let renderer = PlainTextRenderer::new();
        assert!(renderer.use_color);
    }

    #[test]
    fn clock_is_hours_and_minutes() {
        assert_eq!(clock(datetime!(2024-04-10 09:05:59 UTC)), "09:05");
    }

    #[test]
    fn user_message_is_verbatim() {
        let message = ChatMessage::new(
            "run `ls`",
            Role::User,
            datetime!(2024-04-10 14:30:00 UTC),
        );
        let out = render(|r| {
            r.set_user_label("dilan");
            r.print_message(&message);
        });
        assert_eq!(out, "dilan 14:30\nrun `ls`\n\n");
    }

    #[test]
    fn assistant_code_gets_a_header() {
        let message = ChatMessage::new(
            "Use `npm install` first\n```js\nconsole.log(1)\n```",
            Role::Assistant,
            datetime!(2024-04-10 14:31:00 UTC),
        );
        let out = render(|r| r.print_message(&message));
        assert_eq!(
            out,
            "Assistant 14:31\nUse `npm install` first\n--- js ---\n  console.log(1)\n---\n\n"
        );
    }

    #[test]
    fn unlabelled_fence_uses_code_label() {
        let message = ChatMessage::new(
            "see ```\nx\n``` ok",
            Role::Assistant,
            datetime!(2024-04-10 14:31:00 UTC),
        );
        let out = render(|r| r.print_message(&message));
        assert!(out.contains("see \n--- code ---\n  x\n---\n ok\n"));
    }

    #[test]
    fn colored_output_highlights_inline_code() {
        let message = ChatMessage::new("`x`", Role::Assistant, datetime!(2024-04-10 14:31:00 UTC));
        let mut renderer = PlainTextRenderer::with_writer(Vec::new(), true);
        renderer.print_message(&message);
        let out = String::from_utf8(renderer.into_inner()).unwrap();
        assert!(out.contains(&format!("{ANSI_YELLOW}x{ANSI_RESET}")));
        assert!(!out.contains('`'));
    }

    #[test]
    fn sessions_mark_the_active_one() {
        let sessions = vec![
            SessionInfo::new("s-1", "Kurdish grammar", datetime!(2024-04-10 09:00:00 UTC)),
            SessionInfo::new("s-2", "New Chat", datetime!(2024-04-09 18:45:00 UTC)),
        ];
        let out = render(|r| r.print_sessions(&sessions, Some("s-2")));
        assert_eq!(
            out,
            "   1. Kurdish grammar (2024-04-10 09:00)\n*  2. New Chat (2024-04-09 18:45)\n"
        );
        assert_eq!(render(|r| r.print_sessions(&[], None)), "No chats yet.\n");
    }

    #[test]
    fn errors_and_pending() {
        let out = render(|r| {
            r.print_pending();
            r.print_error("boom");
        });
        assert_eq!(out, "Assistant is typing...\nError: boom\n");
    }
}
