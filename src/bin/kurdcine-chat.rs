//! Terminal client for the KurdCine Chat API.
//!
//! # Usage
//!
//! ```bash
//! # Talk to a local development server
//! kurdcine-chat
//!
//! # Point at another server and answer in Kurmanji
//! kurdcine-chat --api-url https://chat.example.com/api/ --language ku
//!
//! # Read settings from a YAML file
//! kurdcine-chat --config ~/.config/kurdcine-chat/config.yaml
//! ```
//!
//! Sign in at the prompt, then type messages.  Lines starting with `/` are
//! commands; `/help` lists them.  Set `RUST_LOG` for diagnostics on stderr.

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing_subscriber::EnvFilter;

use kurdcine_chat::view::screen_for;
use kurdcine_chat::{
    AdminPromptCreate, AuthForm, AuthMode, AuthStore, ChatApi, ChatArgs, ChatCommand,
    ChatConfig, ChatController, CredentialStore, FileCredentialStore, FormOutcome, Identity,
    MemoryCredentialStore, PlainTextRenderer, Renderer, Screen, SendOutcome, help_text,
    parse_command,
};

/// What the REPL does after a screen hands back control.
enum Flow {
    Continue,
    Quit,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let (args, _) = ChatArgs::from_command_line_relaxed("kurdcine-chat [OPTIONS]");
    let config = ChatConfig::resolve(args)?;
    let api = config.client()?;
    let mut renderer = PlainTextRenderer::with_color(config.use_color);

    println!("KurdCine Chat ({})", api.base_url());
    if let Err(err) = api.health().await {
        renderer.print_error(&format!("The server is not reachable: {err}"));
    }

    match config.token_file.clone() {
        Some(path) => {
            let auth = AuthStore::new(FileCredentialStore::new(path));
            run(auth, &api, &config, renderer).await
        }
        None => {
            let auth = AuthStore::new(MemoryCredentialStore::new());
            run(auth, &api, &config, renderer).await
        }
    }
}

async fn run<S: CredentialStore>(
    mut auth: AuthStore<S>,
    api: &ChatApi,
    config: &ChatConfig,
    mut renderer: PlainTextRenderer,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut rl = DefaultEditor::new()?;
    let mut controller = ChatController::new(config.language.clone());
    let mut form = AuthForm::new();

    loop {
        let flow = match screen_for(&auth) {
            Screen::Loading => {
                auth.init(api).await;
                Flow::Continue
            }
            Screen::Auth => auth_screen(&mut rl, &mut form, &mut auth, api, &mut renderer).await,
            Screen::Chat => {
                chat_screen(&mut rl, &mut controller, &mut auth, api, &mut renderer).await
            }
        };
        if let Flow::Quit = flow {
            println!("Goodbye!");
            return Ok(());
        }
    }
}

fn read_line(
    rl: &mut DefaultEditor,
    prompt: &str,
    renderer: &mut PlainTextRenderer,
) -> Option<String> {
    match rl.readline(prompt) {
        Ok(line) => Some(line),
        Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => None,
        Err(err) => {
            renderer.print_error(&format!("Input error: {err}"));
            None
        }
    }
}

async fn auth_screen<S: CredentialStore>(
    rl: &mut DefaultEditor,
    form: &mut AuthForm,
    auth: &mut AuthStore<S>,
    api: &ChatApi,
    renderer: &mut PlainTextRenderer,
) -> Flow {
    let heading = match form.mode {
        AuthMode::Login => "Sign in (or type 'register' to create an account, 'quit' to exit)",
        AuthMode::Register => "Create an account (or type 'login' to sign in, 'quit' to exit)",
    };
    renderer.print_info(heading);

    let Some(email) = read_line(rl, "Email: ", renderer) else {
        return Flow::Quit;
    };
    match email.trim() {
        "quit" | "exit" => return Flow::Quit,
        "register" | "login" => {
            let wanted = if email.trim() == "register" {
                AuthMode::Register
            } else {
                AuthMode::Login
            };
            if form.mode != wanted {
                form.toggle_mode();
            }
            return Flow::Continue;
        }
        _ => {}
    }
    form.email = email;

    if form.mode == AuthMode::Register {
        let Some(username) = read_line(rl, "Username: ", renderer) else {
            return Flow::Quit;
        };
        form.username = username;
    }
    let Some(password) = read_line(rl, "Password: ", renderer) else {
        return Flow::Quit;
    };
    form.password = password;

    match form.submit(auth, api).await {
        FormOutcome::SignedIn(identity) => {
            renderer.print_info(&format!("Welcome, {}!", identity.username));
        }
        FormOutcome::Registered => {
            renderer.print_info("Account created. Please sign in.");
        }
        FormOutcome::Rejected => {
            if let Some(error) = form.error() {
                renderer.print_error(error);
            }
        }
    }
    Flow::Continue
}

async fn chat_screen<S: CredentialStore>(
    rl: &mut DefaultEditor,
    controller: &mut ChatController,
    auth: &mut AuthStore<S>,
    api: &ChatApi,
    renderer: &mut PlainTextRenderer,
) -> Flow {
    let Some(identity) = auth.identity().cloned() else {
        return Flow::Continue;
    };
    renderer.set_user_label(identity.username.clone());
    controller.refresh_sessions(api, auth.credential()).await;
    renderer.print_info("Type /help for commands, /quit to exit\n");

    let prompt = format!("{}> ", identity.initial().unwrap_or('?'));
    loop {
        let Some(line) = read_line(rl, &prompt, renderer) else {
            return Flow::Quit;
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(trimmed);

        if let Some(command) = parse_command(trimmed) {
            if command.requires_admin() && !identity.is_admin {
                renderer.print_error("That command is for administrators only.");
                continue;
            }
            match command {
                ChatCommand::Quit => return Flow::Quit,
                ChatCommand::Logout => {
                    auth.logout();
                    controller.reset();
                    renderer.print_info("Signed out.");
                    return Flow::Continue;
                }
                command => run_command(command, &identity, controller, auth, api, renderer).await,
            }
            continue;
        }

        renderer.print_pending();
        let outcome = controller.send_message(api, auth.credential(), &line).await;
        match outcome {
            SendOutcome::Replied { .. } => {
                if let Some(reply) = controller.messages().last() {
                    renderer.print_message(reply);
                }
            }
            SendOutcome::Failed(err) => {
                if let Some(reply) = controller.messages().last() {
                    renderer.print_message(reply);
                }
                if err.is_authentication() {
                    auth.logout();
                    controller.reset();
                    renderer.print_error("Your session has expired. Please sign in again.");
                    return Flow::Continue;
                }
            }
            SendOutcome::Rejected(rejected) => renderer.print_error(&rejected.to_string()),
            SendOutcome::Discarded => {}
        }
    }
}

async fn run_command<S: CredentialStore>(
    command: ChatCommand,
    identity: &Identity,
    controller: &mut ChatController,
    auth: &AuthStore<S>,
    api: &ChatApi,
    renderer: &mut PlainTextRenderer,
) {
    let credential = auth.credential();
    match command {
        ChatCommand::New => {
            controller.start_new_chat();
            renderer.print_info("Started a new chat.");
        }
        ChatCommand::Sessions => {
            controller.refresh_sessions(api, credential).await;
            renderer.print_sessions(controller.registry().sessions(), controller.active_session());
        }
        ChatCommand::Open(selector) => {
            let session_id = selected_session(controller, &selector);
            match controller.load_session(api, credential, &session_id).await {
                Ok(()) => renderer.print_transcript(controller.messages()),
                Err(err) => renderer.print_error(&format!("Could not open chat: {err}")),
            }
        }
        ChatCommand::Delete(selector) => {
            let session_id = selected_session(controller, &selector);
            match controller.delete_session(api, credential, &session_id).await {
                Ok(()) => renderer.print_info("Chat deleted."),
                Err(err) => renderer.print_error(&format!("Could not delete chat: {err}")),
            }
        }
        ChatCommand::History => {
            if controller.messages().is_empty() {
                renderer.print_info("Start a conversation by typing a message.");
            } else {
                renderer.print_transcript(controller.messages());
            }
        }
        ChatCommand::WhoAmI => {
            let role = if identity.is_admin { " (admin)" } else { "" };
            renderer.print_info(&format!("{} <{}>{role}", identity.username, identity.email));
        }
        ChatCommand::Language(None) => {
            renderer.print_info(&format!("Language: {}", controller.language()));
        }
        ChatCommand::Language(Some(language)) => {
            renderer.print_info(&format!("Language set to {language}"));
            controller.set_language(language);
        }
        ChatCommand::Analytics => match api.analytics(credential).await {
            Ok(analytics) => renderer.print_info(&format!(
                "Users: {}\nChats: {}\nMessages: {}",
                analytics.user_count, analytics.session_count, analytics.message_count
            )),
            Err(err) => renderer.print_error(&err.to_string()),
        },
        ChatCommand::Prompts => match api.list_prompts(credential).await {
            Ok(prompts) if prompts.is_empty() => renderer.print_info("No system prompts."),
            Ok(prompts) => {
                for prompt in prompts {
                    let state = if prompt.is_active { "active" } else { "inactive" };
                    renderer.print_info(&format!(
                        "{} {} ({state})\n    {}",
                        prompt.id, prompt.name, prompt.content
                    ));
                }
            }
            Err(err) => renderer.print_error(&err.to_string()),
        },
        ChatCommand::AddPrompt { name, content } => {
            let body = AdminPromptCreate::new(name, content);
            match api.create_prompt(credential, &body).await {
                Ok(prompt) => renderer.print_info(&format!("Created prompt {}", prompt.id)),
                Err(err) => renderer.print_error(&err.to_string()),
            }
        }
        ChatCommand::UpdatePrompt { id, name, content } => {
            let body = AdminPromptCreate::new(name, content);
            match api.update_prompt(credential, &id, &body).await {
                Ok(status) => renderer.print_info(&status.message),
                Err(err) => renderer.print_error(&err.to_string()),
            }
        }
        ChatCommand::DeletePrompt(id) => match api.delete_prompt(credential, &id).await {
            Ok(status) => renderer.print_info(&status.message),
            Err(err) => renderer.print_error(&err.to_string()),
        },
        ChatCommand::Help => {
            for line in help_text(identity.is_admin).lines() {
                println!("    {line}");
            }
        }
        ChatCommand::Invalid(message) => renderer.print_error(&message),
        ChatCommand::Quit | ChatCommand::Logout => {}
    }
}

/// Map a typed selector to a session id; unknown selectors are taken as ids.
fn selected_session(controller: &ChatController, selector: &str) -> String {
    controller
        .registry()
        .resolve(selector)
        .map(|session| session.id.clone())
        .unwrap_or_else(|| selector.to_string())
}
