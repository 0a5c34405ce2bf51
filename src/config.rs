//! Configuration for the chat REPL.
//!
//! Values come from the command line (parsed with `arrrg`), an optional YAML
//! file, and the environment, in that order of precedence.  Anything still
//! unset takes its default.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use arrrg_derive::CommandLine;
use serde::Deserialize;

use crate::client::ChatApi;
use crate::credential::FileCredentialStore;
use crate::error::{Error, Result};
use crate::types::DEFAULT_LANGUAGE;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Command-line arguments for the kurdcine-chat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Root of the chat API.
    #[arrrg(optional, "API root (default: $KURDCINE_API_URL or http://localhost:8001/api/)", "URL")]
    pub api_url: Option<String>,

    /// Language the assistant answers in.
    #[arrrg(optional, "Reply language (default: en)", "LANG")]
    pub language: Option<String>,

    /// Where the sign-in token is kept.
    #[arrrg(optional, "Token file (default: <config dir>/kurdcine-chat/token)", "PATH")]
    pub token_file: Option<String>,

    /// Request timeout.
    #[arrrg(optional, "Request timeout in seconds (default: 60)", "SECS")]
    pub timeout_secs: Option<u64>,

    /// YAML configuration file.
    #[arrrg(optional, "YAML configuration file", "PATH")]
    pub config: Option<String>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Settings read from a YAML configuration file.
///
/// ```yaml
/// api_url: https://chat.example.com/api/
/// language: ku
/// timeout_secs: 30
/// color: false
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub api_url: Option<String>,
    pub language: Option<String>,
    pub token_file: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
    pub color: Option<bool>,
}

impl ConfigFile {
    /// Read and parse a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|err| Error::io(format!("failed to read {}", path.display()), err))?;
        Self::parse(&contents)
    }

    /// Parse configuration from YAML text.
    pub fn parse(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }
}

/// Resolved configuration for a chat session.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// API root; `None` defers to `KURDCINE_API_URL` and then the default.
    pub api_url: Option<String>,

    /// Language sent with every message.
    pub language: String,

    /// Token file; `None` keeps the credential in memory only.
    pub token_file: Option<PathBuf>,

    /// Per-request timeout.
    pub timeout: Duration,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - API root: from the environment, else the local development server
    /// - Language: en
    /// - Token file: `<config dir>/kurdcine-chat/token`
    /// - Timeout: 60 seconds
    /// - Color: enabled
    pub fn new() -> Self {
        Self {
            api_url: None,
            language: DEFAULT_LANGUAGE.to_string(),
            token_file: FileCredentialStore::default_path(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            use_color: true,
        }
    }

    /// Resolve arguments, loading the YAML file they name if any.
    pub fn resolve(args: ChatArgs) -> Result<Self> {
        let file = match args.config.as_deref() {
            Some(path) => ConfigFile::load(path)?,
            None => ConfigFile::default(),
        };
        Ok(Self::merge(args, file))
    }

    /// Layer command-line arguments over file settings over defaults.
    pub fn merge(args: ChatArgs, file: ConfigFile) -> Self {
        let defaults = Self::new();
        ChatConfig {
            api_url: args.api_url.or(file.api_url),
            language: args
                .language
                .or(file.language)
                .unwrap_or(defaults.language),
            token_file: args
                .token_file
                .map(PathBuf::from)
                .or(file.token_file)
                .or(defaults.token_file),
            timeout: args
                .timeout_secs
                .or(file.timeout_secs)
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            use_color: !args.no_color && file.color.unwrap_or(true),
        }
    }

    /// Sets the API root.
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = Some(api_url.into());
        self
    }

    /// Sets the reply language.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Sets the token file.
    pub fn with_token_file(mut self, path: Option<PathBuf>) -> Self {
        self.token_file = path;
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// Build an API client from this configuration.
    pub fn client(&self) -> Result<ChatApi> {
        ChatApi::with_options(self.api_url.clone(), Some(self.timeout))
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ChatArgs> for ChatConfig {
    fn from(args: ChatArgs) -> Self {
        Self::merge(args, ConfigFile::default())
    }
}
