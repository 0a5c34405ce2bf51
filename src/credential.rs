//! Bearer credentials and their durable storage.
//!
//! A [`Credential`] is passed explicitly to every authenticated request; there
//! is no ambient default header.  A [`CredentialStore`] keeps the token across
//! runs under a single fixed location, and the absence of a stored token means
//! the user is signed out.

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;
use time::OffsetDateTime;

use crate::error::{Error, Result};

/// File name of the stored token inside the configuration directory.
pub const TOKEN_FILE_NAME: &str = "token";

/// An opaque bearer token proving an authenticated identity.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a raw token string.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value for the `Authorization` header.
    pub fn header_value(&self) -> String {
        format!("Bearer {}", self.0)
    }

    /// Expiry encoded in the token, when the token is a JWT with an `exp` claim.
    ///
    /// The signature is not checked; the server remains the authority.
    pub fn expires_at(&self) -> Option<OffsetDateTime> {
        #[derive(Deserialize)]
        struct Claims {
            exp: Option<i64>,
        }

        let payload = self.0.split('.').nth(1)?;
        let decoded = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
        let claims: Claims = serde_json::from_slice(&decoded).ok()?;
        OffsetDateTime::from_unix_timestamp(claims.exp?).ok()
    }

    /// Returns true if the token carries an expiry at or before `now`.
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        self.expires_at().is_some_and(|exp| exp <= now)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential(<redacted>)")
    }
}

/// Durable storage for the bearer credential.
pub trait CredentialStore: Send {
    /// Load the stored credential, if any.
    fn load(&self) -> Result<Option<Credential>>;

    /// Persist the credential, replacing any previous one.
    fn save(&mut self, credential: &Credential) -> Result<()>;

    /// Remove the stored credential.  Clearing an empty store succeeds.
    fn clear(&mut self) -> Result<()>;
}

/// Stores the token in a single file.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    /// Create a store backed by `path`.  The file is created on first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The default location: `<config dir>/kurdcine-chat/token`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("kurdcine-chat").join(TOKEN_FILE_NAME))
    }

    /// The file backing this store.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<Credential>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim();
                if token.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(Credential::new(token)))
                }
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(Error::io("failed to read credential file", err)),
        }
    }

    fn save(&mut self, credential: &Credential) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|err| Error::io("failed to create credential directory", err))?;
        }
        let mut file = open_private(&self.path)
            .map_err(|err| Error::io("failed to open credential file", err))?;
        file.write_all(credential.as_str().as_bytes())
            .map_err(|err| Error::io("failed to write credential file", err))?;
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(Error::io("failed to remove credential file", err)),
        }
    }
}

/// Open `path` for writing, readable by the owner only.
///
/// A file that already exists is restricted before it is truncated.
#[cfg(unix)]
fn open_private(path: &Path) -> io::Result<fs::File> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    match fs::set_permissions(path, fs::Permissions::from_mode(0o600)) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(err),
    }
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> io::Result<fs::File> {
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

/// Keeps the token in memory only.
#[derive(Debug, Clone, Default)]
pub struct MemoryCredentialStore {
    credential: Option<Credential>,
}

impl MemoryCredentialStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already holding `credential`.
    pub fn with_credential(credential: Credential) -> Self {
        Self {
            credential: Some(credential),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<Option<Credential>> {
        Ok(self.credential.clone())
    }

    fn save(&mut self, credential: &Credential) -> Result<()> {
        self.credential = Some(credential.clone());
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.credential = None;
        Ok(())
    }
}
