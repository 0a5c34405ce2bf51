//! Authentication state: who is signed in and with which credential.
//!
//! The identity and the credential live together in [`AuthState::SignedIn`],
//! so one can never be present without the other.  Every transition that
//! changes the in-memory credential also updates the durable store.

use std::error;
use std::fmt;

use time::OffsetDateTime;

use crate::backend::Backend;
use crate::credential::{Credential, CredentialStore};
use crate::error::Error;
use crate::observability::{AUTH_LOGIN_FAILURES, AUTH_LOGINS, AUTH_STALE_CREDENTIALS};
use crate::types::{Identity, LoginRequest, RegisterRequest};

/// Message shown when a failed login carries no server detail.
pub const LOGIN_FALLBACK: &str = "Login failed";

/// Message shown when a failed registration carries no server detail.
pub const REGISTER_FALLBACK: &str = "Registration failed";

/// A failed login or registration, reduced to text for the auth form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthFailure {
    message: String,
}

impl AuthFailure {
    /// Create a failure with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Use the server's `detail` if it sent one, the fallback otherwise.
    pub fn from_error(err: &Error, fallback: &str) -> Self {
        Self::new(err.detail().unwrap_or(fallback))
    }

    /// The message to show to the user.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl error::Error for AuthFailure {}

/// Where the authentication lifecycle currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    /// A stored credential has not been resolved yet.
    Loading,

    /// Nobody is signed in.
    SignedOut,

    /// A user is signed in.
    SignedIn {
        /// The signed-in user.
        identity: Identity,
        /// The credential attached to their requests.
        credential: Credential,
    },
}

/// Holds the current identity and credential and drives sign-in and sign-out.
pub struct AuthStore<S: CredentialStore> {
    store: S,
    state: AuthState,
}

impl<S: CredentialStore> AuthStore<S> {
    /// Create a store in the [`AuthState::Loading`] state.
    pub fn new(store: S) -> Self {
        Self {
            store,
            state: AuthState::Loading,
        }
    }

    /// The current state.
    pub fn state(&self) -> &AuthState {
        &self.state
    }

    /// The signed-in user, if any.
    pub fn identity(&self) -> Option<&Identity> {
        match &self.state {
            AuthState::SignedIn { identity, .. } => Some(identity),
            _ => None,
        }
    }

    /// The credential to attach to authenticated requests, if any.
    pub fn credential(&self) -> Option<&Credential> {
        match &self.state {
            AuthState::SignedIn { credential, .. } => Some(credential),
            _ => None,
        }
    }

    /// Returns true while a stored credential is being resolved.
    pub fn is_loading(&self) -> bool {
        self.state == AuthState::Loading
    }

    /// Returns true if a user is signed in.
    pub fn is_signed_in(&self) -> bool {
        matches!(self.state, AuthState::SignedIn { .. })
    }

    /// The durable credential store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Resolve a previously stored credential into an identity.
    ///
    /// A credential that is expired, unreadable or rejected by the server is
    /// cleared and the store settles in [`AuthState::SignedOut`].
    pub async fn init<B: Backend + ?Sized>(&mut self, backend: &B) -> Option<&Identity> {
        let credential = match self.store.load() {
            Ok(Some(credential)) => credential,
            Ok(None) => {
                self.state = AuthState::SignedOut;
                return None;
            }
            Err(err) => {
                tracing::warn!(error = %err, "could not read stored credential");
                self.state = AuthState::SignedOut;
                return None;
            }
        };

        if credential.is_expired_at(OffsetDateTime::now_utc()) {
            tracing::info!("stored credential has expired");
            AUTH_STALE_CREDENTIALS.click();
            self.sign_out();
            return None;
        }

        match backend.me(Some(&credential)).await {
            Ok(identity) => {
                self.state = AuthState::SignedIn {
                    identity,
                    credential,
                };
                self.identity()
            }
            Err(err) => {
                tracing::warn!(error = %err, "stored credential was not accepted");
                AUTH_STALE_CREDENTIALS.click();
                self.sign_out();
                None
            }
        }
    }

    /// Sign in and remember the credential.
    pub async fn login<B: Backend + ?Sized>(
        &mut self,
        backend: &B,
        email: &str,
        password: &str,
    ) -> Result<Identity, AuthFailure> {
        let request = LoginRequest::new(email, password);
        match backend.login(&request).await {
            Ok(response) => {
                AUTH_LOGINS.click();
                let credential = Credential::new(response.access_token);
                if let Err(err) = self.store.save(&credential) {
                    tracing::warn!(error = %err, "could not persist credential");
                }
                let identity = response.user;
                self.state = AuthState::SignedIn {
                    identity: identity.clone(),
                    credential,
                };
                Ok(identity)
            }
            Err(err) => {
                AUTH_LOGIN_FAILURES.click();
                tracing::debug!(error = %err, "login rejected");
                Err(AuthFailure::from_error(&err, LOGIN_FALLBACK))
            }
        }
    }

    /// Create an account.  This does not sign the new user in.
    pub async fn register<B: Backend + ?Sized>(
        &mut self,
        backend: &B,
        email: &str,
        username: &str,
        password: &str,
    ) -> Result<(), AuthFailure> {
        let request = RegisterRequest::new(email, username, password);
        match backend.register(&request).await {
            Ok(_) => Ok(()),
            Err(err) => {
                tracing::debug!(error = %err, "registration rejected");
                Err(AuthFailure::from_error(&err, REGISTER_FALLBACK))
            }
        }
    }

    /// Forget the identity and the credential.  Never fails.
    pub fn logout(&mut self) {
        self.sign_out();
    }

    fn sign_out(&mut self) {
        if let Err(err) = self.store.clear() {
            tracing::warn!(error = %err, "could not clear stored credential");
        }
        self.state = AuthState::SignedOut;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::MemoryCredentialStore;
    use crate::testing::{FakeBackend, identity};
    use crate::types::LoginResponse;

    fn login_ok(token: &str) -> LoginResponse {
        LoginResponse {
            access_token: token.to_string(),
            token_type: "bearer".to_string(),
            user: identity(),
        }
    }

    #[tokio::test]
    async fn init_without_stored_credential_signs_out() {
        let backend = FakeBackend::new();
        let mut auth = AuthStore::new(MemoryCredentialStore::new());
        assert!(auth.is_loading());
        assert!(auth.init(&backend).await.is_none());
        assert_eq!(auth.state(), &AuthState::SignedOut);
        assert!(backend.call_names().is_empty());
    }

    #[tokio::test]
    async fn init_resolves_stored_credential() {
        let backend = FakeBackend::new().with_me(Ok(identity()));
        let store = MemoryCredentialStore::with_credential(Credential::new("tok"));
        let mut auth = AuthStore::new(store);
        let resolved = auth.init(&backend).await.cloned();
        assert_eq!(resolved, Some(identity()));
        assert_eq!(auth.credential(), Some(&Credential::new("tok")));
        let calls = backend.calls.lock().unwrap().clone();
        assert_eq!(calls, vec![("me".to_string(), Some("tok".to_string()))]);
    }

    #[tokio::test]
    async fn init_with_rejected_credential_clears_it() {
        let backend = FakeBackend::new().with_me(Err(Error::api(
            401,
            Some("Could not validate credentials".to_string()),
            "Could not validate credentials",
        )));
        let store = MemoryCredentialStore::with_credential(Credential::new("stale"));
        let mut auth = AuthStore::new(store);
        assert!(auth.init(&backend).await.is_none());
        assert_eq!(auth.state(), &AuthState::SignedOut);
        assert_eq!(auth.store().load().unwrap(), None);
    }

    #[tokio::test]
    async fn init_with_expired_jwt_skips_network() {
        use base64::Engine;
        use base64::engine::general_purpose::URL_SAFE_NO_PAD;

        let claims = URL_SAFE_NO_PAD.encode(r#"{"sub":"u-1","exp":1000}"#);
        let token = format!("e30.{claims}.sig");
        let backend = FakeBackend::new().with_me(Ok(identity()));
        let store = MemoryCredentialStore::with_credential(Credential::new(token));
        let mut auth = AuthStore::new(store);
        assert!(auth.init(&backend).await.is_none());
        assert!(backend.call_names().is_empty());
        assert_eq!(auth.store().load().unwrap(), None);
    }

    #[tokio::test]
    async fn login_stores_credential_and_identity() {
        let backend = FakeBackend::new().with_login(Ok(login_ok("fresh")));
        let mut auth = AuthStore::new(MemoryCredentialStore::new());
        let identity = auth.login(&backend, "dilan@example.com", "pw").await.unwrap();
        assert_eq!(identity.username, "dilan");
        assert!(auth.is_signed_in());
        assert_eq!(auth.credential(), Some(&Credential::new("fresh")));
        assert_eq!(
            auth.store().load().unwrap(),
            Some(Credential::new("fresh"))
        );
    }

    #[tokio::test]
    async fn login_failure_uses_server_detail() {
        let backend = FakeBackend::new().with_login(Err(Error::api(
            401,
            Some("Incorrect email or password".to_string()),
            "Incorrect email or password",
        )));
        let mut auth = AuthStore::new(MemoryCredentialStore::new());
        auth.init(&backend).await;
        let failure = auth.login(&backend, "x@y.z", "nope").await.unwrap_err();
        assert_eq!(failure.message(), "Incorrect email or password");
        assert!(!auth.is_signed_in());
    }

    #[tokio::test]
    async fn login_failure_without_detail_uses_fallback() {
        let backend =
            FakeBackend::new().with_login(Err(Error::connection("connection refused", None)));
        let mut auth = AuthStore::new(MemoryCredentialStore::new());
        let failure = auth.login(&backend, "x@y.z", "pw").await.unwrap_err();
        assert_eq!(failure.message(), LOGIN_FALLBACK);
    }

    #[tokio::test]
    async fn register_does_not_sign_in() {
        let backend = FakeBackend::new().with_register(Ok(identity()));
        let mut auth = AuthStore::new(MemoryCredentialStore::new());
        auth.init(&backend).await;
        auth.register(&backend, "dilan@example.com", "dilan", "pw")
            .await
            .unwrap();
        assert_eq!(auth.state(), &AuthState::SignedOut);
        assert!(auth.credential().is_none());
    }

    #[tokio::test]
    async fn register_failure_messages() {
        let backend = FakeBackend::new().with_register(Err(Error::api(
            400,
            Some("Username already taken".to_string()),
            "Username already taken",
        )));
        let mut auth = AuthStore::new(MemoryCredentialStore::new());
        let failure = auth
            .register(&backend, "a@b.c", "taken", "pw")
            .await
            .unwrap_err();
        assert_eq!(failure.to_string(), "Username already taken");

        let backend = FakeBackend::new().with_register(Err(Error::timeout("slow", Some(60.0))));
        let failure = auth.register(&backend, "a@b.c", "u", "pw").await.unwrap_err();
        assert_eq!(failure.message(), REGISTER_FALLBACK);
    }

    #[tokio::test]
    async fn logout_clears_everything() {
        let backend = FakeBackend::new().with_login(Ok(login_ok("tok")));
        let mut auth = AuthStore::new(MemoryCredentialStore::new());
        auth.login(&backend, "a@b.c", "pw").await.unwrap();
        auth.logout();
        assert_eq!(auth.state(), &AuthState::SignedOut);
        assert!(auth.identity().is_none());
        assert!(auth.credential().is_none());
        assert_eq!(auth.store().load().unwrap(), None);
    }
}
