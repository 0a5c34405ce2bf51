//! Which screen to show, and the state of the login/registration form.

use crate::auth::{AuthFailure, AuthState, AuthStore};
use crate::backend::Backend;
use crate::credential::CredentialStore;
use crate::types::Identity;

/// The screen that matches the authentication state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// A stored credential is being resolved.
    Loading,

    /// Nobody is signed in.
    Auth,

    /// A user is signed in.
    Chat,
}

impl From<&AuthState> for Screen {
    fn from(state: &AuthState) -> Self {
        match state {
            AuthState::Loading => Screen::Loading,
            AuthState::SignedOut => Screen::Auth,
            AuthState::SignedIn { .. } => Screen::Chat,
        }
    }
}

/// Pick the screen for an auth store.
pub fn screen_for<S: CredentialStore>(auth: &AuthStore<S>) -> Screen {
    Screen::from(auth.state())
}

/// Whether the auth form signs in or creates an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    #[default]
    Login,
    Register,
}

impl AuthMode {
    /// The other mode.
    pub fn toggled(self) -> Self {
        match self {
            AuthMode::Login => AuthMode::Register,
            AuthMode::Register => AuthMode::Login,
        }
    }
}

/// Result of submitting the auth form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormOutcome {
    /// Signed in as this user.
    SignedIn(Identity),

    /// The account was created; the form is back in login mode.
    Registered,

    /// The form shows an error.
    Rejected,
}

/// Fields, mode and inline error of the auth form.
#[derive(Debug, Clone, Default)]
pub struct AuthForm {
    pub mode: AuthMode,
    pub email: String,
    pub username: String,
    pub password: String,
    error: Option<String>,
}

impl AuthForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// The error to show under the form, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Switch between login and registration, dropping any error.
    pub fn toggle_mode(&mut self) {
        self.mode = self.mode.toggled();
        self.error = None;
    }

    /// Empty every field.
    pub fn clear_fields(&mut self) {
        self.email.clear();
        self.username.clear();
        self.password.clear();
    }

    /// Name of the first required field that is empty.
    pub fn missing_field(&self) -> Option<&'static str> {
        if self.email.trim().is_empty() {
            return Some("email");
        }
        if self.mode == AuthMode::Register && self.username.trim().is_empty() {
            return Some("username");
        }
        if self.password.is_empty() {
            return Some("password");
        }
        None
    }

    /// Submit the form in its current mode.
    ///
    /// Empty required fields are rejected without contacting the server.  A
    /// successful registration switches to login mode and clears the fields.
    pub async fn submit<S, B>(&mut self, auth: &mut AuthStore<S>, backend: &B) -> FormOutcome
    where
        S: CredentialStore,
        B: Backend + ?Sized,
    {
        if let Some(field) = self.missing_field() {
            self.error = Some(format!("Please enter your {field}"));
            return FormOutcome::Rejected;
        }
        self.error = None;

        match self.mode {
            AuthMode::Login => match auth.login(backend, self.email.trim(), &self.password).await {
                Ok(identity) => {
                    self.password.clear();
                    FormOutcome::SignedIn(identity)
                }
                Err(failure) => self.reject(failure),
            },
            AuthMode::Register => {
                let result = auth
                    .register(
                        backend,
                        self.email.trim(),
                        self.username.trim(),
                        &self.password,
                    )
                    .await;
                match result {
                    Ok(()) => {
                        self.mode = AuthMode::Login;
                        self.clear_fields();
                        FormOutcome::Registered
                    }
                    Err(failure) => self.reject(failure),
                }
            }
        }
    }

    fn reject(&mut self, failure: AuthFailure) -> FormOutcome {
        self.error = Some(failure.message().to_string());
        FormOutcome::Rejected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::LOGIN_FALLBACK;
    use crate::credential::{Credential, MemoryCredentialStore};
    use crate::error::Error;
    use crate::testing::{FakeBackend, identity};
    use crate::types::LoginResponse;

    fn filled(mode: AuthMode) -> AuthForm {
        AuthForm {
            mode,
            email: "dilan@example.com".to_string(),
            username: "dilan".to_string(),
            password: "secret".to_string(),
            error: None,
        }
    }

    #[test]
    fn screen_follows_auth_state() {
        assert_eq!(Screen::from(&AuthState::Loading), Screen::Loading);
        assert_eq!(Screen::from(&AuthState::SignedOut), Screen::Auth);
        let signed_in = AuthState::SignedIn {
            identity: identity(),
            credential: Credential::new("tok"),
        };
        assert_eq!(Screen::from(&signed_in), Screen::Chat);
        let auth = AuthStore::new(MemoryCredentialStore::new());
        assert_eq!(screen_for(&auth), Screen::Loading);
    }

    #[tokio::test]
    async fn empty_fields_are_rejected_locally() {
        let backend = FakeBackend::new();
        let mut auth = AuthStore::new(MemoryCredentialStore::new());
        let mut form = AuthForm::new();
        assert_eq!(form.submit(&mut auth, &backend).await, FormOutcome::Rejected);
        assert_eq!(form.error(), Some("Please enter your email"));

        let mut form = filled(AuthMode::Register);
        form.username.clear();
        assert_eq!(form.submit(&mut auth, &backend).await, FormOutcome::Rejected);
        assert_eq!(form.error(), Some("Please enter your username"));
        assert!(backend.call_names().is_empty());
    }

    #[tokio::test]
    async fn login_success_switches_to_chat() {
        let backend = FakeBackend::new().with_login(Ok(LoginResponse {
            access_token: "tok".to_string(),
            token_type: "bearer".to_string(),
            user: identity(),
        }));
        let mut auth = AuthStore::new(MemoryCredentialStore::new());
        let mut form = filled(AuthMode::Login);
        let outcome = form.submit(&mut auth, &backend).await;
        assert_eq!(outcome, FormOutcome::SignedIn(identity()));
        assert_eq!(screen_for(&auth), Screen::Chat);
        assert!(form.password.is_empty());
    }

    #[tokio::test]
    async fn login_failure_shows_inline_error() {
        let backend = FakeBackend::new().with_login(Err(Error::connection("refused", None)));
        let mut auth = AuthStore::new(MemoryCredentialStore::new());
        auth.init(&backend).await;
        let mut form = filled(AuthMode::Login);
        assert_eq!(form.submit(&mut auth, &backend).await, FormOutcome::Rejected);
        assert_eq!(form.error(), Some(LOGIN_FALLBACK));
        assert_eq!(screen_for(&auth), Screen::Auth);
        assert_eq!(form.email, "dilan@example.com");
    }

    #[tokio::test]
    async fn registration_flips_to_login_and_clears() {
        let backend = FakeBackend::new().with_register(Ok(identity()));
        let mut auth = AuthStore::new(MemoryCredentialStore::new());
        auth.init(&backend).await;
        let mut form = filled(AuthMode::Register);
        assert_eq!(form.submit(&mut auth, &backend).await, FormOutcome::Registered);
        assert_eq!(form.mode, AuthMode::Login);
        assert!(form.email.is_empty());
        assert!(form.username.is_empty());
        assert!(form.password.is_empty());
        assert_eq!(screen_for(&auth), Screen::Auth);
    }

    #[tokio::test]
    async fn toggle_drops_error() {
        let backend = FakeBackend::new();
        let mut auth = AuthStore::new(MemoryCredentialStore::new());
        let mut form = AuthForm::new();
        form.submit(&mut auth, &backend).await;
        assert!(form.error().is_some());
        form.toggle_mode();
        assert_eq!(form.mode, AuthMode::Register);
        assert!(form.error().is_none());
    }
}
