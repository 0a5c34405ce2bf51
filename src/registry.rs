//! The list of a user's chat sessions.

use crate::backend::Backend;
use crate::credential::Credential;
use crate::error::Result;
use crate::observability::SESSION_REFRESH_FAILURES;
use crate::types::{ChatMessage, SessionInfo};

/// Sidebar data: the user's sessions in server order.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    sessions: Vec<SessionInfo>,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The sessions as of the last refresh.
    pub fn sessions(&self) -> &[SessionInfo] {
        &self.sessions
    }

    /// Returns true if no sessions are known.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Look up a session by its id.
    pub fn get(&self, session_id: &str) -> Option<&SessionInfo> {
        self.sessions.iter().find(|s| s.id == session_id)
    }

    /// Resolve a user-typed selector: a 1-based position in the list, or an id.
    pub fn resolve(&self, selector: &str) -> Option<&SessionInfo> {
        let selector = selector.trim();
        if let Ok(position) = selector.parse::<usize>()
            && position >= 1
            && let Some(session) = self.sessions.get(position - 1)
        {
            return Some(session);
        }
        self.get(selector)
    }

    /// Forget every session.
    pub fn clear(&mut self) {
        self.sessions.clear();
    }

    /// Refetch the list.  A failure is logged and leaves the list empty.
    pub async fn refresh<B: Backend + ?Sized>(
        &mut self,
        backend: &B,
        credential: Option<&Credential>,
    ) -> &[SessionInfo] {
        match backend.list_sessions(credential).await {
            Ok(sessions) => self.sessions = sessions,
            Err(err) => {
                SESSION_REFRESH_FAILURES.click();
                tracing::warn!(error = %err, "could not fetch chat sessions");
                self.sessions.clear();
            }
        }
        &self.sessions
    }

    /// Fetch the transcript of one session, oldest message first.
    pub async fn fetch_messages<B: Backend + ?Sized>(
        &self,
        backend: &B,
        credential: Option<&Credential>,
        session_id: &str,
    ) -> Result<Vec<ChatMessage>> {
        backend.session_messages(credential, session_id).await
    }

    /// Delete a session remotely, then refresh the list.
    pub async fn delete<B: Backend + ?Sized>(
        &mut self,
        backend: &B,
        credential: Option<&Credential>,
        session_id: &str,
    ) -> Result<()> {
        backend.delete_session(credential, session_id).await?;
        self.refresh(backend, credential).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::testing::{FakeBackend, session};

    #[tokio::test]
    async fn refresh_keeps_server_order() {
        let backend = FakeBackend::new().with_sessions(Ok(vec![
            session("s-2", "Newest"),
            session("s-1", "Older"),
        ]));
        let mut registry = SessionRegistry::new();
        let credential = Credential::new("tok");
        let sessions = registry.refresh(&backend, Some(&credential)).await;
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].id, "s-2");
    }

    #[tokio::test]
    async fn refresh_failure_empties_list() {
        let mut registry = SessionRegistry::new();
        let backend = FakeBackend::new().with_sessions(Ok(vec![session("s-1", "One")]));
        registry.refresh(&backend, None).await;
        assert!(!registry.is_empty());

        let backend = FakeBackend::new().with_sessions(Err(Error::api(500, None, "boom")));
        assert!(registry.refresh(&backend, None).await.is_empty());
    }

    #[tokio::test]
    async fn delete_then_refresh() {
        let backend = FakeBackend::new()
            .with_delete(Ok(()))
            .with_sessions(Ok(vec![session("s-2", "Remaining")]));
        let mut registry = SessionRegistry::new();
        registry.delete(&backend, None, "s-1").await.unwrap();
        assert_eq!(backend.call_names(), vec!["delete_session", "list_sessions"]);
        assert_eq!(registry.sessions()[0].id, "s-2");
    }

    #[tokio::test]
    async fn failed_delete_skips_refresh() {
        let backend = FakeBackend::new().with_delete(Err(Error::api(
            404,
            Some("Session not found".to_string()),
            "Session not found",
        )));
        let mut registry = SessionRegistry::new();
        let err = registry.delete(&backend, None, "gone").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(backend.call_names(), vec!["delete_session"]);
    }

    #[tokio::test]
    async fn resolve_by_position_or_id() {
        let backend = FakeBackend::new().with_sessions(Ok(vec![
            session("abc", "First"),
            session("def", "Second"),
        ]));
        let mut registry = SessionRegistry::new();
        registry.refresh(&backend, None).await;
        assert_eq!(registry.resolve("2").unwrap().id, "def");
        assert_eq!(registry.resolve(" abc ").unwrap().id, "abc");
        assert!(registry.resolve("0").is_none());
        assert!(registry.resolve("3").is_none());
        assert!(registry.resolve("zzz").is_none());
    }
}
