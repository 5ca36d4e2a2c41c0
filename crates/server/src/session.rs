//! Per-user session store
//!
//! Sessions are keyed by user name and live for the process lifetime.
//! Each session's mutable state sits behind its own async mutex, so
//! concurrent turns for the same user serialize instead of racing on
//! the turn log.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::Mutex;

use avatar_core::{ResumeSummary, Turn};

/// Mutable conversational state for one user
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    /// Structured resume summary, placeholder until an upload happens
    pub resume_summary: ResumeSummary,
    /// Has the assistant introduced itself to this user yet
    pub first_greeted: bool,
    /// Ordered log of prior turns
    pub turns: Vec<Turn>,
}

/// One user's session
pub struct Session {
    pub user_name: String,
    state: Mutex<SessionState>,
}

impl Session {
    fn new(user_name: impl Into<String>, state: SessionState) -> Self {
        Self {
            user_name: user_name.into(),
            state: Mutex::new(state),
        }
    }

    /// Lock this session's state; holds out concurrent turns for the
    /// same user until released
    pub async fn lock(&self) -> tokio::sync::MutexGuard<'_, SessionState> {
        self.state.lock().await
    }
}

/// In-memory session store
///
/// No eviction and no persistence: state lasts exactly as long as the
/// process, matching the demo's contract.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the session for `user_name`, creating a default one for
    /// unseen users
    pub fn get_or_create(&self, user_name: &str) -> Arc<Session> {
        if let Some(session) = self.sessions.read().get(user_name) {
            return session.clone();
        }

        let mut sessions = self.sessions.write();
        sessions
            .entry(user_name.to_string())
            .or_insert_with(|| {
                tracing::info!(user = user_name, "creating session");
                Arc::new(Session::new(user_name, SessionState::default()))
            })
            .clone()
    }

    /// Create or replace the session for a fresh resume upload
    pub fn create_with_resume(&self, user_name: &str, resume_summary: ResumeSummary) -> Arc<Session> {
        let session = Arc::new(Session::new(
            user_name,
            SessionState {
                resume_summary,
                first_greeted: false,
                turns: Vec::new(),
            },
        ));
        self.sessions
            .write()
            .insert(user_name.to_string(), session.clone());
        tracing::info!(user = user_name, "created session from resume upload");
        session
    }

    pub fn count(&self) -> usize {
        self.sessions.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use avatar_core::TurnRole;

    #[tokio::test]
    async fn test_get_or_create_returns_same_session() {
        let store = SessionStore::new();
        let a = store.get_or_create("asha");
        let b = store.get_or_create("asha");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(store.count(), 1);
    }

    #[tokio::test]
    async fn test_new_session_defaults() {
        let store = SessionStore::new();
        let session = store.get_or_create("ravi");
        let state = session.lock().await;
        assert!(!state.first_greeted);
        assert!(state.turns.is_empty());
        assert_eq!(
            state.resume_summary.experience_summary,
            "No resume summary available."
        );
    }

    #[tokio::test]
    async fn test_resume_upload_replaces_session() {
        let store = SessionStore::new();
        {
            let session = store.get_or_create("asha");
            let mut state = session.lock().await;
            state.first_greeted = true;
            state.turns.push(Turn::user("old"));
        }

        let summary = ResumeSummary {
            name: "Asha".into(),
            ..Default::default()
        };
        let session = store.create_with_resume("asha", summary);
        let state = session.lock().await;
        assert!(!state.first_greeted);
        assert!(state.turns.is_empty());
        assert_eq!(state.resume_summary.name, "Asha");
    }

    #[tokio::test]
    async fn test_turn_append_under_lock() {
        let store = SessionStore::new();
        let session = store.get_or_create("asha");

        {
            let mut state = session.lock().await;
            state.first_greeted = true;
            state.turns.push(Turn::user("hello"));
            state.turns.push(Turn::assistant("welcome"));
        }

        let state = session.lock().await;
        assert_eq!(state.turns.len(), 2);
        assert_eq!(state.turns[0].role, TurnRole::User);
        assert_eq!(state.turns[1].role, TurnRole::Assistant);
    }
}
