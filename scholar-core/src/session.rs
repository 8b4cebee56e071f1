use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{Message, ScholarError, SessionState, StateUpdate};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub app_name: String,
    pub user_id: String,
    pub session_id: String,
}

impl SessionKey {
    pub fn new(
        app_name: impl Into<String>,
        user_id: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            user_id: user_id.into(),
            session_id: session_id.into(),
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.app_name, self.user_id, self.session_id)
    }
}

/// Everything the process keeps about one conversation.
#[derive(Clone, Debug, Default)]
pub struct Session {
    pub state: SessionState,
    transcripts: HashMap<String, Vec<Message>>,
    turns: HashMap<String, u32>,
}

impl Session {
    pub fn transcript(&self, agent: &str) -> &[Message] {
        self.transcripts.get(agent).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn turns(&self, agent: &str) -> u32 {
        self.turns.get(agent).copied().unwrap_or(0)
    }
}

/// In-memory store of live sessions. Cloning shares the same sessions.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<SessionKey, Session>>>,
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore").finish_non_exhaustive()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create_session(&self, key: SessionKey) -> Result<(), ScholarError> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&key) {
            return Err(ScholarError::SessionExists(key.to_string()));
        }
        sessions.insert(key, Session::default());
        Ok(())
    }

    pub async fn get_session(&self, key: &SessionKey) -> Result<Session, ScholarError> {
        self.sessions
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| ScholarError::SessionNotFound(key.to_string()))
    }

    pub async fn state(&self, key: &SessionKey) -> Result<SessionState, ScholarError> {
        self.read(key, |session| session.state.clone()).await
    }

    pub async fn apply(&self, key: &SessionKey, update: StateUpdate) -> Result<(), ScholarError> {
        self.write(key, |session| session.state.apply(update)).await
    }

    /// Bumps the turn counter of `agent` and returns the new turn number
    /// (starting at 1).
    pub async fn begin_turn(&self, key: &SessionKey, agent: &str) -> Result<u32, ScholarError> {
        self.write(key, |session| {
            let turn = session.turns.entry(agent.to_string()).or_insert(0);
            *turn += 1;
            *turn
        })
        .await
    }

    pub async fn transcript(
        &self,
        key: &SessionKey,
        agent: &str,
    ) -> Result<Vec<Message>, ScholarError> {
        self.read(key, |session| session.transcript(agent).to_vec())
            .await
    }

    pub async fn append_transcript(
        &self,
        key: &SessionKey,
        agent: &str,
        messages: Vec<Message>,
    ) -> Result<(), ScholarError> {
        self.write(key, |session| {
            session
                .transcripts
                .entry(agent.to_string())
                .or_default()
                .extend(messages)
        })
        .await
    }

    pub async fn delete_session(&self, key: &SessionKey) -> Option<Session> {
        self.sessions.write().await.remove(key)
    }

    async fn read<R>(
        &self,
        key: &SessionKey,
        f: impl FnOnce(&Session) -> R,
    ) -> Result<R, ScholarError> {
        let sessions = self.sessions.read().await;
        let session = sessions
            .get(key)
            .ok_or_else(|| ScholarError::SessionNotFound(key.to_string()))?;
        Ok(f(session))
    }

    async fn write<R>(
        &self,
        key: &SessionKey,
        f: impl FnOnce(&mut Session) -> R,
    ) -> Result<R, ScholarError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(key)
            .ok_or_else(|| ScholarError::SessionNotFound(key.to_string()))?;
        Ok(f(session))
    }
}
