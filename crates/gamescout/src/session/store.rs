use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use super::Session;

/// Identifies one conversation: a sender inside a chat on a gateway.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub gateway: String,
    pub chat_id: String,
    pub sender_id: String,
}

impl SessionKey {
    pub fn new(
        gateway: impl Into<String>,
        chat_id: impl Into<String>,
        sender_id: impl Into<String>,
    ) -> Self {
        Self {
            gateway: gateway.into(),
            chat_id: chat_id.into(),
            sender_id: sender_id.into(),
        }
    }

    /// Flat string form, used for map and lock keys.
    pub fn as_key(&self) -> String {
        format!("{}\0{}\0{}", self.gateway, self.chat_id, self.sender_id)
    }
}

/// In-memory sessions keyed by [`SessionKey`].
///
/// Cloning shares the underlying map. Nothing is persisted and sessions are
/// never evicted.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the session for `key`, creating an idle one on first contact.
    pub async fn get_or_create(&self, key: &SessionKey) -> Session {
        let key = key.as_key();

        // Common case: read lock only
        if let Some(session) = self.sessions.read().await.get(&key) {
            return session.clone();
        }

        let mut sessions = self.sessions.write().await;
        sessions.entry(key).or_default().clone()
    }

    /// Look up a session without creating it.
    pub async fn get(&self, key: &SessionKey) -> Option<Session> {
        self.sessions.read().await.get(&key.as_key()).cloned()
    }

    /// Store `session` for `key`, stamping `updated_at`.
    pub async fn save(&self, key: &SessionKey, mut session: Session) {
        session.updated_at = Utc::now();
        self.sessions.write().await.insert(key.as_key(), session);
    }

    /// Number of known sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
