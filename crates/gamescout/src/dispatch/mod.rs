//! Inbound text dispatch.
//!
//! The [`Dispatcher`] owns every session. For each message it takes the
//! session's lock, runs the pure state machine ([`machine::transition`]),
//! executes the resulting action against the data sources and stores the
//! new session. Messages for different sessions are handled concurrently;
//! messages for the same session run one at a time.

mod commands;
pub mod machine;
pub mod reply;

pub use machine::{Action, ConversationPolicy, Transition, transition};
pub use reply::{Outbound, Reply};

use std::sync::Arc;

use tracing::debug;

use crate::config::ConversationConfig;
use crate::session::{SessionKey, SessionStore};
use crate::sources::GameSources;
use crate::sync::KeyedLocks;

/// Routes inbound text to the state machine and the data sources.
pub struct Dispatcher {
    sources: Arc<dyn GameSources>,
    sessions: SessionStore,
    locks: KeyedLocks,
    policy: ConversationPolicy,
}

impl Dispatcher {
    pub fn new(sources: Arc<dyn GameSources>, policy: ConversationPolicy) -> Self {
        Self {
            sources,
            sessions: SessionStore::new(),
            locks: KeyedLocks::new(),
            policy,
        }
    }

    /// Create a dispatcher using the conversation section of the config.
    pub fn from_config(sources: Arc<dyn GameSources>, config: &ConversationConfig) -> Self {
        Self::new(
            sources,
            ConversationPolicy {
                max_count_attempts: config.max_count_attempts,
            },
        )
    }

    /// Shared handle to the session store.
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Handle one inbound text for the session identified by `key`.
    pub async fn dispatch(&self, key: &SessionKey, text: &str) -> Reply {
        let lock = self.locks.get(&key.as_key());
        let _guard = lock.lock().await;

        if let Some(command) = text.trim().strip_prefix('/')
            && let Some(reply) = self.handle_command(command, key).await
        {
            return reply;
        }

        let session = self.sessions.get_or_create(key).await;
        let Transition {
            session: next,
            action,
        } = transition(&session, text, &self.policy);

        debug!(
            gateway = %key.gateway,
            chat_id = %key.chat_id,
            from = %session.flow,
            to = %next.flow,
            "Session transition"
        );

        // Saved before the source call; the lock is held across both
        self.sessions.save(key, next).await;

        self.execute(action).await
    }

    async fn execute(&self, action: Action) -> Reply {
        match action {
            Action::Reply(reply) => reply,
            Action::QueryCatalog(genre) => {
                let outcome = self.sources.query_catalog(&genre).await;
                reply::render_catalog(&genre, &outcome)
            }
            Action::ListGenres => {
                let listing = self.sources.list_genres().await;
                reply::render_genres(&listing)
            }
            Action::FetchImages(count) => {
                let outcome = self.sources.upcoming_images(count).await;
                reply::render_images(&outcome)
            }
        }
    }
}
