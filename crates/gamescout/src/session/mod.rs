//! Per-user conversation state.
//!
//! A [`Session`] records which multi-turn flow, if any, a user is in. Sessions
//! are created on the first message and live for the rest of the process.

mod store;

pub use store::{SessionKey, SessionStore};

use std::fmt;

use chrono::{DateTime, Utc};

/// Multi-turn flow in progress.
///
/// At most one flow is active; entering a flow replaces the previous one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Flow {
    #[default]
    Idle,
    /// Next text is a free-form genre.
    AwaitingCustomGenre,
    /// Next text should be a positive image count.
    AwaitingImageCount,
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Flow::Idle => "idle",
            Flow::AwaitingCustomGenre => "awaiting custom genre",
            Flow::AwaitingImageCount => "awaiting image count",
        };
        f.write_str(name)
    }
}

/// Conversation state for one user in one chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub flow: Flow,
    /// Last accepted image count.
    pub pending_image_count: u32,
    /// Consecutive invalid answers to the image-count prompt.
    pub invalid_count_attempts: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            flow: Flow::Idle,
            pending_image_count: 0,
            invalid_count_attempts: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Enter `flow`, dropping whatever flow was pending.
    pub fn enter(&mut self, flow: Flow) {
        self.flow = flow;
        self.invalid_count_attempts = 0;
    }

    /// Return to [`Flow::Idle`].
    pub fn reset(&mut self) {
        self.enter(Flow::Idle);
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
