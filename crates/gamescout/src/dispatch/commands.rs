//! Slash commands handled outside the conversation flow.

use crate::session::SessionKey;

use super::Dispatcher;
use super::reply::{self, Reply};

// ============================================================================
// Command Handlers
// ============================================================================

impl Dispatcher {
    /// Handle a slash command (text after the leading `/`).
    ///
    /// Returns `None` for commands that are not handled here; those go through
    /// normal conversation routing. `/start` is one of them since it is part
    /// of the state machine.
    pub(super) async fn handle_command(&self, command: &str, key: &SessionKey) -> Option<Reply> {
        match command_name(command) {
            "latest" => Some(self.handle_latest_command().await),
            "status" => Some(self.handle_status_command(key).await),
            _ => None,
        }
    }

    async fn handle_latest_command(&self) -> Reply {
        let digest = self.sources.latest_release().await;
        reply::render_release(&digest)
    }

    async fn handle_status_command(&self, key: &SessionKey) -> Reply {
        let Some(session) = self.sessions.get(key).await else {
            return Reply::text("No conversation yet. Send /start to begin.");
        };
        Reply::text(format!(
            "Flow: {}\nStarted: {}",
            session.flow,
            session.created_at.format("%Y-%m-%d %H:%M UTC"),
        ))
    }
}

/// Command name without arguments or a `@botname` suffix.
fn command_name(command: &str) -> &str {
    let word = command.split_whitespace().next().unwrap_or("");
    word.split('@').next().unwrap_or(word)
}
