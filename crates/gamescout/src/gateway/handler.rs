//! Message handler that feeds gateway messages to the dispatcher.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use gamescout_gateway_protocol::{MessageContent, MessageReceivedData};

use super::MessageHandler;
use crate::dispatch::{Dispatcher, Reply};
use crate::session::SessionKey;

/// Routes text messages to the [`Dispatcher`], one session per sender in
/// each chat.
pub struct BotMessageHandler {
    dispatcher: Arc<Dispatcher>,
}

impl BotMessageHandler {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }
}

#[async_trait]
impl MessageHandler for BotMessageHandler {
    async fn handle_message(&self, gateway: &str, data: &MessageReceivedData) -> Option<Reply> {
        let Some(text) = extract_text(&data.content) else {
            debug!(
                gateway = %gateway,
                chat_id = %data.chat_id,
                "Ignoring non-text message"
            );
            return None;
        };

        let key = SessionKey::new(gateway, &data.chat_id, &data.sender.id);
        Some(self.dispatcher.dispatch(&key, text).await)
    }
}

/// Only typed text and keyboard presses drive the conversation.
fn extract_text(content: &MessageContent) -> Option<&str> {
    content.as_text()
}
