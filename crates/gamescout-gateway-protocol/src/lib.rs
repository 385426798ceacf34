//! Gateway Protocol types for communication between gamescout and chat gateways.
//!
//! A gateway owns the connection to a chat platform (Telegram today) and
//! speaks two message types with the core:
//!
//! - **Commands** (gamescout → gateway): send a text reply, send a photo, show typing
//! - **Events** (gateway → gamescout): inbound text, command acknowledgements, errors
//!
//! Built-in gateways exchange these values over tokio channels. The serde
//! representation is JSON tagged by `type`, so the same types can be written
//! as JSON Lines by an out-of-process gateway.
//!
//! # Example
//!
//! ```ignore
//! use gamescout_gateway_protocol::{GatewayCommand, ReplyKeyboard};
//!
//! let command = GatewayCommand::SendMessage {
//!     request_id: "req_001".to_string(),
//!     chat_id: "42".to_string(),
//!     content: "Choose a game genre:".to_string(),
//!     keyboard: Some(ReplyKeyboard::single_row(["Action", "Indie"])),
//! };
//! println!("{}", serde_json::to_string(&command)?);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Commands (gamescout → Gateway)
// ============================================================================

/// Commands sent from gamescout to a gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GatewayCommand {
    /// Send a text message to a chat.
    SendMessage {
        request_id: String,
        chat_id: String,
        content: String,
        /// Optional reply keyboard shown under the input field.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        keyboard: Option<ReplyKeyboard>,
    },

    /// Send media to a chat.
    SendMedia {
        request_id: String,
        chat_id: String,
        media: MediaPayload,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        caption: Option<String>,
    },

    /// Show typing indicator in a chat.
    SendTyping { chat_id: String },

    /// Request graceful shutdown.
    Shutdown,
}

impl GatewayCommand {
    /// Request id of the command, if it carries one.
    pub fn request_id(&self) -> Option<&str> {
        match self {
            GatewayCommand::SendMessage { request_id, .. }
            | GatewayCommand::SendMedia { request_id, .. } => Some(request_id),
            GatewayCommand::SendTyping { .. } | GatewayCommand::Shutdown => None,
        }
    }
}

/// Reply keyboard: rows of plain-text buttons.
///
/// Pressing a button sends its label back as an ordinary text message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyKeyboard {
    pub rows: Vec<Vec<String>>,
    /// Ask the client to shrink the keyboard to fit its buttons.
    #[serde(default)]
    pub resize: bool,
}

impl ReplyKeyboard {
    /// Create a resized keyboard with every label on one row.
    pub fn single_row<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rows: vec![labels.into_iter().map(Into::into).collect()],
            resize: true,
        }
    }

    /// All button labels in row order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().flatten().map(String::as_str)
    }
}

/// Media payload for the SendMedia command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum MediaPayload {
    /// Photo the platform fetches from a URL.
    PhotoUrl { url: String },
}

// ============================================================================
// Events (Gateway → gamescout)
// ============================================================================

/// Events sent from a gateway to gamescout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GatewayEvent {
    /// Gateway is ready to receive commands.
    Ready {
        gateway: String,
        version: String,
        #[serde(default)]
        capabilities: Vec<String>,
    },

    /// Incoming message from a user.
    MessageReceived(Box<MessageReceivedData>),

    /// Command completed successfully.
    CommandOk {
        request_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message_id: Option<String>,
    },

    /// Command failed.
    CommandError {
        request_id: String,
        code: String,
        message: String,
    },

    /// Gateway-level error (not tied to a specific command).
    Error {
        code: String,
        message: String,
        /// Whether this error is fatal (gateway will shut down).
        #[serde(default)]
        fatal: bool,
    },

    /// Gateway is shutting down.
    Shutdown { reason: String },
}

/// Data for an incoming message event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageReceivedData {
    pub message_id: String,
    pub chat_id: String,
    pub sender: Sender,
    pub content: MessageContent,
    /// Timestamp when the message was sent (from the platform).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Sender information for incoming messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sender {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// Content of an incoming message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    /// Plain text message.
    Text { text: String },

    /// Media message with an optional caption.
    Media {
        media_type: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        caption: Option<String>,
    },

    /// Unknown/unsupported content type.
    Unknown {
        #[serde(default)]
        raw: serde_json::Value,
    },
}

impl MessageContent {
    /// Extract the text of a text message.
    ///
    /// Media captions are not treated as text: the bot only reacts to typed
    /// input and keyboard presses.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MessageContent::Text { text } => Some(text),
            _ => None,
        }
    }
}

// ============================================================================
// Gateway Capabilities
// ============================================================================

/// Well-known gateway capabilities.
pub mod capabilities {
    /// Gateway supports sending media.
    pub const MEDIA: &str = "media";
    /// Gateway supports typing indicators.
    pub const TYPING: &str = "typing";
    /// Gateway supports reply keyboards.
    pub const REPLY_KEYBOARD: &str = "reply_keyboard";
}

// ============================================================================
// Error Codes
// ============================================================================

/// Well-known error codes for CommandError and Error events.
pub mod error_codes {
    /// Sending a text message failed.
    pub const SEND_FAILED: &str = "send_failed";
    /// Sending media failed.
    pub const MEDIA_FAILED: &str = "media_failed";
    /// Platform API error.
    pub const PLATFORM_ERROR: &str = "platform_error";
}
