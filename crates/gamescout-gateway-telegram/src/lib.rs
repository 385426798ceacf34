//! Telegram gateway for gamescout using teloxide.
//!
//! The gateway long-polls the Bot API, turns incoming text into
//! [`GatewayEvent::MessageReceived`] and executes [`GatewayCommand`]s
//! (text replies with reply keyboards, photos fetched by URL).
//!
//! Commands are executed one at a time in the order they arrive, so a batch
//! of replies for one chat keeps its ordering. A failed command is reported
//! as [`GatewayEvent::CommandError`] and the next command still runs.

use std::time::Duration;

use gamescout_gateway_protocol::{
    GatewayCommand, GatewayEvent, MediaPayload, MessageContent, MessageReceivedData,
    ReplyKeyboard, Sender, capabilities, error_codes,
};
use teloxide::prelude::*;
use teloxide::types::{InputFile, KeyboardButton, KeyboardMarkup, MediaKind, MessageKind};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Long-polling timeout passed to `getUpdates`.
const POLLING_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// Configuration
// ============================================================================

/// Configuration for the Telegram gateway.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    /// Telegram bot token from BotFather.
    pub bot_token: String,
}

impl TelegramConfig {
    /// Create a new config with the given bot token.
    pub fn new(bot_token: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
        }
    }
}

// ============================================================================
// Telegram Gateway
// ============================================================================

/// Telegram gateway that bridges the Telegram Bot API with gamescout.
pub struct TelegramGateway {
    config: TelegramConfig,
}

impl TelegramGateway {
    /// Create a new Telegram gateway.
    pub fn new(config: TelegramConfig) -> Self {
        Self { config }
    }

    /// Start the gateway and communicate via the provided channels.
    ///
    /// This method blocks until shutdown is requested.
    pub async fn start(
        self,
        event_tx: mpsc::Sender<GatewayEvent>,
        mut command_rx: mpsc::Receiver<GatewayCommand>,
    ) {
        // HTTP timeout must outlive the polling timeout
        let client = match teloxide::net::default_reqwest_settings()
            .timeout(POLLING_TIMEOUT + Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
        {
            Ok(client) => client,
            Err(e) => {
                error!(error = %e, "Failed to build HTTP client");
                let _ = event_tx
                    .send(GatewayEvent::Error {
                        code: error_codes::PLATFORM_ERROR.to_string(),
                        message: format!("failed to build HTTP client: {e}"),
                        fatal: true,
                    })
                    .await;
                return;
            }
        };

        let bot = Bot::with_client(&self.config.bot_token, client);

        let ready_event = GatewayEvent::Ready {
            gateway: "telegram".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            capabilities: vec![
                capabilities::MEDIA.to_string(),
                capabilities::TYPING.to_string(),
                capabilities::REPLY_KEYBOARD.to_string(),
            ],
        };
        if event_tx.send(ready_event).await.is_err() {
            error!("Failed to send ready event");
            return;
        }

        info!("Telegram gateway starting");

        let handler = Update::filter_message().endpoint({
            let event_tx = event_tx.clone();
            move |msg: Message| {
                let event_tx = event_tx.clone();
                async move {
                    if let Err(e) = handle_message(&msg, &event_tx).await {
                        warn!(error = %e, "Failed to handle message");
                    }
                    respond(())
                }
            }
        });

        let mut dispatcher = Dispatcher::builder(bot.clone(), handler).build();
        let shutdown_token = dispatcher.shutdown_token();

        let bot_for_commands = bot.clone();
        let event_tx_for_commands = event_tx.clone();

        let command_handle = tokio::spawn(async move {
            while let Some(command) = command_rx.recv().await {
                let event = match command {
                    GatewayCommand::SendMessage {
                        request_id,
                        chat_id,
                        content,
                        keyboard,
                    } => {
                        match send_message(&bot_for_commands, &chat_id, &content, keyboard.as_ref())
                            .await
                        {
                            Ok(msg_id) => GatewayEvent::CommandOk {
                                request_id,
                                message_id: Some(msg_id),
                            },
                            Err(e) => GatewayEvent::CommandError {
                                request_id,
                                code: error_codes::SEND_FAILED.to_string(),
                                message: e,
                            },
                        }
                    }

                    GatewayCommand::SendMedia {
                        request_id,
                        chat_id,
                        media,
                        caption,
                    } => match send_media(&bot_for_commands, &chat_id, &media, caption).await {
                        Ok(msg_id) => GatewayEvent::CommandOk {
                            request_id,
                            message_id: Some(msg_id),
                        },
                        Err(e) => GatewayEvent::CommandError {
                            request_id,
                            code: error_codes::MEDIA_FAILED.to_string(),
                            message: e,
                        },
                    },

                    GatewayCommand::SendTyping { chat_id } => {
                        let Ok(chat_id) = chat_id.parse::<i64>() else {
                            continue;
                        };
                        let _ = bot_for_commands
                            .send_chat_action(ChatId(chat_id), teloxide::types::ChatAction::Typing)
                            .await;
                        continue;
                    }

                    GatewayCommand::Shutdown => {
                        info!("Telegram gateway received shutdown command");
                        match shutdown_token.shutdown() {
                            Ok(done) => drop(done),
                            Err(e) => warn!(error = ?e, "Dispatcher was not running"),
                        }
                        let _ = event_tx_for_commands
                            .send(GatewayEvent::Shutdown {
                                reason: "shutdown requested".to_string(),
                            })
                            .await;
                        break;
                    }
                };

                if event_tx_for_commands.send(event).await.is_err() {
                    break;
                }
            }
            debug!("Command handler stopped");
        });

        let polling = teloxide::update_listeners::Polling::builder(bot)
            .timeout(POLLING_TIMEOUT)
            .build();

        // Blocks until shutdown
        dispatcher
            .dispatch_with_listener(
                polling,
                teloxide::error_handlers::LoggingErrorHandler::with_custom_text(
                    "Telegram polling error (will retry)",
                ),
            )
            .await;

        command_handle.abort();
        info!("Telegram gateway stopped");
    }
}

// ============================================================================
// Message Handling
// ============================================================================

async fn handle_message(
    msg: &Message,
    event_tx: &mpsc::Sender<GatewayEvent>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let Some(content) = extract_content(msg) else {
        debug!("Ignoring message without extractable content");
        return Ok(());
    };

    let event = GatewayEvent::MessageReceived(Box::new(MessageReceivedData {
        message_id: msg.id.0.to_string(),
        chat_id: msg.chat.id.0.to_string(),
        sender: extract_sender(msg),
        content,
        timestamp: Some(msg.date),
    }));

    event_tx.send(event).await?;
    Ok(())
}

fn extract_content(msg: &Message) -> Option<MessageContent> {
    match &msg.kind {
        MessageKind::Common(common) => match &common.media_kind {
            MediaKind::Text(text) => Some(MessageContent::Text {
                text: text.text.clone(),
            }),
            MediaKind::Photo(photo) => Some(MessageContent::Media {
                media_type: "image".to_string(),
                caption: photo.caption.clone(),
            }),
            MediaKind::Document(doc) => Some(MessageContent::Media {
                media_type: "document".to_string(),
                caption: doc.caption.clone(),
            }),
            _ => None,
        },
        _ => None,
    }
}

fn extract_sender(msg: &Message) -> Sender {
    msg.from
        .as_ref()
        .map(|user| Sender {
            id: user.id.0.to_string(),
            username: user.username.clone(),
            display_name: Some(
                format!(
                    "{} {}",
                    user.first_name,
                    user.last_name.as_deref().unwrap_or("")
                )
                .trim()
                .to_string(),
            ),
        })
        .unwrap_or_else(|| Sender {
            // Channel posts have no sender; fall back to the chat itself
            id: msg.chat.id.0.to_string(),
            username: None,
            display_name: None,
        })
}

// ============================================================================
// Command Execution
// ============================================================================

async fn send_message(
    bot: &Bot,
    chat_id: &str,
    content: &str,
    keyboard: Option<&ReplyKeyboard>,
) -> Result<String, String> {
    let chat_id = parse_chat_id(chat_id)?;

    let mut request = bot.send_message(ChatId(chat_id), content);
    if let Some(keyboard) = keyboard {
        request = request.reply_markup(convert_reply_keyboard(keyboard));
    }

    let msg = request.await.map_err(|e| e.to_string())?;
    Ok(msg.id.0.to_string())
}

async fn send_media(
    bot: &Bot,
    chat_id: &str,
    media: &MediaPayload,
    caption: Option<String>,
) -> Result<String, String> {
    let chat_id = parse_chat_id(chat_id)?;

    let MediaPayload::PhotoUrl { url } = media;
    let url = url::Url::parse(url).map_err(|e| format!("invalid media url '{url}': {e}"))?;

    let mut request = bot.send_photo(ChatId(chat_id), InputFile::url(url));
    if let Some(caption) = caption {
        request = request.caption(caption);
    }

    let msg = request.await.map_err(|e| e.to_string())?;
    Ok(msg.id.0.to_string())
}

/// Convert a protocol ReplyKeyboard to a teloxide KeyboardMarkup.
fn convert_reply_keyboard(keyboard: &ReplyKeyboard) -> KeyboardMarkup {
    let rows = keyboard
        .rows
        .iter()
        .map(|row| row.iter().map(KeyboardButton::new).collect::<Vec<_>>());

    let markup = KeyboardMarkup::new(rows);
    if keyboard.resize {
        markup.resize_keyboard()
    } else {
        markup
    }
}

fn parse_chat_id(chat_id: &str) -> Result<i64, String> {
    chat_id.parse().map_err(|_| "invalid chat_id".to_string())
}
