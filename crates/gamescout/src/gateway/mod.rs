//! Chat gateway integration.
//!
//! A gateway owns the connection to a chat platform and talks to the core
//! through the gateway protocol:
//!
//! ```text
//! ┌──────────────┐  GatewayEvent   ┌────────────────┐  text   ┌────────────┐
//! │   Telegram   │ ──────────────▶ │ GatewayManager │ ──────▶ │ Dispatcher │
//! │   gateway    │ ◀────────────── │                │ ◀────── │            │
//! └──────────────┘  GatewayCommand └────────────────┘  Reply  └────────────┘
//! ```
//!
//! Built-in gateways are compiled in behind feature flags and exchange
//! protocol values over tokio channels. Inbound messages go through a
//! per-session FIFO ([`queue`]) before reaching the dispatcher.

pub mod handler;
pub mod manager;
pub mod queue;

pub use gamescout_gateway_protocol::{
    GatewayCommand, GatewayEvent, MediaPayload, MessageContent, MessageReceivedData,
    ReplyKeyboard, Sender, capabilities, error_codes,
};

pub use handler::BotMessageHandler;
pub use manager::{
    DEFAULT_MESSAGE_HANDLER_TIMEOUT, GatewayHandle, GatewayManager, MessageHandler, SendError,
};

#[cfg(feature = "gateway-telegram")]
pub use gamescout_gateway_telegram::{TelegramConfig, TelegramGateway};
