//! Bot server command implementation.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, bail};
use tokio::signal;
use tracing::{info, warn};

use gamescout::build_info;
use gamescout::config::Config;
use gamescout::gateway::{BotMessageHandler, GatewayManager};

use super::build_dispatcher;

pub async fn run(config_path: &str) -> Result<()> {
    let config = Config::load(config_path).await?;
    info!(version = %build_info::version_string(), "Starting gamescout");

    let dispatcher = build_dispatcher(&config)?;
    let gateways = GatewayManager::new(Duration::from_secs(
        config.conversation.handler_timeout_seconds,
    ));
    gateways
        .set_handler(Arc::new(BotMessageHandler::new(dispatcher)))
        .await;

    #[cfg(feature = "gateway-telegram")]
    if let Some(ref telegram_config) = config.gateways.telegram
        && telegram_config.enabled
    {
        start_telegram_gateway(&gateways, telegram_config.clone()).await;
    }

    if gateways.list().await.is_empty() {
        bail!(
            "No gateway enabled in '{}'. Configure gateways.telegram.bot_token, \
             or use `gamescout chat` to talk to the bot locally.",
            config_path
        );
    }

    shutdown_signal().await;

    gateways.shutdown().await;
    info!("Bot stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
        _ = terminate => info!("Received SIGTERM, shutting down..."),
    }
}

/// Start the Telegram gateway in a background task.
#[cfg(feature = "gateway-telegram")]
async fn start_telegram_gateway(
    gateways: &GatewayManager,
    config: gamescout::config::TelegramGatewayConfig,
) {
    use gamescout::gateway::{TelegramConfig, TelegramGateway, capabilities};

    let (cmd_rx, evt_tx) = gateways
        .register(
            "telegram",
            vec![
                capabilities::MEDIA.to_string(),
                capabilities::TYPING.to_string(),
                capabilities::REPLY_KEYBOARD.to_string(),
            ],
        )
        .await;

    let gateway = TelegramGateway::new(TelegramConfig::new(&config.bot_token));
    tokio::spawn(async move {
        gateway.start(evt_tx, cmd_rx).await;
    });

    info!("Telegram gateway started");
}
