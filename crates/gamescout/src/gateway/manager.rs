//! Gateway Manager: connects chat gateways to the dispatcher.
//!
//! The manager:
//! - registers gateways and hands them their command/event channels
//! - runs one event loop per gateway, queueing inbound messages per session
//!   and spawning a task to drain each busy session in arrival order
//! - turns a [`Reply`] into gateway commands, one per outbound item

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{RwLock, mpsc};
use tracing::{debug, error, info, warn};

use gamescout_gateway_protocol::{
    GatewayCommand, GatewayEvent, MediaPayload, MessageReceivedData, capabilities,
};

use super::queue::{EnqueueResult, SessionMessageQueue, SessionMessageQueues};
use crate::dispatch::reply::HANDLER_TIMEOUT;
use crate::dispatch::{Outbound, Reply};
use crate::session::SessionKey;

/// Default timeout for handling one message (5 minutes).
pub const DEFAULT_MESSAGE_HANDLER_TIMEOUT: Duration = Duration::from_secs(300);

/// Capacity of the command and event channels per gateway.
const CHANNEL_CAPACITY: usize = 100;

// ============================================================================
// Gateway Manager
// ============================================================================

/// Registry and event router for all gateways.
#[derive(Clone)]
pub struct GatewayManager {
    inner: Arc<RwLock<GatewayManagerInner>>,
    queues: SessionMessageQueues,
}

struct GatewayManagerInner {
    gateways: HashMap<String, GatewayHandle>,
    handler: Option<Arc<dyn MessageHandler>>,
    message_handler_timeout: Duration,
    /// Event loop tasks, awaited at shutdown.
    event_handles: Vec<tokio::task::JoinHandle<()>>,
}

impl GatewayManager {
    /// Create a manager that gives each message `message_handler_timeout` to
    /// produce a reply.
    ///
    /// Different sessions are handled concurrently. Messages for one session
    /// are handled in arrival order, each reply sent before the next message
    /// is dispatched.
    pub fn new(message_handler_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(GatewayManagerInner {
                gateways: HashMap::new(),
                handler: None,
                message_handler_timeout,
                event_handles: Vec::new(),
            })),
            queues: SessionMessageQueues::new(),
        }
    }

    pub async fn set_handler(&self, handler: Arc<dyn MessageHandler>) {
        let mut inner = self.inner.write().await;
        inner.handler = Some(handler);
    }

    /// Register a gateway and get its channels.
    ///
    /// Returns:
    /// - `Receiver<GatewayCommand>`: the gateway reads commands here
    /// - `Sender<GatewayEvent>`: the gateway reports events here
    pub async fn register(
        &self,
        name: impl Into<String>,
        capabilities: Vec<String>,
    ) -> (mpsc::Receiver<GatewayCommand>, mpsc::Sender<GatewayEvent>) {
        let name = name.into();
        let (cmd_tx, cmd_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (evt_tx, evt_rx) = mpsc::channel(CHANNEL_CAPACITY);

        let handle = GatewayHandle {
            name: name.clone(),
            command_tx: cmd_tx,
            capabilities,
        };

        let manager = self.clone();
        let gateway_name = name.clone();
        let join_handle = tokio::spawn(async move {
            manager.handle_events(gateway_name, evt_rx).await;
        });

        {
            let mut inner = self.inner.write().await;
            inner.gateways.insert(name.clone(), handle);
            inner.event_handles.push(join_handle);
        }

        info!(gateway = %name, "Gateway registered");
        (cmd_rx, evt_tx)
    }

    pub async fn unregister(&self, name: &str) {
        let mut inner = self.inner.write().await;
        if inner.gateways.remove(name).is_some() {
            info!(gateway = %name, "Gateway unregistered");
        }
    }

    pub async fn get(&self, name: &str) -> Option<GatewayHandle> {
        let inner = self.inner.read().await;
        inner.gateways.get(name).cloned()
    }

    /// Names of all registered gateways.
    pub async fn list(&self) -> Vec<String> {
        let inner = self.inner.read().await;
        inner.gateways.keys().cloned().collect()
    }

    /// Send every item of `reply` to a chat, in order.
    ///
    /// Each item becomes its own command. Whether the platform accepted it is
    /// reported later as `CommandOk` or `CommandError`.
    pub async fn send_reply(
        &self,
        gateway: &str,
        chat_id: &str,
        reply: Reply,
    ) -> Result<(), SendError> {
        let Some(handle) = self.get(gateway).await else {
            warn!(gateway = %gateway, "Gateway not found");
            return Err(SendError::GatewayNotFound(gateway.to_string()));
        };

        for item in reply.items {
            handle.send(outbound_to_command(chat_id, item)).await?;
        }
        Ok(())
    }

    /// Show the typing indicator, if the gateway supports it.
    pub async fn send_typing(&self, gateway: &str, chat_id: &str) -> Result<(), SendError> {
        let Some(handle) = self.get(gateway).await else {
            return Err(SendError::GatewayNotFound(gateway.to_string()));
        };
        if !handle.has_capability(capabilities::TYPING) {
            return Ok(());
        }
        handle
            .send(GatewayCommand::SendTyping {
                chat_id: chat_id.to_string(),
            })
            .await
    }

    /// Ask every gateway to stop, then wait for their event loops.
    pub async fn shutdown(&self) {
        let gateways = {
            let inner = self.inner.read().await;
            inner
                .gateways
                .iter()
                .map(|(k, v)| (k.clone(), v.command_tx.clone()))
                .collect::<Vec<_>>()
        };

        for (name, tx) in gateways {
            debug!(gateway = %name, "Sending shutdown to gateway");
            let _ = tx.send(GatewayCommand::Shutdown).await;
        }

        let handles = {
            let mut inner = self.inner.write().await;
            std::mem::take(&mut inner.event_handles)
        };
        for handle in handles {
            let _ = handle.await;
        }
    }

    async fn handle_events(&self, gateway: String, mut rx: mpsc::Receiver<GatewayEvent>) {
        let mut inflight = tokio::task::JoinSet::new();

        while let Some(event) = rx.recv().await {
            // Reap finished handler tasks
            while inflight.try_join_next().is_some() {}

            match event {
                GatewayEvent::Ready {
                    gateway: reported_name,
                    version,
                    capabilities,
                } => {
                    info!(
                        gateway = %gateway,
                        reported_name = %reported_name,
                        version = %version,
                        capabilities = ?capabilities,
                        "Gateway ready"
                    );
                }

                GatewayEvent::MessageReceived(data) => {
                    debug!(
                        gateway = %gateway,
                        message_id = %data.message_id,
                        chat_id = %data.chat_id,
                        sender_id = %data.sender.id,
                        "Message received from gateway"
                    );

                    let (handler, handler_timeout) = {
                        let inner = self.inner.read().await;
                        (inner.handler.clone(), inner.message_handler_timeout)
                    };

                    let Some(handler) = handler else {
                        warn!(gateway = %gateway, "No message handler registered");
                        continue;
                    };

                    let key = SessionKey::new(&gateway, &data.chat_id, &data.sender.id);
                    let queue = self.queues.get(&key.as_key());

                    // Enqueued here, before any spawn, so arrival order is kept
                    match queue.try_enqueue(data.clone()).await {
                        EnqueueResult::ProcessNow => {
                            let manager = self.clone();
                            let gateway = gateway.clone();
                            inflight.spawn(async move {
                                manager
                                    .drain_session(&gateway, handler, handler_timeout, data, queue)
                                    .await;
                            });
                        }
                        EnqueueResult::Queued => {
                            debug!(
                                gateway = %gateway,
                                chat_id = %data.chat_id,
                                "Session busy, message queued"
                            );
                        }
                    }
                }

                GatewayEvent::CommandOk {
                    request_id,
                    message_id,
                } => {
                    debug!(
                        gateway = %gateway,
                        request_id = %request_id,
                        message_id = ?message_id,
                        "Command completed"
                    );
                }

                // One failed item never stops the rest of a reply
                GatewayEvent::CommandError {
                    request_id,
                    code,
                    message,
                } => {
                    warn!(
                        gateway = %gateway,
                        request_id = %request_id,
                        code = %code,
                        message = %message,
                        "Command failed, skipping"
                    );
                }

                GatewayEvent::Error {
                    code,
                    message,
                    fatal,
                } => {
                    if fatal {
                        error!(
                            gateway = %gateway,
                            code = %code,
                            message = %message,
                            "Fatal gateway error"
                        );
                        self.unregister(&gateway).await;
                    } else {
                        warn!(
                            gateway = %gateway,
                            code = %code,
                            message = %message,
                            "Gateway error"
                        );
                    }
                }

                GatewayEvent::Shutdown { reason } => {
                    info!(gateway = %gateway, reason = %reason, "Gateway shutdown");
                    self.unregister(&gateway).await;
                    break;
                }
            }
        }

        // Let in-flight replies go out before returning
        while inflight.join_next().await.is_some() {}

        debug!(gateway = %gateway, "Gateway event handler stopped");
    }

    /// Process `first`, then every message queued for the session meanwhile.
    async fn drain_session(
        &self,
        gateway: &str,
        handler: Arc<dyn MessageHandler>,
        handler_timeout: Duration,
        first: Box<MessageReceivedData>,
        queue: Arc<SessionMessageQueue>,
    ) {
        let mut next = Some(first);
        while let Some(data) = next {
            self.process_message(gateway, handler.clone(), handler_timeout, &data)
                .await;
            next = queue.next().await;
        }
    }

    async fn process_message(
        &self,
        gateway: &str,
        handler: Arc<dyn MessageHandler>,
        handler_timeout: Duration,
        data: &MessageReceivedData,
    ) {
        if let Err(e) = self.send_typing(gateway, &data.chat_id).await {
            debug!(gateway = %gateway, error = %e, "Failed to send typing indicator");
        }

        let reply = match tokio::time::timeout(handler_timeout, handler.handle_message(gateway, data))
            .await
        {
            Ok(reply) => reply,
            Err(_elapsed) => {
                warn!(
                    gateway = %gateway,
                    chat_id = %data.chat_id,
                    timeout_secs = handler_timeout.as_secs(),
                    "Message handler timed out"
                );
                Some(Reply::text(HANDLER_TIMEOUT))
            }
        };

        let Some(reply) = reply.filter(|r| !r.is_empty()) else {
            return;
        };

        if let Err(e) = self.send_reply(gateway, &data.chat_id, reply).await {
            error!(
                gateway = %gateway,
                chat_id = %data.chat_id,
                error = %e,
                "Failed to send reply"
            );
        }
    }
}

impl Default for GatewayManager {
    fn default() -> Self {
        Self::new(DEFAULT_MESSAGE_HANDLER_TIMEOUT)
    }
}

fn outbound_to_command(chat_id: &str, item: Outbound) -> GatewayCommand {
    let request_id = ulid::Ulid::new().to_string();
    match item {
        Outbound::Text { text, keyboard } => GatewayCommand::SendMessage {
            request_id,
            chat_id: chat_id.to_string(),
            content: text,
            keyboard,
        },
        Outbound::Photo { url, caption } => GatewayCommand::SendMedia {
            request_id,
            chat_id: chat_id.to_string(),
            media: MediaPayload::PhotoUrl { url },
            caption,
        },
    }
}

// ============================================================================
// Message Handler
// ============================================================================

/// Handler for incoming gateway messages.
#[async_trait::async_trait]
pub trait MessageHandler: Send + Sync {
    /// Handle an incoming message.
    ///
    /// Returns the reply to send back, or `None` to stay silent.
    async fn handle_message(&self, gateway: &str, data: &MessageReceivedData) -> Option<Reply>;
}

// ============================================================================
// Gateway Handle
// ============================================================================

/// Handle for sending commands to one gateway.
#[derive(Clone)]
pub struct GatewayHandle {
    /// Gateway name (e.g., "telegram").
    pub name: String,
    pub command_tx: mpsc::Sender<GatewayCommand>,
    /// Capabilities reported at registration.
    pub capabilities: Vec<String>,
}

impl GatewayHandle {
    pub async fn send(&self, command: GatewayCommand) -> Result<(), SendError> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| SendError::ChannelClosed)
    }

    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|c| c == capability)
    }
}

/// Error sending a command to a gateway.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("gateway '{0}' is not registered")]
    GatewayNotFound(String),

    #[error("gateway channel closed")]
    ChannelClosed,
}
