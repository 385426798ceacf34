//! Per-session message queues.
//!
//! The event loop enqueues every inbound message before any task is spawned.
//! The first message for an idle session is processed right away; anything
//! arriving while that session is busy waits in a FIFO and is drained by the
//! same task, so a session's messages and replies never overtake each other.

use std::collections::VecDeque;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use gamescout_gateway_protocol::MessageReceivedData;

/// Result of enqueueing a message.
#[derive(Debug, PartialEq, Eq)]
pub enum EnqueueResult {
    /// Session was idle and is now busy; the caller processes this message.
    ProcessNow,
    /// Session is busy; the message waits for the drain loop.
    Queued,
}

struct SessionQueueInner {
    busy: bool,
    pending: VecDeque<Box<MessageReceivedData>>,
}

/// FIFO of messages for one session.
pub struct SessionMessageQueue {
    inner: Mutex<SessionQueueInner>,
}

impl SessionMessageQueue {
    fn new() -> Self {
        Self {
            inner: Mutex::new(SessionQueueInner {
                busy: false,
                pending: VecDeque::new(),
            }),
        }
    }

    /// Mark the session busy, or queue `data` behind the message in progress.
    pub async fn try_enqueue(&self, data: Box<MessageReceivedData>) -> EnqueueResult {
        let mut inner = self.inner.lock().await;
        if !inner.busy {
            inner.busy = true;
            return EnqueueResult::ProcessNow;
        }
        inner.pending.push_back(data);
        EnqueueResult::Queued
    }

    /// Take the next pending message, or mark the session idle if none is left.
    pub async fn next(&self) -> Option<Box<MessageReceivedData>> {
        let mut inner = self.inner.lock().await;
        let next = inner.pending.pop_front();
        if next.is_none() {
            inner.busy = false;
        }
        next
    }

    pub async fn pending_len(&self) -> usize {
        self.inner.lock().await.pending.len()
    }
}

/// Per-session queues keyed by session key.
#[derive(Clone, Default)]
pub struct SessionMessageQueues {
    queues: Arc<DashMap<String, Arc<SessionMessageQueue>>>,
}

impl SessionMessageQueues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the queue for `key`.
    pub fn get(&self, key: &str) -> Arc<SessionMessageQueue> {
        self.queues
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(SessionMessageQueue::new()))
            .clone()
    }

    pub fn len(&self) -> usize {
        self.queues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use gamescout_gateway_protocol::{MessageContent, Sender};

    use super::*;

    fn message(text: &str) -> Box<MessageReceivedData> {
        Box::new(MessageReceivedData {
            message_id: "1".to_string(),
            chat_id: "chat1".to_string(),
            sender: Sender {
                id: "user1".to_string(),
                username: None,
                display_name: None,
            },
            content: MessageContent::Text {
                text: text.to_string(),
            },
            timestamp: None,
        })
    }

    fn text_of(data: &MessageReceivedData) -> &str {
        data.content.as_text().unwrap_or_default()
    }

    #[tokio::test]
    async fn idle_session_processes_now() {
        let queue = SessionMessageQueue::new();
        assert_eq!(
            queue.try_enqueue(message("hello")).await,
            EnqueueResult::ProcessNow
        );
        assert_eq!(queue.pending_len().await, 0);
    }

    #[tokio::test]
    async fn busy_session_queues_in_arrival_order() {
        let queue = SessionMessageQueue::new();
        queue.try_enqueue(message("first")).await;

        assert_eq!(
            queue.try_enqueue(message("second")).await,
            EnqueueResult::Queued
        );
        assert_eq!(
            queue.try_enqueue(message("third")).await,
            EnqueueResult::Queued
        );

        let second = queue.next().await.unwrap();
        let third = queue.next().await.unwrap();
        assert_eq!(text_of(&second), "second");
        assert_eq!(text_of(&third), "third");
    }

    #[tokio::test]
    async fn empty_drain_marks_session_idle() {
        let queue = SessionMessageQueue::new();
        queue.try_enqueue(message("first")).await;

        assert!(queue.next().await.is_none());
        assert_eq!(
            queue.try_enqueue(message("again")).await,
            EnqueueResult::ProcessNow
        );
    }

    #[test]
    fn queues_are_shared_per_key() {
        let queues = SessionMessageQueues::new();
        let a = queues.get("telegram\0chat1\0user1");
        let b = queues.get("telegram\0chat1\0user1");
        let c = queues.get("telegram\0chat1\0user2");

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(queues.len(), 2);
    }
}
