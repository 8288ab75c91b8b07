//! Chat Hub
//!
//! Owns the bounded chat history and the chat subscriber set. New
//! subscribers are seeded with the full history, then receive live
//! messages in publish order.

use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;

use super::SubscriberSet;
use crate::application::ports::{FeedHub, Subscription};
use crate::domain::chat::{ChatHistory, ChatMessage, ChatValidationError, PostedMessage};
use crate::domain::subscription::SubscriberId;
use crate::infrastructure::metrics::{self, FeedKind};

#[derive(Debug)]
struct ChatState {
    history: ChatHistory,
    subscribers: SubscriberSet<ChatMessage>,
}

/// Broadcast hub for the chat feed.
#[derive(Debug)]
pub struct ChatHub {
    state: Mutex<ChatState>,
}

/// Shared chat hub reference.
pub type SharedChatHub = Arc<ChatHub>;

impl ChatHub {
    /// Create a hub retaining at most `history_capacity` messages.
    #[must_use]
    pub fn new(history_capacity: usize) -> Self {
        Self {
            state: Mutex::new(ChatState {
                history: ChatHistory::new(history_capacity),
                subscribers: SubscriberSet::new(FeedKind::Chat),
            }),
        }
    }

    /// Create a hub with the default history capacity.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(crate::domain::chat::DEFAULT_HISTORY_CAPACITY)
    }

    /// Stamp, record and fan out a posted message.
    ///
    /// The timestamp is taken under the hub lock, so history order and
    /// timestamp order agree.
    ///
    /// # Errors
    ///
    /// Returns [`ChatValidationError`] if the user name or message is blank;
    /// nothing is recorded or delivered in that case.
    pub fn publish(&self, posted: PostedMessage) -> Result<Arc<ChatMessage>, ChatValidationError> {
        let validated = posted.into_validated().inspect_err(|_| {
            metrics::record_publish_rejected(FeedKind::Chat);
        })?;

        let (message, delivered) = {
            let mut state = self.state.lock();
            let message = Arc::new(validated.stamp(Utc::now()));
            state.history.push(Arc::clone(&message));
            let delivered = state.subscribers.broadcast(&message);
            (message, delivered)
        };

        metrics::record_published(FeedKind::Chat, delivered);
        tracing::debug!(
            user = %message.user_name,
            delivered,
            "Chat message published"
        );

        Ok(message)
    }

    /// Copy of the current history, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ChatMessage> {
        self.state.lock().history.snapshot()
    }

    /// Register a subscriber seeded with the full current history.
    #[must_use]
    pub fn subscribe(&self) -> Subscription<ChatMessage> {
        let mut state = self.state.lock();
        let ChatState {
            history,
            subscribers,
        } = &mut *state;
        subscribers.register(history.iter().cloned())
    }

    /// Remove a subscriber. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: SubscriberId) {
        self.state.lock().subscribers.remove(id);
    }

    /// Drop every subscriber, closing their queues.
    pub fn close(&self) {
        let closed = self.state.lock().subscribers.clear();
        tracing::info!(closed, "Chat hub closed");
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.state.lock().subscribers.len()
    }

    /// Number of retained history messages.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.state.lock().history.len()
    }
}

impl Default for ChatHub {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl FeedHub for ChatHub {
    type Event = ChatMessage;

    fn feed_name(&self) -> &'static str {
        FeedKind::Chat.as_str()
    }

    fn subscribe(&self) -> Subscription<ChatMessage> {
        Self::subscribe(self)
    }

    fn unsubscribe(&self, id: SubscriberId) {
        Self::unsubscribe(self, id);
    }
}

// =============================================================================
// Tests
// =============================================================================
