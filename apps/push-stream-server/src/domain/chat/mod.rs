//! Chat Feed Types
//!
//! A chat message is posted by a client, stamped by the server, and kept in
//! a bounded FIFO history so that new viewers get recent context.
//!
//! # Wire Format
//!
//! ```json
//! {"userName": "alice", "message": "hi", "timestamp": "2026-01-01T12:00:00Z"}
//! ```

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default number of chat messages retained in history.
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

// =============================================================================
// Messages
// =============================================================================

/// A published chat message.
///
/// Immutable once created. The timestamp is always assigned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Display name of the author.
    pub user_name: String,
    /// Message body.
    pub message: String,
    /// Server-assigned publish time.
    pub timestamp: DateTime<Utc>,
}

/// A chat message as submitted by a client, before validation.
///
/// Missing fields deserialize as empty strings so they fail validation
/// instead of failing JSON extraction. Any client timestamp is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostedMessage {
    /// Display name of the author.
    #[serde(default, alias = "UserName")]
    pub user_name: String,
    /// Message body.
    #[serde(default, alias = "Message")]
    pub message: String,
}

impl PostedMessage {
    /// Create a posted message.
    #[must_use]
    pub fn new(user_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            message: message.into(),
        }
    }

    /// Check that both the user name and the body contain visible text.
    ///
    /// # Errors
    ///
    /// Returns [`ChatValidationError::MissingFields`] if either field is
    /// empty or whitespace-only.
    pub fn validate(&self) -> Result<(), ChatValidationError> {
        if self.user_name.trim().is_empty() || self.message.trim().is_empty() {
            return Err(ChatValidationError::MissingFields);
        }
        Ok(())
    }

    /// Validate, keeping the fields for stamping later.
    ///
    /// # Errors
    ///
    /// Returns [`ChatValidationError::MissingFields`] if either field is
    /// empty or whitespace-only.
    pub fn into_validated(self) -> Result<ValidatedMessage, ChatValidationError> {
        self.validate()?;
        Ok(ValidatedMessage {
            user_name: self.user_name,
            message: self.message,
        })
    }
}

/// A posted message that passed validation and awaits its publish time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedMessage {
    user_name: String,
    message: String,
}

impl ValidatedMessage {
    /// Stamp with the publish time.
    #[must_use]
    pub fn stamp(self, timestamp: DateTime<Utc>) -> ChatMessage {
        ChatMessage {
            user_name: self.user_name,
            message: self.message,
            timestamp,
        }
    }
}

/// Chat message validation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ChatValidationError {
    /// User name or message body is empty.
    #[error("UserName and Message are required")]
    MissingFields,
}

// =============================================================================
// History
// =============================================================================

/// Bounded FIFO of the most recent chat messages, oldest first.
#[derive(Debug, Clone)]
pub struct ChatHistory {
    capacity: usize,
    entries: VecDeque<Arc<ChatMessage>>,
}

impl ChatHistory {
    /// Create an empty history. A capacity of zero is raised to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Append a message, returning the evicted oldest entry if the history
    /// was already full.
    pub fn push(&mut self, message: Arc<ChatMessage>) -> Option<Arc<ChatMessage>> {
        let evicted = if self.entries.len() >= self.capacity {
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back(message);
        evicted
    }

    /// Iterate over retained messages, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ChatMessage>> {
        self.entries.iter()
    }

    /// Copy the retained messages out, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ChatMessage> {
        self.entries.iter().map(|m| m.as_ref().clone()).collect()
    }

    /// Number of retained messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the history is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of retained messages.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for ChatHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use test_case::test_case;

    use super::*;

    fn message(n: usize) -> Arc<ChatMessage> {
        Arc::new(ChatMessage {
            user_name: "alice".to_string(),
            message: format!("msg-{n}"),
            timestamp: Utc::now(),
        })
    }

    #[test_case("", "hi" ; "empty user name")]
    #[test_case("alice", "" ; "empty message")]
    #[test_case("   ", "hi" ; "whitespace user name")]
    #[test_case("alice", "\t\n " ; "whitespace message")]
    #[test_case("", "" ; "both empty")]
    fn validation_rejects_blank_fields(user_name: &str, body: &str) {
        let posted = PostedMessage::new(user_name, body);
        assert_eq!(posted.validate(), Err(ChatValidationError::MissingFields));
    }

    #[test]
    fn validation_accepts_padded_text() {
        let posted = PostedMessage::new(" alice ", " hi ");
        assert!(posted.validate().is_ok());
    }

    #[test]
    fn stamp_uses_given_timestamp() {
        let now = Utc::now();
        let msg = PostedMessage::new("alice", "hi").into_validated().unwrap().stamp(now);
        assert_eq!(msg.user_name, "alice");
        assert_eq!(msg.message, "hi");
        assert_eq!(msg.timestamp, now);
    }

    #[test]
    fn into_validated_rejects_blank_fields() {
        assert_eq!(
            PostedMessage::new("alice", "  ").into_validated(),
            Err(ChatValidationError::MissingFields)
        );
        assert_eq!(
            PostedMessage::new("\u{3000}", "hi").into_validated(),
            Err(ChatValidationError::MissingFields)
        );
    }

    #[test]
    fn posted_message_accepts_both_casings_and_ignores_timestamp() {
        let camel: PostedMessage = serde_json::from_str(
            r#"{"userName":"alice","message":"hi","timestamp":"2000-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        let pascal: PostedMessage =
            serde_json::from_str(r#"{"UserName":"alice","Message":"hi"}"#).unwrap();
        assert_eq!(camel, pascal);
    }

    #[test]
    fn posted_message_missing_fields_default_to_empty() {
        let posted: PostedMessage = serde_json::from_str("{}").unwrap();
        assert!(posted.validate().is_err());
    }

    #[test]
    fn chat_message_serializes_camel_case() {
        let msg = ChatMessage {
            user_name: "alice".to_string(),
            message: "hi".to_string(),
            timestamp: Utc::now(),
        };
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["userName"], "alice");
        assert_eq!(value["message"], "hi");
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn history_evicts_oldest_first() {
        let mut history = ChatHistory::new(2);
        assert!(history.push(message(0)).is_none());
        assert!(history.push(message(1)).is_none());
        let evicted = history.push(message(2)).unwrap();
        assert_eq!(evicted.message, "msg-0");

        let bodies: Vec<_> = history.iter().map(|m| m.message.clone()).collect();
        assert_eq!(bodies, vec!["msg-1", "msg-2"]);
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let mut history = ChatHistory::new(0);
        history.push(message(0));
        history.push(message(1));
        assert_eq!(history.capacity(), 1);
        assert_eq!(history.snapshot()[0].message, "msg-1");
    }

    #[test]
    fn default_capacity_is_one_hundred() {
        assert_eq!(ChatHistory::default().capacity(), 100);
    }

    proptest! {
        #[test]
        fn history_keeps_last_capacity_in_order(count in 0usize..400) {
            let mut history = ChatHistory::default();
            for n in 0..count {
                history.push(message(n));
            }

            let expected: Vec<String> = (count.saturating_sub(100)..count)
                .map(|n| format!("msg-{n}"))
                .collect();
            let actual: Vec<String> = history.snapshot().into_iter().map(|m| m.message).collect();

            prop_assert!(history.len() <= 100);
            prop_assert_eq!(actual, expected);
        }
    }
}
