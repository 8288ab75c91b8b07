//! Server-Sent Events Stream Adapter
//!
//! Bridges a [`FeedHub`] subscription to a streaming HTTP response body.
//! Each queued event becomes one `data: <json>\n\n` frame, yielded as soon
//! as it is dequeued so hyper writes it out without batching.
//!
//! # Lifecycle
//!
//! ```text
//! open ──► subscribe ──► wait(queue | shutdown) ──► frame ──► wait ...
//!                               │
//!                 shutdown / queue closed / peer gone
//!                               ▼
//!                          unsubscribe
//! ```
//!
//! The subscription is held by a guard that unsubscribes on drop. The
//! guard lives in the stream state, so it is released whether the loop
//! ends on its own or hyper drops the body after a client disconnect.

use std::convert::Infallible;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use futures::Stream;
use futures::stream;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::application::ports::{FeedHub, Subscription};
use crate::infrastructure::metrics;

/// Content type of event-stream responses.
pub const EVENT_STREAM_CONTENT_TYPE: &str = "text/event-stream";

/// Encode one event as an SSE `data` frame.
///
/// # Errors
///
/// Returns the JSON error if the event cannot be serialized.
pub fn encode_frame<T: Serialize + ?Sized>(event: &T) -> Result<Bytes, serde_json::Error> {
    let json = serde_json::to_string(event)?;
    Ok(Bytes::from(format!("data: {json}\n\n")))
}

// =============================================================================
// Subscription Guard
// =============================================================================

/// Owns a live subscription and removes it from its hub when dropped.
struct SubscriptionGuard<H: FeedHub> {
    hub: Arc<H>,
    subscription: Subscription<H::Event>,
}

impl<H: FeedHub> SubscriptionGuard<H> {
    fn open(hub: Arc<H>) -> Self {
        let subscription = hub.subscribe();
        tracing::info!(
            feed = hub.feed_name(),
            subscriber = %subscription.id(),
            "Client connected to stream"
        );
        Self { hub, subscription }
    }
}

impl<H: FeedHub> Drop for SubscriptionGuard<H> {
    fn drop(&mut self) {
        self.hub.unsubscribe(self.subscription.id());
        tracing::info!(
            feed = self.hub.feed_name(),
            subscriber = %self.subscription.id(),
            "Client disconnected from stream"
        );
    }
}

// =============================================================================
// Stream Adapter
// =============================================================================

/// Subscribe to `hub` and return the stream of encoded frames.
///
/// The stream ends when `shutdown` is cancelled, when the hub closes the
/// queue, or when an event fails to serialize. Dropping the stream at any
/// point unsubscribes.
pub fn event_stream<H: FeedHub>(
    hub: Arc<H>,
    shutdown: CancellationToken,
) -> impl Stream<Item = Result<Bytes, Infallible>> + Send + 'static {
    let guard = SubscriptionGuard::open(hub);

    stream::unfold((guard, shutdown), |(mut guard, shutdown)| async move {
        let next = tokio::select! {
            biased;
            () = shutdown.cancelled() => None,
            event = guard.subscription.recv() => event,
        };
        let event = next?;

        match encode_frame(event.as_ref()) {
            Ok(frame) => {
                metrics::record_frame_written(guard.hub.feed_name());
                Some((Ok(frame), (guard, shutdown)))
            }
            Err(e) => {
                tracing::error!(
                    feed = guard.hub.feed_name(),
                    subscriber = %guard.subscription.id(),
                    error = %e,
                    "Failed to encode stream event"
                );
                None
            }
        }
    })
}

/// Build a streaming `text/event-stream` response for `hub`.
pub fn stream_response<H: FeedHub>(hub: Arc<H>, shutdown: CancellationToken) -> Response {
    let body = Body::from_stream(event_stream(hub, shutdown));
    (
        [
            (header::CONTENT_TYPE, EVENT_STREAM_CONTENT_TYPE),
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
        ],
        body,
    )
        .into_response()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use futures::StreamExt;
    use tokio_test::{assert_pending, assert_ready};

    use super::*;
    use crate::domain::chat::PostedMessage;
    use crate::infrastructure::broadcast::ChatHub;

    fn frame_text(item: Option<Result<Bytes, Infallible>>) -> String {
        let bytes = item.unwrap().unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn frame_is_data_line_plus_blank_line() {
        let frame = encode_frame(&serde_json::json!({"a": 1})).unwrap();
        assert_eq!(&frame[..], b"data: {\"a\":1}\n\n");
    }

    #[tokio::test]
    async fn replays_history_then_live_messages() {
        let hub = Arc::new(ChatHub::with_defaults());
        hub.publish(PostedMessage::new("alice", "first")).unwrap();

        let mut frames = Box::pin(event_stream(Arc::clone(&hub), CancellationToken::new()));
        let first = frame_text(frames.next().await);
        assert!(first.starts_with("data: {"));
        assert!(first.ends_with("}\n\n"));
        assert!(first.contains(r#""message":"first""#));

        hub.publish(PostedMessage::new("bob", "second")).unwrap();
        let second = frame_text(frames.next().await);
        assert!(second.contains(r#""userName":"bob""#));
    }

    #[tokio::test]
    async fn suspends_while_queue_is_empty() {
        let hub = Arc::new(ChatHub::with_defaults());
        let mut frames = tokio_test::task::spawn(event_stream(
            Arc::clone(&hub),
            CancellationToken::new(),
        ));

        assert_pending!(frames.poll_next());

        hub.publish(PostedMessage::new("alice", "wake")).unwrap();
        assert!(frames.is_woken());
        let item = assert_ready!(frames.poll_next());
        assert!(frame_text(item).contains("wake"));
    }

    #[tokio::test]
    async fn dropping_stream_unsubscribes() {
        let hub = Arc::new(ChatHub::with_defaults());
        let frames = event_stream(Arc::clone(&hub), CancellationToken::new());
        assert_eq!(hub.subscriber_count(), 1);

        drop(frames);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn shutdown_ends_stream_and_unsubscribes() {
        let hub = Arc::new(ChatHub::with_defaults());
        let shutdown = CancellationToken::new();
        let mut frames = Box::pin(event_stream(Arc::clone(&hub), shutdown.clone()));

        let waiter = tokio::spawn(async move { frames.next().await.is_none() });
        tokio::task::yield_now().await;
        shutdown.cancel();

        assert!(waiter.await.unwrap());
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn closed_hub_ends_stream() {
        let hub = Arc::new(ChatHub::with_defaults());
        let mut frames = Box::pin(event_stream(Arc::clone(&hub), CancellationToken::new()));

        hub.close();
        assert!(frames.next().await.is_none());
    }

    #[test]
    fn response_carries_event_stream_headers() {
        let hub = Arc::new(ChatHub::with_defaults());
        let response = stream_response(hub, CancellationToken::new());
        let headers = response.headers();

        assert_eq!(headers[header::CONTENT_TYPE], EVENT_STREAM_CONTENT_TYPE);
        assert_eq!(headers[header::CACHE_CONTROL], "no-cache");
        assert_eq!(headers[header::CONNECTION], "keep-alive");
    }
}
