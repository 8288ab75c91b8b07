//! Numbers Feed Integration Tests
//!
//! Covers the current-snapshot endpoint and the counter event stream,
//! driven both by manual publishes and by a real ticker on paused time.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use push_stream_server::{AppState, ChatHub, Counters, NumbersHub, router};

type Snapshot = BTreeMap<String, u32>;

fn uniform(value: u32) -> Counters {
    ('A'..='Z').map(|k| (k, value)).collect()
}

fn parse_frame(chunk: &[u8]) -> Snapshot {
    let text = std::str::from_utf8(chunk).unwrap();
    let payload = text
        .strip_prefix("data: ")
        .and_then(|t| t.strip_suffix("\n\n"))
        .unwrap();
    serde_json::from_str(payload).unwrap()
}

fn app(numbers: Arc<NumbersHub>, shutdown: CancellationToken) -> axum::Router {
    router(AppState::new(
        Arc::new(ChatHub::with_defaults()),
        numbers,
        shutdown,
    ))
}

#[tokio::test]
async fn test_current_returns_all_letters() {
    let numbers = Arc::new(NumbersHub::new(uniform(123_456)));
    let response = app(numbers, CancellationToken::new())
        .oneshot(Request::get("/api/numbers/current").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let snapshot: Snapshot = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(snapshot.len(), 26);
    assert_eq!(snapshot["A"], 123_456);
    assert_eq!(snapshot["Z"], 123_456);
}

#[tokio::test]
async fn test_stream_sends_snapshot_then_updates() {
    let numbers = Arc::new(NumbersHub::new(uniform(10)));
    let response = app(Arc::clone(&numbers), CancellationToken::new())
        .oneshot(Request::get("/api/numbers/stream").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let mut stream = response.into_body().into_data_stream();

    let first = parse_frame(&stream.next().await.unwrap().unwrap());
    assert!(first.values().all(|v| *v == 10));

    numbers.publish(uniform(7));
    let second = parse_frame(&stream.next().await.unwrap().unwrap());
    assert!(second.values().all(|v| *v == 7));
    assert_eq!(numbers.subscriber_count(), 1);

    drop(stream);
    assert_eq!(numbers.subscriber_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_ticker_drives_stream_once_per_period() {
    let shutdown = CancellationToken::new();
    let (numbers, ticker) = NumbersHub::start(Duration::from_secs(1), shutdown.clone());
    let response = app(Arc::clone(&numbers), shutdown.clone())
        .oneshot(Request::get("/api/numbers/stream").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let mut stream = response.into_body().into_data_stream();

    let mut previous = parse_frame(&stream.next().await.unwrap().unwrap());
    for _ in 0..3 {
        let next = parse_frame(&stream.next().await.unwrap().unwrap());
        assert_eq!(next.len(), 26);
        for (key, value) in &next {
            let before = previous[key];
            let delta = before - value;
            assert!((1..=9).contains(&delta), "{key}: {before} -> {value}");
        }
        previous = next;
    }

    shutdown.cancel();
    assert!(stream.next().await.is_none());
    ticker.await.unwrap();
    assert!(!numbers.is_ticker_running());
}
