//! Push Stream Server Binary
//!
//! Starts the chat and counter feeds and serves them over HTTP.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin push-stream-server
//! ```
//!
//! # Environment Variables
//!
//! - `PUSH_HTTP_PORT`: Feed API port (default: 8080)
//! - `PUSH_HEALTH_PORT`: Health check and metrics port (default: 8082)
//! - `PUSH_CHAT_HISTORY_CAPACITY`: Retained chat messages (default: 100)
//! - `PUSH_TICK_INTERVAL_MS`: Counter tick period (default: 1000)
//! - `OTEL_ENABLED`: Export spans over OTLP (default: false)
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: OTLP endpoint (default: <http://localhost:4317>)
//! - `OTEL_SERVICE_NAME`: Service name (default: push-stream-server)
//! - `RUST_LOG`: Log level (default: info)

use std::sync::Arc;
use std::time::Duration;

use push_stream_server::infrastructure::telemetry;
use push_stream_server::{
    ApiServer, AppState, ChatHub, HealthServer, HealthServerState, NumbersHub, PushConfig,
    init_metrics,
};
use tokio::signal;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;

/// Graceful shutdown timeout.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    // Initialize tracing (and OpenTelemetry when enabled)
    let _telemetry_guard = telemetry::init();

    tracing::info!("Starting Push Stream Server");

    // Initialize Prometheus metrics
    let _metrics_handle = init_metrics();

    let config = PushConfig::from_env()?;
    log_config(&config);

    let shutdown_token = CancellationToken::new();

    // Feed hubs
    let chat_hub = Arc::new(ChatHub::new(config.feeds.chat_history_capacity));
    let (numbers_hub, ticker) =
        NumbersHub::start(config.feeds.tick_interval, shutdown_token.clone());

    // Health server
    let health_state = Arc::new(HealthServerState::new(
        env!("CARGO_PKG_VERSION").to_string(),
        Arc::clone(&chat_hub),
        Arc::clone(&numbers_hub),
    ));
    let health_server = HealthServer::new(
        config.server.health_port,
        health_state,
        shutdown_token.clone(),
    );
    let health_task = tokio::spawn(async move {
        if let Err(e) = health_server.run().await {
            tracing::error!(error = %e, "Health server error");
        }
    });

    // API server
    let app_state = AppState::new(
        Arc::clone(&chat_hub),
        Arc::clone(&numbers_hub),
        shutdown_token.clone(),
    );
    let api_server = ApiServer::new(config.server.http_port, app_state);
    let api_shutdown = shutdown_token.clone();
    let api_task = tokio::spawn(async move {
        if let Err(e) = api_server.run().await {
            tracing::error!(error = %e, "API server error");
            api_shutdown.cancel();
        }
    });

    tracing::info!("Push stream server ready");

    await_shutdown(shutdown_token).await;

    chat_hub.close();
    numbers_hub.close();

    let drained = tokio::time::timeout(SHUTDOWN_TIMEOUT, async {
        let (api, health, ticker) = tokio::join!(api_task, health_task, ticker);
        [
            report_task_exit("api_server", api),
            report_task_exit("health_server", health),
            report_task_exit("ticker", ticker),
        ]
        .into_iter()
        .all(|clean| clean)
    })
    .await;

    match drained {
        Ok(true) => tracing::info!("Push stream server stopped"),
        Ok(false) => tracing::error!("Push stream server stopped after a task failure"),
        Err(_) => tracing::warn!(
            timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
            "Shutdown timed out; exiting with tasks still running"
        ),
    }

    Ok(())
}

/// Log how a background task ended. Returns `false` if it panicked or was
/// aborted.
fn report_task_exit(task: &'static str, result: Result<(), JoinError>) -> bool {
    match result {
        Ok(()) => {
            tracing::debug!(task, "Task finished");
            true
        }
        Err(e) if e.is_panic() => {
            tracing::error!(task, error = %e, "Task panicked");
            false
        }
        Err(e) => {
            tracing::error!(task, error = %e, "Task cancelled before finishing");
            false
        }
    }
}

/// Log the parsed configuration.
fn log_config(config: &PushConfig) {
    tracing::info!(
        http_port = config.server.http_port,
        health_port = config.server.health_port,
        chat_history_capacity = config.feeds.chat_history_capacity,
        tick_interval_ms = u64::try_from(config.feeds.tick_interval.as_millis()).unwrap_or(u64::MAX),
        "Configuration loaded"
    );
}

/// Load .env file from current directory or any ancestor directory.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Wait for a shutdown signal (SIGTERM or SIGINT) or an internal cancel.
#[allow(clippy::expect_used)]
async fn await_shutdown(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
        () = shutdown_token.cancelled() => {
            tracing::warn!("Internal shutdown requested");
        }
    }

    shutdown_token.cancel();

    tracing::info!(
        timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
        "Graceful shutdown started"
    );
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn clean_task_exit_reported_ok() {
        let result = tokio::spawn(async {}).await;
        assert!(report_task_exit("ticker", result));
    }

    #[tokio::test]
    async fn panicked_task_reported_as_failure() {
        let result: Result<(), JoinError> = tokio::spawn(async { panic!("ticker blew up") }).await;
        assert!(result.as_ref().is_err_and(JoinError::is_panic));
        assert!(!report_task_exit("ticker", result));
    }

    #[tokio::test]
    async fn aborted_task_reported_as_failure() {
        let handle = tokio::spawn(std::future::pending::<()>());
        handle.abort();
        let result = handle.await;
        assert!(result.as_ref().is_err_and(JoinError::is_cancelled));
        assert!(!report_task_exit("api_server", result));
    }
}
