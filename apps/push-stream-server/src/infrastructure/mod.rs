//! Infrastructure Layer - Adapters and external integrations.
//!
//! This layer contains the concrete hubs behind the port interfaces
//! defined in the application layer, and everything that talks to the
//! network or the process environment.

/// Broadcast hubs and the subscriber fan-out core.
pub mod broadcast;

/// Feed API HTTP server and SSE stream adapter.
pub mod http;

/// Configuration loading.
pub mod config;

/// Health check HTTP endpoint.
pub mod health;

/// Prometheus metrics instrumentation.
pub mod metrics;

/// Tracing and OpenTelemetry integration.
pub mod telemetry;
