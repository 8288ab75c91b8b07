//! Configuration Module
//!
//! Configuration loading for the push server.

mod settings;

pub use settings::{ConfigError, FeedSettings, PushConfig, ServerSettings};
