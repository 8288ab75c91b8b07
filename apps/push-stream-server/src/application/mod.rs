//! Application Layer - Use cases and port definitions.
//!
//! This layer contains the application services and port interfaces
//! that define how the domain interacts with transports and timers.

/// Port interfaces between hubs and streaming transports.
pub mod ports;

/// Application services (the periodic counter producer).
pub mod services;
