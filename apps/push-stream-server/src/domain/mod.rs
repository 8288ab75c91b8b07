//! Domain Layer - Core feed types and business rules.
//!
//! This layer contains the event types carried by the two feeds and the
//! rules that govern them (history bounds, counter ticking, message
//! validation). Nothing here knows about HTTP or channels.

/// Chat messages, validation, and bounded history.
pub mod chat;

/// The A-Z counter set and its tick rule.
pub mod numbers;

/// Subscriber identity.
pub mod subscription;
