//! Shared types for the Bitstamp REST and WebSocket APIs
//!
//! This crate provides the core type definitions used across the SDK.
//! It has minimal dependencies and can be used independently.
//!
//! # Key Types
//!
//! - [`Pair`] - Trading pair identifiers (e.g., "btcusd")
//! - [`ChannelKind`] - Live data channel categories
//! - [`InboundFrame`], [`ControlRequest`] - WebSocket envelopes
//! - [`StreamError`] - Streaming error types
//! - [`CallBudget`], [`RateLimitConfig`] - Client-side call budgeting

pub mod enums;
pub mod error;
pub mod messages;
pub mod pair;
pub mod rate_limit;

// Re-export commonly used types
pub use enums::*;
pub use error::*;
pub use messages::*;
pub use pair::*;
pub use rate_limit::*;

// Re-export rust_decimal for users
pub use rust_decimal::Decimal;
