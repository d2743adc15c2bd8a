//! # Data Ingestors Module
//!
//! Clients that receive data the server pushes, as opposed to data the
//! client asks for.
//!
//! - **`live_channel`**: the supervised WebSocket client for product list
//!   updates.

/// The WebSocket client for live product updates.
pub mod live_channel;

pub use live_channel::{Backoff, ChannelConfig, ChannelEvent, ChannelState, LiveChannel};
