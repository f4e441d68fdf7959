//! Outbound channel hub.
//!
//! A registry of stubbed messaging integrations (Telegram, VK, email,
//! WhatsApp, SMS), message distribution with per-channel results, a simple
//! message board, and an inbound data collector with its own query surface.

pub mod channel;
pub mod error;
pub mod handler;
pub mod hub;
pub mod registry;

pub use channel::{ChannelConfig, ChannelKind};
pub use error::ChannelError;
pub use handler::{ChannelHandler, Delivery, StubHandler, UnconfiguredHandler};
pub use hub::{
    ChannelResult, ChannelStats, DataEntry, DataMetadata, DataPage, DataQuery, DeliveryStatus,
    Distribution, DistributionStatus, HubStats, Message, MessageHub,
};
pub use registry::ChannelRegistry;
