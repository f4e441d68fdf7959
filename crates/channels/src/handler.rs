//! Channel handler trait and the stub integrations.

use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::channel::ChannelKind;
use crate::error::ChannelError;

/// Outcome of a successful hand-off to a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Delivery {
    pub channel: ChannelKind,
    pub detail: String,
}

/// One outbound integration.
///
/// Implementations must not block for long: the hub calls them while holding
/// its lock.
pub trait ChannelHandler: Send + Sync {
    fn kind(&self) -> ChannelKind;

    fn deliver(&self, message: &str, settings: &JsonValue) -> Result<Delivery, ChannelError>;
}

/// Accepts every message and reports a fixed confirmation.
#[derive(Debug, Clone)]
pub struct StubHandler {
    kind: ChannelKind,
    detail: &'static str,
}

impl StubHandler {
    pub fn new(kind: ChannelKind, detail: &'static str) -> Self {
        Self { kind, detail }
    }

    pub fn telegram() -> Self {
        Self::new(ChannelKind::Telegram, "Message queued for Telegram")
    }

    pub fn vk() -> Self {
        Self::new(ChannelKind::Vk, "Message posted to VK")
    }

    pub fn email() -> Self {
        Self::new(ChannelKind::Email, "Email sent successfully")
    }
}

impl ChannelHandler for StubHandler {
    fn kind(&self) -> ChannelKind {
        self.kind
    }

    fn deliver(&self, message: &str, _settings: &JsonValue) -> Result<Delivery, ChannelError> {
        let preview: String = message.chars().take(50).collect();
        tracing::debug!(channel = %self.kind, preview = %preview, "stub delivery");

        Ok(Delivery {
            channel: self.kind,
            detail: self.detail.to_string(),
        })
    }
}

/// Integration without credentials: every delivery fails.
#[derive(Debug, Clone)]
pub struct UnconfiguredHandler {
    kind: ChannelKind,
}

impl UnconfiguredHandler {
    pub fn new(kind: ChannelKind) -> Self {
        Self { kind }
    }
}

impl ChannelHandler for UnconfiguredHandler {
    fn kind(&self) -> ChannelKind {
        self.kind
    }

    fn deliver(&self, _message: &str, _settings: &JsonValue) -> Result<Delivery, ChannelError> {
        Err(ChannelError::NotConfigured(self.kind.as_str().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_always_delivers() {
        let d = StubHandler::vk().deliver("hello", &JsonValue::Null).unwrap();
        assert_eq!(d.channel, ChannelKind::Vk);
        assert_eq!(d.detail, "Message posted to VK");
    }

    #[test]
    fn unconfigured_always_fails() {
        let err = UnconfiguredHandler::new(ChannelKind::Sms)
            .deliver("hello", &JsonValue::Null)
            .unwrap_err();
        assert_eq!(err.code(), "channel_not_configured");
        assert_eq!(err.to_string(), "sms channel not configured");
    }
}
