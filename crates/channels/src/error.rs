use thiserror::Error;

/// Errors raised by the channel hub.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    /// No channel with this id is registered.
    #[error("unsupported channel: {0}")]
    Unsupported(String),

    /// The channel exists but is switched off.
    #[error("channel is disabled: {0}")]
    Disabled(String),

    /// The channel is enabled but its integration has no credentials.
    #[error("{0} channel not configured")]
    NotConfigured(String),

    #[error("validation failed: {0}")]
    Validation(String),
}

impl ChannelError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Stable machine-readable code used on the wire.
    pub fn code(&self) -> &'static str {
        match self {
            ChannelError::Unsupported(_) => "unsupported_channel",
            ChannelError::Disabled(_) => "channel_disabled",
            ChannelError::NotConfigured(_) => "channel_not_configured",
            ChannelError::Validation(_) => "validation_error",
        }
    }
}
