use serde::{Deserialize, Serialize};

use crate::error::ChannelError;

/// Known outbound channel kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Telegram,
    Vk,
    Email,
    Whatsapp,
    Sms,
}

impl ChannelKind {
    /// Registration order, also the listing order.
    pub const ALL: [ChannelKind; 5] = [
        ChannelKind::Telegram,
        ChannelKind::Vk,
        ChannelKind::Email,
        ChannelKind::Whatsapp,
        ChannelKind::Sms,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelKind::Telegram => "telegram",
            ChannelKind::Vk => "vk",
            ChannelKind::Email => "email",
            ChannelKind::Whatsapp => "whatsapp",
            ChannelKind::Sms => "sms",
        }
    }

    fn display_name(&self) -> &'static str {
        match self {
            ChannelKind::Telegram => "Telegram",
            ChannelKind::Vk => "VKontakte",
            ChannelKind::Email => "Email",
            ChannelKind::Whatsapp => "WhatsApp",
            ChannelKind::Sms => "SMS",
        }
    }

    fn icon(&self) -> &'static str {
        match self {
            ChannelKind::Telegram => "📱",
            ChannelKind::Vk => "👥",
            ChannelKind::Email => "📧",
            ChannelKind::Whatsapp => "💬",
            ChannelKind::Sms => "📲",
        }
    }

    fn description(&self) -> &'static str {
        match self {
            ChannelKind::Telegram => "Messages to Telegram chats via bot",
            ChannelKind::Vk => "Posts to a VKontakte community wall",
            ChannelKind::Email => "Outbound email over SMTP",
            ChannelKind::Whatsapp => "WhatsApp Business messages",
            ChannelKind::Sms => "SMS through a gateway provider",
        }
    }

    /// WhatsApp and SMS ship switched off.
    fn enabled_by_default(&self) -> bool {
        matches!(self, ChannelKind::Telegram | ChannelKind::Vk | ChannelKind::Email)
    }
}

impl core::fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for ChannelKind {
    type Err = ChannelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        ChannelKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == needle)
            .ok_or_else(|| ChannelError::Unsupported(s.trim().to_string()))
    }
}

/// Display and switch settings for one channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub id: ChannelKind,
    pub name: String,
    pub icon: String,
    pub description: String,
    pub enabled: bool,
}

impl ChannelConfig {
    pub fn default_for(kind: ChannelKind) -> Self {
        Self {
            id: kind,
            name: kind.display_name().to_string(),
            icon: kind.icon().to_string(),
            description: kind.description().to_string(),
            enabled: kind.enabled_by_default(),
        }
    }
}
