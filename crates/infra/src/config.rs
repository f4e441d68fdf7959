//! Runtime configuration, read once from the environment at startup.

use std::net::SocketAddr;

use thiserror::Error;

use unitdesk_channels::ChannelKind;

use crate::store::AvailabilityPolicy;

pub const ENV_BIND_ADDR: &str = "UNITDESK_BIND_ADDR";
pub const ENV_SEED_DEMO: &str = "UNITDESK_SEED_DEMO";
pub const ENV_AVAILABILITY_POLICY: &str = "UNITDESK_AVAILABILITY_POLICY";
pub const ENV_DISABLED_CHANNELS: &str = "UNITDESK_DISABLED_CHANNELS";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}: invalid value {value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(var: &'static str, value: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            var,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub seed_demo: bool,
    pub availability_policy: AvailabilityPolicy,
    /// Channels forced off at startup, on top of the stock defaults.
    pub disabled_channels: Vec<ChannelKind>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            seed_demo: true,
            availability_policy: AvailabilityPolicy::default(),
            disabled_channels: Vec::new(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key → value source. Unset or blank keys take defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let bind_addr = match get(ENV_BIND_ADDR) {
            Some(raw) => raw
                .trim()
                .parse::<SocketAddr>()
                .map_err(|e| ConfigError::invalid(ENV_BIND_ADDR, &raw, e.to_string()))?,
            None => defaults.bind_addr,
        };

        let seed_demo = match get(ENV_SEED_DEMO) {
            Some(raw) => parse_bool(&raw)
                .ok_or_else(|| ConfigError::invalid(ENV_SEED_DEMO, &raw, "expected true or false"))?,
            None => defaults.seed_demo,
        };

        let availability_policy = match get(ENV_AVAILABILITY_POLICY) {
            Some(raw) => raw
                .parse::<AvailabilityPolicy>()
                .map_err(|e| ConfigError::invalid(ENV_AVAILABILITY_POLICY, &raw, e.to_string()))?,
            None => defaults.availability_policy,
        };

        let disabled_channels = match get(ENV_DISABLED_CHANNELS) {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|id| {
                    id.parse::<ChannelKind>()
                        .map_err(|e| ConfigError::invalid(ENV_DISABLED_CHANNELS, &raw, e.to_string()))
                })
                .collect::<Result<Vec<_>, _>>()?,
            None => defaults.disabled_channels,
        };

        Ok(Self {
            bind_addr,
            seed_demo,
            availability_policy,
            disabled_channels,
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn empty_environment_gives_defaults() {
        assert_eq!(from(&[]).unwrap(), AppConfig::default());
    }

    #[test]
    fn reads_every_variable() {
        let cfg = from(&[
            (ENV_BIND_ADDR, "127.0.0.1:3000"),
            (ENV_SEED_DEMO, "no"),
            (ENV_AVAILABILITY_POLICY, "manual"),
            (ENV_DISABLED_CHANNELS, "email, vk"),
        ])
        .unwrap();

        assert_eq!(cfg.bind_addr, "127.0.0.1:3000".parse().unwrap());
        assert!(!cfg.seed_demo);
        assert_eq!(cfg.availability_policy, AvailabilityPolicy::Manual);
        assert_eq!(cfg.disabled_channels, vec![ChannelKind::Email, ChannelKind::Vk]);
    }

    #[test]
    fn bad_values_name_the_variable() {
        let err = from(&[(ENV_BIND_ADDR, "localhost")]).unwrap_err();
        assert!(err.to_string().starts_with(ENV_BIND_ADDR));

        assert!(from(&[(ENV_SEED_DEMO, "maybe")]).is_err());
        assert!(from(&[(ENV_DISABLED_CHANNELS, "fax")]).is_err());
    }
}
