use std::collections::BTreeMap;

use crate::channel::{ChannelConfig, ChannelKind};
use crate::error::ChannelError;
use crate::handler::{ChannelHandler, StubHandler, UnconfiguredHandler};

struct Entry {
    config: ChannelConfig,
    handler: Box<dyn ChannelHandler>,
}

/// Channel id → config + handler.
pub struct ChannelRegistry {
    entries: BTreeMap<ChannelKind, Entry>,
}

impl core::fmt::Debug for ChannelRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.entries.values().map(|e| &e.config)).finish()
    }
}

impl ChannelRegistry {
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// All five channels with their stock handlers. Kinds listed in
    /// `disabled` start switched off regardless of their default.
    pub fn with_defaults(disabled: &[ChannelKind]) -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(StubHandler::telegram()));
        registry.register(Box::new(StubHandler::vk()));
        registry.register(Box::new(StubHandler::email()));
        registry.register(Box::new(UnconfiguredHandler::new(ChannelKind::Whatsapp)));
        registry.register(Box::new(UnconfiguredHandler::new(ChannelKind::Sms)));

        for kind in disabled {
            if let Some(entry) = registry.entries.get_mut(kind) {
                entry.config.enabled = false;
            }
        }
        registry
    }

    /// Register (or replace) the handler for its kind, with default config.
    pub fn register(&mut self, handler: Box<dyn ChannelHandler>) {
        let kind = handler.kind();
        self.entries.insert(
            kind,
            Entry {
                config: ChannelConfig::default_for(kind),
                handler,
            },
        );
    }

    pub fn configs(&self) -> Vec<ChannelConfig> {
        self.entries.values().map(|e| e.config.clone()).collect()
    }

    pub fn config(&self, id: &str) -> Result<&ChannelConfig, ChannelError> {
        self.entry(id).map(|e| &e.config)
    }

    /// Handler for `id`, only if the channel is enabled.
    pub fn lookup(&self, id: &str) -> Result<&dyn ChannelHandler, ChannelError> {
        let entry = self.entry(id)?;
        if !entry.config.enabled {
            return Err(ChannelError::Disabled(entry.config.id.as_str().to_string()));
        }
        Ok(entry.handler.as_ref())
    }

    pub fn set_enabled(&mut self, id: &str, enabled: bool) -> Result<ChannelConfig, ChannelError> {
        let kind: ChannelKind = id.parse()?;
        let entry = self
            .entries
            .get_mut(&kind)
            .ok_or_else(|| ChannelError::Unsupported(id.trim().to_string()))?;
        entry.config.enabled = enabled;
        Ok(entry.config.clone())
    }

    fn entry(&self, id: &str) -> Result<&Entry, ChannelError> {
        let kind: ChannelKind = id.parse()?;
        self.entries
            .get(&kind)
            .ok_or_else(|| ChannelError::Unsupported(id.trim().to_string()))
    }
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::with_defaults(&[])
    }
}
