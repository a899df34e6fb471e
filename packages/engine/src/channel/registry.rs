// packages/engine/src/channel/registry.rs
//! Name → channel mapping for in-process simulations
//!
//! Mirrors the create/attach split of a process-visible queue: the controller
//! creates the channel under a well-known name, every other actor attaches to
//! it and fails fast when it does not exist.

use crate::channel::memory::MemoryChannel;
use crate::utils::errors::{Result, SimError};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Registry of named in-process channels
#[derive(Default)]
pub struct ChannelRegistry {
    channels: DashMap<String, Arc<MemoryChannel>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the channel, or return the live one registered under `name`
    pub fn create(&self, name: &str) -> Arc<MemoryChannel> {
        let mut entry = self
            .channels
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(MemoryChannel::new(name)));

        if entry.is_closed() {
            debug!("Replacing torn-down channel '{}'", name);
            *entry = Arc::new(MemoryChannel::new(name));
        }

        info!("Channel '{}' ready", name);
        Arc::clone(entry.value())
    }

    /// Attach to an existing, live channel
    pub fn attach(&self, name: &str) -> Result<Arc<MemoryChannel>> {
        match self.channels.get(name) {
            Some(channel) if !channel.is_closed() => Ok(Arc::clone(channel.value())),
            _ => Err(SimError::ChannelUnavailable(format!(
                "no channel registered under '{}'",
                name
            ))),
        }
    }

    /// Forget a channel; returns whether one was registered
    pub fn remove(&self, name: &str) -> bool {
        self.channels.remove(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::SharedChannel;

    #[test]
    fn test_attach_unknown_fails() {
        let registry = ChannelRegistry::new();
        let result = registry.attach("missing");
        assert!(matches!(result, Err(SimError::ChannelUnavailable(_))));
    }

    #[test]
    fn test_create_then_attach_same_instance() {
        let registry = ChannelRegistry::new();
        let created = registry.create("tower");
        let attached = registry.attach("tower").unwrap();
        assert!(Arc::ptr_eq(&created, &attached));

        // Creating again keeps the live instance
        let again = registry.create("tower");
        assert!(Arc::ptr_eq(&created, &again));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_torn_down_channel_unavailable() {
        let registry = ChannelRegistry::new();
        let channel = registry.create("tower");
        channel.teardown().await.unwrap();

        assert!(registry.attach("tower").is_err());

        let fresh = registry.create("tower");
        assert!(!Arc::ptr_eq(&channel, &fresh));
        assert!(registry.attach("tower").is_ok());
    }

    #[test]
    fn test_independent_instances() {
        let registry = ChannelRegistry::new();
        let a = registry.create("sim-a");
        let b = registry.create("sim-b");
        assert!(!Arc::ptr_eq(&a, &b));
        assert!(registry.remove("sim-a"));
        assert!(!registry.remove("sim-a"));
        assert_eq!(registry.len(), 1);
    }
}
