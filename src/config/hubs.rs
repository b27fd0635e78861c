//! Hub configuration and lookup
//!
//! A hub is a named upstream matchmaking pool. Each configured hub carries
//! its upstream identifier plus the chat-platform channels the bridge drives
//! for it: the text channel whose commands are scoped to the hub, the
//! category ephemeral voice channels are created under, and the voice lobby
//! players are returned to on teardown.

use crate::types::ChannelId;
use serde::{Deserialize, Serialize};

/// Configuration for a single upstream hub
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubConfig {
    /// Hub name as it appears in webhook payloads
    pub name: String,
    /// Upstream hub identifier used in API paths
    pub upstream_id: String,
    /// Text channel whose `matches` command is scoped to this hub
    pub match_channel: ChannelId,
    /// Category that ephemeral voice channels are created under
    pub category: ChannelId,
    /// Voice lobby players are moved back to on match teardown
    pub lobby: ChannelId,
}

impl HubConfig {
    /// Default Power Pugs hub
    pub fn power_pugs() -> Self {
        Self {
            name: "NACCS Power Pugs".to_string(),
            upstream_id: "9512ae3b-7322-4821-9eca-6e0db1819b03".to_string(),
            match_channel: ChannelId(610367175487913984),
            category: ChannelId(0),
            lobby: ChannelId(0),
        }
    }

    /// Default general queue hub
    pub fn general() -> Self {
        Self {
            name: "NACCS General".to_string(),
            upstream_id: "a67c2ead-9968-4e8b-957b-fb8bc244b302".to_string(),
            match_channel: ChannelId(0),
            category: ChannelId(0),
            lobby: ChannelId(0),
        }
    }
}

/// Lookup table over the configured hubs
///
/// Webhook payloads address hubs by name; chat commands address them by the
/// channel they were invoked from. An unknown name or channel resolves to
/// `None` and the caller decides whether that is a drop or an ignore.
#[derive(Debug, Clone, Default)]
pub struct HubDirectory {
    hubs: Vec<HubConfig>,
}

impl HubDirectory {
    pub fn new(hubs: Vec<HubConfig>) -> Self {
        Self { hubs }
    }

    pub fn by_name(&self, name: &str) -> Option<&HubConfig> {
        self.hubs.iter().find(|hub| hub.name == name)
    }

    pub fn by_match_channel(&self, channel: ChannelId) -> Option<&HubConfig> {
        self.hubs.iter().find(|hub| hub.match_channel == channel)
    }

    pub fn iter(&self) -> impl Iterator<Item = &HubConfig> {
        self.hubs.iter()
    }

    pub fn len(&self) -> usize {
        self.hubs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hubs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> HubDirectory {
        HubDirectory::new(vec![HubConfig::power_pugs(), HubConfig::general()])
    }

    #[test]
    fn lookup_by_name() {
        let hubs = directory();
        let hub = hubs.by_name("NACCS Power Pugs").unwrap();
        assert_eq!(hub.upstream_id, "9512ae3b-7322-4821-9eca-6e0db1819b03");
        assert!(hubs.by_name("Unknown Hub").is_none());
    }

    #[test]
    fn lookup_by_match_channel() {
        let hubs = directory();
        let hub = hubs
            .by_match_channel(ChannelId(610367175487913984))
            .unwrap();
        assert_eq!(hub.name, "NACCS Power Pugs");
        assert!(hubs.by_match_channel(ChannelId(123)).is_none());
    }
}
