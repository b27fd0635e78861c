//! Common types used throughout the bridge service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier for a match, supplied by upstream webhook payloads
pub type MatchId = String;

macro_rules! snowflake_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }
    };
}

snowflake_id!(
    /// Chat-platform guild (server) identifier
    GuildId
);
snowflake_id!(
    /// Chat-platform channel identifier (text, voice or category)
    ChannelId
);
snowflake_id!(
    /// Chat-platform user identifier
    UserId
);
snowflake_id!(
    /// Chat-platform role identifier
    RoleId
);
snowflake_id!(
    /// Chat-platform message identifier
    MessageId
);

/// One team's roster as carried by a `ready` webhook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRoster {
    pub team_name: String,
    /// Upstream platform player identifiers
    pub players: Vec<String>,
}

/// Typed match lifecycle event, produced by webhook payload validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchEvent {
    Ready {
        match_id: MatchId,
        hub: String,
        teams: Vec<TeamRoster>,
    },
    Finished {
        match_id: MatchId,
        hub: String,
    },
    Cancelled {
        match_id: MatchId,
        hub: String,
    },
}

impl MatchEvent {
    pub fn match_id(&self) -> &str {
        match self {
            MatchEvent::Ready { match_id, .. }
            | MatchEvent::Finished { match_id, .. }
            | MatchEvent::Cancelled { match_id, .. } => match_id,
        }
    }

    pub fn hub(&self) -> &str {
        match self {
            MatchEvent::Ready { hub, .. }
            | MatchEvent::Finished { hub, .. }
            | MatchEvent::Cancelled { hub, .. } => hub,
        }
    }

    /// Stable event kind label for logging and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            MatchEvent::Ready { .. } => "ready",
            MatchEvent::Finished { .. } => "finished",
            MatchEvent::Cancelled { .. } => "cancelled",
        }
    }
}

/// A live stream entry that passed field validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveStream {
    pub nickname: String,
    pub title: String,
    pub viewer_count: u64,
    pub channel_url: Option<String>,
}

/// Eligibility verdict from the identity store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Eligibility {
    pub eligible: bool,
    /// Institution/team tag applied to a verified user's display name
    pub affiliation: Option<String>,
}

/// Read-only row mapping a platform identity to a chat identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityRecord {
    pub chat_user: UserId,
    pub platform_id: String,
    pub verified: bool,
    pub affiliation: Option<String>,
}

/// An inbound chat message, platform-agnostic
///
/// The chat adapter converts SDK message events into this shape before any
/// component logic runs.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub id: MessageId,
    pub channel: ChannelId,
    pub author: UserId,
    pub author_display: String,
    pub author_is_bot: bool,
    /// True when the message was posted by a webhook integration
    pub from_webhook: bool,
    pub author_roles: Vec<RoleId>,
    pub content: String,
}

/// Timestamped marker for when a session or display entry was first seen
pub type SeenAt = DateTime<Utc>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snowflake_display_and_from() {
        let channel = ChannelId::from(610367175487913984);
        assert_eq!(channel.to_string(), "610367175487913984");
        assert_eq!(channel, ChannelId(610367175487913984));
    }

    #[test]
    fn match_event_accessors() {
        let event = MatchEvent::Finished {
            match_id: "m1".to_string(),
            hub: "NACCS Power Pugs".to_string(),
        };
        assert_eq!(event.match_id(), "m1");
        assert_eq!(event.hub(), "NACCS Power Pugs");
        assert_eq!(event.kind(), "finished");
    }

    #[test]
    fn snowflake_serde_is_transparent() {
        let user = UserId(42);
        let json = serde_json::to_string(&user).unwrap();
        assert_eq!(json, "42");
        let back: UserId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, user);
    }
}
