//! Upstream match API integration
//!
//! This module talks to the esports Data API that owns hubs, matches, queues
//! and stream listings. Every call maps a transport error or non-2xx status
//! to `BridgeError::UpstreamUnavailable`; callers treat that as "temporarily
//! unavailable" and never retry automatically.

pub mod client;
pub mod models;

// Re-export commonly used types
pub use client::{HttpMatchApi, MatchApi, MockMatchApi};
pub use models::{Faction, LiveStreamEntry, OngoingMatch, Paged, QueueEntry, RosterEntry};
