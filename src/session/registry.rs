//! In-memory registry of active match sessions

use crate::types::{ChannelId, MatchId, UserId};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// One team's ephemeral voice channel within a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamChannel {
    pub team_name: String,
    pub channel: ChannelId,
    /// Members successfully moved in at match start; used as the fallback
    /// occupant list when live occupancy cannot be read at teardown
    pub seated: Vec<UserId>,
}

/// The ephemeral resources created for one match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchSession {
    pub match_id: MatchId,
    pub hub: String,
    pub channels: Vec<TeamChannel>,
    pub created_at: DateTime<Utc>,
}

/// Returned when a second session is begun for an already-registered match
///
/// This is a benign duplicate-delivery signal, not an error to surface to
/// end users.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Session already registered for match {0}")]
pub struct AlreadyRegistered(pub MatchId);

/// Mapping from match id to its session
///
/// Backed by a plain map and not thread-safe by contract: all mutation must
/// come from a single logical flow (the lifecycle handler). Callers that
/// introduce concurrent flows must add their own mutual exclusion.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<MatchId, MatchSession>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session; rejects a duplicate for the same match id
    pub fn begin_session(
        &mut self,
        session: MatchSession,
    ) -> std::result::Result<(), AlreadyRegistered> {
        if self.sessions.contains_key(&session.match_id) {
            return Err(AlreadyRegistered(session.match_id));
        }
        self.sessions.insert(session.match_id.clone(), session);
        Ok(())
    }

    /// Remove and return the session for a match, if one is registered
    pub fn end_session(&mut self, match_id: &str) -> Option<MatchSession> {
        self.sessions.remove(match_id)
    }

    pub fn contains(&self, match_id: &str) -> bool {
        self.sessions.contains_key(match_id)
    }

    /// Number of currently registered sessions
    pub fn active(&self) -> usize {
        self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::current_timestamp;
    use proptest::prelude::*;

    fn session(match_id: &str) -> MatchSession {
        MatchSession {
            match_id: match_id.to_string(),
            hub: "NACCS Power Pugs".to_string(),
            channels: vec![],
            created_at: current_timestamp(),
        }
    }

    #[test]
    fn begin_twice_registers_exactly_one_session() {
        let mut registry = SessionRegistry::new();

        assert!(registry.begin_session(session("m1")).is_ok());
        let err = registry.begin_session(session("m1")).unwrap_err();
        assert_eq!(err, AlreadyRegistered("m1".to_string()));
        assert_eq!(registry.active(), 1);
    }

    #[test]
    fn end_without_begin_is_none() {
        let mut registry = SessionRegistry::new();
        assert!(registry.end_session("ghost").is_none());
        assert_eq!(registry.active(), 0);
    }

    #[test]
    fn end_returns_registered_session() {
        let mut registry = SessionRegistry::new();
        registry.begin_session(session("m1")).unwrap();

        let ended = registry.end_session("m1").unwrap();
        assert_eq!(ended.match_id, "m1");
        assert!(!registry.contains("m1"));
        assert!(registry.end_session("m1").is_none());
    }

    proptest! {
        /// At most one session per match id, for any begin/end sequence
        #[test]
        fn at_most_one_session_per_id(ops in prop::collection::vec((any::<bool>(), 0usize..4), 0..32)) {
            let ids = ["m1", "m2", "m3", "m4"];
            let mut registry = SessionRegistry::new();
            let mut live: std::collections::HashSet<&str> = Default::default();

            for (begin, idx) in ops {
                let id = ids[idx];
                if begin {
                    let result = registry.begin_session(session(id));
                    prop_assert_eq!(result.is_ok(), !live.contains(id));
                    live.insert(id);
                } else {
                    let result = registry.end_session(id);
                    prop_assert_eq!(result.is_some(), live.contains(id));
                    live.remove(id);
                }
                prop_assert_eq!(registry.active(), live.len());
            }
        }
    }
}
