//! Wire models for the upstream Data API
//!
//! Response shapes mirror the Data v4 payloads: listing endpoints wrap their
//! results in an `items` page, matches carry two factions with rosters, and
//! stream entries may arrive with fields missing (those are counted as
//! malformed by the reconciler rather than failing a whole pass).

use crate::types::LiveStream;
use serde::{Deserialize, Serialize};

/// Page envelope used by upstream listing endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paged<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

/// One ongoing match as listed by `hubs/{id}/matches`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OngoingMatch {
    pub match_id: String,
    pub teams: MatchTeams,
    #[serde(default)]
    pub results: Option<MatchResults>,
    #[serde(default)]
    pub voting: Option<MatchVoting>,
    #[serde(default, rename = "faceit_url")]
    pub match_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchTeams {
    pub faction1: Faction,
    pub faction2: Faction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Faction {
    pub name: String,
    #[serde(default)]
    pub roster: Vec<RosterEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterEntry {
    pub nickname: String,
    #[serde(default)]
    pub player_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResults {
    pub score: MatchScore,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchScore {
    #[serde(default)]
    pub faction1: i64,
    #[serde(default)]
    pub faction2: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchVoting {
    #[serde(default)]
    pub map: Option<VotePick>,
    #[serde(default)]
    pub location: Option<VotePick>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VotePick {
    #[serde(default)]
    pub pick: Vec<String>,
}

impl OngoingMatch {
    /// First picked map, when voting has concluded
    pub fn picked_map(&self) -> Option<&str> {
        self.voting
            .as_ref()
            .and_then(|voting| voting.map.as_ref())
            .and_then(|pick| pick.pick.first())
            .map(String::as_str)
    }

    /// First picked server location, when voting has concluded
    pub fn picked_location(&self) -> Option<&str> {
        self.voting
            .as_ref()
            .and_then(|voting| voting.location.as_ref())
            .and_then(|pick| pick.pick.first())
            .map(String::as_str)
    }

    /// Current score as a `(faction1, faction2)` pair
    pub fn score(&self) -> (i64, i64) {
        match &self.results {
            Some(results) => (results.score.faction1, results.score.faction2),
            None => (0, 0),
        }
    }
}

/// One queue as listed by `hubs/{id}/queues`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueueEntry {
    #[serde(default)]
    pub queue_id: Option<String>,
    #[serde(default)]
    pub size: u64,
}

/// One live stream as listed by `organizers/{id}/streams`
///
/// All fields are optional at the wire level; `validate` promotes an entry
/// into a `LiveStream` or rejects it as malformed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LiveStreamEntry {
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub viewers: Option<u64>,
    #[serde(default)]
    pub channel_url: Option<String>,
}

impl LiveStreamEntry {
    /// Promote the entry to a validated `LiveStream`, or `None` if a
    /// required field is missing
    pub fn validate(self) -> Option<LiveStream> {
        let nickname = self.nickname.filter(|nick| !nick.is_empty())?;
        let title = self.title?;
        let viewer_count = self.viewers?;
        Some(LiveStream {
            nickname,
            title,
            viewer_count,
            channel_url: self.channel_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ongoing_match_deserializes_nested_voting() {
        let body = r#"{
          "match_id": "m-1",
          "teams": {
            "faction1": {"name": "Alpha", "roster": [{"nickname": "p1"}]},
            "faction2": {"name": "Beta", "roster": [{"nickname": "p2"}]}
          },
          "results": {"score": {"faction1": 7, "faction2": 5}},
          "voting": {
            "map": {"pick": ["de_mirage"]},
            "location": {"pick": ["Chicago"]}
          },
          "faceit_url": "https://example/match/m-1"
        }"#;

        let parsed: OngoingMatch = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.score(), (7, 5));
        assert_eq!(parsed.picked_map(), Some("de_mirage"));
        assert_eq!(parsed.picked_location(), Some("Chicago"));
        assert_eq!(parsed.teams.faction1.roster[0].nickname, "p1");
    }

    #[test]
    fn ongoing_match_allows_missing_results_and_voting() {
        let body = r#"{
          "match_id": "m-2",
          "teams": {
            "faction1": {"name": "Alpha"},
            "faction2": {"name": "Beta"}
          }
        }"#;

        let parsed: OngoingMatch = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.score(), (0, 0));
        assert!(parsed.picked_map().is_none());
        assert!(parsed.teams.faction1.roster.is_empty());
    }

    #[test]
    fn paged_defaults_to_empty_items() {
        let parsed: Paged<QueueEntry> = serde_json::from_str("{}").unwrap();
        assert!(parsed.items.is_empty());
    }

    #[test]
    fn stream_entry_validation() {
        let complete = LiveStreamEntry {
            nickname: Some("streamer".to_string()),
            title: Some("scrims".to_string()),
            viewers: Some(42),
            channel_url: None,
        };
        let stream = complete.validate().unwrap();
        assert_eq!(stream.nickname, "streamer");
        assert_eq!(stream.viewer_count, 42);

        let missing_title = LiveStreamEntry {
            nickname: Some("streamer".to_string()),
            title: None,
            viewers: Some(42),
            channel_url: None,
        };
        assert!(missing_title.validate().is_none());

        let empty_nickname = LiveStreamEntry {
            nickname: Some(String::new()),
            title: Some("scrims".to_string()),
            viewers: Some(42),
            channel_url: None,
        };
        assert!(empty_nickname.validate().is_none());
    }
}
