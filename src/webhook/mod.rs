//! Webhook payload validation
//!
//! Lifecycle webhooks arrive as JSON message bodies posted by a trusted
//! automated sender. Everything is validated into a typed `MatchEvent`
//! before dispatch; a payload that fails validation is a
//! `BridgeError::MalformedPayload` and never reaches component logic.

use crate::error::BridgeError;
use crate::types::{MatchEvent, TeamRoster};
use serde::Deserialize;

/// Recognized lifecycle event names
pub const EVENT_MATCH_READY: &str = "match_status_ready";
pub const EVENT_MATCH_FINISHED: &str = "match_status_finished";
pub const EVENT_MATCH_CANCELLED: &str = "match_status_cancelled";

#[derive(Debug, Deserialize)]
struct RawWebhook {
    event: Option<String>,
    match_id: Option<String>,
    hub: Option<String>,
    #[serde(default)]
    teams: Option<Vec<RawTeam>>,
}

#[derive(Debug, Deserialize)]
struct RawTeam {
    team_name: Option<String>,
    players: Option<Vec<String>>,
}

fn malformed(reason: impl Into<String>) -> BridgeError {
    BridgeError::MalformedPayload {
        reason: reason.into(),
    }
}

/// Validate a webhook body into a typed lifecycle event
pub fn parse_match_webhook(body: &str) -> Result<MatchEvent, BridgeError> {
    let raw: RawWebhook = serde_json::from_str(body)
        .map_err(|e| malformed(format!("Invalid JSON: {}", e)))?;

    let event = raw.event.ok_or_else(|| malformed("Missing event field"))?;
    let match_id = raw
        .match_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| malformed("Missing match_id field"))?;
    let hub = raw.hub.ok_or_else(|| malformed("Missing hub field"))?;

    match event.as_str() {
        EVENT_MATCH_READY => {
            let raw_teams = raw
                .teams
                .ok_or_else(|| malformed("Ready event is missing teams"))?;
            let mut teams = Vec::with_capacity(raw_teams.len());
            for (index, team) in raw_teams.into_iter().enumerate() {
                let team_name = team
                    .team_name
                    .filter(|name| !name.is_empty())
                    .ok_or_else(|| malformed(format!("Team {} is missing team_name", index)))?;
                let players = team
                    .players
                    .ok_or_else(|| malformed(format!("Team {} is missing players", index)))?;
                teams.push(TeamRoster { team_name, players });
            }
            Ok(MatchEvent::Ready {
                match_id,
                hub,
                teams,
            })
        }
        EVENT_MATCH_FINISHED => Ok(MatchEvent::Finished { match_id, hub }),
        EVENT_MATCH_CANCELLED => Ok(MatchEvent::Cancelled { match_id, hub }),
        other => Err(malformed(format!("Unsupported event {:?}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ready_event() {
        let body = r#"{
            "event": "match_status_ready",
            "match_id": "m1",
            "hub": "NACCS Power Pugs",
            "teams": [
                {"team_name": "Alpha", "players": ["p1", "p2"]},
                {"team_name": "Beta", "players": ["p3", "p4"]}
            ]
        }"#;

        let event = parse_match_webhook(body).unwrap();
        match event {
            MatchEvent::Ready {
                match_id,
                hub,
                teams,
            } => {
                assert_eq!(match_id, "m1");
                assert_eq!(hub, "NACCS Power Pugs");
                assert_eq!(teams.len(), 2);
                assert_eq!(teams[0].team_name, "Alpha");
                assert_eq!(teams[1].players, vec!["p3", "p4"]);
            }
            other => panic!("expected ready event, got {:?}", other),
        }
    }

    #[test]
    fn parses_finished_and_cancelled_events() {
        let finished = parse_match_webhook(
            r#"{"event": "match_status_finished", "match_id": "m1", "hub": "NACCS Power Pugs"}"#,
        )
        .unwrap();
        assert_eq!(finished.kind(), "finished");

        let cancelled = parse_match_webhook(
            r#"{"event": "match_status_cancelled", "match_id": "m1", "hub": "NACCS Power Pugs"}"#,
        )
        .unwrap();
        assert_eq!(cancelled.kind(), "cancelled");
    }

    #[test]
    fn rejects_invalid_json() {
        let err = parse_match_webhook("not json").unwrap_err();
        assert!(matches!(err, BridgeError::MalformedPayload { .. }));
    }

    #[test]
    fn rejects_missing_fields() {
        for body in [
            r#"{"match_id": "m1", "hub": "h"}"#,
            r#"{"event": "match_status_finished", "hub": "h"}"#,
            r#"{"event": "match_status_finished", "match_id": "m1"}"#,
            r#"{"event": "match_status_ready", "match_id": "m1", "hub": "h"}"#,
            r#"{"event": "match_status_ready", "match_id": "m1", "hub": "h",
                "teams": [{"players": ["p1"]}]}"#,
            r#"{"event": "match_status_ready", "match_id": "m1", "hub": "h",
                "teams": [{"team_name": "Alpha"}]}"#,
        ] {
            let err = parse_match_webhook(body).unwrap_err();
            assert!(
                matches!(err, BridgeError::MalformedPayload { .. }),
                "body should be malformed: {}",
                body
            );
        }
    }

    #[test]
    fn rejects_unsupported_event_kind() {
        let err = parse_match_webhook(
            r#"{"event": "match_status_configuring", "match_id": "m1", "hub": "h"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, BridgeError::MalformedPayload { .. }));
    }

    #[test]
    fn empty_match_id_is_malformed() {
        let err = parse_match_webhook(
            r#"{"event": "match_status_finished", "match_id": "", "hub": "h"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, BridgeError::MalformedPayload { .. }));
    }
}
