//! Match lifecycle handling
//!
//! Consumes typed lifecycle events and drives creation and teardown of
//! ephemeral voice channels through the chat gateway. Per-member and
//! per-channel failures are isolated: one failed move or delete never aborts
//! the rest of the batch, and every outcome is collected for observability.

use crate::chat::ChatGateway;
use crate::config::hubs::HubDirectory;
use crate::identity::IdentityLookup;
use crate::metrics::MetricsCollector;
use crate::session::registry::{MatchSession, SessionRegistry, TeamChannel};
use crate::types::{ChannelId, GuildId, MatchEvent, TeamRoster, UserId};
use crate::utils::{current_timestamp, truncate_label};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Voice channel names are capped by the chat platform
const CHANNEL_NAME_LIMIT: usize = 100;

/// Where one roster member ended up during match setup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// Resolved and moved into the team channel
    Seated(UserId),
    /// No chat identity found for the platform id
    Unresolved,
    /// Resolved but the voice move failed
    MoveFailed(UserId),
}

/// Per-member setup outcome, keyed by upstream platform id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberPlacement {
    pub platform_id: String,
    pub placement: Placement,
}

/// Summary of a session setup
#[derive(Debug, Clone, Default)]
pub struct ReadyReport {
    pub channels: Vec<ChannelId>,
    pub placements: Vec<MemberPlacement>,
}

/// Summary of a session teardown
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeardownReport {
    pub moved: usize,
    pub move_failures: usize,
    pub deleted: usize,
    pub delete_failures: usize,
}

/// What handling an event amounted to
#[derive(Debug, Clone)]
pub enum EventOutcome {
    /// Session created and registered
    Ready(ReadyReport),
    /// Session ended and resources torn down
    Teardown(TeardownReport),
    /// Duplicate `ready` for a registered match; dropped
    Duplicate,
    /// Hub name outside the configured set; dropped
    UnknownHub,
    /// `finished`/`cancelled` with no registered session; dropped
    NoSession,
}

/// Drives session setup and teardown from lifecycle events
///
/// Sole owner and sole mutator of the session registry.
pub struct LifecycleHandler {
    gateway: Arc<dyn ChatGateway>,
    identity: Arc<dyn IdentityLookup>,
    hubs: HubDirectory,
    guild: GuildId,
    log_unknown_hubs: bool,
    metrics: Arc<MetricsCollector>,
    registry: SessionRegistry,
}

impl LifecycleHandler {
    pub fn new(
        gateway: Arc<dyn ChatGateway>,
        identity: Arc<dyn IdentityLookup>,
        hubs: HubDirectory,
        guild: GuildId,
        log_unknown_hubs: bool,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            gateway,
            identity,
            hubs,
            guild,
            log_unknown_hubs,
            metrics,
            registry: SessionRegistry::new(),
        }
    }

    /// Number of currently registered sessions
    pub fn active_sessions(&self) -> usize {
        self.registry.active()
    }

    /// Apply one lifecycle event
    pub async fn handle_event(&mut self, event: MatchEvent) -> EventOutcome {
        self.metrics.lifecycle().record_event(event.kind());

        match event {
            MatchEvent::Ready {
                match_id,
                hub,
                teams,
            } => self.handle_ready(match_id, hub, teams).await,
            MatchEvent::Finished { match_id, hub } => {
                self.handle_end(match_id, hub, "finished").await
            }
            MatchEvent::Cancelled { match_id, hub } => {
                self.handle_end(match_id, hub, "cancelled").await
            }
        }
    }

    async fn handle_ready(
        &mut self,
        match_id: String,
        hub_name: String,
        teams: Vec<TeamRoster>,
    ) -> EventOutcome {
        let Some(hub) = self.hubs.by_name(&hub_name) else {
            return self.drop_unknown_hub(&hub_name, &match_id);
        };

        if self.registry.contains(&match_id) {
            info!(
                "Duplicate ready event for match {}, session already registered; dropping",
                match_id
            );
            self.metrics.lifecycle().record_drop("duplicate");
            return EventOutcome::Duplicate;
        }

        info!(
            "Match {} ready in hub {}: creating {} team channels",
            match_id,
            hub.name,
            teams.len()
        );

        let mut report = ReadyReport::default();
        let mut channels = Vec::new();

        for team in &teams {
            let name = truncate_label(&team.team_name, CHANNEL_NAME_LIMIT);
            let channel = match self
                .gateway
                .create_voice_channel(self.guild, hub.category, &name, team.players.len() as u32)
                .await
            {
                Ok(channel) => channel,
                Err(e) => {
                    error!(
                        "Failed to create voice channel for team {} in match {}: {:#}",
                        team.team_name, match_id, e
                    );
                    continue;
                }
            };
            self.metrics.lifecycle().record_channel_created();
            report.channels.push(channel);

            let mut seated = Vec::new();
            for platform_id in &team.players {
                let placement = match self.identity.resolve_chat_user(platform_id).await {
                    Some(user) => match self.gateway.move_to_voice(self.guild, user, channel).await
                    {
                        Ok(()) => {
                            seated.push(user);
                            Placement::Seated(user)
                        }
                        Err(e) => {
                            warn!(
                                "Could not move {} into {} for match {}: {:#}",
                                user, channel, match_id, e
                            );
                            Placement::MoveFailed(user)
                        }
                    },
                    None => {
                        warn!(
                            "No chat identity for platform id {} in match {}",
                            platform_id, match_id
                        );
                        Placement::Unresolved
                    }
                };
                self.metrics.lifecycle().record_placement(&placement);
                report.placements.push(MemberPlacement {
                    platform_id: platform_id.clone(),
                    placement,
                });
            }

            channels.push(TeamChannel {
                team_name: team.team_name.clone(),
                channel,
                seated,
            });
        }

        let session = MatchSession {
            match_id: match_id.clone(),
            hub: hub.name.clone(),
            channels,
            created_at: current_timestamp(),
        };
        if let Err(e) = self.registry.begin_session(session) {
            warn!(
                "{}; dropping late duplicate, channels {:?} left behind",
                e, report.channels
            );
            self.metrics.lifecycle().record_drop("duplicate");
            return EventOutcome::Duplicate;
        }
        self.metrics
            .lifecycle()
            .set_active_sessions(self.registry.active());

        let seated = report
            .placements
            .iter()
            .filter(|placement| matches!(placement.placement, Placement::Seated(_)))
            .count();
        info!(
            "Session registered for match {}: {} channels, {}/{} members seated",
            match_id,
            report.channels.len(),
            seated,
            report.placements.len()
        );
        EventOutcome::Ready(report)
    }

    async fn handle_end(&mut self, match_id: String, hub_name: String, kind: &str) -> EventOutcome {
        let Some(hub) = self.hubs.by_name(&hub_name) else {
            return self.drop_unknown_hub(&hub_name, &match_id);
        };
        let lobby = hub.lobby;

        let Some(session) = self.registry.end_session(&match_id) else {
            info!("No session found for match {} on {}; dropping", match_id, kind);
            self.metrics.lifecycle().record_drop("no_session");
            return EventOutcome::NoSession;
        };
        self.metrics
            .lifecycle()
            .set_active_sessions(self.registry.active());

        info!(
            "Match {} {}: returning players to lobby and removing {} channels",
            match_id,
            kind,
            session.channels.len()
        );

        let mut report = TeardownReport::default();
        for team_channel in &session.channels {
            let occupants = match self
                .gateway
                .voice_occupants(self.guild, team_channel.channel)
                .await
            {
                Ok(occupants) => occupants,
                Err(e) => {
                    warn!(
                        "Could not read occupants of {}, falling back to seated roster: {:#}",
                        team_channel.channel, e
                    );
                    team_channel.seated.clone()
                }
            };

            for user in occupants {
                match self.gateway.move_to_voice(self.guild, user, lobby).await {
                    Ok(()) => report.moved += 1,
                    Err(e) => {
                        warn!(
                            "Could not move {} back to lobby {} for match {}: {:#}",
                            user, lobby, match_id, e
                        );
                        report.move_failures += 1;
                    }
                }
            }

            match self.gateway.delete_channel(team_channel.channel).await {
                Ok(()) => {
                    self.metrics.lifecycle().record_channel_deleted();
                    report.deleted += 1;
                }
                Err(e) => {
                    error!(
                        "Failed to delete channel {} for match {}: {:#}",
                        team_channel.channel, match_id, e
                    );
                    report.delete_failures += 1;
                }
            }
        }

        info!(
            "Teardown complete for match {}: {} moved ({} failures), {} channels deleted ({} failures)",
            match_id, report.moved, report.move_failures, report.deleted, report.delete_failures
        );
        EventOutcome::Teardown(report)
    }

    fn drop_unknown_hub(&self, hub_name: &str, match_id: &str) -> EventOutcome {
        if self.log_unknown_hubs {
            warn!(
                "Event for match {} names unrecognized hub {:?}; dropping",
                match_id, hub_name
            );
        }
        self.metrics.lifecycle().record_drop("unknown_hub");
        EventOutcome::UnknownHub
    }
}
