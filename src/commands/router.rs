//! Command execution against the chat platform and upstream API

use crate::chat::ChatGateway;
use crate::commands::Command;
use crate::config::hubs::{HubConfig, HubDirectory};
use crate::config::ChatSettings;
use crate::identity::IdentityLookup;
use crate::metrics::MetricsCollector;
use crate::types::{GuildId, InboundMessage, RoleId};
use crate::upstream::{MatchApi, OngoingMatch};
use crate::utils::tagged_nickname;
use crate::window::WindowScheduler;
use std::sync::Arc;
use tracing::{debug, warn};

/// Routes parsed commands to their handlers
pub struct CommandRouter {
    gateway: Arc<dyn ChatGateway>,
    identity: Arc<dyn IdentityLookup>,
    api: Arc<dyn MatchApi>,
    hubs: HubDirectory,
    window: Arc<WindowScheduler>,
    metrics: Arc<MetricsCollector>,
    guild: GuildId,
    member_role: RoleId,
    notify_role: RoleId,
    operator_role: RoleId,
    prefix: String,
}

impl CommandRouter {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        gateway: Arc<dyn ChatGateway>,
        identity: Arc<dyn IdentityLookup>,
        api: Arc<dyn MatchApi>,
        hubs: HubDirectory,
        window: Arc<WindowScheduler>,
        metrics: Arc<MetricsCollector>,
        settings: &ChatSettings,
    ) -> Self {
        Self {
            gateway,
            identity,
            api,
            hubs,
            window,
            metrics,
            guild: GuildId(settings.guild_id),
            member_role: RoleId(settings.member_role),
            notify_role: RoleId(settings.notify_role),
            operator_role: RoleId(settings.operator_role),
            prefix: settings.command_prefix.clone(),
        }
    }

    /// Parse and execute a command, if the message carries one
    pub async fn dispatch(&self, msg: &InboundMessage) -> crate::error::Result<()> {
        let Some(command) = Command::parse(&self.prefix, &msg.content) else {
            return Ok(());
        };
        self.metrics.commands().record(command.name());
        debug!("Command {} from {}", command.name(), msg.author);

        // The invocation itself is noise in the channel
        if let Err(e) = self.gateway.delete_message(msg.channel, msg.id).await {
            debug!("Could not delete command invocation: {:#}", e);
        }

        match command {
            Command::Verify => self.verify(msg).await,
            Command::PingMe => self.toggle_notify(msg, true).await,
            Command::NoPing => self.toggle_notify(msg, false).await,
            Command::Matches => self.matches(msg).await,
            Command::AutoWindowOn => self.auto_window(msg, true).await,
            Command::AutoWindowOff => self.auto_window(msg, false).await,
        }
    }

    async fn verify(&self, msg: &InboundMessage) -> crate::error::Result<()> {
        let eligibility = self.identity.check_eligibility(msg.author).await;

        if !eligibility.eligible {
            self.gateway
                .direct_message(
                    msg.author,
                    "I couldn't verify you: no eligible record found. \
                     Contact staff if you believe this is a mistake.",
                )
                .await?;
            return Ok(());
        }

        if let Err(e) = self
            .gateway
            .add_role(self.guild, msg.author, self.member_role)
            .await
        {
            warn!("Could not grant member role to {}: {:#}", msg.author, e);
        }

        if let Some(affiliation) = &eligibility.affiliation {
            let nick = tagged_nickname(&msg.author_display, affiliation);
            if let Err(e) = self
                .gateway
                .set_nickname(self.guild, msg.author, &nick)
                .await
            {
                warn!("Could not tag nickname for {}: {:#}", msg.author, e);
            }
        }

        let confirmation = match &eligibility.affiliation {
            Some(affiliation) => format!("You're verified! Welcome, {}.", affiliation),
            None => "You're verified!".to_string(),
        };
        self.gateway.direct_message(msg.author, &confirmation).await?;
        Ok(())
    }

    async fn toggle_notify(&self, msg: &InboundMessage, opt_in: bool) -> crate::error::Result<()> {
        let result = if opt_in {
            self.gateway
                .add_role(self.guild, msg.author, self.notify_role)
                .await
        } else {
            self.gateway
                .remove_role(self.guild, msg.author, self.notify_role)
                .await
        };
        if let Err(e) = result {
            warn!("Could not toggle notify role for {}: {:#}", msg.author, e);
            return Ok(());
        }

        let confirmation = if opt_in {
            "You'll be pinged when pugs are starting."
        } else {
            "You won't be pinged anymore."
        };
        self.gateway.direct_message(msg.author, confirmation).await?;
        Ok(())
    }

    async fn matches(&self, msg: &InboundMessage) -> crate::error::Result<()> {
        let Some(hub) = self.hubs.by_match_channel(msg.channel) else {
            debug!("matches command outside a configured hub channel, ignoring");
            return Ok(());
        };

        let queue_size = self.api.fetch_queue_size(hub).await;
        let ongoing = self.api.fetch_ongoing_matches(hub).await;

        let content = match (queue_size, ongoing) {
            (Ok(queue_size), Ok(ongoing)) => render_matches(hub, queue_size, &ongoing),
            (queue, matches) => {
                if let Err(e) = queue.and(matches.map(|_| 0)) {
                    warn!("matches command could not reach upstream: {:#}", e);
                }
                "I had trouble fetching matches. Notify staff and try again later.".to_string()
            }
        };

        self.gateway.send_message(msg.channel, &content).await?;
        Ok(())
    }

    async fn auto_window(&self, msg: &InboundMessage, on: bool) -> crate::error::Result<()> {
        if !msg.author_roles.contains(&self.operator_role) {
            self.gateway
                .direct_message(msg.author, "That command is restricted to operators.")
                .await?;
            return Ok(());
        }

        let content = if on {
            if self.window.start() {
                "Queue window schedule started."
            } else {
                "Queue window schedule is already running."
            }
        } else if self.window.stop() {
            "Queue window schedule stopped."
        } else {
            "Queue window schedule was not running."
        };
        self.gateway.send_message(msg.channel, content).await?;
        Ok(())
    }
}

/// Render the queue and ongoing-match summary for a hub
fn render_matches(hub: &HubConfig, queue_size: u64, ongoing: &[OngoingMatch]) -> String {
    let mut lines = vec![format!(
        "{}: {} in queue.",
        hub.name,
        match queue_size {
            1 => "1 player".to_string(),
            n => format!("{} players", n),
        }
    )];

    if ongoing.is_empty() {
        lines.push("There are currently no ongoing matches.".to_string());
        return lines.join("\n");
    }

    for item in ongoing {
        let (score1, score2) = item.score();
        let mut line = format!(
            "{} ({}) vs. {} ({})",
            item.teams.faction1.name, score1, item.teams.faction2.name, score2
        );
        match (item.picked_location(), item.picked_map()) {
            (Some(location), Some(map)) => line.push_str(&format!(" — {} | {}", location, map)),
            (None, Some(map)) => line.push_str(&format!(" — {}", map)),
            _ => {}
        }
        if let Some(url) = &item.match_url {
            line.push_str(&format!("\n  {}", url));
        }
        for faction in [&item.teams.faction1, &item.teams.faction2] {
            if !faction.roster.is_empty() {
                let roster: Vec<&str> = faction
                    .roster
                    .iter()
                    .map(|entry| entry.nickname.as_str())
                    .collect();
                line.push_str(&format!("\n  {}: {}", faction.name, roster.join(", ")));
            }
        }
        lines.push(line);
    }

    lines.join("\n")
}
