//! Main application configuration
//!
//! This module defines the primary configuration structures for the hubwatch
//! bridge service, including environment variable loading and validation.

use crate::config::hubs::HubConfig;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub upstream: UpstreamSettings,
    pub chat: ChatSettings,
    pub identity: IdentitySettings,
    pub webhook: WebhookSettings,
    pub streams: StreamSettings,
    pub window: WindowSettings,
    pub hubs: Vec<HubConfig>,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Port for health check endpoint
    pub health_port: u16,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,
}

/// Upstream match API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamSettings {
    /// Base URL of the upstream Data API
    pub base_url: String,
    /// Bearer token for the upstream API
    pub api_key: String,
    /// Organizer identifier used for stream listings
    pub organizer_id: String,
    /// Per-request timeout in seconds
    pub request_timeout_seconds: u64,
}

/// Chat platform settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSettings {
    /// Bot token for the chat platform
    pub token: String,
    /// Guild the bridge operates in
    pub guild_id: u64,
    /// Role granted to verified members
    pub member_role: u64,
    /// Role toggled by pingme/noping
    pub notify_role: u64,
    /// Role required for operator commands
    pub operator_role: u64,
    /// Prefix for text commands
    pub command_prefix: String,
}

/// Identity lookup store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentitySettings {
    /// Connection URL for the relational lookup store
    pub database_url: String,
}

/// Webhook handling settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookSettings {
    /// Log webhook events naming a hub outside the configured set before
    /// dropping them
    pub log_unknown_hubs: bool,
}

/// Stream reconciliation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamSettings {
    /// Channel stream announcements are posted to
    pub announce_channel: u64,
    /// Reconciliation pass interval in seconds
    pub poll_interval_seconds: u64,
}

/// Queue window schedule settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowSettings {
    /// Interval between open/close toggles in seconds
    pub toggle_interval_seconds: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            service: ServiceSettings::default(),
            upstream: UpstreamSettings::default(),
            chat: ChatSettings::default(),
            identity: IdentitySettings::default(),
            webhook: WebhookSettings::default(),
            streams: StreamSettings::default(),
            window: WindowSettings::default(),
            hubs: vec![HubConfig::power_pugs(), HubConfig::general()],
        }
    }
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "hubwatch".to_string(),
            log_level: "info".to_string(),
            health_port: 8080,
            shutdown_timeout_seconds: 30,
        }
    }
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            base_url: "https://open.faceit.com/data/v4/".to_string(),
            api_key: String::new(),
            organizer_id: String::new(),
            request_timeout_seconds: 10,
        }
    }
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            token: String::new(),
            guild_id: 0,
            member_role: 0,
            notify_role: 0,
            operator_role: 0,
            command_prefix: ".".to_string(),
        }
    }
}

impl Default for IdentitySettings {
    fn default() -> Self {
        Self {
            database_url: "postgres://localhost:5432/hubwatch".to_string(),
        }
    }
}

impl Default for WebhookSettings {
    fn default() -> Self {
        Self {
            log_unknown_hubs: true,
        }
    }
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            announce_channel: 0,
            poll_interval_seconds: 300, // 5 minutes
        }
    }
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            toggle_interval_seconds: 3600, // 1 hour
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            config.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            config.service.log_level = log_level;
        }
        if let Ok(port) = env::var("HEALTH_PORT") {
            config.service.health_port = port
                .parse()
                .map_err(|_| anyhow!("Invalid HEALTH_PORT value: {}", port))?;
        }
        if let Ok(timeout) = env::var("SHUTDOWN_TIMEOUT_SECONDS") {
            config.service.shutdown_timeout_seconds = timeout
                .parse()
                .map_err(|_| anyhow!("Invalid SHUTDOWN_TIMEOUT_SECONDS value: {}", timeout))?;
        }

        // Upstream settings
        if let Ok(base_url) = env::var("UPSTREAM_BASE_URL") {
            config.upstream.base_url = base_url;
        }
        if let Ok(key) = env::var("FACEIT_KEY") {
            config.upstream.api_key = key;
        }
        if let Ok(organizer) = env::var("UPSTREAM_ORGANIZER_ID") {
            config.upstream.organizer_id = organizer;
        }
        if let Ok(timeout) = env::var("UPSTREAM_TIMEOUT_SECONDS") {
            config.upstream.request_timeout_seconds = timeout
                .parse()
                .map_err(|_| anyhow!("Invalid UPSTREAM_TIMEOUT_SECONDS value: {}", timeout))?;
        }

        // Chat settings
        if let Ok(token) = env::var("DISCORD_TOKEN") {
            config.chat.token = token;
        }
        if let Ok(guild) = env::var("GUILD_ID") {
            config.chat.guild_id = guild
                .parse()
                .map_err(|_| anyhow!("Invalid GUILD_ID value: {}", guild))?;
        }
        if let Ok(role) = env::var("MEMBER_ROLE_ID") {
            config.chat.member_role = role
                .parse()
                .map_err(|_| anyhow!("Invalid MEMBER_ROLE_ID value: {}", role))?;
        }
        if let Ok(role) = env::var("NOTIFY_ROLE_ID") {
            config.chat.notify_role = role
                .parse()
                .map_err(|_| anyhow!("Invalid NOTIFY_ROLE_ID value: {}", role))?;
        }
        if let Ok(role) = env::var("OPERATOR_ROLE_ID") {
            config.chat.operator_role = role
                .parse()
                .map_err(|_| anyhow!("Invalid OPERATOR_ROLE_ID value: {}", role))?;
        }
        if let Ok(prefix) = env::var("COMMAND_PREFIX") {
            config.chat.command_prefix = prefix;
        }

        // Identity settings
        if let Ok(url) = env::var("DATABASE_URL") {
            config.identity.database_url = url;
        }

        // Webhook settings
        if let Ok(flag) = env::var("LOG_UNKNOWN_HUBS") {
            config.webhook.log_unknown_hubs = flag
                .parse()
                .map_err(|_| anyhow!("Invalid LOG_UNKNOWN_HUBS value: {}", flag))?;
        }

        // Stream settings
        if let Ok(channel) = env::var("ANNOUNCE_CHANNEL_ID") {
            config.streams.announce_channel = channel
                .parse()
                .map_err(|_| anyhow!("Invalid ANNOUNCE_CHANNEL_ID value: {}", channel))?;
        }
        if let Ok(interval) = env::var("STREAM_POLL_INTERVAL_SECONDS") {
            config.streams.poll_interval_seconds = interval
                .parse()
                .map_err(|_| anyhow!("Invalid STREAM_POLL_INTERVAL_SECONDS value: {}", interval))?;
        }

        // Window settings
        if let Ok(interval) = env::var("WINDOW_TOGGLE_INTERVAL_SECONDS") {
            config.window.toggle_interval_seconds = interval.parse().map_err(|_| {
                anyhow!("Invalid WINDOW_TOGGLE_INTERVAL_SECONDS value: {}", interval)
            })?;
        }

        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        validate_config(&config)?;
        Ok(config)
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.service.shutdown_timeout_seconds)
    }

    /// Get upstream request timeout as Duration
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream.request_timeout_seconds)
    }

    /// Get stream reconciliation interval as Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.streams.poll_interval_seconds)
    }

    /// Get queue window toggle interval as Duration
    pub fn window_interval(&self) -> Duration {
        Duration::from_secs(self.window.toggle_interval_seconds)
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    // Validate ports and timeouts
    if config.service.health_port == 0 {
        return Err(anyhow!("Health port cannot be 0"));
    }
    if config.service.shutdown_timeout_seconds == 0 {
        return Err(anyhow!("Shutdown timeout must be greater than 0"));
    }
    if config.upstream.request_timeout_seconds == 0 {
        return Err(anyhow!("Upstream request timeout must be greater than 0"));
    }

    // Validate upstream settings
    if config.upstream.base_url.is_empty() {
        return Err(anyhow!("Upstream base URL cannot be empty"));
    }

    // Validate chat settings
    if config.chat.command_prefix.is_empty() {
        return Err(anyhow!("Command prefix cannot be empty"));
    }

    // Validate identity settings
    if config.identity.database_url.is_empty() {
        return Err(anyhow!("Database URL cannot be empty"));
    }

    // Validate intervals
    if config.streams.poll_interval_seconds == 0 {
        return Err(anyhow!("Stream poll interval must be greater than 0"));
    }
    if config.window.toggle_interval_seconds == 0 {
        return Err(anyhow!("Window toggle interval must be greater than 0"));
    }

    // Validate hubs
    if config.hubs.is_empty() {
        return Err(anyhow!("At least one hub must be configured"));
    }
    for hub in &config.hubs {
        if hub.name.is_empty() {
            return Err(anyhow!("Hub name cannot be empty"));
        }
        if hub.upstream_id.is_empty() {
            return Err(anyhow!("Hub {} has no upstream id", hub.name));
        }
    }
    let mut names: Vec<&str> = config.hubs.iter().map(|hub| hub.name.as_str()).collect();
    names.sort_unstable();
    names.dedup();
    if names.len() != config.hubs.len() {
        return Err(anyhow!("Hub names must be unique"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
        assert_eq!(config.hubs.len(), 2);
        assert_eq!(config.streams.poll_interval_seconds, 300);
    }

    #[test]
    fn rejects_bad_log_level() {
        let mut config = AppConfig::default();
        config.service.log_level = "verbose".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn rejects_duplicate_hub_names() {
        let mut config = AppConfig::default();
        config.hubs.push(config.hubs[0].clone());
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn rejects_zero_poll_interval() {
        let mut config = AppConfig::default();
        config.streams.poll_interval_seconds = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn duration_helpers() {
        let config = AppConfig::default();
        assert_eq!(config.poll_interval(), Duration::from_secs(300));
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(30));
    }
}
