//! Configuration management for the hubwatch service
//!
//! This module handles all configuration loading from environment variables,
//! validation, and default values for the bridge service.

pub mod app;
pub mod hubs;

// Re-export commonly used types
pub use app::{
    validate_config, AppConfig, ChatSettings, IdentitySettings, ServiceSettings, StreamSettings,
    UpstreamSettings, WebhookSettings, WindowSettings,
};
pub use hubs::{HubConfig, HubDirectory};
