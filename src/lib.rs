//! Hubwatch - Chat-platform bridge for esports hub match lifecycles
//!
//! This crate bridges an esports hub's match lifecycle webhooks, queue
//! listings and stream listings with a chat server's voice channels, roles
//! and announcement messages, backed by a small relational table mapping
//! platform identities to chat identities.

pub mod chat;
pub mod commands;
pub mod config;
pub mod error;
pub mod identity;
pub mod metrics;
pub mod service;
pub mod session;
pub mod streams;
pub mod tasks;
pub mod types;
pub mod upstream;
pub mod utils;
pub mod webhook;
pub mod window;

// Re-export commonly used types and traits
pub use error::{BridgeError, Result};
pub use types::*;

// Re-export key components
pub use chat::ChatGateway;
pub use identity::IdentityLookup;
pub use service::AppState;
pub use session::{LifecycleHandler, SessionRegistry};
pub use streams::StreamReconciler;
pub use upstream::MatchApi;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
