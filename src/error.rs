//! Error types for the bridge service
//!
//! This module defines all error types using anyhow for consistent error handling
//! throughout the application.

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific bridge scenarios
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("Upstream API unavailable: {reason}")]
    UpstreamUnavailable { reason: String },

    #[error("Malformed webhook payload: {reason}")]
    MalformedPayload { reason: String },

    #[error("Duplicate lifecycle event for match {match_id}")]
    DuplicateEvent { match_id: String },

    #[error("Unrecognized hub: {hub}")]
    UnrecognizedHub { hub: String },

    #[error("Chat platform request failed: {message}")]
    ChatPlatform { message: String },

    #[error("Identity lookup miss: {subject}")]
    IdentityNotFound { subject: String },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Internal service error: {message}")]
    InternalError { message: String },
}
