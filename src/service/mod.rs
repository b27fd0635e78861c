//! Service layer for the hubwatch bridge service
//!
//! This module contains the main application state, the single inbound
//! message entry point, and background task coordination.

pub mod app;
pub mod health;

pub use app::AppState;
pub use health::{HealthCheck, HealthReport, HealthStatus, ServiceStats};
