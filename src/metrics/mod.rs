//! Metrics and monitoring for the hubwatch bridge service
//!
//! This module provides metrics collection and health/metrics HTTP endpoints
//! for the bridge service.

pub mod collector;
pub mod health;

pub use collector::{
    CommandMetrics, LifecycleMetrics, MetricsCollector, ServiceMetrics, StreamMetrics,
};
pub use health::{HealthServer, HealthServerConfig};
