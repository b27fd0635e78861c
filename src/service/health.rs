//! Service health checks

use crate::service::app::AppState;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Overall service health
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Degraded => write!(f, "degraded"),
            HealthStatus::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// Point-in-time service statistics
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStats {
    pub active_sessions: usize,
    pub displayed_streams: usize,
    pub reconciler_running: bool,
    pub window_running: bool,
    pub uptime_seconds: u64,
}

/// Health status plus the statistics it was derived from
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub stats: ServiceStats,
}

/// Health check entry points used by the HTTP endpoints
pub struct HealthCheck;

impl HealthCheck {
    /// Full health check with statistics
    pub async fn check(app: Arc<AppState>) -> HealthReport {
        let stats = app.stats().await;
        let status = if !app.is_running() {
            HealthStatus::Unhealthy
        } else if !stats.reconciler_running {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };
        HealthReport { status, stats }
    }

    /// Lightweight liveness check
    pub async fn liveness(app: Arc<AppState>) -> HealthStatus {
        if app.is_running() {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        }
    }
}
