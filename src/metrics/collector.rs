//! Metrics collection using Prometheus

use crate::error::Result;
use crate::session::Placement;
use crate::streams::PassSummary;
use prometheus::{IntCounter, IntCounterVec, IntGauge, Opts, Registry};
use std::sync::Arc;

/// Main metrics collector for the bridge service
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Service-level metrics
    service_metrics: ServiceMetrics,

    /// Match lifecycle metrics
    lifecycle_metrics: LifecycleMetrics,

    /// Stream reconciliation metrics
    stream_metrics: StreamMetrics,

    /// Command surface metrics
    command_metrics: CommandMetrics,
}

/// Service-level metrics
#[derive(Clone)]
pub struct ServiceMetrics {
    /// Service uptime in seconds
    pub uptime_seconds: IntGauge,

    /// Inbound chat messages by source (webhook, command, other)
    pub inbound_messages_total: IntCounterVec,

    /// Webhook payloads that failed validation
    pub malformed_payloads_total: IntCounter,
}

/// Match lifecycle metrics
#[derive(Clone)]
pub struct LifecycleMetrics {
    /// Lifecycle events received, by kind
    pub events_total: IntCounterVec,

    /// Lifecycle events dropped, by reason
    pub events_dropped_total: IntCounterVec,

    /// Currently registered match sessions
    pub active_sessions: IntGauge,

    /// Ephemeral voice channels created
    pub channels_created_total: IntCounter,

    /// Ephemeral voice channels deleted
    pub channels_deleted_total: IntCounter,

    /// Per-member placement outcomes during match setup
    pub placements_total: IntCounterVec,
}

/// Stream reconciliation metrics
#[derive(Clone)]
pub struct StreamMetrics {
    /// Reconciliation passes, by outcome (ok, deferred)
    pub passes_total: IntCounterVec,

    /// Announcements currently displayed
    pub announcements_displayed: IntGauge,

    /// Announcements created
    pub announcements_created_total: IntCounter,

    /// Announcements edited in place
    pub announcements_updated_total: IntCounter,

    /// Announcements removed
    pub announcements_removed_total: IntCounter,

    /// Upstream stream entries skipped as malformed
    pub malformed_entries_total: IntCounter,
}

/// Command surface metrics
#[derive(Clone)]
pub struct CommandMetrics {
    /// Commands executed, by name
    pub commands_total: IntCounterVec,
}

fn int_counter(registry: &Registry, name: &str, help: &str) -> Result<IntCounter> {
    let counter = IntCounter::new(name, help)?;
    registry.register(Box::new(counter.clone()))?;
    Ok(counter)
}

fn int_counter_vec(
    registry: &Registry,
    name: &str,
    help: &str,
    labels: &[&str],
) -> Result<IntCounterVec> {
    let counter = IntCounterVec::new(Opts::new(name, help), labels)?;
    registry.register(Box::new(counter.clone()))?;
    Ok(counter)
}

fn int_gauge(registry: &Registry, name: &str, help: &str) -> Result<IntGauge> {
    let gauge = IntGauge::new(name, help)?;
    registry.register(Box::new(gauge.clone()))?;
    Ok(gauge)
}

impl MetricsCollector {
    /// Create a new metrics collector with its own registry
    pub fn new() -> Result<Self> {
        Self::with_registry(Arc::new(Registry::new()))
    }

    /// Create a new metrics collector against an existing registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let service_metrics = ServiceMetrics {
            uptime_seconds: int_gauge(
                &registry,
                "hubwatch_uptime_seconds",
                "Service uptime in seconds",
            )?,
            inbound_messages_total: int_counter_vec(
                &registry,
                "hubwatch_inbound_messages_total",
                "Inbound chat messages by source",
                &["source"],
            )?,
            malformed_payloads_total: int_counter(
                &registry,
                "hubwatch_malformed_payloads_total",
                "Webhook payloads that failed validation",
            )?,
        };

        let lifecycle_metrics = LifecycleMetrics {
            events_total: int_counter_vec(
                &registry,
                "hubwatch_lifecycle_events_total",
                "Lifecycle events received by kind",
                &["kind"],
            )?,
            events_dropped_total: int_counter_vec(
                &registry,
                "hubwatch_lifecycle_events_dropped_total",
                "Lifecycle events dropped by reason",
                &["reason"],
            )?,
            active_sessions: int_gauge(
                &registry,
                "hubwatch_active_sessions",
                "Currently registered match sessions",
            )?,
            channels_created_total: int_counter(
                &registry,
                "hubwatch_channels_created_total",
                "Ephemeral voice channels created",
            )?,
            channels_deleted_total: int_counter(
                &registry,
                "hubwatch_channels_deleted_total",
                "Ephemeral voice channels deleted",
            )?,
            placements_total: int_counter_vec(
                &registry,
                "hubwatch_member_placements_total",
                "Per-member placement outcomes during match setup",
                &["outcome"],
            )?,
        };

        let stream_metrics = StreamMetrics {
            passes_total: int_counter_vec(
                &registry,
                "hubwatch_reconcile_passes_total",
                "Stream reconciliation passes by outcome",
                &["outcome"],
            )?,
            announcements_displayed: int_gauge(
                &registry,
                "hubwatch_announcements_displayed",
                "Stream announcements currently displayed",
            )?,
            announcements_created_total: int_counter(
                &registry,
                "hubwatch_announcements_created_total",
                "Stream announcements created",
            )?,
            announcements_updated_total: int_counter(
                &registry,
                "hubwatch_announcements_updated_total",
                "Stream announcements edited in place",
            )?,
            announcements_removed_total: int_counter(
                &registry,
                "hubwatch_announcements_removed_total",
                "Stream announcements removed",
            )?,
            malformed_entries_total: int_counter(
                &registry,
                "hubwatch_malformed_stream_entries_total",
                "Upstream stream entries skipped as malformed",
            )?,
        };

        let command_metrics = CommandMetrics {
            commands_total: int_counter_vec(
                &registry,
                "hubwatch_commands_total",
                "Commands executed by name",
                &["command"],
            )?,
        };

        Ok(Self {
            registry,
            service_metrics,
            lifecycle_metrics,
            stream_metrics,
            command_metrics,
        })
    }

    /// Get the underlying Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Get service-level metrics
    pub fn service(&self) -> &ServiceMetrics {
        &self.service_metrics
    }

    /// Get lifecycle metrics
    pub fn lifecycle(&self) -> &LifecycleMetrics {
        &self.lifecycle_metrics
    }

    /// Get stream reconciliation metrics
    pub fn streams(&self) -> &StreamMetrics {
        &self.stream_metrics
    }

    /// Get command surface metrics
    pub fn commands(&self) -> &CommandMetrics {
        &self.command_metrics
    }
}

impl ServiceMetrics {
    pub fn record_inbound(&self, source: &str) {
        self.inbound_messages_total
            .with_label_values(&[source])
            .inc();
    }
}

impl LifecycleMetrics {
    pub fn record_event(&self, kind: &str) {
        self.events_total.with_label_values(&[kind]).inc();
    }

    pub fn record_drop(&self, reason: &str) {
        self.events_dropped_total.with_label_values(&[reason]).inc();
    }

    pub fn set_active_sessions(&self, active: usize) {
        self.active_sessions.set(active as i64);
    }

    pub fn record_channel_created(&self) {
        self.channels_created_total.inc();
    }

    pub fn record_channel_deleted(&self) {
        self.channels_deleted_total.inc();
    }

    pub fn record_placement(&self, placement: &Placement) {
        let outcome = match placement {
            Placement::Seated(_) => "seated",
            Placement::Unresolved => "unresolved",
            Placement::MoveFailed(_) => "move_failed",
        };
        self.placements_total.with_label_values(&[outcome]).inc();
    }
}

impl StreamMetrics {
    pub fn record_pass(&self, outcome: &str) {
        self.passes_total.with_label_values(&[outcome]).inc();
    }

    pub fn record_summary(&self, summary: &PassSummary, displayed: usize) {
        self.announcements_displayed.set(displayed as i64);
        self.announcements_created_total
            .inc_by(summary.created as u64);
        self.announcements_updated_total
            .inc_by(summary.updated as u64);
        self.announcements_removed_total
            .inc_by(summary.removed as u64);
        self.malformed_entries_total
            .inc_by(summary.malformed as u64);
    }
}

impl CommandMetrics {
    pub fn record(&self, command: &str) {
        self.commands_total.with_label_values(&[command]).inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collector_registers_metric_families() {
        let collector = MetricsCollector::new().unwrap();

        collector.lifecycle().record_event("ready");
        collector.lifecycle().set_active_sessions(1);
        collector.streams().record_pass("ok");
        collector.commands().record("verify");

        let families = collector.registry().gather();
        assert!(!families.is_empty());

        let names: Vec<String> = families
            .iter()
            .map(|family| family.get_name().to_string())
            .collect();
        assert!(names.iter().any(|name| name.contains("lifecycle_events")));
        assert!(names.iter().any(|name| name.contains("reconcile_passes")));
        assert!(names.iter().any(|name| name.contains("commands_total")));
    }

    #[test]
    fn separate_collectors_use_separate_registries() {
        let first = MetricsCollector::new().unwrap();
        let second = MetricsCollector::new().unwrap();

        first.commands().record("verify");
        let families = second.registry().gather();
        let verify_count: u64 = families
            .iter()
            .filter(|family| family.get_name().contains("commands_total"))
            .flat_map(|family| family.get_metric())
            .map(|metric| metric.get_counter().get_value() as u64)
            .sum();
        assert_eq!(verify_count, 0);
    }
}
