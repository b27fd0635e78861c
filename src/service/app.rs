//! Main application state and service coordination
//!
//! `AppState` wires configuration and the external handles (chat gateway,
//! identity store, upstream API) into the lifecycle handler, command router,
//! reconciliation task and health server. `handle_message` is the single
//! inbound entry point: webhook-authored messages feed the lifecycle
//! handler, everything else goes through the command router. Both mutable
//! state owners (the session registry inside the lifecycle handler, the
//! displayed-stream map inside the reconciler) sit behind async mutexes
//! because the gateway delivers events from a concurrent context.

use crate::chat::ChatGateway;
use crate::commands::CommandRouter;
use crate::config::hubs::HubDirectory;
use crate::config::AppConfig;
use crate::error::Result;
use crate::identity::IdentityLookup;
use crate::metrics::{HealthServer, HealthServerConfig, MetricsCollector};
use crate::service::health::ServiceStats;
use crate::session::LifecycleHandler;
use crate::streams::StreamReconciler;
use crate::tasks::PeriodicTask;
use crate::types::{ChannelId, GuildId, InboundMessage};
use crate::upstream::MatchApi;
use crate::webhook::parse_match_webhook;
use crate::window::{LoggedWindowActions, WindowScheduler};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Main application state containing all service components
pub struct AppState {
    config: AppConfig,
    metrics: Arc<MetricsCollector>,
    lifecycle: Mutex<LifecycleHandler>,
    router: CommandRouter,
    reconciler: Arc<Mutex<StreamReconciler>>,
    reconcile_task: PeriodicTask,
    window: Arc<WindowScheduler>,
    health_server: Arc<HealthServer>,
    started_at: Instant,
    is_running: AtomicBool,
}

impl AppState {
    /// Wire the service components from configuration and external handles
    pub fn new(
        config: AppConfig,
        gateway: Arc<dyn ChatGateway>,
        identity: Arc<dyn IdentityLookup>,
        api: Arc<dyn MatchApi>,
    ) -> Result<Self> {
        let metrics = Arc::new(MetricsCollector::new()?);
        let hubs = HubDirectory::new(config.hubs.clone());
        let guild = GuildId(config.chat.guild_id);

        let lifecycle = Mutex::new(LifecycleHandler::new(
            gateway.clone(),
            identity.clone(),
            hubs.clone(),
            guild,
            config.webhook.log_unknown_hubs,
            metrics.clone(),
        ));

        // The window schedule targets the primary (first configured) hub
        let primary_hub = config
            .hubs
            .first()
            .cloned()
            .ok_or_else(|| crate::error::BridgeError::ConfigurationError {
                message: "At least one hub must be configured".to_string(),
            })?;
        let window = Arc::new(WindowScheduler::new(
            primary_hub,
            config.window_interval(),
            Arc::new(LoggedWindowActions),
        ));

        let router = CommandRouter::new(
            gateway.clone(),
            identity,
            api.clone(),
            hubs,
            window.clone(),
            metrics.clone(),
            &config.chat,
        );

        let reconciler = Arc::new(Mutex::new(StreamReconciler::new(
            api,
            gateway,
            config.upstream.organizer_id.clone(),
            ChannelId(config.streams.announce_channel),
            metrics.clone(),
        )));
        let reconcile_task = PeriodicTask::new("stream-reconciler", config.poll_interval());

        let health_server = Arc::new(HealthServer::new(
            HealthServerConfig {
                port: config.service.health_port,
                host: "0.0.0.0".to_string(),
            },
            metrics.clone(),
        ));

        Ok(Self {
            config,
            metrics,
            lifecycle,
            router,
            reconciler,
            reconcile_task,
            window,
            health_server,
            started_at: Instant::now(),
            is_running: AtomicBool::new(false),
        })
    }

    /// Start background tasks (reconciliation loop, health server)
    pub fn start(&self) {
        if self.is_running.swap(true, Ordering::SeqCst) {
            warn!("Service already started, ignoring start");
            return;
        }

        let reconciler = self.reconciler.clone();
        self.reconcile_task.start(move || {
            let reconciler = reconciler.clone();
            async move {
                if let Err(e) = reconciler.lock().await.run_pass().await {
                    warn!("Reconcile pass deferred: {:#}", e);
                }
            }
        });

        let server = self.health_server.clone();
        tokio::spawn(async move {
            if let Err(e) = server.start().await {
                error!("Health server failed: {:#}", e);
            }
        });

        info!(
            "Service started: {} hubs configured, reconciling streams every {:?}",
            self.config.hubs.len(),
            self.config.poll_interval()
        );
    }

    /// Stop background tasks
    pub fn stop(&self) {
        if !self.is_running.swap(false, Ordering::SeqCst) {
            return;
        }
        self.reconcile_task.stop();
        self.window.stop();
        self.health_server.stop();
        info!("Service stopped");
    }

    /// Whether `start` has been called without a matching `stop`
    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::SeqCst)
    }

    /// Single entry point for inbound chat messages
    ///
    /// Webhook-authored messages carry lifecycle payloads and are routed to
    /// the lifecycle handler; bot chatter is ignored; everything else goes
    /// through the command router.
    pub async fn handle_message(&self, msg: InboundMessage) -> Result<()> {
        if msg.from_webhook {
            self.metrics.service().record_inbound("webhook");
            match parse_match_webhook(&msg.content) {
                Ok(event) => {
                    let outcome = self.lifecycle.lock().await.handle_event(event).await;
                    debug!("Lifecycle event handled: {:?}", outcome);
                }
                Err(e) => {
                    self.metrics.service().malformed_payloads_total.inc();
                    warn!("Dropping malformed webhook payload: {}", e);
                }
            }
            return Ok(());
        }

        if msg.author_is_bot {
            return Ok(());
        }

        self.metrics.service().record_inbound("chat");
        self.router.dispatch(&msg).await
    }

    /// Snapshot of service statistics for health checks
    pub async fn stats(&self) -> ServiceStats {
        let active_sessions = self.lifecycle.lock().await.active_sessions();
        let displayed_streams = self.reconciler.lock().await.displayed_count();
        let uptime_seconds = self.started_at.elapsed().as_secs();
        self.metrics
            .service()
            .uptime_seconds
            .set(uptime_seconds as i64);

        ServiceStats {
            active_sessions,
            displayed_streams,
            reconciler_running: self.reconcile_task.is_running(),
            window_running: self.window.is_running(),
            uptime_seconds,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn metrics(&self) -> Arc<MetricsCollector> {
        self.metrics.clone()
    }

    pub fn health_server(&self) -> Arc<HealthServer> {
        self.health_server.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::RecordingGateway;
    use crate::config::hubs::HubConfig;
    use crate::identity::StaticIdentityLookup;
    use crate::types::{MessageId, UserId};
    use crate::upstream::MockMatchApi;

    fn test_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.hubs = vec![HubConfig {
            name: "NACCS Power Pugs".to_string(),
            upstream_id: "hub-upstream-id".to_string(),
            match_channel: ChannelId(600),
            category: ChannelId(500),
            lobby: ChannelId(501),
        }];
        config.streams.announce_channel = 700;
        config
    }

    fn app_with_gateway() -> (Arc<AppState>, Arc<RecordingGateway>) {
        let gateway = Arc::new(RecordingGateway::new());
        let identity = Arc::new(StaticIdentityLookup::new());
        identity.insert_identity("p1", UserId(1));
        identity.insert_identity("p2", UserId(2));
        let api = Arc::new(MockMatchApi::new());

        let app = AppState::new(test_config(), gateway.clone(), identity, api).unwrap();
        (Arc::new(app), gateway)
    }

    fn webhook_message(body: &str) -> InboundMessage {
        InboundMessage {
            id: MessageId(1),
            channel: ChannelId(800),
            author: UserId(900),
            author_display: "hub-webhook".to_string(),
            author_is_bot: true,
            from_webhook: true,
            author_roles: vec![],
            content: body.to_string(),
        }
    }

    #[tokio::test]
    async fn webhook_messages_drive_the_lifecycle_handler() {
        let (app, gateway) = app_with_gateway();

        let ready = r#"{
            "event": "match_status_ready",
            "match_id": "m1",
            "hub": "NACCS Power Pugs",
            "teams": [{"team_name": "Alpha", "players": ["p1", "p2"]}]
        }"#;
        app.handle_message(webhook_message(ready)).await.unwrap();

        assert_eq!(gateway.live_channels().len(), 1);
        assert_eq!(app.stats().await.active_sessions, 1);

        let finished = r#"{
            "event": "match_status_finished",
            "match_id": "m1",
            "hub": "NACCS Power Pugs"
        }"#;
        app.handle_message(webhook_message(finished)).await.unwrap();

        assert!(gateway.live_channels().is_empty());
        assert_eq!(app.stats().await.active_sessions, 0);
    }

    #[tokio::test]
    async fn malformed_webhook_payloads_are_dropped() {
        let (app, gateway) = app_with_gateway();

        app.handle_message(webhook_message("{\"event\": \"match_status_ready\"}"))
            .await
            .unwrap();
        app.handle_message(webhook_message("not json")).await.unwrap();

        assert!(gateway.live_channels().is_empty());
        assert_eq!(app.stats().await.active_sessions, 0);
    }

    #[tokio::test]
    async fn bot_chatter_is_ignored() {
        let (app, gateway) = app_with_gateway();

        let mut msg = webhook_message(".matches");
        msg.from_webhook = false;
        app.handle_message(msg).await.unwrap();

        assert!(gateway.messages_in(ChannelId(800)).is_empty());
    }

    #[tokio::test]
    async fn start_is_idempotent_and_stop_halts_reconciliation() {
        let (app, _) = app_with_gateway();

        app.start();
        assert!(app.is_running());
        app.start(); // second start is a no-op
        assert!(app.stats().await.reconciler_running);

        app.stop();
        assert!(!app.is_running());
        assert!(!app.stats().await.reconciler_running);
    }
}
