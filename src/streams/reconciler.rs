//! Stream reconciliation pass logic

use crate::chat::ChatGateway;
use crate::metrics::MetricsCollector;
use crate::types::{ChannelId, LiveStream, MessageId};
use crate::upstream::MatchApi;
use crate::utils::current_timestamp;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// One stream currently shown in the announcement channel
///
/// Keyed by streamer nickname, not by stream session: a streamer restarting
/// between passes keeps the same entry and message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayedStream {
    pub message: MessageId,
    pub viewer_count: u64,
    pub first_seen: DateTime<Utc>,
}

/// What one reconciliation pass did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassSummary {
    /// Valid live streams observed this pass
    pub live: usize,
    /// New announcements posted
    pub created: usize,
    /// Existing announcements edited in place
    pub updated: usize,
    /// Stale entries removed (announcement deletion attempted exactly once)
    pub removed: usize,
    /// Upstream entries skipped for missing required fields
    pub malformed: usize,
}

/// Periodically diffs live streams against posted announcements
///
/// Exclusively owns the displayed-stream map; the only caller is the
/// periodic task driving `run_pass`.
pub struct StreamReconciler {
    api: Arc<dyn MatchApi>,
    gateway: Arc<dyn ChatGateway>,
    organizer_id: String,
    announce_channel: ChannelId,
    metrics: Arc<MetricsCollector>,
    displayed: HashMap<String, DisplayedStream>,
}

impl StreamReconciler {
    pub fn new(
        api: Arc<dyn MatchApi>,
        gateway: Arc<dyn ChatGateway>,
        organizer_id: String,
        announce_channel: ChannelId,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            api,
            gateway,
            organizer_id,
            announce_channel,
            metrics,
            displayed: HashMap::new(),
        }
    }

    /// Number of announcements currently tracked
    pub fn displayed_count(&self) -> usize {
        self.displayed.len()
    }

    /// Tracked nicknames, sorted for stable assertions
    pub fn displayed_nicknames(&self) -> Vec<String> {
        let mut nicknames: Vec<String> = self.displayed.keys().cloned().collect();
        nicknames.sort();
        nicknames
    }

    /// Run one reconciliation pass
    ///
    /// An upstream failure returns `UpstreamUnavailable` without touching any
    /// state; the caller simply defers to the next tick.
    pub async fn run_pass(&mut self) -> crate::error::Result<PassSummary> {
        let pass_id = Uuid::new_v4();
        debug!("Reconcile pass {} starting", pass_id);

        let entries = match self.api.fetch_live_streams(&self.organizer_id).await {
            Ok(entries) => entries,
            Err(e) => {
                self.metrics.streams().record_pass("deferred");
                warn!(
                    "Reconcile pass {} deferred, stream listing unavailable: {:#}",
                    pass_id, e
                );
                return Err(e);
            }
        };

        let mut summary = PassSummary::default();
        let mut live: HashMap<String, LiveStream> = HashMap::new();
        for entry in entries {
            match entry.validate() {
                Some(stream) => {
                    live.insert(stream.nickname.clone(), stream);
                }
                None => {
                    summary.malformed += 1;
                }
            }
        }
        if summary.malformed > 0 {
            warn!(
                "Reconcile pass {}: skipped {} malformed stream entries",
                pass_id, summary.malformed
            );
        }
        summary.live = live.len();

        // Create or refresh an announcement per live nickname
        for (nickname, stream) in &live {
            let content = render_announcement(stream);
            match self.displayed.get_mut(nickname) {
                Some(entry) => {
                    match self
                        .gateway
                        .edit_message(self.announce_channel, entry.message, &content)
                        .await
                    {
                        Ok(()) => {
                            entry.viewer_count = stream.viewer_count;
                            summary.updated += 1;
                        }
                        Err(e) => {
                            warn!("Failed to refresh announcement for {}: {:#}", nickname, e);
                        }
                    }
                }
                None => match self.gateway.send_message(self.announce_channel, &content).await {
                    Ok(message) => {
                        self.displayed.insert(
                            nickname.clone(),
                            DisplayedStream {
                                message,
                                viewer_count: stream.viewer_count,
                                first_seen: current_timestamp(),
                            },
                        );
                        summary.created += 1;
                    }
                    Err(e) => {
                        warn!(
                            "Failed to announce {}; will retry next pass: {:#}",
                            nickname, e
                        );
                    }
                },
            }
        }

        // Drop announcements for streamers no longer live. The entry is
        // removed whether or not the delete succeeds: deletion is attempted
        // exactly once.
        let stale: Vec<String> = self
            .displayed
            .keys()
            .filter(|nickname| !live.contains_key(*nickname))
            .cloned()
            .collect();
        for nickname in stale {
            if let Some(entry) = self.displayed.remove(&nickname) {
                summary.removed += 1;
                if let Err(e) = self
                    .gateway
                    .delete_message(self.announce_channel, entry.message)
                    .await
                {
                    warn!("Failed to delete announcement for {}: {:#}", nickname, e);
                }
            }
        }

        self.metrics.streams().record_pass("ok");
        self.metrics
            .streams()
            .record_summary(&summary, self.displayed.len());

        info!(
            "Reconcile pass {}: {} live, {} created, {} updated, {} removed, {} malformed",
            pass_id, summary.live, summary.created, summary.updated, summary.removed,
            summary.malformed
        );
        Ok(summary)
    }
}

/// Render the announcement body for a live stream
fn render_announcement(stream: &LiveStream) -> String {
    match &stream.channel_url {
        Some(url) => format!(
            "📺 {} is live — {} ({} viewers)\n{}",
            stream.nickname, stream.title, stream.viewer_count, url
        ),
        None => format!(
            "📺 {} is live — {} ({} viewers)",
            stream.nickname, stream.title, stream.viewer_count
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::RecordingGateway;
    use crate::upstream::{LiveStreamEntry, MockMatchApi};

    const ANNOUNCE: ChannelId = ChannelId(700);

    fn entry(nickname: &str, viewers: u64) -> LiveStreamEntry {
        LiveStreamEntry {
            nickname: Some(nickname.to_string()),
            title: Some(format!("{} plays pugs", nickname)),
            viewers: Some(viewers),
            channel_url: Some(format!("https://streams.example/{}", nickname)),
        }
    }

    fn reconciler(
        api: Arc<MockMatchApi>,
        gateway: Arc<RecordingGateway>,
    ) -> StreamReconciler {
        StreamReconciler::new(
            api,
            gateway,
            "org-1".to_string(),
            ANNOUNCE,
            Arc::new(MetricsCollector::new().unwrap()),
        )
    }

    #[tokio::test]
    async fn first_pass_announces_each_live_stream() {
        let api = Arc::new(MockMatchApi::new());
        let gateway = Arc::new(RecordingGateway::new());
        api.set_streams(vec![entry("A", 10), entry("B", 20)]);

        let mut reconciler = reconciler(api, gateway.clone());
        let summary = reconciler.run_pass().await.unwrap();

        assert_eq!(summary.live, 2);
        assert_eq!(summary.created, 2);
        assert_eq!(summary.updated, 0);
        assert_eq!(reconciler.displayed_nicknames(), vec!["A", "B"]);
        assert_eq!(gateway.messages_in(ANNOUNCE).len(), 2);
    }

    #[tokio::test]
    async fn unchanged_stream_list_is_idempotent() {
        let api = Arc::new(MockMatchApi::new());
        let gateway = Arc::new(RecordingGateway::new());
        api.set_streams(vec![entry("A", 10), entry("B", 20)]);

        let mut reconciler = reconciler(api, gateway.clone());
        reconciler.run_pass().await.unwrap();
        let handles_after_first: Vec<MessageId> = gateway
            .messages_in(ANNOUNCE)
            .iter()
            .map(|(id, _)| *id)
            .collect();

        let summary = reconciler.run_pass().await.unwrap();
        assert_eq!(summary.created, 0);
        assert_eq!(summary.updated, 2);
        assert_eq!(summary.removed, 0);

        let handles_after_second: Vec<MessageId> = gateway
            .messages_in(ANNOUNCE)
            .iter()
            .map(|(id, _)| *id)
            .collect();
        assert_eq!(handles_after_first, handles_after_second);
        assert!(gateway.deleted_messages().is_empty());
    }

    #[tokio::test]
    async fn departed_streamer_is_cleaned_up_and_survivor_updated_in_place() {
        let api = Arc::new(MockMatchApi::new());
        let gateway = Arc::new(RecordingGateway::new());
        api.set_streams(vec![entry("A", 10), entry("B", 20)]);

        let mut reconciler = reconciler(api.clone(), gateway.clone());
        reconciler.run_pass().await.unwrap();
        let before: Vec<(MessageId, String)> = gateway.messages_in(ANNOUNCE);
        let b_handle = before
            .iter()
            .find(|(_, content)| content.contains("B is live"))
            .map(|(id, _)| *id)
            .unwrap();

        api.set_streams(vec![entry("B", 35)]);
        let summary = reconciler.run_pass().await.unwrap();

        assert_eq!(summary.removed, 1);
        assert_eq!(summary.updated, 1);
        assert_eq!(reconciler.displayed_nicknames(), vec!["B"]);
        assert_eq!(gateway.deleted_messages().len(), 1);

        let after = gateway.messages_in(ANNOUNCE);
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].0, b_handle);
        assert!(after[0].1.contains("35 viewers"));
    }

    #[tokio::test]
    async fn malformed_entries_are_counted_and_skipped() {
        let api = Arc::new(MockMatchApi::new());
        let gateway = Arc::new(RecordingGateway::new());
        api.set_streams(vec![
            entry("A", 10),
            LiveStreamEntry {
                nickname: Some("broken".to_string()),
                title: None,
                viewers: Some(5),
                channel_url: None,
            },
        ]);

        let mut reconciler = reconciler(api, gateway.clone());
        let summary = reconciler.run_pass().await.unwrap();

        assert_eq!(summary.live, 1);
        assert_eq!(summary.malformed, 1);
        assert_eq!(reconciler.displayed_nicknames(), vec!["A"]);
    }

    #[tokio::test]
    async fn upstream_outage_defers_the_pass_without_touching_state() {
        let api = Arc::new(MockMatchApi::new());
        let gateway = Arc::new(RecordingGateway::new());
        api.set_streams(vec![entry("A", 10)]);

        let mut reconciler = reconciler(api.clone(), gateway.clone());
        reconciler.run_pass().await.unwrap();

        api.set_unavailable(true);
        assert!(reconciler.run_pass().await.is_err());
        assert_eq!(reconciler.displayed_nicknames(), vec!["A"]);
        assert!(gateway.deleted_messages().is_empty());

        api.set_unavailable(false);
        let summary = reconciler.run_pass().await.unwrap();
        assert_eq!(summary.updated, 1);
    }

    #[tokio::test]
    async fn failed_announcement_creation_is_retried_next_pass() {
        let api = Arc::new(MockMatchApi::new());
        let gateway = Arc::new(RecordingGateway::new());
        api.set_streams(vec![entry("A", 10)]);
        gateway.fail_sends(true);

        let mut reconciler = reconciler(api, gateway.clone());
        let summary = reconciler.run_pass().await.unwrap();
        assert_eq!(summary.created, 0);
        assert_eq!(reconciler.displayed_count(), 0);

        gateway.fail_sends(false);
        let summary = reconciler.run_pass().await.unwrap();
        assert_eq!(summary.created, 1);
        assert_eq!(reconciler.displayed_nicknames(), vec!["A"]);
    }

    #[tokio::test]
    async fn restarting_streamer_keeps_the_same_entry() {
        let api = Arc::new(MockMatchApi::new());
        let gateway = Arc::new(RecordingGateway::new());
        api.set_streams(vec![entry("A", 10)]);

        let mut reconciler = reconciler(api.clone(), gateway.clone());
        reconciler.run_pass().await.unwrap();
        let handle = gateway.messages_in(ANNOUNCE)[0].0;

        // Same nickname, fresh stream session with a new title
        api.set_streams(vec![LiveStreamEntry {
            nickname: Some("A".to_string()),
            title: Some("round two".to_string()),
            viewers: Some(3),
            channel_url: None,
        }]);
        let summary = reconciler.run_pass().await.unwrap();

        assert_eq!(summary.created, 0);
        assert_eq!(summary.updated, 1);
        assert_eq!(gateway.messages_in(ANNOUNCE)[0].0, handle);
    }
}
