//! HTTP client for the upstream Data API

use crate::config::hubs::HubConfig;
use crate::config::UpstreamSettings;
use crate::error::{BridgeError, Result};
use crate::upstream::models::{LiveStreamEntry, OngoingMatch, Paged, QueueEntry};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::sync::Mutex;
use tracing::{debug, warn};

/// Trait for fetching match, queue and stream state from the upstream API
///
/// Implementations map any non-2xx response or transport error to
/// `BridgeError::UpstreamUnavailable`. Callers surface that as "try again
/// later" and defer to the next poll; retrying here is deliberately not done.
#[async_trait]
pub trait MatchApi: Send + Sync {
    /// List ongoing matches for a hub
    async fn fetch_ongoing_matches(&self, hub: &HubConfig) -> Result<Vec<OngoingMatch>>;

    /// Report how many players are waiting in a hub's queues
    async fn fetch_queue_size(&self, hub: &HubConfig) -> Result<u64>;

    /// List currently live streams for an organizer
    async fn fetch_live_streams(&self, organizer_id: &str) -> Result<Vec<LiveStreamEntry>>;
}

/// Reqwest-backed implementation of `MatchApi`
pub struct HttpMatchApi {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpMatchApi {
    /// Create a new client from upstream settings
    ///
    /// The per-request timeout is a defensive bound; the upstream contract
    /// itself specifies none.
    pub fn new(settings: &UpstreamSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(
                settings.request_timeout_seconds,
            ))
            .build()
            .map_err(|e| BridgeError::InternalError {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
        })
    }

    /// Issue a GET request and decode the JSON response
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let url = format!("{}/{}", self.base_url, path);
        debug!("Upstream GET {}", url);

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.api_key)
            .query(query)
            .send()
            .await
            .map_err(|e| BridgeError::UpstreamUnavailable {
                reason: format!("Transport error for {}: {}", path, e),
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!("Upstream returned {} for {}", status, path);
            return Err(BridgeError::UpstreamUnavailable {
                reason: format!("Status {} from {}", status, path),
            }
            .into());
        }

        response
            .json::<T>()
            .await
            .map_err(|e| {
                BridgeError::UpstreamUnavailable {
                    reason: format!("Unexpected response body from {}: {}", path, e),
                }
                .into()
            })
    }
}

#[async_trait]
impl MatchApi for HttpMatchApi {
    async fn fetch_ongoing_matches(&self, hub: &HubConfig) -> Result<Vec<OngoingMatch>> {
        let path = format!("hubs/{}/matches", hub.upstream_id);
        let page: Paged<OngoingMatch> = self.get_json(&path, &[("type", "ongoing")]).await?;
        debug!(
            "Fetched {} ongoing matches for hub {}",
            page.items.len(),
            hub.name
        );
        Ok(page.items)
    }

    async fn fetch_queue_size(&self, hub: &HubConfig) -> Result<u64> {
        let path = format!("hubs/{}/queues", hub.upstream_id);
        let page: Paged<QueueEntry> = self.get_json(&path, &[]).await?;
        Ok(page.items.iter().map(|queue| queue.size).sum())
    }

    async fn fetch_live_streams(&self, organizer_id: &str) -> Result<Vec<LiveStreamEntry>> {
        let path = format!("organizers/{}/streams", organizer_id);
        let page: Paged<LiveStreamEntry> = self.get_json(&path, &[]).await?;
        Ok(page.items)
    }
}

/// Canned-response implementation of `MatchApi` for testing
#[derive(Default)]
pub struct MockMatchApi {
    matches: Mutex<Vec<OngoingMatch>>,
    queue_size: Mutex<u64>,
    streams: Mutex<Vec<LiveStreamEntry>>,
    unavailable: Mutex<bool>,
}

impl MockMatchApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the canned ongoing-match list
    pub fn set_matches(&self, matches: Vec<OngoingMatch>) {
        *self.matches.lock().unwrap() = matches;
    }

    /// Replace the canned queue size
    pub fn set_queue_size(&self, size: u64) {
        *self.queue_size.lock().unwrap() = size;
    }

    /// Replace the canned stream list
    pub fn set_streams(&self, streams: Vec<LiveStreamEntry>) {
        *self.streams.lock().unwrap() = streams;
    }

    /// Make every call fail with `UpstreamUnavailable` until cleared
    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.lock().unwrap() = unavailable;
    }

    fn check_available(&self) -> Result<()> {
        if *self.unavailable.lock().unwrap() {
            return Err(BridgeError::UpstreamUnavailable {
                reason: "Canned outage".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

#[async_trait]
impl MatchApi for MockMatchApi {
    async fn fetch_ongoing_matches(&self, _hub: &HubConfig) -> Result<Vec<OngoingMatch>> {
        self.check_available()?;
        Ok(self.matches.lock().unwrap().clone())
    }

    async fn fetch_queue_size(&self, _hub: &HubConfig) -> Result<u64> {
        self.check_available()?;
        Ok(*self.queue_size.lock().unwrap())
    }

    async fn fetch_live_streams(&self, _organizer_id: &str) -> Result<Vec<LiveStreamEntry>> {
        self.check_available()?;
        Ok(self.streams.lock().unwrap().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::hubs::HubConfig;

    #[tokio::test]
    async fn mock_api_serves_canned_data() {
        let api = MockMatchApi::new();
        api.set_queue_size(12);

        let hub = HubConfig::power_pugs();
        assert_eq!(api.fetch_queue_size(&hub).await.unwrap(), 12);
        assert!(api.fetch_ongoing_matches(&hub).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn mock_api_outage_maps_to_unavailable() {
        let api = MockMatchApi::new();
        api.set_unavailable(true);

        let hub = HubConfig::general();
        let err = api.fetch_queue_size(&hub).await.unwrap_err();
        assert!(err.to_string().contains("unavailable"));
    }

    #[test]
    fn http_client_builds_from_settings() {
        let settings = UpstreamSettings::default();
        assert!(HttpMatchApi::new(&settings).is_ok());
    }
}
