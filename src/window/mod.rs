//! Recurring queue window schedule
//!
//! Operators can put a hub's queue on a recurring open/close cadence with
//! `autowindowon`/`autowindowoff`. The schedule itself is real (a periodic
//! task alternating between open and close); the open/close side effects sit
//! behind `WindowActions`, whose default implementation only records intent
//! because the upstream API exposes no programmatic queue toggle.

use crate::config::hubs::HubConfig;
use crate::error::Result;
use crate::tasks::PeriodicTask;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{info, warn};

/// Side effects of opening and closing a hub's queue window
#[async_trait]
pub trait WindowActions: Send + Sync {
    async fn open_window(&self, hub: &HubConfig) -> Result<()>;

    async fn close_window(&self, hub: &HubConfig) -> Result<()>;
}

/// Default `WindowActions` that logs the toggle and does nothing else
pub struct LoggedWindowActions;

#[async_trait]
impl WindowActions for LoggedWindowActions {
    async fn open_window(&self, hub: &HubConfig) -> Result<()> {
        info!("Queue window open for hub {}", hub.name);
        Ok(())
    }

    async fn close_window(&self, hub: &HubConfig) -> Result<()> {
        info!("Queue window closed for hub {}", hub.name);
        Ok(())
    }
}

/// Recording `WindowActions` for tests
#[derive(Default)]
pub struct RecordingWindowActions {
    toggles: Mutex<Vec<String>>,
}

impl RecordingWindowActions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggles(&self) -> Vec<String> {
        self.toggles.lock().unwrap().clone()
    }
}

#[async_trait]
impl WindowActions for RecordingWindowActions {
    async fn open_window(&self, hub: &HubConfig) -> Result<()> {
        self.toggles
            .lock()
            .unwrap()
            .push(format!("open:{}", hub.name));
        Ok(())
    }

    async fn close_window(&self, hub: &HubConfig) -> Result<()> {
        self.toggles
            .lock()
            .unwrap()
            .push(format!("close:{}", hub.name));
        Ok(())
    }
}

/// Alternating open/close schedule for one hub's queue
pub struct WindowScheduler {
    task: PeriodicTask,
    actions: Arc<dyn WindowActions>,
    hub: HubConfig,
}

impl WindowScheduler {
    pub fn new(hub: HubConfig, interval: Duration, actions: Arc<dyn WindowActions>) -> Self {
        let task = PeriodicTask::new(format!("queue-window-{}", hub.name), interval);
        Self { task, actions, hub }
    }

    /// Begin the schedule; the first tick opens the window
    ///
    /// Returns false if the schedule is already running.
    pub fn start(&self) -> bool {
        let actions = self.actions.clone();
        let hub = self.hub.clone();
        let open = Arc::new(AtomicBool::new(false));

        self.task.start(move || {
            let actions = actions.clone();
            let hub = hub.clone();
            let open = open.clone();
            async move {
                let opening = !open.load(Ordering::SeqCst);
                let result = if opening {
                    actions.open_window(&hub).await
                } else {
                    actions.close_window(&hub).await
                };
                match result {
                    Ok(()) => open.store(opening, Ordering::SeqCst),
                    Err(e) => warn!(
                        "Queue window toggle failed for hub {}, staying {}: {:#}",
                        hub.name,
                        if opening { "closed" } else { "open" },
                        e
                    ),
                }
            }
        })
    }

    /// Stop the schedule
    pub fn stop(&self) -> bool {
        self.task.stop()
    }

    pub fn is_running(&self) -> bool {
        self.task.is_running()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    fn scheduler(actions: Arc<RecordingWindowActions>) -> WindowScheduler {
        WindowScheduler::new(
            HubConfig::power_pugs(),
            Duration::from_millis(10),
            actions,
        )
    }

    #[tokio::test]
    async fn alternates_open_and_close() {
        let actions = Arc::new(RecordingWindowActions::new());
        let scheduler = scheduler(actions.clone());

        assert!(scheduler.start());
        sleep(Duration::from_millis(45)).await;
        scheduler.stop();

        let toggles = actions.toggles();
        assert!(toggles.len() >= 2);
        assert_eq!(toggles[0], "open:NACCS Power Pugs");
        assert_eq!(toggles[1], "close:NACCS Power Pugs");
        for pair in toggles.windows(2) {
            assert_ne!(pair[0], pair[1]);
        }
    }

    #[tokio::test]
    async fn start_is_idempotent() {
        let actions = Arc::new(RecordingWindowActions::new());
        let scheduler = scheduler(actions);

        assert!(scheduler.start());
        assert!(!scheduler.start());
        assert!(scheduler.is_running());
        assert!(scheduler.stop());
        assert!(!scheduler.is_running());
    }
}
