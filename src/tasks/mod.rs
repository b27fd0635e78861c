//! Cancellable periodic tasks
//!
//! Background loops (stream reconciliation, the queue window schedule) run
//! as explicit task objects with `start`/`stop`/`is_running` instead of bare
//! spawned loops. Start is idempotent: a second start while running is
//! refused, so two concurrent timers can never exist for one task. Stop
//! signals through a watch channel and lets an in-flight tick finish; no
//! further ticks fire afterwards.

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

struct RunningTask {
    stop: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// A named, fixed-period background task
pub struct PeriodicTask {
    name: String,
    period: Duration,
    inner: Mutex<Option<RunningTask>>,
}

impl PeriodicTask {
    pub fn new(name: impl Into<String>, period: Duration) -> Self {
        Self {
            name: name.into(),
            period,
            inner: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_running(&self) -> bool {
        self.inner
            .lock()
            .unwrap()
            .as_ref()
            .map_or(false, |task| !task.handle.is_finished())
    }

    /// Start ticking; the first tick fires immediately
    ///
    /// Returns false without spawning anything if the task is already
    /// running.
    pub fn start<F, Fut>(&self, mut tick: F) -> bool
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let mut inner = self.inner.lock().unwrap();
        if let Some(task) = inner.as_ref() {
            if !task.handle.is_finished() {
                warn!("Periodic task {} already running, ignoring start", self.name);
                return false;
            }
        }

        let (stop_tx, mut stop_rx) = watch::channel(false);
        let name = self.name.clone();
        let period = self.period;
        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => tick().await,
                    result = stop_rx.changed() => {
                        if result.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            debug!("Periodic task {} stopped", name);
        });

        *inner = Some(RunningTask {
            stop: stop_tx,
            handle,
        });
        info!(
            "Started periodic task {} with period {:?}",
            self.name, self.period
        );
        true
    }

    /// Signal the task to stop after any in-flight tick
    ///
    /// Returns false if the task was not running.
    pub fn stop(&self) -> bool {
        let mut inner = self.inner.lock().unwrap();
        match inner.take() {
            Some(task) => {
                let was_running = !task.handle.is_finished();
                let _ = task.stop.send(true);
                if was_running {
                    info!("Stop signal sent to periodic task {}", self.name);
                }
                was_running
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::time::sleep;

    fn counting_task(period_ms: u64) -> (PeriodicTask, Arc<AtomicUsize>) {
        let task = PeriodicTask::new("test-task", Duration::from_millis(period_ms));
        let counter = Arc::new(AtomicUsize::new(0));
        (task, counter)
    }

    fn start_counting(task: &PeriodicTask, counter: Arc<AtomicUsize>) -> bool {
        task.start(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        })
    }

    #[tokio::test]
    async fn ticks_until_stopped() {
        let (task, counter) = counting_task(10);
        assert!(start_counting(&task, counter.clone()));
        assert!(task.is_running());

        sleep(Duration::from_millis(60)).await;
        assert!(counter.load(Ordering::SeqCst) >= 2);

        assert!(task.stop());
        sleep(Duration::from_millis(30)).await;
        let frozen = counter.load(Ordering::SeqCst);
        sleep(Duration::from_millis(50)).await;
        assert_eq!(counter.load(Ordering::SeqCst), frozen);
        assert!(!task.is_running());
    }

    #[tokio::test]
    async fn double_start_is_refused() {
        let (task, counter) = counting_task(10);
        assert!(start_counting(&task, counter.clone()));
        assert!(!start_counting(&task, counter.clone()));
        task.stop();
    }

    #[tokio::test]
    async fn stop_without_start_is_a_noop() {
        let (task, _) = counting_task(10);
        assert!(!task.stop());
        assert!(!task.is_running());
    }

    #[tokio::test]
    async fn restart_after_stop_is_allowed() {
        let (task, counter) = counting_task(10);
        assert!(start_counting(&task, counter.clone()));
        assert!(task.stop());
        sleep(Duration::from_millis(20)).await;

        assert!(start_counting(&task, counter.clone()));
        assert!(task.is_running());
        task.stop();
    }
}
