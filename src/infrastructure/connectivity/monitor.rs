use crate::infrastructure::connectivity::probe::ReachabilityProbe;
use crate::shared::config::SyncConfig;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;

/// Single source of truth for "can we reach the backend right now".
///
/// The platform's link signal only reflects link-layer connectivity, so it
/// is combined with periodic active probing of the backend itself. Both
/// inputs funnel through one transition function; subscribers see each
/// false→true / true→false flip exactly once. Starts optimistically online
/// and lets the first probe correct that.
pub struct ConnectivityMonitor {
    probe: Arc<dyn ReachabilityProbe>,
    online: AtomicBool,
    last_online_at: RwLock<Option<DateTime<Utc>>>,
    events: broadcast::Sender<bool>,
    probe_interval: Duration,
    probe_timeout: Duration,
    task: StdMutex<Option<JoinHandle<()>>>,
}

impl ConnectivityMonitor {
    pub fn new(probe: Arc<dyn ReachabilityProbe>, config: &SyncConfig) -> Arc<Self> {
        Self::with_timings(
            probe,
            Duration::from_secs(config.probe_interval_secs),
            Duration::from_secs(config.probe_timeout_secs),
        )
    }

    pub fn with_timings(
        probe: Arc<dyn ReachabilityProbe>,
        probe_interval: Duration,
        probe_timeout: Duration,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(16);
        Arc::new(Self {
            probe,
            online: AtomicBool::new(true),
            last_online_at: RwLock::new(None),
            events,
            probe_interval,
            probe_timeout,
            task: StdMutex::new(None),
        })
    }

    /// Spawns the periodic probe loop. Call once from the composition root.
    pub fn start(self: &Arc<Self>) {
        let monitor = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(monitor.probe_interval);
            loop {
                interval.tick().await;
                monitor.probe_once().await;
            }
        });
        if let Ok(mut slot) = self.task.lock() {
            if let Some(previous) = slot.replace(handle) {
                previous.abort();
            }
        }
    }

    /// Runs one bounded probe and folds the result into the state machine.
    /// A timed-out probe counts as unreachable, never as an error.
    pub async fn probe_once(&self) -> bool {
        let reachable = matches!(
            tokio::time::timeout(self.probe_timeout, self.probe.check()).await,
            Ok(Ok(()))
        );
        self.transition(reachable).await;
        reachable
    }

    /// Feed of the platform's online/offline signal. The link coming up
    /// does not prove the backend is reachable; the next probe corrects
    /// any optimism here.
    pub async fn report_link_state(&self, online: bool) {
        self.transition(online).await;
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    pub async fn last_online_at(&self) -> Option<DateTime<Utc>> {
        *self.last_online_at.read().await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<bool> {
        self.events.subscribe()
    }

    async fn transition(&self, online: bool) {
        if online {
            *self.last_online_at.write().await = Some(Utc::now());
        }
        let previous = self.online.swap(online, Ordering::SeqCst);
        if previous != online {
            tracing::info!(target: "sync::connectivity", online, "connectivity changed");
            let _ = self.events.send(online);
        }
    }

    pub fn dispose(&self) {
        if let Ok(mut slot) = self.task.lock() {
            if let Some(handle) = slot.take() {
                handle.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::error::AppError;
    use async_trait::async_trait;

    struct StaticProbe {
        reachable: AtomicBool,
    }

    impl StaticProbe {
        fn new(reachable: bool) -> Arc<Self> {
            Arc::new(Self {
                reachable: AtomicBool::new(reachable),
            })
        }

        fn set(&self, reachable: bool) {
            self.reachable.store(reachable, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl ReachabilityProbe for StaticProbe {
        async fn check(&self) -> Result<(), AppError> {
            if self.reachable.load(Ordering::SeqCst) {
                Ok(())
            } else {
                Err(AppError::Network("unreachable".to_string()))
            }
        }
    }

    struct StalledProbe;

    #[async_trait]
    impl ReachabilityProbe for StalledProbe {
        async fn check(&self) -> Result<(), AppError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        }
    }

    fn test_monitor(probe: Arc<dyn ReachabilityProbe>) -> Arc<ConnectivityMonitor> {
        ConnectivityMonitor::with_timings(
            probe,
            Duration::from_millis(20),
            Duration::from_millis(50),
        )
    }

    #[tokio::test]
    async fn test_first_failing_probe_corrects_optimistic_start() {
        let probe = StaticProbe::new(false);
        let monitor = test_monitor(probe);

        assert!(monitor.is_online());
        monitor.probe_once().await;
        assert!(!monitor.is_online());
    }

    #[tokio::test]
    async fn test_transitions_broadcast_exactly_once() {
        let probe = StaticProbe::new(false);
        let monitor = test_monitor(Arc::clone(&probe) as Arc<dyn ReachabilityProbe>);
        let mut rx = monitor.subscribe();

        monitor.probe_once().await;
        monitor.probe_once().await; // same result, no second event
        probe.set(true);
        monitor.probe_once().await;

        assert_eq!(rx.recv().await.unwrap(), false);
        assert_eq!(rx.recv().await.unwrap(), true);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_stalled_probe_times_out_as_offline() {
        let monitor = test_monitor(Arc::new(StalledProbe));

        let reachable = monitor.probe_once().await;
        assert!(!reachable);
        assert!(!monitor.is_online());
    }

    #[tokio::test]
    async fn test_link_state_report_drives_transitions() {
        let probe = StaticProbe::new(true);
        let monitor = test_monitor(probe);
        let mut rx = monitor.subscribe();

        monitor.report_link_state(false).await;
        assert!(!monitor.is_online());
        monitor.report_link_state(true).await;
        assert!(monitor.is_online());
        assert!(monitor.last_online_at().await.is_some());

        assert_eq!(rx.recv().await.unwrap(), false);
        assert_eq!(rx.recv().await.unwrap(), true);
    }

    #[tokio::test]
    async fn test_probe_loop_recovers_connectivity() {
        let probe = StaticProbe::new(false);
        let monitor = test_monitor(Arc::clone(&probe) as Arc<dyn ReachabilityProbe>);
        monitor.start();

        let mut rx = monitor.subscribe();
        let offline = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(!offline);

        probe.set(true);
        let online = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(online);

        monitor.dispose();
    }
}
