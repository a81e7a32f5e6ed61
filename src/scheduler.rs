use crate::collector::Collector;
use crate::state::LastRunCache;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{info, warn};

/// Long-lived background loop driving full collection cycles on a fixed
/// interval. The stop signal is observed only between cycles: an in-flight
/// cycle always finishes before the loop exits.
pub struct CollectionScheduler {
    collector: Arc<Collector>,
    cache: LastRunCache,
    startup_delay: Duration,
    interval: Duration,
}

/// Handle to a running scheduler. Dropping it closes the stop channel, so
/// the loop exits at its next wait point without being joined; `shutdown`
/// additionally waits for that exit with a bounded join.
pub struct SchedulerHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl CollectionScheduler {
    pub fn new(
        collector: Arc<Collector>,
        cache: LastRunCache,
        startup_delay: Duration,
        interval: Duration,
    ) -> Self {
        Self {
            collector,
            cache,
            startup_delay,
            interval,
        }
    }

    /// Spawn the loop onto a background task. The initial grace delay keeps
    /// collection from contending with process startup; a stop during the
    /// delay skips the first cycle entirely.
    pub fn start(self) -> SchedulerHandle {
        let (stop_tx, mut stop_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            info!(
                "Collection scheduler started (startup delay {:?}, interval {:?})",
                self.startup_delay, self.interval
            );

            tokio::select! {
                _ = sleep(self.startup_delay) => {}
                _ = stop_rx.changed() => {
                    info!("Collection scheduler stopped before first cycle");
                    return;
                }
            }

            loop {
                let result = self.collector.run_all().await;
                info!(
                    "Scheduled collection cycle done: ok={} fail={} added={}",
                    result.sources_ok, result.sources_fail, result.articles_added
                );
                self.cache.publish(result).await;

                tokio::select! {
                    _ = sleep(self.interval) => {}
                    _ = stop_rx.changed() => break,
                }
            }

            info!("Collection scheduler stopped");
        });

        SchedulerHandle { stop: stop_tx, task }
    }
}

impl SchedulerHandle {
    /// Signal the loop to stop and wait for it, bounded by `join_timeout`.
    /// A loop stuck in a long cycle must not block process shutdown; missing
    /// the join is logged and otherwise ignored.
    pub async fn shutdown(self, join_timeout: Duration) {
        let _ = self.stop.send(true);
        match timeout(join_timeout, self.task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Collection loop task ended abnormally: {}", e),
            Err(_) => warn!(
                "Collection loop did not stop within {:?}, abandoning it",
                join_timeout
            ),
        }
    }
}
