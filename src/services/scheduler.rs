//! Update scheduler
//!
//! The scheduler task is the only place updates execute. It reacts to two
//! producers: a fixed-period timer and manual refresh requests sent through an
//! [`UpdateHandle`]. Manual producers acquire the [`UpdatePermit`] before
//! enqueueing, so a refresh issued while an update runs is answered with
//! `Busy` straight away instead of being queued.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::update_service::{
    UpdateGuard, UpdateOutcome, UpdatePermit, UpdateService, UpdateSummary, UpdateTrigger,
};
use crate::errors::{AppError, AppResult};

const REQUEST_QUEUE_SIZE: usize = 8;
/// Upper bound for the tick period so deadline arithmetic cannot overflow
const MAX_TICK_PERIOD: Duration = Duration::from_secs(30 * 365 * 24 * 60 * 60);

/// A manual update waiting for the scheduler, already holding the guard
#[derive(Debug)]
pub struct UpdateRequest {
    pub permit: UpdatePermit,
    pub trigger: UpdateTrigger,
    pub reply: oneshot::Sender<AppResult<UpdateSummary>>,
}

/// Cloneable handle for requesting updates from outside the scheduler
#[derive(Debug, Clone)]
pub struct UpdateHandle {
    tx: mpsc::Sender<UpdateRequest>,
    guard: UpdateGuard,
}

impl UpdateHandle {
    /// Ask for an immediate update and wait for its outcome
    pub async fn request_refresh(&self) -> UpdateOutcome {
        let Some(permit) = self.guard.try_acquire() else {
            info!("Manual refresh rejected, update already in progress");
            return UpdateOutcome::Busy;
        };

        let (reply, response) = oneshot::channel();
        let request = UpdateRequest {
            permit,
            trigger: UpdateTrigger::Manual,
            reply,
        };
        // A failed send drops the request, and with it the permit
        if self.tx.send(request).await.is_err() {
            return UpdateOutcome::Failed(AppError::internal("Update scheduler is not running"));
        }

        match response.await {
            Ok(Ok(summary)) => UpdateOutcome::Completed(summary),
            Ok(Err(e)) => UpdateOutcome::Failed(e),
            Err(_) => UpdateOutcome::Failed(AppError::internal(
                "Update was abandoned before completing",
            )),
        }
    }

    pub fn is_updating(&self) -> bool {
        self.guard.is_updating()
    }
}

pub struct UpdateScheduler {
    service: Arc<UpdateService>,
    requests: mpsc::Receiver<UpdateRequest>,
    interval: Duration,
    run_on_startup: bool,
    cancellation_token: CancellationToken,
}

impl UpdateScheduler {
    pub fn new(
        service: Arc<UpdateService>,
        interval: Duration,
        run_on_startup: bool,
        cancellation_token: CancellationToken,
    ) -> (Self, UpdateHandle) {
        let (tx, requests) = mpsc::channel(REQUEST_QUEUE_SIZE);
        let handle = UpdateHandle {
            tx,
            guard: service.guard().clone(),
        };
        let scheduler = Self {
            service,
            requests,
            interval,
            run_on_startup,
            cancellation_token,
        };
        (scheduler, handle)
    }

    /// Run until the cancellation token fires
    pub async fn run(mut self) {
        info!(
            "Update scheduler started (interval: {}m, run on startup: {})",
            self.interval.as_secs() / 60,
            self.run_on_startup
        );

        if self.run_on_startup {
            self.try_update(UpdateTrigger::Startup).await;
        }

        let period = self.interval.min(MAX_TICK_PERIOD);
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;

                _ = self.cancellation_token.cancelled() => {
                    info!("Update scheduler received cancellation signal, stopping");
                    break;
                }

                _ = ticker.tick() => {
                    debug!("Scheduled update tick");
                    self.try_update(UpdateTrigger::Scheduler).await;
                }

                Some(request) = self.requests.recv() => {
                    debug!("Received {} update request", request.trigger);
                    let result = self.execute(request.permit, request.trigger).await;
                    // The requester may have gone away; the update still counts
                    let _ = request.reply.send(result);
                }
            }
        }
    }

    /// Timer and startup path: skip, never queue, when an update is in flight
    async fn try_update(&self, trigger: UpdateTrigger) {
        match self.service.guard().try_acquire() {
            Some(permit) => {
                // Failures are logged by the service and absorbed here
                let _ = self.execute(permit, trigger).await;
            }
            None => info!("Update already in progress, skipping {} update", trigger),
        }
    }

    /// Run the update on its own task so a panic cannot take the scheduler down
    async fn execute(&self, permit: UpdatePermit, trigger: UpdateTrigger) -> AppResult<UpdateSummary> {
        let service = self.service.clone();
        let mut task = tokio::spawn(async move { service.run(permit, trigger).await });

        tokio::select! {
            joined = &mut task => match joined {
                Ok(result) => result,
                Err(e) if e.is_panic() => {
                    error!("Update task panicked (trigger: {})", trigger);
                    Err(AppError::internal("Update task panicked"))
                }
                Err(e) => Err(AppError::internal(format!("Update task failed: {e}"))),
            },
            _ = self.cancellation_token.cancelled() => {
                task.abort();
                info!("Aborted in-flight {} update for shutdown", trigger);
                Err(AppError::internal("Update cancelled by shutdown"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::errors::FetchResult;
    use crate::models::Channel;
    use crate::services::SnapshotStore;
    use crate::sources::CatalogSource;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;
    use tokio::sync::Notify;

    /// Blocks every fetch until released, counting calls
    struct GatedSource {
        calls: AtomicUsize,
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl CatalogSource for GatedSource {
        async fn fetch(&self) -> FetchResult<Vec<Channel>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.entered.notify_one();
            self.release.notified().await;
            Ok(Vec::new())
        }
    }

    struct PanickingSource;

    #[async_trait]
    impl CatalogSource for PanickingSource {
        async fn fetch(&self) -> FetchResult<Vec<Channel>> {
            panic!("source exploded");
        }
    }

    fn service(dir: &TempDir, source: Arc<dyn CatalogSource>) -> Arc<UpdateService> {
        let mut config = Config::default();
        config.storage.favorites_path = dir.path().join("pluto-favorites");
        config.storage.backup_dir = None;
        Arc::new(UpdateService::new(source, SnapshotStore::new(), &config))
    }

    #[tokio::test]
    async fn test_manual_refresh_while_updating_is_busy() {
        let dir = TempDir::new().unwrap();
        let source = Arc::new(GatedSource {
            calls: AtomicUsize::new(0),
            entered: Notify::new(),
            release: Notify::new(),
        });
        let service = service(&dir, source.clone());
        let token = CancellationToken::new();
        let (scheduler, handle) =
            UpdateScheduler::new(service.clone(), Duration::from_secs(3600), false, token.clone());
        let scheduler_task = tokio::spawn(scheduler.run());

        let first = {
            let handle = handle.clone();
            tokio::spawn(async move { handle.request_refresh().await })
        };
        source.entered.notified().await;
        assert!(handle.is_updating());

        assert!(matches!(handle.request_refresh().await, UpdateOutcome::Busy));

        source.release.notify_one();
        assert!(matches!(first.await.unwrap(), UpdateOutcome::Completed(_)));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert!(!handle.is_updating());

        token.cancel();
        scheduler_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_panicking_update_releases_guard_and_scheduler_survives() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir, Arc::new(PanickingSource));
        let token = CancellationToken::new();
        let (scheduler, handle) =
            UpdateScheduler::new(service.clone(), Duration::from_secs(3600), false, token.clone());
        let scheduler_task = tokio::spawn(scheduler.run());

        assert!(matches!(
            handle.request_refresh().await,
            UpdateOutcome::Failed(AppError::Internal { .. })
        ));
        assert!(!handle.is_updating());

        // Still accepting work after the panic
        assert!(matches!(
            handle.request_refresh().await,
            UpdateOutcome::Failed(AppError::Internal { .. })
        ));

        token.cancel();
        scheduler_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_refresh_after_shutdown_fails_without_holding_guard() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir, Arc::new(PanickingSource));
        let token = CancellationToken::new();
        let (scheduler, handle) =
            UpdateScheduler::new(service, Duration::from_secs(3600), false, token.clone());
        token.cancel();
        scheduler.run().await;

        assert!(matches!(
            handle.request_refresh().await,
            UpdateOutcome::Failed(_)
        ));
        assert!(!handle.is_updating());
    }

    #[tokio::test]
    async fn test_oversized_interval_still_serves_manual_refresh() {
        let dir = TempDir::new().unwrap();
        let source = Arc::new(GatedSource {
            calls: AtomicUsize::new(0),
            entered: Notify::new(),
            release: Notify::new(),
        });
        let service = service(&dir, source.clone());
        let token = CancellationToken::new();
        let (scheduler, handle) =
            UpdateScheduler::new(service, Duration::from_secs(u64::MAX), false, token.clone());
        let scheduler_task = tokio::spawn(scheduler.run());

        source.release.notify_one();
        assert!(matches!(
            handle.request_refresh().await,
            UpdateOutcome::Completed(_)
        ));

        token.cancel();
        scheduler_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_timer_triggers_updates() {
        let dir = TempDir::new().unwrap();
        struct CountingSource(AtomicUsize);

        #[async_trait]
        impl CatalogSource for CountingSource {
            async fn fetch(&self) -> FetchResult<Vec<Channel>> {
                self.0.fetch_add(1, Ordering::SeqCst);
                Ok(Vec::new())
            }
        }

        let source = Arc::new(CountingSource(AtomicUsize::new(0)));
        let service = service(&dir, source.clone());
        let token = CancellationToken::new();
        let (scheduler, _handle) =
            UpdateScheduler::new(service, Duration::from_millis(50), true, token.clone());
        let scheduler_task = tokio::spawn(scheduler.run());

        // Startup run plus at least two ticks
        let waited = tokio::time::timeout(Duration::from_secs(5), async {
            while source.0.load(Ordering::SeqCst) < 3 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;
        token.cancel();
        scheduler_task.await.unwrap();

        assert!(waited.is_ok(), "timer did not trigger updates");
    }
}
