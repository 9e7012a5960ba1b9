use std::{sync::Arc, time::Duration};

use chrono::Utc;
use tokio::{select, sync::Mutex, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{
    DEFAULT_SWEEP_PERIOD,
    workflow::lifecycle::{SweepSummary, process_expired::ProcessExpiredMatchesUseCase},
};

/// Periodically sweeps expired matches. Sweeps never overlap: the timer loop
/// awaits each sweep, and `run_once` callers queue behind the same lock.
pub struct MatchLifecycleRunner<P: ProcessExpiredMatchesUseCase> {
    use_case: Arc<P>,
    period: Duration,
    sweep_lock: Mutex<()>,
}

impl<P: ProcessExpiredMatchesUseCase + Send + Sync + 'static> MatchLifecycleRunner<P> {
    /// A zero `period` falls back to [`DEFAULT_SWEEP_PERIOD`].
    pub fn new(use_case: Arc<P>, period: Duration) -> Self {
        let period = if period.is_zero() {
            log::warn!(
                "Zero match sweep period, using {:?} instead",
                DEFAULT_SWEEP_PERIOD
            );
            DEFAULT_SWEEP_PERIOD
        } else {
            period
        };
        Self {
            use_case,
            period,
            sweep_lock: Mutex::new(()),
        }
    }

    pub async fn run_once(&self) -> Option<SweepSummary> {
        let _guard = self.sweep_lock.lock().await;
        match self.use_case.process_expired_matches(Utc::now()).await {
            Ok(summary) => {
                log::debug!("Match lifecycle sweep finished: {:?}", summary);
                Some(summary)
            }
            Err(e) => {
                log::error!(
                    "Match lifecycle sweep aborted, retrying in {:?}: {}",
                    self.period,
                    e
                );
                None
            }
        }
    }

    pub async fn run(&self, token: CancellationToken) {
        log::info!(
            "Starting match lifecycle runner with a period of {:?}",
            self.period
        );
        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            select! {
                _ = token.cancelled() => break,
                _ = interval.tick() => {}
            }
            select! {
                _ = token.cancelled() => {
                    log::warn!("Match lifecycle sweep interrupted by shutdown");
                    break;
                }
                _ = self.run_once() => {}
            }
        }
        log::info!("Match lifecycle runner stopped");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::{DateTime, Utc};

    use chrono::Duration as ChronoDuration;

    use crate::{
        adapters::in_memory::{FaultPlan, InMemoryLifecycleStore},
        domain::{
            MatchId, RepoError,
            r#match::{Match, MatchStatus},
        },
        ports::sweep_observer::RecordingSweepObserver,
        workflow::lifecycle::{SweepError, process_expired::ProcessExpiredMatchesUseCaseImpl},
    };

    use super::*;

    #[derive(Default)]
    struct CountingUseCase {
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        sweep_duration: Duration,
        fail: bool,
    }

    #[async_trait::async_trait]
    impl ProcessExpiredMatchesUseCase for CountingUseCase {
        async fn process_expired_matches(
            &self,
            _now: DateTime<Utc>,
        ) -> Result<SweepSummary, SweepError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(in_flight, Ordering::SeqCst);
            tokio::time::sleep(self.sweep_duration).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            if self.fail {
                return Err(SweepError::StoreUnavailable(RepoError::StorageError(
                    "down".to_string(),
                )));
            }
            Ok(SweepSummary::default())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_every_period_until_cancelled() {
        let use_case = Arc::new(CountingUseCase::default());
        let runner = Arc::new(MatchLifecycleRunner::new(
            use_case.clone(),
            Duration::from_secs(300),
        ));
        let token = CancellationToken::new();

        let handle = tokio::spawn({
            let runner = runner.clone();
            let token = token.clone();
            async move { runner.run(token).await }
        });

        tokio::time::sleep(Duration::from_secs(601)).await;
        assert_eq!(use_case.calls.load(Ordering::SeqCst), 3);

        token.cancel();
        handle.await.unwrap();

        tokio::time::sleep(Duration::from_secs(900)).await;
        assert_eq!(use_case.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeps_never_overlap() {
        let use_case = Arc::new(CountingUseCase {
            sweep_duration: Duration::from_secs(10),
            ..CountingUseCase::default()
        });
        let runner = MatchLifecycleRunner::new(use_case.clone(), Duration::from_secs(300));

        futures::join!(runner.run_once(), runner.run_once(), runner.run_once());

        assert_eq!(use_case.calls.load(Ordering::SeqCst), 3);
        assert_eq!(use_case.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_sweep_is_retried_next_period() {
        let use_case = Arc::new(CountingUseCase {
            fail: true,
            ..CountingUseCase::default()
        });
        let runner = Arc::new(MatchLifecycleRunner::new(
            use_case.clone(),
            Duration::from_secs(60),
        ));
        let token = CancellationToken::new();

        assert_eq!(runner.run_once().await, None);

        let handle = tokio::spawn({
            let runner = runner.clone();
            let token = token.clone();
            async move { runner.run(token).await }
        });
        tokio::time::sleep(Duration::from_secs(130)).await;
        token.cancel();
        handle.await.unwrap();

        assert_eq!(use_case.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_period_falls_back_to_default() {
        let use_case = Arc::new(CountingUseCase::default());
        let runner = Arc::new(MatchLifecycleRunner::new(use_case.clone(), Duration::ZERO));
        let token = CancellationToken::new();

        let handle = tokio::spawn({
            let runner = runner.clone();
            let token = token.clone();
            async move { runner.run(token).await }
        });

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(use_case.calls.load(Ordering::SeqCst), 1);
        tokio::time::sleep(DEFAULT_SWEEP_PERIOD).await;
        assert_eq!(use_case.calls.load(Ordering::SeqCst), 2);

        token.cancel();
        assert!(handle.await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_mid_sweep_commits_nothing() {
        let store = Arc::new(InMemoryLifecycleStore::new());
        store.insert_match(Match {
            id: MatchId(1),
            status: MatchStatus::Pending,
            scheduled_at: Some(Utc::now() - ChronoDuration::minutes(5)),
            required_players: 10,
        });
        store.set_faults(FaultPlan {
            commit_delay: Some(Duration::from_secs(30)),
            ..FaultPlan::default()
        });
        let use_case = Arc::new(ProcessExpiredMatchesUseCaseImpl::new(
            store.clone(),
            Arc::new(RecordingSweepObserver::default()),
        ));
        let runner = Arc::new(MatchLifecycleRunner::new(use_case, Duration::from_secs(300)));
        let token = CancellationToken::new();

        let handle = tokio::spawn({
            let runner = runner.clone();
            let token = token.clone();
            async move { runner.run(token).await }
        });

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(store.issued_writes().len(), 1);

        token.cancel();
        handle.await.unwrap();
        tokio::time::sleep(Duration::from_secs(60)).await;

        assert_eq!(
            store.get_match(MatchId(1)).unwrap().status,
            MatchStatus::Pending
        );
    }
}
