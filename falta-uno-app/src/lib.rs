use std::{sync::Arc, time::Duration};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{
    ports::{sweep_observer::SweepObserverPort, unit_of_work::UnitOfWorkPort},
    processes::match_lifecycle_runner::MatchLifecycleRunner,
    workflow::lifecycle::process_expired::{
        ProcessExpiredMatchesUseCase, ProcessExpiredMatchesUseCaseImpl,
    },
};

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod processes;
pub mod workflow;

pub const DEFAULT_SWEEP_PERIOD: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("match sweep period must be non-zero")]
pub struct ZeroSweepPeriod;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LifecycleSettings {
    sweep_period: Duration,
}

impl LifecycleSettings {
    pub fn new(sweep_period: Duration) -> Result<Self, ZeroSweepPeriod> {
        if sweep_period.is_zero() {
            return Err(ZeroSweepPeriod);
        }
        Ok(Self { sweep_period })
    }

    pub fn sweep_period(&self) -> Duration {
        self.sweep_period
    }
}

impl Default for LifecycleSettings {
    fn default() -> Self {
        Self {
            sweep_period: DEFAULT_SWEEP_PERIOD,
        }
    }
}

pub struct Application {
    pub jobs: JoinHandle<()>,
    pub shutdown_token: CancellationToken,

    pub process_expired_matches_use_case:
        Arc<dyn ProcessExpiredMatchesUseCase + Send + Sync + 'static>,
}

impl Application {
    /// Stops the background jobs and waits for them to finish. An in-flight
    /// sweep is dropped together with its uncommitted unit of work.
    pub async fn shutdown(self) {
        self.shutdown_token.cancel();
        if let Err(e) = self.jobs.await {
            log::error!("Background jobs failed: {}", e);
        }
    }
}

pub fn build_application<
    U: UnitOfWorkPort + Send + Sync + 'static,
    O: SweepObserverPort + Send + Sync + 'static,
>(
    unit_of_work: Arc<U>,
    sweep_observer: Arc<O>,
    settings: LifecycleSettings,
) -> Application {
    let process_expired_matches_use_case = Arc::new(ProcessExpiredMatchesUseCaseImpl::new(
        unit_of_work.clone(),
        sweep_observer.clone(),
    ));

    let match_lifecycle_runner = MatchLifecycleRunner::new(
        process_expired_matches_use_case.clone(),
        settings.sweep_period(),
    );

    let shutdown_token = CancellationToken::new();
    let token = shutdown_token.clone();
    let jobs = tokio::spawn(async move {
        match_lifecycle_runner.run(token).await;
    });

    Application {
        jobs,
        shutdown_token,
        process_expired_matches_use_case,
    }
}
