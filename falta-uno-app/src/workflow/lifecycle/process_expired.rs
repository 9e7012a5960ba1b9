use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{
    domain::{
        RepoError,
        enrollment::EnrollmentStatus,
        r#match::{ExpiryOutcome, Match, MatchStatus},
    },
    ports::{
        enrollment_store::EnrollmentStore,
        match_store::MatchStore,
        sweep_observer::SweepObserverPort,
        unit_of_work::{UnitOfWork, UnitOfWorkPort},
    },
    workflow::lifecycle::{SweepError, SweepSummary},
};

/// Statuses swept for expiry, in processing order.
const EXPIRING_STATUSES: [MatchStatus; 2] = [MatchStatus::Pending, MatchStatus::Confirmed];

#[async_trait::async_trait]
pub trait ProcessExpiredMatchesUseCase {
    async fn process_expired_matches(&self, now: DateTime<Utc>)
    -> Result<SweepSummary, SweepError>;
}

pub struct ProcessExpiredMatchesUseCaseImpl<U: UnitOfWorkPort, O: SweepObserverPort> {
    unit_of_work: Arc<U>,
    sweep_observer: Arc<O>,
}

impl<
    U: UnitOfWorkPort + Send + Sync + 'static,
    O: SweepObserverPort + Send + Sync + 'static,
> ProcessExpiredMatchesUseCaseImpl<U, O>
{
    pub fn new(unit_of_work: Arc<U>, sweep_observer: Arc<O>) -> Self {
        Self {
            unit_of_work,
            sweep_observer,
        }
    }

    async fn sweep(work: &mut U::Work, now: DateTime<Utc>) -> Result<SweepSummary, RepoError> {
        let mut summary = SweepSummary::default();

        for status in EXPIRING_STATUSES {
            let expired = work.find_by_status_and_scheduled_before(status, now).await?;
            for r#match in expired {
                summary.processed += 1;

                if let Err(violation) = r#match.check_expired(status, now) {
                    log::warn!("Skipping match {}: {}", r#match.id, violation);
                    summary.skipped += 1;
                    continue;
                }

                let confirmed_enrollments = match status {
                    MatchStatus::Pending => {
                        work.count_by_match_and_status(r#match.id, EnrollmentStatus::Confirmed)
                            .await?
                    }
                    _ => 0,
                };
                let outcome = r#match.expiry_outcome(confirmed_enrollments);
                Self::apply_outcome(work, &r#match, outcome, &mut summary).await?;
            }
        }

        Ok(summary)
    }

    async fn apply_outcome(
        work: &mut U::Work,
        r#match: &Match,
        outcome: ExpiryOutcome,
        summary: &mut SweepSummary,
    ) -> Result<(), RepoError> {
        let Some(target) = outcome.target_status() else {
            log::debug!(
                "Match {} left {} after its scheduled time",
                r#match.id,
                r#match.status
            );
            return Ok(());
        };

        let next = match r#match.status.transition_to(target) {
            Ok(next) => next,
            Err(e) => {
                log::warn!("Skipping match {}: {}", r#match.id, e);
                summary.skipped += 1;
                return Ok(());
            }
        };

        if !work.transition_status(r#match.id, r#match.status, next).await? {
            log::debug!(
                "Match {} changed status concurrently, not moving it to {}",
                r#match.id,
                next
            );
            return Ok(());
        }

        log::info!("Match {} moved {} -> {}", r#match.id, r#match.status, next);
        match next {
            MatchStatus::Cancelled => summary.cancelled += 1,
            MatchStatus::Completed => summary.completed += 1,
            MatchStatus::Pending | MatchStatus::Confirmed => {}
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl<
    U: UnitOfWorkPort + Send + Sync + 'static,
    O: SweepObserverPort + Send + Sync + 'static,
> ProcessExpiredMatchesUseCase for ProcessExpiredMatchesUseCaseImpl<U, O>
{
    async fn process_expired_matches(
        &self,
        now: DateTime<Utc>,
    ) -> Result<SweepSummary, SweepError> {
        let mut work = self.unit_of_work.begin().await?;

        let summary = match Self::sweep(&mut work, now).await {
            Ok(summary) => summary,
            Err(e) => {
                if let Err(rollback_error) = work.rollback().await {
                    log::error!("Failed to roll back match sweep: {}", rollback_error);
                }
                return Err(SweepError::StoreUnavailable(e));
            }
        };

        work.commit().await?;

        if summary.has_transitions() {
            self.sweep_observer.on_sweep_completed(&summary);
        }
        Ok(summary)
    }
}
