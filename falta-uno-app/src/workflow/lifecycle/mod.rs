use thiserror::Error;

use crate::domain::RepoError;

pub mod process_expired;

/// Outcome of one sweep over expired matches.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SweepSummary {
    pub processed: usize,
    pub cancelled: usize,
    pub completed: usize,
    pub skipped: usize,
}

impl SweepSummary {
    pub fn has_transitions(&self) -> bool {
        self.cancelled + self.completed > 0
    }
}

#[derive(Debug, Error)]
pub enum SweepError {
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] RepoError),
}
