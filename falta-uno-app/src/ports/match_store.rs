use chrono::{DateTime, Utc};

use crate::domain::{
    MatchId, RepoError,
    r#match::{Match, MatchStatus},
};

#[async_trait::async_trait]
pub trait MatchStore {
    async fn find_by_status_and_scheduled_before(
        &mut self,
        status: MatchStatus,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Match>, RepoError>;

    /// Upsert. The stored match keeps the given id.
    async fn save(&mut self, r#match: &Match) -> Result<Match, RepoError>;

    /// Compare-and-set on the status column. Returns `false` without writing
    /// when the stored status is no longer `from`.
    async fn transition_status(
        &mut self,
        match_id: MatchId,
        from: MatchStatus,
        to: MatchStatus,
    ) -> Result<bool, RepoError>;
}
