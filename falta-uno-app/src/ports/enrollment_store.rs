use crate::domain::{MatchId, RepoError, enrollment::EnrollmentStatus};

#[async_trait::async_trait]
pub trait EnrollmentStore {
    async fn count_by_match_and_status(
        &mut self,
        match_id: MatchId,
        status: EnrollmentStatus,
    ) -> Result<u64, RepoError>;
}
