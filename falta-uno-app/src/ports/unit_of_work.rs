use crate::{
    domain::RepoError,
    ports::{enrollment_store::EnrollmentStore, match_store::MatchStore},
};

/// Starts atomic units of work over the match and enrollment stores.
#[async_trait::async_trait]
pub trait UnitOfWorkPort {
    type Work: UnitOfWork + MatchStore + EnrollmentStore + Send;

    async fn begin(&self) -> Result<Self::Work, RepoError>;
}

/// Writes made through a unit of work become visible to others only on
/// `commit`. Dropping it without committing discards them.
#[async_trait::async_trait]
pub trait UnitOfWork: Send {
    async fn commit(self) -> Result<(), RepoError>;
    async fn rollback(self) -> Result<(), RepoError>;
}
