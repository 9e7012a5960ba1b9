use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};

use chrono::{DateTime, Utc};

use crate::{
    domain::{
        EnrollmentId, MatchId, PlayerId, RepoError,
        enrollment::{Enrollment, EnrollmentStatus},
        r#match::{Match, MatchStatus},
    },
    ports::{
        enrollment_store::EnrollmentStore,
        match_store::MatchStore,
        unit_of_work::{UnitOfWork, UnitOfWorkPort},
    },
};

#[derive(Default)]
struct State {
    matches: BTreeMap<MatchId, Match>,
    enrollments: Vec<Enrollment>,
    next_enrollment_id: i64,
}

/// Failures and interleavings to inject into units of work.
#[derive(Clone, Debug, Default)]
pub struct FaultPlan {
    pub fail_begin: bool,
    pub fail_commit: bool,
    pub fail_count: bool,
    pub fail_transition_of: Option<MatchId>,
    /// Commits wait this long before touching shared state.
    pub commit_delay: Option<std::time::Duration>,
    /// Applied to committed state right after the first status query of a
    /// unit of work, as if another request changed the match in between.
    pub interleave_status_change: Option<(MatchId, MatchStatus)>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusWrite {
    pub match_id: MatchId,
    pub from: MatchStatus,
    pub to: MatchStatus,
}

/// Shared in-memory match and enrollment tables with staged, all-or-nothing
/// units of work.
#[derive(Clone, Default)]
pub struct InMemoryLifecycleStore {
    state: Arc<Mutex<State>>,
    faults: Arc<Mutex<FaultPlan>>,
    writes: Arc<Mutex<Vec<StatusWrite>>>,
}

impl InMemoryLifecycleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_match(&self, r#match: Match) {
        let mut state = self.state.lock().unwrap();
        state.matches.insert(r#match.id, r#match);
    }

    pub fn insert_enrollment(
        &self,
        match_id: MatchId,
        player_id: PlayerId,
        status: EnrollmentStatus,
    ) -> EnrollmentId {
        let mut state = self.state.lock().unwrap();
        state.next_enrollment_id += 1;
        let id = EnrollmentId(state.next_enrollment_id);
        state.enrollments.push(Enrollment {
            id,
            match_id,
            player_id,
            status,
        });
        id
    }

    pub fn get_match(&self, match_id: MatchId) -> Option<Match> {
        self.state.lock().unwrap().matches.get(&match_id).cloned()
    }

    pub fn set_match_status(&self, match_id: MatchId, status: MatchStatus) {
        if let Some(m) = self.state.lock().unwrap().matches.get_mut(&match_id) {
            m.status = status;
        }
    }

    pub fn set_faults(&self, faults: FaultPlan) {
        *self.faults.lock().unwrap() = faults;
    }

    /// Every status write issued through a unit of work, committed or not.
    pub fn issued_writes(&self) -> Vec<StatusWrite> {
        self.writes.lock().unwrap().clone()
    }

    fn faults(&self) -> FaultPlan {
        self.faults.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl UnitOfWorkPort for InMemoryLifecycleStore {
    type Work = InMemoryUnitOfWork;

    async fn begin(&self) -> Result<Self::Work, RepoError> {
        if self.faults().fail_begin {
            return Err(RepoError::StorageError("store offline".to_string()));
        }
        Ok(InMemoryUnitOfWork {
            store: self.clone(),
            staged: BTreeMap::new(),
            read_versions: BTreeMap::new(),
            interleaved: false,
        })
    }
}

pub struct InMemoryUnitOfWork {
    store: InMemoryLifecycleStore,
    staged: BTreeMap<MatchId, Match>,
    read_versions: BTreeMap<MatchId, Option<MatchStatus>>,
    interleaved: bool,
}

impl InMemoryUnitOfWork {
    fn current(&self, state: &State, match_id: MatchId) -> Option<Match> {
        self.staged
            .get(&match_id)
            .or_else(|| state.matches.get(&match_id))
            .cloned()
    }

    fn stage(&mut self, state: &State, r#match: Match) {
        self.read_versions
            .entry(r#match.id)
            .or_insert_with(|| state.matches.get(&r#match.id).map(|m| m.status));
        self.staged.insert(r#match.id, r#match);
    }
}

#[async_trait::async_trait]
impl MatchStore for InMemoryUnitOfWork {
    async fn find_by_status_and_scheduled_before(
        &mut self,
        status: MatchStatus,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Match>, RepoError> {
        let found = {
            let state = self.store.state.lock().unwrap();
            let mut ids: Vec<MatchId> = state.matches.keys().copied().collect();
            ids.extend(self.staged.keys().copied());
            ids.sort();
            ids.dedup();
            let found: Vec<Match> = ids
                .into_iter()
                .filter_map(|id| self.current(&state, id))
                .filter(|m| m.status == status)
                .filter(|m| m.scheduled_at.is_some_and(|at| at < cutoff))
                .collect();
            found
        };

        if !self.interleaved {
            self.interleaved = true;
            if let Some((match_id, status)) = self.store.faults().interleave_status_change {
                self.store.set_match_status(match_id, status);
            }
        }
        Ok(found)
    }

    async fn save(&mut self, r#match: &Match) -> Result<Match, RepoError> {
        let shared = self.store.state.clone();
        let state = shared.lock().unwrap();
        self.stage(&state, r#match.clone());
        Ok(r#match.clone())
    }

    async fn transition_status(
        &mut self,
        match_id: MatchId,
        from: MatchStatus,
        to: MatchStatus,
    ) -> Result<bool, RepoError> {
        self.store.writes.lock().unwrap().push(StatusWrite { match_id, from, to });
        if self.store.faults().fail_transition_of == Some(match_id) {
            return Err(RepoError::StorageError(format!(
                "failed to update match {}",
                match_id
            )));
        }

        let shared = self.store.state.clone();
        let state = shared.lock().unwrap();
        let Some(mut current) = self.current(&state, match_id) else {
            return Ok(false);
        };
        if current.status != from {
            return Ok(false);
        }
        current.status = to;
        self.stage(&state, current);
        Ok(true)
    }
}

#[async_trait::async_trait]
impl EnrollmentStore for InMemoryUnitOfWork {
    async fn count_by_match_and_status(
        &mut self,
        match_id: MatchId,
        status: EnrollmentStatus,
    ) -> Result<u64, RepoError> {
        if self.store.faults().fail_count {
            return Err(RepoError::StorageError("enrollment store offline".to_string()));
        }
        let state = self.store.state.lock().unwrap();
        let count = state
            .enrollments
            .iter()
            .filter(|e| e.match_id == match_id && e.status == status)
            .count();
        Ok(count as u64)
    }
}

#[async_trait::async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    async fn commit(self) -> Result<(), RepoError> {
        let faults = self.store.faults();
        if let Some(delay) = faults.commit_delay {
            tokio::time::sleep(delay).await;
        }
        if faults.fail_commit {
            return Err(RepoError::StorageError("commit failed".to_string()));
        }
        let mut state = self.store.state.lock().unwrap();
        for (match_id, read_status) in &self.read_versions {
            let committed_status = state.matches.get(match_id).map(|m| m.status);
            if committed_status != *read_status {
                return Err(RepoError::StorageError(format!(
                    "write conflict on match {}",
                    match_id
                )));
            }
        }
        for (match_id, staged) in self.staged {
            state.matches.insert(match_id, staged);
        }
        Ok(())
    }

    async fn rollback(self) -> Result<(), RepoError> {
        Ok(())
    }
}
