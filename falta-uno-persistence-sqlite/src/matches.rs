use chrono::{DateTime, Utc};
use falta_uno_app::{
    domain::{
        MatchId, RepoError,
        enrollment::EnrollmentStatus,
        r#match::{Match, MatchStatus},
    },
    ports::{
        enrollment_store::EnrollmentStore,
        match_store::MatchStore,
        unit_of_work::{UnitOfWork, UnitOfWorkPort},
    },
};
use sqlx::{Pool, Row, Sqlite, Transaction, sqlite::SqliteRow};

pub struct SqliteUnitOfWork {
    pool: Pool<Sqlite>,
}

impl SqliteUnitOfWork {
    pub fn with_pool(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl UnitOfWorkPort for SqliteUnitOfWork {
    type Work = SqliteMatchTransaction;

    async fn begin(&self) -> Result<Self::Work, RepoError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::StorageError(e.to_string()))?;
        Ok(SqliteMatchTransaction { tx })
    }
}

/// Rolled back on drop unless committed.
pub struct SqliteMatchTransaction {
    tx: Transaction<'static, Sqlite>,
}

fn match_from_row(row: &SqliteRow) -> Result<Match, RepoError> {
    let id: i64 = row
        .try_get("id")
        .map_err(|e| RepoError::StorageError(e.to_string()))?;
    let status: String = row
        .try_get("status")
        .map_err(|e| RepoError::StorageError(e.to_string()))?;
    let scheduled_at: Option<i64> = row
        .try_get("scheduled_at")
        .map_err(|e| RepoError::StorageError(e.to_string()))?;
    let required_players: i64 = row
        .try_get("required_players")
        .map_err(|e| RepoError::StorageError(e.to_string()))?;

    let status = status
        .parse::<MatchStatus>()
        .map_err(|e| RepoError::StorageError(format!("match {}: {}", id, e)))?;

    Ok(Match {
        id: MatchId(id),
        status,
        scheduled_at: scheduled_at.and_then(DateTime::from_timestamp_millis),
        required_players,
    })
}

#[async_trait::async_trait]
impl MatchStore for SqliteMatchTransaction {
    async fn find_by_status_and_scheduled_before(
        &mut self,
        status: MatchStatus,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Match>, RepoError> {
        // Integer casts keep loosely typed columns decodable; bad values fail validation instead.
        let rows = sqlx::query(
            "SELECT id, status, CAST(scheduled_at AS INTEGER) AS scheduled_at, \
             CAST(required_players AS INTEGER) AS required_players \
             FROM matches WHERE status = ? AND matches.scheduled_at < ?",
        )
        .bind(status.as_str())
        .bind(cutoff.timestamp_millis())
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| RepoError::StorageError(e.to_string()))?;

        rows.iter().map(match_from_row).collect()
    }

    async fn save(&mut self, r#match: &Match) -> Result<Match, RepoError> {
        sqlx::query(
            "INSERT INTO matches (id, status, scheduled_at, required_players) VALUES (?, ?, ?, ?) \
             ON CONFLICT(id) DO UPDATE SET status = excluded.status, scheduled_at = excluded.scheduled_at, required_players = excluded.required_players",
        )
        .bind(r#match.id.0)
        .bind(r#match.status.as_str())
        .bind(r#match.scheduled_at.map(|at| at.timestamp_millis()))
        .bind(r#match.required_players)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| RepoError::StorageError(e.to_string()))?;

        Ok(r#match.clone())
    }

    async fn transition_status(
        &mut self,
        match_id: MatchId,
        from: MatchStatus,
        to: MatchStatus,
    ) -> Result<bool, RepoError> {
        let res = sqlx::query("UPDATE matches SET status = ? WHERE id = ? AND status = ?")
            .bind(to.as_str())
            .bind(match_id.0)
            .bind(from.as_str())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| RepoError::StorageError(e.to_string()))?;

        Ok(res.rows_affected() == 1)
    }
}

#[async_trait::async_trait]
impl EnrollmentStore for SqliteMatchTransaction {
    async fn count_by_match_and_status(
        &mut self,
        match_id: MatchId,
        status: EnrollmentStatus,
    ) -> Result<u64, RepoError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM enrollments WHERE match_id = ? AND status = ?",
        )
        .bind(match_id.0)
        .bind(status.as_str())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| RepoError::StorageError(e.to_string()))?;

        u64::try_from(count).map_err(|e| RepoError::StorageError(e.to_string()))
    }
}

#[async_trait::async_trait]
impl UnitOfWork for SqliteMatchTransaction {
    async fn commit(self) -> Result<(), RepoError> {
        self.tx
            .commit()
            .await
            .map_err(|e| RepoError::StorageError(e.to_string()))
    }

    async fn rollback(self) -> Result<(), RepoError> {
        self.tx
            .rollback()
            .await
            .map_err(|e| RepoError::StorageError(e.to_string()))
    }
}
