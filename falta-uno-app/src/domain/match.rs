use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::MatchId;

pub const MAX_REQUIRED_PLAYERS: i64 = i32::MAX as i64;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Match {
    pub id: MatchId,
    pub status: MatchStatus,
    pub scheduled_at: Option<DateTime<Utc>>,
    /// Raw stored capacity. Only `1..=MAX_REQUIRED_PLAYERS` is valid.
    pub required_players: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MatchStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Pending => "PENDING",
            MatchStatus::Confirmed => "CONFIRMED",
            MatchStatus::Cancelled => "CANCELLED",
            MatchStatus::Completed => "COMPLETED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, MatchStatus::Cancelled | MatchStatus::Completed)
    }

    /// The lifecycle only ever moves forward. Terminal states have no outgoing edges.
    pub fn can_transition_to(&self, next: MatchStatus) -> bool {
        matches!(
            (self, next),
            (MatchStatus::Pending, MatchStatus::Confirmed)
                | (MatchStatus::Pending, MatchStatus::Cancelled)
                | (MatchStatus::Confirmed, MatchStatus::Completed)
                | (MatchStatus::Confirmed, MatchStatus::Cancelled)
        )
    }

    pub fn transition_to(self, next: MatchStatus) -> Result<MatchStatus, InvalidTransition> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(InvalidTransition { from: self, to: next })
        }
    }
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for MatchStatus {
    type Err = UnknownMatchStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(MatchStatus::Pending),
            "CONFIRMED" => Ok(MatchStatus::Confirmed),
            "CANCELLED" => Ok(MatchStatus::Cancelled),
            "COMPLETED" => Ok(MatchStatus::Completed),
            other => Err(UnknownMatchStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown match status: {0}")]
pub struct UnknownMatchStatus(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid match status transition {from} -> {to}")]
pub struct InvalidTransition {
    pub from: MatchStatus,
    pub to: MatchStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchInvariantViolation {
    #[error("required players must be positive, got {0}")]
    NonPositiveCapacity(i64),
    #[error("required players {0} exceeds {max}", max = MAX_REQUIRED_PLAYERS)]
    CapacityOutOfRange(i64),
    #[error("match has no scheduled time")]
    MissingSchedule,
    #[error("match is scheduled at {scheduled_at}, not before {now}")]
    NotYetDue {
        scheduled_at: DateTime<Utc>,
        now: DateTime<Utc>,
    },
    #[error("expected status {expected}, found {found}")]
    UnexpectedStatus {
        expected: MatchStatus,
        found: MatchStatus,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryOutcome {
    Cancel,
    Complete,
    Unchanged,
}

impl ExpiryOutcome {
    pub fn target_status(&self) -> Option<MatchStatus> {
        match self {
            ExpiryOutcome::Cancel => Some(MatchStatus::Cancelled),
            ExpiryOutcome::Complete => Some(MatchStatus::Completed),
            ExpiryOutcome::Unchanged => None,
        }
    }
}

impl Match {
    /// Checks that a match returned for `expected` status with a cutoff of `now`
    /// is well formed and actually due.
    pub fn check_expired(
        &self,
        expected: MatchStatus,
        now: DateTime<Utc>,
    ) -> Result<(), MatchInvariantViolation> {
        if self.status != expected {
            return Err(MatchInvariantViolation::UnexpectedStatus {
                expected,
                found: self.status,
            });
        }
        if self.required_players <= 0 {
            return Err(MatchInvariantViolation::NonPositiveCapacity(
                self.required_players,
            ));
        }
        if self.required_players > MAX_REQUIRED_PLAYERS {
            return Err(MatchInvariantViolation::CapacityOutOfRange(
                self.required_players,
            ));
        }
        let Some(scheduled_at) = self.scheduled_at else {
            return Err(MatchInvariantViolation::MissingSchedule);
        };
        if scheduled_at >= now {
            return Err(MatchInvariantViolation::NotYetDue { scheduled_at, now });
        }
        Ok(())
    }

    pub fn has_enough_players(&self, confirmed_enrollments: u64) -> bool {
        u64::try_from(self.required_players)
            .map(|required| confirmed_enrollments >= required)
            .unwrap_or(false)
    }

    /// Decides what happens to an expired match. `confirmed_enrollments` is only
    /// consulted for pending matches.
    pub fn expiry_outcome(&self, confirmed_enrollments: u64) -> ExpiryOutcome {
        match self.status {
            MatchStatus::Pending if !self.has_enough_players(confirmed_enrollments) => {
                ExpiryOutcome::Cancel
            }
            MatchStatus::Pending => ExpiryOutcome::Unchanged,
            MatchStatus::Confirmed => ExpiryOutcome::Complete,
            MatchStatus::Cancelled | MatchStatus::Completed => ExpiryOutcome::Unchanged,
        }
    }
}
