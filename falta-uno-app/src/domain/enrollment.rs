use thiserror::Error;

use crate::domain::{EnrollmentId, MatchId, PlayerId};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub match_id: MatchId,
    pub player_id: PlayerId,
    pub status: EnrollmentStatus,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EnrollmentStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl EnrollmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollmentStatus::Pending => "PENDING",
            EnrollmentStatus::Confirmed => "CONFIRMED",
            EnrollmentStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EnrollmentStatus {
    type Err = UnknownEnrollmentStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(EnrollmentStatus::Pending),
            "CONFIRMED" => Ok(EnrollmentStatus::Confirmed),
            "CANCELLED" => Ok(EnrollmentStatus::Cancelled),
            other => Err(UnknownEnrollmentStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown enrollment status: {0}")]
pub struct UnknownEnrollmentStatus(pub String);
