// Case domain models - what the court's case system tells us about a day.
//
// These are pure domain types with no HTTP concerns. The infra client maps
// the case API's JSON onto them.

use thiserror::Error;

use crate::core::credentials::AuthError;

/// One scheduled hearing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Appointment {
    pub case_id: String,
    pub reason: String,
    pub room: String,
    /// `HH.MM.SS`, 24h. Kept as sent; see `minutes_since_midnight` for ordering.
    pub time: String,
    /// Buddhist-era `DD/MM/YYYY` the API filed it under.
    pub appoint_date: String,
}

/// Result of asking the case API for one business date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// At least one appointment. Never constructed with an empty list.
    Found(Vec<Appointment>),
    /// No hearings that day. A normal outcome, not a failure.
    Empty,
}

impl FetchOutcome {
    /// Builds an outcome from a list, folding an empty list into `Empty`.
    pub fn from_list(appointments: Vec<Appointment>) -> Self {
        if appointments.is_empty() {
            Self::Empty
        } else {
            Self::Found(appointments)
        }
    }

    pub fn count(&self) -> usize {
        match self {
            Self::Found(list) => list.len(),
            Self::Empty => 0,
        }
    }
}

/// Errors raised by case API queries.
#[derive(Debug, Clone, Error)]
pub enum CaseError {
    #[error("Case API rejected the credential: {0}")]
    Unauthorized(String),
    #[error("Case API error: {0}")]
    Api(String),
    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// A judge currently on active duty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveJudge {
    pub id: i64,
    pub name: String,
}

/// One row of the monthly duty-judge rota.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DutyPoolEntry {
    /// `DD/MM/YYYY 00:00:00` with a Buddhist-era year.
    pub pool_date: String,
    pub judge_id: i64,
}
