use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

/// Errors raised by the calendar service.
#[derive(Debug, Clone, Error)]
pub enum CalendarError {
    #[error("Calendar API error: {0}")]
    Api(String),
    #[error("Calendar authentication failed: {0}")]
    Auth(String),
}

/// Start or end of a calendar entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryTime {
    /// Date only; for an end boundary this day is excluded.
    AllDay(NaiveDate),
    Timed(DateTime<Utc>),
}

/// An entry as it exists on the remote calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEntry {
    pub id: String,
    pub title: String,
    pub start: Option<EntryTime>,
    pub end: Option<EntryTime>,
}

/// Fields written when creating or overwriting an all-day entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllDayDraft {
    pub title: String,
    pub description: String,
    pub start: NaiveDate,
    /// Exclusive.
    pub end: NaiveDate,
}

/// The calendar operations the sync path needs.
#[async_trait]
pub trait CalendarService: Send + Sync {
    /// Entries overlapping `[time_min, time_max]` whose text matches `query`.
    async fn find_entries(
        &self,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
        query: &str,
    ) -> Result<Vec<CalendarEntry>, CalendarError>;

    /// Creates an entry and returns its id.
    async fn insert_all_day(&self, draft: &AllDayDraft) -> Result<String, CalendarError>;

    /// Replaces the title, description and dates of an existing entry.
    async fn update_all_day(&self, entry_id: &str, draft: &AllDayDraft) -> Result<(), CalendarError>;
}
