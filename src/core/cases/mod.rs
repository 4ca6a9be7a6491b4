pub mod case_fetcher;
pub mod case_models;
pub mod day_summary;

pub use case_fetcher::{CaseApi, CaseFetcher, SEARCH_PAGE_LIMIT};
pub use case_models::{ActiveJudge, Appointment, CaseError, DutyPoolEntry, FetchOutcome};
pub use day_summary::{sort_chronologically, summarize, DaySummary, SUMMARY_MARKER, UNKNOWN_TIME};
