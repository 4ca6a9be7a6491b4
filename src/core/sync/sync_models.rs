use serde::Serialize;
use thiserror::Error;

use crate::core::calendar::CalendarError;
use crate::core::cases::CaseError;
use crate::core::credentials::AuthError;

/// Window used when the caller gives no usable day count.
pub const DEFAULT_WINDOW_DAYS: u32 = 7;

/// Hard ceiling on the window.
pub const MAX_WINDOW_DAYS: u32 = 90;

/// Per-run tally of day outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncResult {
    pub added: u32,
    pub updated: u32,
    /// Days never visited because the run was cancelled.
    pub skipped: u32,
    pub errors: u32,
}

/// What a finished run hands back to its trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub days: u32,
    pub summary: SyncResult,
    pub cancelled: bool,
}

/// How a single day ended when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DayOutcome {
    NoAppointments,
    Created { entry_id: String },
    Updated { entry_id: String },
}

/// Failure of one day; recorded in the tally, never aborts the run.
#[derive(Debug, Error)]
pub enum DayError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] CaseError),
    #[error("calendar upsert failed: {0}")]
    Reconcile(#[from] CalendarError),
}

/// Failures that stop a whole run.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Cannot connect to Case System API: {0}")]
    Auth(#[from] AuthError),
    #[error("A sync run is already in progress")]
    AlreadyRunning,
}

/// Maps a requested day count onto `1..=MAX_WINDOW_DAYS`.
///
/// Missing or zero means the default window; negatives clamp up to one day.
pub fn clamp_window(requested: Option<i64>) -> u32 {
    match requested {
        None | Some(0) => DEFAULT_WINDOW_DAYS,
        Some(n) if n < 0 => 1,
        Some(n) => u32::try_from(n).unwrap_or(MAX_WINDOW_DAYS).min(MAX_WINDOW_DAYS),
    }
}
