use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;

use super::sync_models::{
    DayError, DayOutcome, SyncError, SyncReport, SyncResult, MAX_WINDOW_DAYS,
};
use crate::core::audit::{AuditAction, AuditTrail, SYNC_ACTOR};
use crate::core::calendar::{CalendarReconciler, UpsertOutcome};
use crate::core::cases::{summarize, CaseError, CaseFetcher, FetchOutcome};
use crate::core::dates::{bangkok_timestamp, BusinessDate};
use crate::core::notify::messages::format_sync_report;
use crate::core::notify::{Channel, Notifier};

const IDLE: u8 = 0;
const RUNNING: u8 = 1;
const CANCELLING: u8 = 2;

/// Puts the run state back to idle however the run ends, including when its
/// future is dropped mid-flight.
struct RunStateReset<'a>(&'a AtomicU8);

impl Drop for RunStateReset<'_> {
    fn drop(&mut self) {
        self.0.store(IDLE, Ordering::SeqCst);
    }
}

/// Mirrors a rolling window of days from the case API onto the calendar.
///
/// Only one run may be in flight at a time: the find-then-write upsert is not
/// atomic on the calendar side, so overlapping runs could create duplicate
/// summary entries for the same day.
pub struct SyncService {
    fetcher: Arc<CaseFetcher>,
    reconciler: CalendarReconciler,
    notifier: Arc<Notifier>,
    audit: Arc<AuditTrail>,
    run_lock: Mutex<()>,
    /// `IDLE`, `RUNNING` or `CANCELLING`; only ever non-idle while `run_lock` is held.
    state: AtomicU8,
}

impl SyncService {
    pub fn new(
        fetcher: Arc<CaseFetcher>,
        reconciler: CalendarReconciler,
        notifier: Arc<Notifier>,
        audit: Arc<AuditTrail>,
    ) -> Self {
        Self {
            fetcher,
            reconciler,
            notifier,
            audit,
            run_lock: Mutex::new(()),
            state: AtomicU8::new(IDLE),
        }
    }

    /// Syncs `window_days` days starting from today (Bangkok time).
    pub async fn run_sync(&self, window_days: u32) -> Result<SyncReport, SyncError> {
        self.run_sync_from(BusinessDate::today(), window_days).await
    }

    /// Syncs `window_days` days starting from `start`.
    ///
    /// Per-day failures are counted and the loop moves on. Only a credential
    /// failure or a concurrent run stops the whole thing.
    pub async fn run_sync_from(
        &self,
        start: BusinessDate,
        window_days: u32,
    ) -> Result<SyncReport, SyncError> {
        let _guard = self
            .run_lock
            .try_lock()
            .map_err(|_| SyncError::AlreadyRunning)?;
        self.state.store(RUNNING, Ordering::SeqCst);
        let _reset = RunStateReset(&self.state);

        let days = window_days.clamp(1, MAX_WINDOW_DAYS);
        tracing::info!(days, start = %start, "Syncing daily summaries");

        self.fetcher.prepare().await?;

        let mut summary = SyncResult::default();
        let mut cancelled = false;

        for offset in 0..days {
            if self.state.load(Ordering::SeqCst) == CANCELLING {
                let remaining = days - offset;
                tracing::warn!(remaining, "Sync cancelled, leaving remaining days untouched");
                summary.skipped += remaining;
                cancelled = true;
                break;
            }

            let Some(date) = start.plus_days(offset) else {
                tracing::error!(offset, "Date out of range");
                summary.errors += 1;
                continue;
            };

            match self.sync_day(&date).await {
                Ok(DayOutcome::NoAppointments) => {
                    tracing::debug!(date = %date, "No appointments");
                }
                Ok(DayOutcome::Created { entry_id }) => {
                    tracing::info!(date = %date, entry_id = %entry_id, "Created daily summary");
                    summary.added += 1;
                }
                Ok(DayOutcome::Updated { entry_id }) => {
                    tracing::info!(date = %date, entry_id = %entry_id, "Updated daily summary");
                    summary.updated += 1;
                }
                Err(DayError::Fetch(CaseError::Auth(e))) => {
                    tracing::error!(date = %date, "Credential lost mid-run: {}", e);
                    return Err(SyncError::Auth(e));
                }
                Err(e) => {
                    tracing::warn!(date = %date, iso = %date.to_iso_string(), "Day sync failed: {}", e);
                    summary.errors += 1;
                }
            }
        }

        tracing::info!(
            added = summary.added,
            updated = summary.updated,
            skipped = summary.skipped,
            errors = summary.errors,
            "Sync finished"
        );

        let report = format_sync_report(days, &summary, cancelled, &bangkok_timestamp(Utc::now()));
        self.notifier.notify(Channel::Admin, &report).await;

        Ok(SyncReport {
            days,
            summary,
            cancelled,
        })
    }

    /// Asks the in-flight run to stop at the next day boundary.
    ///
    /// Returns `false` when no run is in flight.
    pub fn request_cancel(&self) -> bool {
        match self
            .state
            .compare_exchange(RUNNING, CANCELLING, Ordering::SeqCst, Ordering::SeqCst)
        {
            Ok(_) => true,
            Err(current) => current == CANCELLING,
        }
    }

    async fn sync_day(&self, date: &BusinessDate) -> Result<DayOutcome, DayError> {
        let appointments = match self.fetcher.fetch_appointments(date).await? {
            FetchOutcome::Empty => return Ok(DayOutcome::NoAppointments),
            FetchOutcome::Found(list) => list,
        };

        let summary = summarize(date, &appointments, &bangkok_timestamp(Utc::now()));

        let upserted = self.reconciler.upsert_daily_summary(date, &summary).await?;
        let action = match upserted {
            UpsertOutcome::Created { .. } => AuditAction::DailyCreate,
            UpsertOutcome::Updated { .. } => AuditAction::DailyUpdate,
        };
        self.audit
            .record(
                action,
                upserted.entry_id(),
                &summary.title,
                Some(date.to_buddhist_string().as_str()),
                SYNC_ACTOR,
            )
            .await;

        Ok(match upserted {
            UpsertOutcome::Created { entry_id } => DayOutcome::Created { entry_id },
            UpsertOutcome::Updated { entry_id } => DayOutcome::Updated { entry_id },
        })
    }
}
