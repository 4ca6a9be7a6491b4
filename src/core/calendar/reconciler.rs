use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Asia::Bangkok;

use super::calendar_models::{AllDayDraft, CalendarEntry, CalendarError, CalendarService, EntryTime};
use crate::core::cases::{DaySummary, SUMMARY_MARKER};
use crate::core::dates::BusinessDate;

/// What the upsert did to the calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created { entry_id: String },
    Updated { entry_id: String },
}

impl UpsertOutcome {
    pub fn entry_id(&self) -> &str {
        match self {
            Self::Created { entry_id } | Self::Updated { entry_id } => entry_id,
        }
    }
}

/// Keeps exactly one summary entry per day on the calendar.
///
/// The lookup and the write are two separate remote calls, so two runs racing
/// on the same day can both insert. The sync service's run lock is what keeps
/// that from happening inside one process.
pub struct CalendarReconciler {
    calendar: Arc<dyn CalendarService>,
}

impl CalendarReconciler {
    pub fn new(calendar: Arc<dyn CalendarService>) -> Self {
        Self { calendar }
    }

    pub async fn upsert_daily_summary(
        &self,
        date: &BusinessDate,
        summary: &DaySummary,
    ) -> Result<UpsertOutcome, CalendarError> {
        let day = date.gregorian();
        let time_min = Utc.from_utc_datetime(&day.and_time(NaiveTime::MIN));
        let time_max = time_min + Duration::seconds(86_399);

        // The remote query is full-text, so confirm the marker is in the title.
        let candidates: Vec<_> = self
            .calendar
            .find_entries(time_min, time_max, SUMMARY_MARKER)
            .await?
            .into_iter()
            .filter(|entry| entry.title.contains(SUMMARY_MARKER))
            .collect();

        // A calendar ahead of UTC returns the neighbouring days' entries for this window too.
        let (existing, neighbours): (Vec<_>, Vec<_>) =
            candidates.into_iter().partition(|entry| starts_on(entry, day));
        for entry in &neighbours {
            tracing::debug!(date = %date, entry_id = %entry.id, "Ignoring summary entry dated on another day");
        }

        if existing.len() > 1 {
            tracing::warn!(
                date = %date,
                count = existing.len(),
                "Multiple summary entries found for one day, updating the first"
            );
        }

        let (start, end) = date.all_day_range();
        let draft = AllDayDraft {
            title: summary.title.clone(),
            description: summary.description.clone(),
            start,
            end,
        };

        match existing.first() {
            Some(entry) => {
                let all_day = matches!(
                    (&entry.start, &entry.end),
                    (Some(EntryTime::AllDay(_)), Some(EntryTime::AllDay(_)))
                );
                if !all_day {
                    tracing::warn!(date = %date, entry_id = %entry.id, "Summary entry was not all-day, rewriting it as one");
                }
                self.calendar.update_all_day(&entry.id, &draft).await?;
                Ok(UpsertOutcome::Updated {
                    entry_id: entry.id.clone(),
                })
            }
            None => {
                let entry_id = self.calendar.insert_all_day(&draft).await?;
                Ok(UpsertOutcome::Created { entry_id })
            }
        }
    }
}

/// Whether the entry begins on `day`; timed starts are read in Bangkok local time.
fn starts_on(entry: &CalendarEntry, day: NaiveDate) -> bool {
    match &entry.start {
        Some(EntryTime::AllDay(start)) => *start == day,
        Some(EntryTime::Timed(at)) => at.with_timezone(&Bangkok).date_naive() == day,
        None => false,
    }
}
