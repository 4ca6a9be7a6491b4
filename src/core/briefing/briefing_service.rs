use std::sync::Arc;

use chrono::Datelike;
use thiserror::Error;

use crate::core::cases::{ActiveJudge, CaseError, CaseFetcher, DutyPoolEntry, FetchOutcome};
use crate::core::dates::BusinessDate;
use crate::core::notify::messages::{format_duty_judge, format_duty_judge_error, format_today_message};
use crate::core::notify::{Channel, Delivery, Notifier};

#[derive(Debug, Error)]
pub enum BriefingError {
    #[error(transparent)]
    Case(#[from] CaseError),
    #[error("Notification config missing")]
    NotConfigured,
    #[error("Notification could not be delivered")]
    Delivery,
}

/// Outcome of the duty-judge check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DutyReport {
    pub date: BusinessDate,
    pub judge: Option<String>,
}

/// Single-day announcements for the stakeholder chat.
pub struct BriefingService {
    fetcher: Arc<CaseFetcher>,
    notifier: Arc<Notifier>,
}

impl BriefingService {
    pub fn new(fetcher: Arc<CaseFetcher>, notifier: Arc<Notifier>) -> Self {
        Self { fetcher, notifier }
    }

    /// Posts today's hearing list and returns how many hearings it had.
    pub async fn notify_today(&self) -> Result<usize, BriefingError> {
        self.notify_today_for(BusinessDate::today()).await
    }

    pub async fn notify_today_for(&self, date: BusinessDate) -> Result<usize, BriefingError> {
        let appointments = match self.fetcher.fetch_appointments(&date).await? {
            FetchOutcome::Found(list) => list,
            FetchOutcome::Empty => Vec::new(),
        };
        tracing::info!(date = %date, count = appointments.len(), "Sending today's hearing list");

        let message = format_today_message(&date, &appointments);
        delivered(self.notifier.notify(Channel::Primary, &message).await)?;
        Ok(appointments.len())
    }

    /// Announces today's duty judge.
    pub async fn notify_duty_judge(&self) -> Result<DutyReport, BriefingError> {
        self.notify_duty_judge_for(BusinessDate::today()).await
    }

    pub async fn notify_duty_judge_for(&self, date: BusinessDate) -> Result<DutyReport, BriefingError> {
        match self.lookup_duty_judge(&date).await {
            Ok(judge) => {
                let message = format_duty_judge(&date, judge.as_deref());
                delivered(self.notifier.notify(Channel::Primary, &message).await)?;
                Ok(DutyReport { date, judge })
            }
            Err(e) => {
                tracing::error!(date = %date, "Duty judge check failed: {}", e);
                self.notifier
                    .notify(Channel::Primary, &format_duty_judge_error(&e.to_string()))
                    .await;
                Err(e.into())
            }
        }
    }

    async fn lookup_duty_judge(&self, date: &BusinessDate) -> Result<Option<String>, CaseError> {
        let judges = match self.fetcher.active_judges().await {
            Ok(judges) => judges,
            Err(CaseError::Auth(e)) => return Err(CaseError::Auth(e)),
            Err(e) => {
                tracing::warn!("Could not list active judges, names will fall back to ids: {}", e);
                Vec::new()
            }
        };

        let day = date.gregorian();
        let pool = self.fetcher.duty_pool(day.month(), day.year()).await?;

        Ok(find_duty_entry(&pool, date).map(|entry| judge_name(&judges, entry.judge_id)))
    }
}

fn delivered(delivery: Delivery) -> Result<(), BriefingError> {
    match delivery {
        Delivery::Sent => Ok(()),
        Delivery::NotConfigured => Err(BriefingError::NotConfigured),
        Delivery::Failed => Err(BriefingError::Delivery),
    }
}

/// First rota row dated `date`. Rows carry a `DD/MM/YYYY 00:00:00` stamp.
fn find_duty_entry<'a>(pool: &'a [DutyPoolEntry], date: &BusinessDate) -> Option<&'a DutyPoolEntry> {
    pool.iter().find(|entry| {
        entry
            .pool_date
            .split_whitespace()
            .next()
            .and_then(|prefix| BusinessDate::parse_buddhist(prefix).ok())
            .is_some_and(|d| d == *date)
    })
}

fn judge_name(judges: &[ActiveJudge], id: i64) -> String {
    judges
        .iter()
        .find(|judge| judge.id == id)
        .map(|judge| judge.name.clone())
        .unwrap_or_else(|| format!("Unknown ID: {}", id))
}
