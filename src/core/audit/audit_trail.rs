use std::sync::Arc;

use chrono::Utc;

use crate::core::dates::{bangkok_timestamp, to_iso_date_range};
use crate::core::sheets::{AuditLog, AuditRecord};

/// Actor name used for rows written by the sync path.
pub const SYNC_ACTOR: &str = "Auto-Bot";

/// Audit actions written by this service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    DailyCreate,
    DailyUpdate,
    Login,
}

impl AuditAction {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditAction::DailyCreate => "DAILY-CREATE",
            AuditAction::DailyUpdate => "DAILY-UPDATE",
            AuditAction::Login => "LOGIN",
        }
    }
}

/// Best-effort writer for the audit sheet. Failures are logged, never returned.
pub struct AuditTrail {
    log: Arc<dyn AuditLog>,
}

impl AuditTrail {
    pub fn new(log: Arc<dyn AuditLog>) -> Self {
        Self { log }
    }

    /// `business_date` is the `DD/MM/YYYY` key of the day the row is about; its
    /// end-exclusive ISO range fills the start and end columns.
    pub async fn record(
        &self,
        action: AuditAction,
        entry_id: &str,
        summary: &str,
        business_date: Option<&str>,
        performed_by: &str,
    ) {
        let (start, end) = match business_date.map(to_iso_date_range) {
            Some(Ok(range)) => range,
            Some(Err(e)) => {
                tracing::warn!("Audit row without dates: {}", e);
                ("-".to_string(), "-".to_string())
            }
            None => ("-".to_string(), "-".to_string()),
        };
        let record = AuditRecord {
            entry_id: non_blank(entry_id),
            action: action.as_str().to_string(),
            performed_by: non_blank(performed_by),
            summary: non_blank(summary),
            start,
            end,
            timestamp: bangkok_timestamp(Utc::now()),
        };

        if let Err(e) = self.log.append(record).await {
            tracing::error!(action = action.as_str(), "Error logging to sheet: {}", e);
        }
    }
}

fn non_blank(value: &str) -> String {
    if value.trim().is_empty() {
        "-".to_string()
    } else {
        value.to_string()
    }
}
