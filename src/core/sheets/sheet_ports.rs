// Spreadsheet-backed ports.
//
// The spreadsheet plays three roles: a key/value config table, an email
// whitelist and an append-only audit log. Each role gets its own narrow trait
// so services only see the part they use.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum SheetError {
    #[error("Spreadsheet API error: {0}")]
    Api(String),
    #[error("Spreadsheet authentication failed: {0}")]
    Auth(String),
}

/// Key/value configuration, re-read on every call.
#[async_trait]
pub trait ConfigSource: Send + Sync {
    async fn read_config(&self) -> Result<HashMap<String, String>, SheetError>;
}

/// Whitelisted admin emails, re-read on every call.
#[async_trait]
pub trait AllowedEmailSource: Send + Sync {
    async fn allowed_emails(&self) -> Result<BTreeSet<String>, SheetError>;
}

/// One audit row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRecord {
    pub entry_id: String,
    pub action: String,
    pub performed_by: String,
    pub summary: String,
    pub start: String,
    pub end: String,
    pub timestamp: String,
}

impl AuditRecord {
    /// Column order of the `Logs` sheet.
    pub fn into_row(self) -> Vec<String> {
        vec![
            self.entry_id,
            self.action,
            self.performed_by,
            self.summary,
            self.start,
            self.end,
            self.timestamp,
        ]
    }
}

#[async_trait]
pub trait AuditLog: Send + Sync {
    async fn append(&self, record: AuditRecord) -> Result<(), SheetError>;
}

/// Folds `[key, value]` rows into a map, trimming both and skipping blanks.
pub fn config_from_rows(rows: &[Vec<String>]) -> HashMap<String, String> {
    let mut config = HashMap::new();
    for row in rows {
        let key = row.first().map(|k| k.trim()).unwrap_or_default();
        let value = row.get(1).map(|v| v.trim()).unwrap_or_default();
        if !key.is_empty() && !value.is_empty() {
            config.insert(key.to_string(), value.to_string());
        }
    }
    config
}

/// Collects the first column as trimmed, lowercased emails, skipping blanks.
pub fn emails_from_rows(rows: &[Vec<String>]) -> BTreeSet<String> {
    rows.iter()
        .filter_map(|row| row.first())
        .map(|email| email.trim().to_lowercase())
        .filter(|email| !email.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
        data.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_config_rows_are_trimmed_and_blanks_skipped() {
        let config = config_from_rows(&rows(&[
            &[" TELEGRAM_TOKEN ", " abc "],
            &["CHAT_ID", ""],
            &[],
            &["", "orphan"],
            &["ADMIN_CHAT_ID", "-100"],
        ]));

        assert_eq!(config.len(), 2);
        assert_eq!(config.get("TELEGRAM_TOKEN").map(String::as_str), Some("abc"));
        assert_eq!(config.get("ADMIN_CHAT_ID").map(String::as_str), Some("-100"));
    }

    #[test]
    fn test_email_rows_are_normalised() {
        let emails = emails_from_rows(&rows(&[
            &["  Clerk@Court.go.th "],
            &[""],
            &[],
            &["judge@court.go.th", "ignored column"],
        ]));

        assert_eq!(emails.len(), 2);
        assert!(emails.contains("clerk@court.go.th"));
        assert!(emails.contains("judge@court.go.th"));
    }

    #[test]
    fn test_audit_row_order() {
        let row = AuditRecord {
            entry_id: "e1".into(),
            action: "DAILY-CREATE".into(),
            performed_by: "Auto-Bot".into(),
            summary: "s".into(),
            start: "-".into(),
            end: "-".into(),
            timestamp: "t".into(),
        }
        .into_row();

        assert_eq!(row, vec!["e1", "DAILY-CREATE", "Auto-Bot", "s", "-", "-", "t"]);
    }
}
