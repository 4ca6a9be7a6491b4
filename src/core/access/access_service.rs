use std::sync::Arc;

use thiserror::Error;

use crate::core::audit::{AuditAction, AuditTrail};
use crate::core::sheets::AllowedEmailSource;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("Email not in whitelist")]
    Forbidden,
    #[error("No email given")]
    MissingEmail,
}

/// Gates admin access by the spreadsheet email whitelist.
///
/// The whitelist is read on every check; there is no in-process copy.
pub struct AccessService {
    emails: Arc<dyn AllowedEmailSource>,
    audit: Arc<AuditTrail>,
}

impl AccessService {
    pub fn new(emails: Arc<dyn AllowedEmailSource>, audit: Arc<AuditTrail>) -> Self {
        Self { emails, audit }
    }

    /// Whether the email is on the whitelist. A failed read denies.
    pub async fn is_allowed(&self, email: &str) -> bool {
        let email = email.trim().to_lowercase();
        if email.is_empty() {
            return false;
        }

        match self.emails.allowed_emails().await {
            Ok(allowed) => allowed.contains(&email),
            Err(e) => {
                tracing::error!("Error fetching allowed users: {}", e);
                false
            }
        }
    }

    /// Checks a login attempt and audits it when granted.
    ///
    /// Returns the normalised email on success.
    pub async fn authorize(&self, email: &str) -> Result<String, AccessError> {
        let normalised = email.trim().to_lowercase();
        if normalised.is_empty() {
            return Err(AccessError::MissingEmail);
        }

        tracing::info!("Checking permission: {}", normalised);
        if !self.is_allowed(&normalised).await {
            tracing::warn!("Access denied: {}", normalised);
            return Err(AccessError::Forbidden);
        }

        tracing::info!("Login success: {}", normalised);
        self.audit
            .record(AuditAction::Login, "-", "User Login", None, &normalised)
            .await;
        Ok(normalised)
    }
}
