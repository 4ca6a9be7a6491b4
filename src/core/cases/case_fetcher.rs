use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use super::case_models::{ActiveJudge, CaseError, DutyPoolEntry, FetchOutcome};
use crate::core::credentials::{AuthError, Credential, CredentialProvider};
use crate::core::dates::BusinessDate;

/// Maximum rows requested per business date.
pub const SEARCH_PAGE_LIMIT: u32 = 200;

/// The query half of the case API. Every call carries a bearer credential.
#[async_trait]
pub trait CaseApi: Send + Sync {
    /// Searches hearings for one Buddhist-era `DD/MM/YYYY` date.
    async fn search_appointments(
        &self,
        appoint_date: &str,
        credential: &Credential,
    ) -> Result<FetchOutcome, CaseError>;

    async fn list_active_judges(
        &self,
        credential: &Credential,
    ) -> Result<Vec<ActiveJudge>, CaseError>;

    /// Duty rota for a Gregorian month.
    async fn duty_pool(
        &self,
        month: u32,
        year: i32,
        credential: &Credential,
    ) -> Result<Vec<DutyPoolEntry>, CaseError>;
}

/// Runs case API queries with a valid credential attached.
///
/// If the API rejects the cached credential, it is dropped and the call is
/// retried once with a fresh login.
pub struct CaseFetcher {
    api: Arc<dyn CaseApi>,
    credentials: Arc<CredentialProvider>,
}

impl CaseFetcher {
    pub fn new(api: Arc<dyn CaseApi>, credentials: Arc<CredentialProvider>) -> Self {
        Self { api, credentials }
    }

    /// Makes sure a credential is available before a batch of calls.
    pub async fn prepare(&self) -> Result<(), AuthError> {
        self.credentials.ensure_credential().await.map(|_| ())
    }

    pub async fn fetch_appointments(&self, date: &BusinessDate) -> Result<FetchOutcome, CaseError> {
        let appoint_date = date.to_buddhist_string();
        tracing::debug!(appoint_date = %appoint_date, "Searching case API");

        let outcome = self
            .authorized(|credential| {
                let api = Arc::clone(&self.api);
                let appoint_date = appoint_date.clone();
                async move { api.search_appointments(&appoint_date, &credential).await }
            })
            .await?;

        if let FetchOutcome::Found(list) = &outcome {
            let stray = list
                .iter()
                .filter(|a| !a.appoint_date.is_empty() && !a.appoint_date.starts_with(&appoint_date))
                .count();
            if stray > 0 {
                tracing::warn!(appoint_date = %appoint_date, stray, "Case API returned rows filed under another date");
            }
        }
        tracing::debug!(appoint_date = %appoint_date, count = outcome.count(), "Case API answered");
        Ok(outcome)
    }

    pub async fn active_judges(&self) -> Result<Vec<ActiveJudge>, CaseError> {
        self.authorized(|credential| {
            let api = Arc::clone(&self.api);
            async move { api.list_active_judges(&credential).await }
        })
        .await
    }

    pub async fn duty_pool(&self, month: u32, year: i32) -> Result<Vec<DutyPoolEntry>, CaseError> {
        self.authorized(|credential| {
            let api = Arc::clone(&self.api);
            async move { api.duty_pool(month, year, &credential).await }
        })
        .await
    }

    async fn authorized<T, F, Fut>(&self, call: F) -> Result<T, CaseError>
    where
        F: Fn(Credential) -> Fut,
        Fut: Future<Output = Result<T, CaseError>>,
    {
        let credential = self.credentials.ensure_credential().await?;

        match call(credential).await {
            Err(CaseError::Unauthorized(reason)) => {
                tracing::warn!("Case API credential rejected ({}), logging in again", reason);
                self.credentials.invalidate().await;
                let credential = self.credentials.ensure_credential().await?;
                call(credential).await
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cases::Appointment;
    use crate::core::testing::{appointment, FakeCaseApi};
    use chrono::NaiveDate;

    fn day() -> BusinessDate {
        BusinessDate::from_gregorian(NaiveDate::from_ymd_opt(2026, 10, 16).unwrap())
    }

    fn fetcher(api: &Arc<FakeCaseApi>) -> CaseFetcher {
        let credentials = Arc::new(CredentialProvider::new(api.clone()));
        CaseFetcher::new(api.clone(), credentials)
    }

    #[tokio::test]
    async fn test_fetch_uses_buddhist_key() {
        let api = Arc::new(FakeCaseApi::new());
        let list: Vec<Appointment> = vec![appointment("A1", "09.00.00")];
        api.set_day("16/10/2569", Ok(FetchOutcome::Found(list.clone())));

        let outcome = fetcher(&api).fetch_appointments(&day()).await.unwrap();

        assert_eq!(outcome, FetchOutcome::Found(list));
        assert_eq!(api.searched_dates(), vec!["16/10/2569".to_string()]);
    }

    #[tokio::test]
    async fn test_unknown_day_is_empty() {
        let api = Arc::new(FakeCaseApi::new());
        let outcome = fetcher(&api).fetch_appointments(&day()).await.unwrap();
        assert_eq!(outcome, FetchOutcome::Empty);
    }

    #[tokio::test]
    async fn test_rejected_credential_is_refreshed_once() {
        let api = Arc::new(FakeCaseApi::new());
        api.reject_credentials(1);

        let outcome = fetcher(&api).fetch_appointments(&day()).await.unwrap();

        assert_eq!(outcome, FetchOutcome::Empty);
        assert_eq!(api.login_count(), 2);
    }

    #[tokio::test]
    async fn test_repeated_rejection_is_reported() {
        let api = Arc::new(FakeCaseApi::new());
        api.reject_credentials(5);

        let err = fetcher(&api).fetch_appointments(&day()).await.unwrap_err();

        assert!(matches!(err, CaseError::Unauthorized(_)));
        assert_eq!(api.login_count(), 2);
    }

    #[tokio::test]
    async fn test_login_failure_surfaces_as_auth() {
        let api = Arc::new(FakeCaseApi::new());
        api.fail_login("down");

        let err = fetcher(&api).fetch_appointments(&day()).await.unwrap_err();

        assert!(matches!(err, CaseError::Auth(AuthError::Login(_))));
        assert!(api.searched_dates().is_empty());
    }
}
