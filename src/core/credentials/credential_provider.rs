use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;

/// Errors raised while acquiring the case API bearer credential.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("Case API login failed: {0}")]
    Login(String),
    #[error("Case API login response carried no bearer token")]
    MissingToken,
}

/// Opaque bearer token for the case API.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Never print the token itself.
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// The login half of the case API.
#[async_trait]
pub trait CaseLogin: Send + Sync {
    /// Logs in with the fixed service credentials and returns the raw
    /// `Authorization` response header, if the server sent one.
    async fn login(&self) -> Result<Option<String>, AuthError>;
}

/// Owns the single credential slot shared by every case API caller.
///
/// The slot lock is held across the login call, so concurrent first callers
/// wait for one login and then reuse its result.
pub struct CredentialProvider {
    login: Arc<dyn CaseLogin>,
    slot: Mutex<Option<Credential>>,
}

impl CredentialProvider {
    pub fn new(login: Arc<dyn CaseLogin>) -> Self {
        Self {
            login,
            slot: Mutex::new(None),
        }
    }

    /// Starts with a pre-issued token (e.g. from the environment).
    pub fn with_seed(login: Arc<dyn CaseLogin>, seed: Option<String>) -> Self {
        let seeded = seed
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
            .map(Credential::new);

        Self {
            slot: Mutex::new(seeded),
            ..Self::new(login)
        }
    }

    /// Returns the cached credential, logging in first if the slot is empty.
    pub async fn ensure_credential(&self) -> Result<Credential, AuthError> {
        let mut slot = self.slot.lock().await;
        if let Some(credential) = slot.as_ref() {
            return Ok(credential.clone());
        }

        tracing::info!("Renewing case API credential");
        let header = self.login.login().await?.ok_or(AuthError::MissingToken)?;
        let token = strip_bearer(&header);
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }

        let credential = Credential::new(token);
        *slot = Some(credential.clone());
        tracing::info!("Case API credential updated");
        Ok(credential)
    }

    /// Drops the cached credential so the next caller logs in again.
    pub async fn invalidate(&self) {
        self.slot.lock().await.take();
    }
}

fn strip_bearer(header: &str) -> String {
    let header = header.trim();
    header
        .strip_prefix("Bearer ")
        .unwrap_or(header)
        .trim()
        .to_string()
}
