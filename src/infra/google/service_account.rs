// Google service-account authentication.
//
// A service account signs a short-lived JWT with its private key and trades it
// at the key's `token_uri` for an OAuth2 access token. One authenticator is
// shared by the calendar and spreadsheet clients, so it asks for both scopes.
//
// **Environment Variables:**
// - `GOOGLE_CREDENTIALS` - The service account JSON content (for deployment)
// - `GOOGLE_SERVICE_ACCOUNT_KEY` - Path to the service account JSON file

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

const SCOPES: &str =
    "https://www.googleapis.com/auth/calendar https://www.googleapis.com/auth/spreadsheets";

/// Tokens are refreshed this long before Google says they expire.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum GoogleAuthError {
    #[error("Service account key is not readable: {0}")]
    Key(String),
    #[error("Token exchange failed: {0}")]
    Exchange(String),
}

/// Anything that can hand out a bearer token for Google APIs.
#[async_trait]
pub trait AccessTokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String, GoogleAuthError>;
}

/// Service account credentials from the JSON key file.
#[derive(Debug, Clone, Deserialize)]
struct ServiceAccountCredentials {
    client_email: String,
    private_key: String,
    token_uri: String,
}

/// JWT claims for Google OAuth2.
#[derive(Debug, Serialize)]
struct JwtClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: u64,
    /// At most one hour after `iat`.
    exp: u64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

struct CachedToken {
    token: String,
    expires_at: SystemTime,
}

/// Authenticator that handles OAuth2 with service account credentials.
pub struct ServiceAccountAuth {
    credentials: ServiceAccountCredentials,
    client: Client,
    cached_token: RwLock<Option<CachedToken>>,
}

impl ServiceAccountAuth {
    /// Creates a new authenticator from JSON key content.
    pub fn from_json(json: &str, client: Client) -> Result<Self, GoogleAuthError> {
        let credentials: ServiceAccountCredentials =
            serde_json::from_str(json).map_err(|e| GoogleAuthError::Key(e.to_string()))?;
        Ok(Self {
            credentials,
            client,
            cached_token: RwLock::new(None),
        })
    }

    /// Creates a new authenticator from a JSON key file path.
    pub async fn from_file(path: &str, client: Client) -> Result<Self, GoogleAuthError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| GoogleAuthError::Key(format!("{}: {}", path, e)))?;
        Self::from_json(&content, client)
    }

    async fn fetch_new_token(&self) -> Result<(String, Duration), GoogleAuthError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| GoogleAuthError::Exchange(e.to_string()))?
            .as_secs();

        let claims = JwtClaims {
            iss: self.credentials.client_email.clone(),
            scope: SCOPES.to_string(),
            aud: self.credentials.token_uri.clone(),
            iat: now,
            exp: now + 3600,
        };

        let key = EncodingKey::from_rsa_pem(self.credentials.private_key.as_bytes())
            .map_err(|e| GoogleAuthError::Key(e.to_string()))?;
        let jwt = encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| GoogleAuthError::Key(e.to_string()))?;

        let response = self
            .client
            .post(&self.credentials.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", &jwt),
            ])
            .send()
            .await
            .map_err(|e| GoogleAuthError::Exchange(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(GoogleAuthError::Exchange(format!("{}: {}", status, text)));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| GoogleAuthError::Exchange(e.to_string()))?;
        Ok((token.access_token, Duration::from_secs(token.expires_in)))
    }
}

#[async_trait]
impl AccessTokenSource for ServiceAccountAuth {
    /// Returns the cached token, refreshing it when it is about to expire.
    async fn access_token(&self) -> Result<String, GoogleAuthError> {
        {
            let cached = self.cached_token.read().await;
            if let Some(token) = cached.as_ref() {
                if token.expires_at > SystemTime::now() + EXPIRY_MARGIN {
                    return Ok(token.token.clone());
                }
            }
        }

        let mut cached = self.cached_token.write().await;
        // Another caller may have refreshed while we waited for the write lock.
        if let Some(token) = cached.as_ref() {
            if token.expires_at > SystemTime::now() + EXPIRY_MARGIN {
                return Ok(token.token.clone());
            }
        }

        tracing::debug!("Refreshing Google access token");
        let (token, lifetime) = self.fetch_new_token().await?;
        *cached = Some(CachedToken {
            token: token.clone(),
            expires_at: SystemTime::now() + lifetime,
        });
        Ok(token)
    }
}

/// A fixed token, for tests and local tooling.
#[cfg(test)]
pub struct StaticToken(pub &'static str);

#[cfg(test)]
#[async_trait]
impl AccessTokenSource for StaticToken {
    async fn access_token(&self) -> Result<String, GoogleAuthError> {
        Ok(self.0.to_string())
    }
}
