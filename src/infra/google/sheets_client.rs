//! Google Sheets v4 store backing the config, whitelist and audit ports.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;

use super::service_account::AccessTokenSource;
use crate::core::sheets::{
    config_from_rows, emails_from_rows, AllowedEmailSource, AuditLog, AuditRecord, ConfigSource,
    SheetError,
};

pub const GOOGLE_SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4";

const CONFIG_RANGE: &str = "Config!A2:B";
const USERS_RANGE: &str = "Users!A2:A";
const LOGS_RANGE: &str = "Logs!A:G";

pub struct GoogleSheetsStore {
    client: Client,
    auth: Arc<dyn AccessTokenSource>,
    base_url: String,
    spreadsheet_id: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

impl GoogleSheetsStore {
    pub fn new(client: Client, auth: Arc<dyn AccessTokenSource>, spreadsheet_id: impl Into<String>) -> Self {
        Self {
            client,
            auth,
            base_url: GOOGLE_SHEETS_API_BASE.to_string(),
            spreadsheet_id: spreadsheet_id.into(),
        }
    }

    #[cfg(test)]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// `{base}/spreadsheets/{id}/values/{range}` plus an optional `:verb` suffix.
    fn values_url(&self, range: &str, verb: Option<&str>) -> Result<Url, SheetError> {
        let mut url = Url::parse(&self.base_url).map_err(|e| SheetError::Api(e.to_string()))?;
        let last = match verb {
            Some(verb) => format!("{}:{}", range, verb),
            None => range.to_string(),
        };
        url.path_segments_mut()
            .map_err(|_| SheetError::Api(format!("Unusable base URL: {}", self.base_url)))?
            .pop_if_empty()
            .extend(["spreadsheets", self.spreadsheet_id.as_str(), "values", last.as_str()]);
        Ok(url)
    }

    async fn token(&self) -> Result<String, SheetError> {
        self.auth
            .access_token()
            .await
            .map_err(|e| SheetError::Auth(e.to_string()))
    }

    async fn read_range(&self, range: &str) -> Result<Vec<Vec<String>>, SheetError> {
        let token = self.token().await?;
        let response = self
            .client
            .get(self.values_url(range, None)?)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| SheetError::Api(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(SheetError::Api(format!("{} ({}): {}", range, status, text)));
        }

        let body: ValueRange = response
            .json()
            .await
            .map_err(|e| SheetError::Api(format!("Failed to parse {}: {}", range, e)))?;
        Ok(body.values)
    }
}

#[async_trait]
impl ConfigSource for GoogleSheetsStore {
    async fn read_config(&self) -> Result<HashMap<String, String>, SheetError> {
        Ok(config_from_rows(&self.read_range(CONFIG_RANGE).await?))
    }
}

#[async_trait]
impl AllowedEmailSource for GoogleSheetsStore {
    async fn allowed_emails(&self) -> Result<BTreeSet<String>, SheetError> {
        Ok(emails_from_rows(&self.read_range(USERS_RANGE).await?))
    }
}

#[async_trait]
impl AuditLog for GoogleSheetsStore {
    async fn append(&self, record: AuditRecord) -> Result<(), SheetError> {
        let token = self.token().await?;
        let response = self
            .client
            .post(self.values_url(LOGS_RANGE, Some("append"))?)
            .bearer_auth(token)
            .query(&[("valueInputOption", "RAW")])
            .json(&serde_json::json!({ "values": [record.into_row()] }))
            .send()
            .await
            .map_err(|e| SheetError::Api(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(SheetError::Api(format!("append ({}): {}", status, text)));
        }
        Ok(())
    }
}
