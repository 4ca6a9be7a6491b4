use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::core::cases::{
    ActiveJudge, Appointment, CaseApi, CaseError, DutyPoolEntry, FetchOutcome, SEARCH_PAGE_LIMIT,
};
use crate::core::credentials::{AuthError, CaseLogin, Credential};

const LOGIN_PATH: &str = "/jvncUser/api/v1/users/login";
const SEARCH_PATH: &str =
    "/jvncProceed/api/v1/proceed/searchElectronicAppointDateByCase/search?version=1";
const JUDGES_PATH: &str = "/jvncLookup/api/v1/judges/listAllActivedWork?version=1";

/// `judgeStatus` value for a sitting judge.
const ACTIVE_JUDGE_STATUS: i64 = 1;

/// Phrases the search endpoint uses when a date simply has no hearings.
const NOT_FOUND_MARKERS: [&str; 2] = ["ไม่พบข้อมูล", "not found"];

/// HTTP client for the court's case management API.
pub struct CaseApiClient {
    client: Client,
    base_url: String,
    username: String,
    password: String,
}

impl CaseApiClient {
    pub fn new(client: Client, base_url: impl Into<String>, username: String, password: String) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            username,
            password,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_envelope<T>(&self, url: &str, credential: &Credential) -> Result<Envelope<T>, CaseError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let response = self
            .client
            .get(url)
            .bearer_auth(credential.as_str())
            .send()
            .await
            .map_err(|e| CaseError::Api(e.without_url().to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(CaseError::Unauthorized(status.to_string()));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(CaseError::Api(format!("{}: {}", status, text)));
        }

        response
            .json()
            .await
            .map_err(|e| CaseError::Api(format!("Unexpected response: {}", e)))
    }
}

#[derive(Debug, Serialize)]
struct LoginBody<'a> {
    version: u32,
    name: &'a str,
    passwords: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchBody<'a> {
    version: u32,
    appoint_date: &'a str,
    offset: u32,
    limit: u32,
}

/// Common `{success, message, data}` wrapper of every response.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: Option<bool>,
    message: Option<String>,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiAppointment {
    full_case_id: Option<String>,
    reason_name: Option<String>,
    room_name: Option<String>,
    appoint_time: Option<String>,
    appoint_date: Option<String>,
}

impl From<ApiAppointment> for Appointment {
    fn from(api: ApiAppointment) -> Self {
        Appointment {
            case_id: api.full_case_id.unwrap_or_default(),
            reason: api.reason_name.unwrap_or_default(),
            room: api.room_name.unwrap_or_default(),
            time: api.appoint_time.unwrap_or_default(),
            appoint_date: api.appoint_date.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiJudge {
    id: i64,
    judge_name: Option<String>,
    judge_status: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiPoolEntry {
    pool_date: String,
    judge_id: i64,
}

fn is_not_found(message: &str) -> bool {
    let lowered = message.to_lowercase();
    NOT_FOUND_MARKERS.iter().any(|marker| lowered.contains(marker))
}

/// Turns a search response into an outcome.
///
/// The endpoint reports "no hearings" as a failure, sometimes with a non-2xx
/// status, so the envelope is checked before the status.
fn classify_search(status: StatusCode, body: &str) -> Result<FetchOutcome, CaseError> {
    let envelope: Envelope<Vec<ApiAppointment>> = match serde_json::from_str(body) {
        Ok(envelope) => envelope,
        Err(e) if status.is_success() => {
            return Err(CaseError::Api(format!("Unexpected search response: {}", e)))
        }
        Err(_) => return Err(CaseError::Api(format!("{}: {}", status, body))),
    };

    if envelope.success == Some(false) {
        let message = envelope.message.unwrap_or_default();
        if is_not_found(&message) {
            return Ok(FetchOutcome::Empty);
        }
        return Err(CaseError::Api(format!("{}: {}", status, message)));
    }
    if !status.is_success() {
        return Err(CaseError::Api(format!("{}: {}", status, body)));
    }

    let appointments = envelope
        .data
        .unwrap_or_default()
        .into_iter()
        .map(Appointment::from)
        .collect();
    Ok(FetchOutcome::from_list(appointments))
}

#[async_trait]
impl CaseLogin for CaseApiClient {
    async fn login(&self) -> Result<Option<String>, AuthError> {
        let response = self
            .client
            .post(self.url(LOGIN_PATH))
            .json(&LoginBody {
                version: 1,
                name: &self.username,
                passwords: &self.password,
            })
            .send()
            .await
            .map_err(|e| AuthError::Login(e.without_url().to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::Login(response.status().to_string()));
        }

        Ok(response
            .headers()
            .get(reqwest::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string))
    }
}

#[async_trait]
impl CaseApi for CaseApiClient {
    async fn search_appointments(
        &self,
        appoint_date: &str,
        credential: &Credential,
    ) -> Result<FetchOutcome, CaseError> {
        let response = self
            .client
            .post(self.url(SEARCH_PATH))
            .bearer_auth(credential.as_str())
            .json(&SearchBody {
                version: 1,
                appoint_date,
                offset: 0,
                limit: SEARCH_PAGE_LIMIT,
            })
            .send()
            .await
            .map_err(|e| CaseError::Api(e.without_url().to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(CaseError::Unauthorized(status.to_string()));
        }
        let body = response
            .text()
            .await
            .map_err(|e| CaseError::Api(e.without_url().to_string()))?;

        classify_search(status, &body)
    }

    async fn list_active_judges(&self, credential: &Credential) -> Result<Vec<ActiveJudge>, CaseError> {
        let envelope: Envelope<Vec<ApiJudge>> =
            self.get_envelope(&self.url(JUDGES_PATH), credential).await?;

        Ok(envelope
            .data
            .unwrap_or_default()
            .into_iter()
            .filter(|judge| judge.judge_status == Some(ACTIVE_JUDGE_STATUS))
            .map(|judge| ActiveJudge {
                id: judge.id,
                name: judge.judge_name.unwrap_or_default(),
            })
            .collect())
    }

    async fn duty_pool(
        &self,
        month: u32,
        year: i32,
        credential: &Credential,
    ) -> Result<Vec<DutyPoolEntry>, CaseError> {
        let url = self.url(&format!(
            "/jvncManager/api/v1/managerjudgepool/judgeschedule/{:02}/{}/0?version=1.0&offset=0&limit=100",
            month, year
        ));
        let envelope: Envelope<Vec<ApiPoolEntry>> = self.get_envelope(&url, credential).await?;

        let pool = envelope
            .data
            .ok_or_else(|| CaseError::Api("No schedule data from API".to_string()))?;
        Ok(pool
            .into_iter()
            .map(|entry| DutyPoolEntry {
                pool_date: entry.pool_date,
                judge_id: entry.judge_id,
            })
            .collect())
    }
}
