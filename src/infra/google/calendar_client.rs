//! Google Calendar v3 implementation of [`CalendarService`].

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use super::service_account::AccessTokenSource;
use crate::core::calendar::{AllDayDraft, CalendarEntry, CalendarError, CalendarService, EntryTime};

pub const GOOGLE_CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

pub struct GoogleCalendarClient {
    client: Client,
    auth: Arc<dyn AccessTokenSource>,
    base_url: String,
    calendar_id: String,
}

impl GoogleCalendarClient {
    pub fn new(client: Client, auth: Arc<dyn AccessTokenSource>, calendar_id: impl Into<String>) -> Self {
        Self {
            client,
            auth,
            base_url: GOOGLE_CALENDAR_API_BASE.to_string(),
            calendar_id: calendar_id.into(),
        }
    }

    #[cfg(test)]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// `{base}/calendars/{id}/events[/{event_id}]` with each segment escaped.
    fn events_url(&self, event_id: Option<&str>) -> Result<Url, CalendarError> {
        let mut url = Url::parse(&self.base_url).map_err(|e| CalendarError::Api(e.to_string()))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| CalendarError::Api(format!("Unusable base URL: {}", self.base_url)))?;
            segments.pop_if_empty().extend(["calendars", self.calendar_id.as_str(), "events"]);
            if let Some(id) = event_id {
                segments.push(id);
            }
        }
        Ok(url)
    }

    async fn token(&self) -> Result<String, CalendarError> {
        self.auth
            .access_token()
            .await
            .map_err(|e| CalendarError::Auth(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct EventList {
    #[serde(default)]
    items: Vec<GoogleEvent>,
}

#[derive(Debug, Deserialize)]
struct GoogleEvent {
    id: String,
    summary: Option<String>,
    start: Option<EventDateTime>,
    end: Option<EventDateTime>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct EventDateTime {
    #[serde(skip_serializing_if = "Option::is_none")]
    date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    date_time: Option<DateTime<Utc>>,
}

impl EventDateTime {
    fn into_entry_time(self) -> Option<EntryTime> {
        match (self.date, self.date_time) {
            (Some(date), _) => Some(EntryTime::AllDay(date)),
            (None, Some(at)) => Some(EntryTime::Timed(at)),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Serialize)]
struct AllDayBody<'a> {
    summary: &'a str,
    description: &'a str,
    start: EventDateTime,
    end: EventDateTime,
}

impl<'a> From<&'a AllDayDraft> for AllDayBody<'a> {
    fn from(draft: &'a AllDayDraft) -> Self {
        Self {
            summary: &draft.title,
            description: &draft.description,
            start: EventDateTime {
                date: Some(draft.start),
                date_time: None,
            },
            end: EventDateTime {
                date: Some(draft.end),
                date_time: None,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreatedEvent {
    id: String,
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, CalendarError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
    Err(CalendarError::Api(format!("Google API error ({}): {}", status, text)))
}

#[async_trait]
impl CalendarService for GoogleCalendarClient {
    async fn find_entries(
        &self,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
        query: &str,
    ) -> Result<Vec<CalendarEntry>, CalendarError> {
        let token = self.token().await?;
        let response = self
            .client
            .get(self.events_url(None)?)
            .bearer_auth(token)
            .query(&[
                ("timeMin", time_min.to_rfc3339_opts(SecondsFormat::Millis, true)),
                ("timeMax", time_max.to_rfc3339_opts(SecondsFormat::Millis, true)),
                ("q", query.to_string()),
                ("singleEvents", "true".to_string()),
            ])
            .send()
            .await
            .map_err(|e| CalendarError::Api(format!("Google API request failed: {}", e)))?;

        let list: EventList = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| CalendarError::Api(format!("Failed to parse Google response: {}", e)))?;

        Ok(list
            .items
            .into_iter()
            .map(|event| CalendarEntry {
                id: event.id,
                title: event.summary.unwrap_or_default(),
                start: event.start.and_then(EventDateTime::into_entry_time),
                end: event.end.and_then(EventDateTime::into_entry_time),
            })
            .collect())
    }

    async fn insert_all_day(&self, draft: &AllDayDraft) -> Result<String, CalendarError> {
        let token = self.token().await?;
        let response = self
            .client
            .post(self.events_url(None)?)
            .bearer_auth(token)
            .json(&AllDayBody::from(draft))
            .send()
            .await
            .map_err(|e| CalendarError::Api(format!("Google API request failed: {}", e)))?;

        let created: CreatedEvent = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| CalendarError::Api(format!("Failed to parse Google response: {}", e)))?;
        Ok(created.id)
    }

    async fn update_all_day(&self, entry_id: &str, draft: &AllDayDraft) -> Result<(), CalendarError> {
        let token = self.token().await?;
        let response = self
            .client
            .put(self.events_url(Some(entry_id))?)
            .bearer_auth(token)
            .json(&AllDayBody::from(draft))
            .send()
            .await
            .map_err(|e| CalendarError::Api(format!("Google API request failed: {}", e)))?;

        check_status(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::google::service_account::StaticToken;
    use chrono::TimeZone;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer, calendar_id: &str) -> GoogleCalendarClient {
        GoogleCalendarClient::new(Client::new(), Arc::new(StaticToken("cal-token")), calendar_id)
            .with_base_url(server.uri())
    }

    fn draft() -> AllDayDraft {
        AllDayDraft {
            title: "⚖️ คดีวันนี้ 2 คดี".to_string(),
            description: "body".to_string(),
            start: NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
            end: NaiveDate::from_ymd_opt(2026, 10, 17).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_find_entries_sends_window_and_parses_items() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/calendars/court@group.calendar.google.com/events"))
            .and(header("authorization", "Bearer cal-token"))
            .and(query_param("timeMin", "2026-10-16T00:00:00.000Z"))
            .and(query_param("timeMax", "2026-10-16T23:59:59.000Z"))
            .and(query_param("q", "คดีวันนี้"))
            .and(query_param("singleEvents", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [
                    {
                        "id": "evt-1",
                        "summary": "⚖️ คดีวันนี้ 3 คดี",
                        "start": {"date": "2026-10-16"},
                        "end": {"date": "2026-10-17"}
                    },
                    {
                        "id": "evt-2",
                        "start": {"dateTime": "2026-10-16T02:00:00Z"},
                        "end": {"dateTime": "2026-10-16T03:00:00Z"}
                    }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let start = Utc.with_ymd_and_hms(2026, 10, 16, 0, 0, 0).unwrap();
        let entries = client(&server, "court@group.calendar.google.com")
            .find_entries(start, start + chrono::Duration::seconds(86_399), "คดีวันนี้")
            .await
            .unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "⚖️ คดีวันนี้ 3 คดี");
        assert_eq!(
            entries[0].start,
            Some(EntryTime::AllDay(NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()))
        );
        assert_eq!(entries[1].title, "");
        assert!(matches!(entries[1].start, Some(EntryTime::Timed(_))));
    }

    #[tokio::test]
    async fn test_insert_posts_all_day_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/calendars/primary/events"))
            .and(body_json(serde_json::json!({
                "summary": "⚖️ คดีวันนี้ 2 คดี",
                "description": "body",
                "start": {"date": "2026-10-16"},
                "end": {"date": "2026-10-17"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "new-1"})))
            .mount(&server)
            .await;

        let id = client(&server, "primary").insert_all_day(&draft()).await.unwrap();
        assert_eq!(id, "new-1");
    }

    #[tokio::test]
    async fn test_update_puts_to_event_path() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/calendars/primary/events/evt-9"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "evt-9"})))
            .expect(1)
            .mount(&server)
            .await;

        client(&server, "primary").update_all_day("evt-9", &draft()).await.unwrap();
    }

    #[tokio::test]
    async fn test_reconciler_updates_the_entry_dated_on_its_day() {
        use crate::core::calendar::{CalendarReconciler, UpsertOutcome};
        use crate::core::cases::DaySummary;
        use crate::core::dates::BusinessDate;

        let server = MockServer::start().await;
        // A Bangkok calendar returns tomorrow's entry for today's UTC window, listed first.
        Mock::given(method("GET"))
            .and(path("/calendars/primary/events"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [
                    {
                        "id": "evt-tomorrow",
                        "summary": "⚖️ คดีวันนี้ 5 คดี",
                        "start": {"date": "2026-10-17"},
                        "end": {"date": "2026-10-18"}
                    },
                    {
                        "id": "evt-today",
                        "summary": "⚖️ คดีวันนี้ 1 คดี",
                        "start": {"date": "2026-10-16"},
                        "end": {"date": "2026-10-17"}
                    }
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/calendars/primary/events/evt-today"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "evt-today"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/calendars/primary/events/evt-tomorrow"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let reconciler = CalendarReconciler::new(Arc::new(client(&server, "primary")));
        let date = BusinessDate::parse_buddhist("16/10/2569").unwrap();
        let summary = DaySummary {
            title: "⚖️ คดีวันนี้ 2 คดี".to_string(),
            description: "body".to_string(),
        };

        let outcome = reconciler.upsert_daily_summary(&date, &summary).await.unwrap();

        assert_eq!(
            outcome,
            UpsertOutcome::Updated {
                entry_id: "evt-today".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("Rate Limit Exceeded"))
            .mount(&server)
            .await;

        let err = client(&server, "primary").insert_all_day(&draft()).await.unwrap_err();
        assert!(matches!(err, CalendarError::Api(msg) if msg.contains("403") && msg.contains("Rate Limit")));
    }
}
