use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use crate::core::access::{AccessError, AccessService};
use crate::core::briefing::{BriefingError, BriefingService};
use crate::core::sync::{clamp_window, SyncError, SyncService};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub sync: Arc<SyncService>,
    pub briefing: Arc<BriefingService>,
    pub access: Arc<AccessService>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/sync-cases", get(sync_default))
        // A static segment wins over `{days}`, so GET keeps the non-numeric rule here.
        .route("/sync-cases/cancel", get(sync_default).post(cancel_sync))
        .route("/sync-cases/{days}", get(sync_days))
        .route("/casetoday", get(case_today))
        .route("/judgeschedule", get(judge_schedule))
        .route("/api/authorize", post(authorize))
        .with_state(state)
}

/// JSON `{error}` body with a status code.
struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, Json(json!({ "error": self.1 }))).into_response()
    }
}

impl From<SyncError> for ApiError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::AlreadyRunning => ApiError(StatusCode::CONFLICT, err.to_string()),
            SyncError::Auth(_) => ApiError(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
        }
    }
}

async fn health() -> &'static str {
    "ok"
}

/// `GET /sync-cases`
async fn sync_default(State(state): State<AppState>) -> Result<Response, ApiError> {
    run_sync(&state, None).await
}

/// `GET /sync-cases/{days}`; anything that is not an integer means the default.
async fn sync_days(
    Path(days): Path<String>,
    State(state): State<AppState>,
) -> Result<Response, ApiError> {
    run_sync(&state, days.trim().parse::<i64>().ok()).await
}

async fn run_sync(state: &AppState, requested: Option<i64>) -> Result<Response, ApiError> {
    let days = clamp_window(requested);
    let report = state.sync.run_sync(days).await.map_err(|e| {
        tracing::error!("Sync request failed: {}", e);
        ApiError::from(e)
    })?;

    let message = if report.cancelled {
        "Sync cancelled"
    } else {
        "Sync completed"
    };
    Ok(Json(json!({
        "message": message,
        "days": report.days,
        "summary": report.summary,
        "cancelled": report.cancelled,
    }))
    .into_response())
}

/// `POST /sync-cases/cancel`
async fn cancel_sync(State(state): State<AppState>) -> Response {
    if state.sync.request_cancel() {
        tracing::info!("Sync cancellation requested");
        (StatusCode::ACCEPTED, Json(json!({ "cancelling": true }))).into_response()
    } else {
        Json(json!({ "cancelling": false, "message": "No sync in progress" })).into_response()
    }
}

const CONFIG_MISSING: &str = "Telegram config missing in Sheet";

/// `GET /casetoday`
async fn case_today(State(state): State<AppState>) -> Result<Response, ApiError> {
    let count = state.briefing.notify_today().await.map_err(|e| {
        tracing::error!("Today notification failed: {}", e);
        let message = match e {
            BriefingError::NotConfigured => CONFIG_MISSING.to_string(),
            other => other.to_string(),
        };
        ApiError(StatusCode::INTERNAL_SERVER_ERROR, message)
    })?;

    Ok(Json(json!({ "success": true, "count": count })).into_response())
}

/// `GET /judgeschedule`
async fn judge_schedule(State(state): State<AppState>) -> Result<Response, ApiError> {
    let report = state.briefing.notify_duty_judge().await.map_err(|e| {
        let message = match e {
            BriefingError::NotConfigured => CONFIG_MISSING,
            _ => "Failed to fetch judge schedule",
        };
        ApiError(StatusCode::INTERNAL_SERVER_ERROR, message.to_string())
    })?;

    Ok(Json(json!({
        "success": true,
        "date": report.date.to_buddhist_string(),
        "judge": report.judge,
    }))
    .into_response())
}

#[derive(Debug, Deserialize)]
struct AuthorizeRequest {
    #[serde(default)]
    email: String,
}

/// `POST /api/authorize`; the caller has already verified the email's owner.
async fn authorize(
    State(state): State<AppState>,
    Json(body): Json<AuthorizeRequest>,
) -> Result<Response, ApiError> {
    let email = state.access.authorize(&body.email).await.map_err(|e| match e {
        AccessError::MissingEmail => ApiError(StatusCode::BAD_REQUEST, e.to_string()),
        AccessError::Forbidden => ApiError(StatusCode::FORBIDDEN, "Access Denied".to_string()),
    })?;

    Ok(Json(json!({ "success": true, "email": email })).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::audit::AuditTrail;
    use crate::core::calendar::CalendarReconciler;
    use crate::core::cases::CaseFetcher;
    use crate::core::credentials::CredentialProvider;
    use crate::core::notify::Notifier;
    use crate::core::testing::{FakeCalendar, FakeCaseApi, FakeChat, FakeSheets};
    use axum::body::Body;
    use axum::http::Request;
    use std::time::Duration;
    use tower::ServiceExt;

    struct TestApp {
        api: Arc<FakeCaseApi>,
        sheets: Arc<FakeSheets>,
        router: Router,
    }

    fn app() -> TestApp {
        let api = Arc::new(FakeCaseApi::new());
        let sheets = Arc::new(FakeSheets::new());
        let chat = Arc::new(FakeChat::new());

        let credentials = Arc::new(CredentialProvider::new(api.clone()));
        let fetcher = Arc::new(CaseFetcher::new(api.clone(), credentials));
        let notifier = Arc::new(Notifier::new(sheets.clone(), chat));
        let audit = Arc::new(AuditTrail::new(sheets.clone()));

        let state = AppState {
            sync: Arc::new(SyncService::new(
                fetcher.clone(),
                CalendarReconciler::new(Arc::new(FakeCalendar::new())),
                notifier.clone(),
                audit.clone(),
            )),
            briefing: Arc::new(BriefingService::new(fetcher, notifier)),
            access: Arc::new(AccessService::new(sheets.clone(), audit)),
        };

        TestApp {
            api,
            sheets,
            router: build_router(state),
        }
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = app();
        let response = app.router.clone().oneshot(get_req("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_sync_window_parsing() {
        let app = app();

        let (status, body) = send(&app.router, get_req("/sync-cases/3")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["days"], 3);
        assert_eq!(body["cancelled"], false);
        assert_eq!(body["summary"]["errors"], 0);

        let (_, body) = send(&app.router, get_req("/sync-cases/abc")).await;
        assert_eq!(body["days"], 7);

        let (status, body) = send(&app.router, get_req("/sync-cases/cancel")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["days"], 7);

        let (_, body) = send(&app.router, get_req("/sync-cases")).await;
        assert_eq!(body["days"], 7);

        let (_, body) = send(&app.router, get_req("/sync-cases/500")).await;
        assert_eq!(body["days"], 90);

        let (_, body) = send(&app.router, get_req("/sync-cases/-5")).await;
        assert_eq!(body["days"], 1);
    }

    #[tokio::test]
    async fn test_sync_credential_failure_is_500() {
        let app = app();
        app.api.fail_login("connection refused");

        let (status, body) = send(&app.router, get_req("/sync-cases/2")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("Cannot connect to Case System API"));
    }

    #[tokio::test]
    async fn test_overlapping_sync_is_409() {
        let app = app();
        app.api.set_search_delay(Duration::from_millis(200));

        let router = app.router.clone();
        let first = tokio::spawn(async move { send(&router, get_req("/sync-cases/1")).await });
        tokio::time::sleep(Duration::from_millis(50)).await;

        let (status, _) = send(&app.router, get_req("/sync-cases/1")).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = first.await.unwrap();
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_cancel_without_run() {
        let app = app();
        let (status, body) = send(&app.router, post_json("/sync-cases/cancel", json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["cancelling"], false);
    }

    #[tokio::test]
    async fn test_casetoday_without_config_is_500() {
        let app = app();
        let (status, body) = send(&app.router, get_req("/casetoday")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Telegram config missing in Sheet");
    }

    #[tokio::test]
    async fn test_casetoday_reports_count() {
        let app = app();
        app.sheets.set_config("TELEGRAM_TOKEN", "t");
        app.sheets.set_config("CHAT_ID", "1");

        let (status, body) = send(&app.router, get_req("/casetoday")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true, "count": 0 }));
    }

    #[tokio::test]
    async fn test_judgeschedule_failure_is_500() {
        let app = app();
        app.api.fail_pool("No schedule data from API");

        let (status, body) = send(&app.router, get_req("/judgeschedule")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to fetch judge schedule");
    }

    #[tokio::test]
    async fn test_judgeschedule_without_config_is_500() {
        let app = app();
        app.api.set_pool(Vec::new());

        let (status, body) = send(&app.router, get_req("/judgeschedule")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Telegram config missing in Sheet");
    }

    #[tokio::test]
    async fn test_authorize() {
        let app = app();
        app.sheets.allow_email("clerk@court.go.th");

        let (status, body) =
            send(&app.router, post_json("/api/authorize", json!({ "email": "Clerk@Court.go.th" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], "clerk@court.go.th");

        let (status, _) =
            send(&app.router, post_json("/api/authorize", json!({ "email": "someone@else.com" }))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = send(&app.router, post_json("/api/authorize", json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        assert_eq!(app.sheets.audit_rows().len(), 1);
    }
}
