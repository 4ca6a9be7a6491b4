// Entry point of the court calendar bridge.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic, owns every trait seam)
// - `infra/` = Implementations of core traits (case API, Google, Telegram)
// - `http/` = The trigger endpoints (axum)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Start the optional periodic sync
// 4. Serve the trigger endpoints

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "http/http_layer.rs"]
mod http;
#[path = "infra/infra_layer.rs"]
mod infra;

mod config;

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use crate::config::{AppConfig, GoogleKey};
use crate::core::access::AccessService;
use crate::core::audit::AuditTrail;
use crate::core::briefing::BriefingService;
use crate::core::calendar::CalendarReconciler;
use crate::core::cases::CaseFetcher;
use crate::core::credentials::CredentialProvider;
use crate::core::notify::Notifier;
use crate::core::sync::{SyncError, SyncService, DEFAULT_WINDOW_DAYS};
use crate::http::AppState;
use crate::infra::case_api::CaseApiClient;
use crate::infra::google::{GoogleCalendarClient, GoogleSheetsStore, ServiceAccountAuth};
use crate::infra::telegram::TelegramClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env()?;
    tracing::info!(?config, "Configuration loaded");

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================

    // One client per process; the timeout applies to every outbound call.
    let http_client = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .build()
        .context("Failed to build HTTP client")?;

    let google_auth = Arc::new(match &config.google_key {
        GoogleKey::Inline(json) => ServiceAccountAuth::from_json(json, http_client.clone())?,
        GoogleKey::File(path) => ServiceAccountAuth::from_file(path, http_client.clone()).await?,
    });

    let case_api = Arc::new(CaseApiClient::new(
        http_client.clone(),
        config.api_url.clone(),
        config.api_user.clone(),
        config.api_pass.clone(),
    ));
    let credentials = Arc::new(CredentialProvider::with_seed(
        case_api.clone(),
        config.seed_token.clone(),
    ));
    let fetcher = Arc::new(CaseFetcher::new(case_api, credentials));

    let sheets = Arc::new(GoogleSheetsStore::new(
        http_client.clone(),
        google_auth.clone(),
        config.sheet_id.clone(),
    ));
    let calendar = Arc::new(GoogleCalendarClient::new(
        http_client.clone(),
        google_auth,
        config.calendar_id.clone(),
    ));

    let notifier = Arc::new(Notifier::new(sheets.clone(), Arc::new(TelegramClient::new(http_client))));
    let audit = Arc::new(AuditTrail::new(sheets.clone()));

    let sync_service = Arc::new(SyncService::new(
        fetcher.clone(),
        CalendarReconciler::new(calendar),
        notifier.clone(),
        audit.clone(),
    ));
    let briefing_service = Arc::new(BriefingService::new(fetcher, notifier));
    let access_service = Arc::new(AccessService::new(sheets, audit));

    if let Some(interval) = config.sync_interval {
        let sync = Arc::clone(&sync_service);
        tokio::spawn(async move {
            loop {
                tracing::info!("Starting scheduled sync");
                match sync.run_sync(DEFAULT_WINDOW_DAYS).await {
                    Ok(report) => tracing::info!(
                        added = report.summary.added,
                        updated = report.summary.updated,
                        errors = report.summary.errors,
                        "Scheduled sync finished"
                    ),
                    Err(SyncError::AlreadyRunning) => {
                        tracing::info!("Skipping scheduled sync, a run is already in progress")
                    }
                    Err(err) => tracing::error!("Scheduled sync failed: {}", err),
                }

                tokio::time::sleep(interval).await;
            }
        });
    }

    let app = http::build_router(AppState {
        sync: sync_service,
        briefing: briefing_service,
        access: access_service,
    });

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "Court calendar bridge listening");
    axum::serve(listener, app).await?;
    Ok(())
}
