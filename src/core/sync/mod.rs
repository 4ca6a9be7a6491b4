pub mod sync_models;
pub mod sync_service;

pub use sync_models::{clamp_window, SyncError, SyncResult, DEFAULT_WINDOW_DAYS};
pub use sync_service::SyncService;
