// The http module is the trigger surface: a thin axum adapter that maps core
// outcomes to JSON responses and status codes.

#[path = "routes.rs"]
pub mod routes;

pub use routes::{build_router, AppState};
