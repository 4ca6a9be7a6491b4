// The core module contains all business logic.
// Each feature gets its own submodule; remote systems are reached only through
// the traits declared here and implemented in `infra`.

#[path = "dates/mod.rs"]
pub mod dates;

#[path = "credentials/mod.rs"]
pub mod credentials;

#[path = "cases/mod.rs"]
pub mod cases;

#[path = "calendar/mod.rs"]
pub mod calendar;

#[path = "sheets/mod.rs"]
pub mod sheets;

#[path = "notify/mod.rs"]
pub mod notify;

#[path = "audit/mod.rs"]
pub mod audit;

#[path = "access/mod.rs"]
pub mod access;

#[path = "sync/mod.rs"]
pub mod sync;

#[path = "briefing/mod.rs"]
pub mod briefing;

#[cfg(test)]
#[path = "testing/fakes.rs"]
pub mod testing;
