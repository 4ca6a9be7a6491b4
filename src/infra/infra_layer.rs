// The infra module contains implementations of core traits.
// Each remote system gets its own submodule.

#[path = "case_api/mod.rs"]
pub mod case_api;

#[path = "google/mod.rs"]
pub mod google;

#[path = "telegram/mod.rs"]
pub mod telegram;
