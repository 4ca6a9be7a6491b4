pub mod calendar_models;
pub mod reconciler;

pub use calendar_models::{AllDayDraft, CalendarEntry, CalendarError, CalendarService, EntryTime};
pub use reconciler::{CalendarReconciler, UpsertOutcome};
