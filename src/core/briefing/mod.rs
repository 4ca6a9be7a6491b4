pub mod briefing_service;

pub use briefing_service::{BriefingError, BriefingService};
