//! Turns one day's appointments into the text of its calendar summary entry.

use super::case_models::Appointment;
use crate::core::dates::{minutes_since_midnight, short_time, BusinessDate};

/// Fixed fragment in every generated title, used to find the entry again later.
pub const SUMMARY_MARKER: &str = "คดีวันนี้";

/// Shown in place of a missing appointment time.
pub const UNKNOWN_TIME: &str = "ไม่ระบุ";

/// Title and body of a day's summary entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaySummary {
    pub title: String,
    pub description: String,
}

/// Sorts appointments by time of day, keeping fetch order for equal times.
pub fn sort_chronologically(appointments: &mut [Appointment]) {
    appointments.sort_by_key(|a| minutes_since_midnight(&a.time));
}

/// Builds the summary for a non-empty day.
///
/// `updated_at` is appended verbatim as the "last updated" footer.
pub fn summarize(date: &BusinessDate, appointments: &[Appointment], updated_at: &str) -> DaySummary {
    let mut ordered = appointments.to_vec();
    sort_chronologically(&mut ordered);

    let mut description = format!(
        "สรุปรายการนัดหมายประจำวันที่ {}\n----------------------------\n",
        date.to_buddhist_string()
    );

    for (index, item) in ordered.iter().enumerate() {
        let time = short_time(&item.time).unwrap_or_else(|| UNKNOWN_TIME.to_string());
        description.push_str(&format!(
            "{}. {} ({})\n   ห้อง: {} | เวลา: {} น.\n\n",
            index + 1,
            item.case_id,
            item.reason,
            item.room,
            time
        ));
    }
    description.push_str(&format!("(Updated: {})", updated_at));

    DaySummary {
        title: format!("⚖️ {} {} คดี", SUMMARY_MARKER, ordered.len()),
        description,
    }
}
