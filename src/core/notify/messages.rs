//! Chat message templates.
//!
//! Messages are sent with Telegram's HTML parse mode, so every value that came
//! from a remote system goes through [`escape_html`] first.

use crate::core::cases::{sort_chronologically, Appointment, UNKNOWN_TIME};
use crate::core::dates::{short_time, BusinessDate};
use crate::core::sync::SyncResult;

const RULE: &str = "--------------------------------";

/// Escapes the three characters Telegram's HTML mode treats as markup.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Today's hearing list for the stakeholder chat.
pub fn format_today_message(date: &BusinessDate, appointments: &[Appointment]) -> String {
    let mut message = format!(
        "📅 <b>รายการนัดพิจารณาประจำวัน</b>\n{}\n{}\n",
        date.to_thai_long_string(),
        RULE
    );

    if appointments.is_empty() {
        message.push_str("✅ <i>ไม่มีนัดพิจารณาคดีในวันนี้</i>");
        return message;
    }

    let mut ordered = appointments.to_vec();
    sort_chronologically(&mut ordered);

    for (index, item) in ordered.iter().enumerate() {
        let time = short_time(&item.time).unwrap_or_else(|| UNKNOWN_TIME.to_string());
        message.push_str(&format!(
            "<b>{}. {}</b>\n   🕒 {} น. | 🏛️ ห้อง {}\n   📝 {}\n\n",
            index + 1,
            escape_html(&item.case_id),
            escape_html(&time),
            escape_html(&item.room),
            escape_html(&item.reason)
        ));
    }
    message.push_str(&format!(
        "{}\nรวมทั้งหมด: <b>{}</b> คดี",
        RULE,
        ordered.len()
    ));
    message
}

/// Run report for the admin chat.
pub fn format_sync_report(days: u32, result: &SyncResult, cancelled: bool, finished_at: &str) -> String {
    let mut message = format!(
        "🔄 <b>สรุปผลการซิงค์ข้อมูล ({} วัน)</b>\n{}\n✅ เพิ่ม: <b>{}</b> วัน | ✏️ ปรับปรุง: <b>{}</b> วัน\n⚠️ Error: <b>{}</b>\n",
        days, RULE, result.added, result.updated, result.errors
    );
    if cancelled {
        message.push_str(&format!("⏹️ ยกเลิก: <b>{}</b> วัน\n", result.skipped));
    }
    message.push_str(&format!("⏰ เวลา: {}", finished_at));
    message
}

/// Duty judge announcement; `judge` is `None` when the rota has no entry.
pub fn format_duty_judge(date: &BusinessDate, judge: Option<&str>) -> String {
    let header = format!(
        "⚖️ <b>เวรชี้ประจำวันที่ {}</b>\n{}\n",
        date.to_buddhist_string(),
        RULE
    );
    match judge {
        Some(name) => format!("{}👨‍⚖️ <b>{}</b>", header, escape_html(name)),
        None => format!("{}❌ <i>ไม่พบข้อมูลเวรชี้ในระบบ</i>", header),
    }
}

pub fn format_duty_judge_error(error: &str) -> String {
    format!("⚠️ <b>Error เช็คเวรชี้:</b>\n{}", escape_html(error))
}
