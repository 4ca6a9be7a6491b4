// Business-date arithmetic.
//
// The case API keys everything by a Buddhist-era `DD/MM/YYYY` string while the
// calendar wants Gregorian `YYYY-MM-DD` all-day boundaries. Both encodings are
// derived from one `BusinessDate` so they can never drift apart.

use chrono::{DateTime, Datelike, Days, NaiveDate, Utc, Weekday};
use chrono_tz::Asia::Bangkok;
use thiserror::Error;

/// Years between the Gregorian and the Thai Buddhist calendar.
pub const BUDDHIST_ERA_OFFSET: i32 = 543;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateError {
    #[error("Invalid Buddhist-era date '{0}', expected DD/MM/YYYY")]
    InvalidBuddhistDate(String),
}

/// One solar day, viewable in both calendar systems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BusinessDate(NaiveDate);

impl BusinessDate {
    pub fn from_gregorian(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Today as seen by the court, which always runs on Bangkok time.
    pub fn today() -> Self {
        Self(Utc::now().with_timezone(&Bangkok).date_naive())
    }

    /// Parses the case API's `DD/MM/YYYY` Buddhist-era key.
    pub fn parse_buddhist(value: &str) -> Result<Self, DateError> {
        let invalid = || DateError::InvalidBuddhistDate(value.to_string());

        let mut parts = value.trim().split('/');
        let (Some(day), Some(month), Some(year), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };

        let day: u32 = day.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        let year: i32 = year.parse().map_err(|_| invalid())?;

        NaiveDate::from_ymd_opt(year - BUDDHIST_ERA_OFFSET, month, day)
            .map(Self)
            .ok_or_else(invalid)
    }

    pub fn gregorian(&self) -> NaiveDate {
        self.0
    }

    pub fn buddhist_year(&self) -> i32 {
        self.0.year() + BUDDHIST_ERA_OFFSET
    }

    /// The date `days` later, or `None` past the end of chrono's range.
    pub fn plus_days(&self, days: u32) -> Option<Self> {
        self.0.checked_add_days(Days::new(u64::from(days))).map(Self)
    }

    /// `DD/MM/YYYY` with the Buddhist-era year.
    pub fn to_buddhist_string(&self) -> String {
        to_buddhist_date_string(self.0)
    }

    /// `YYYY-MM-DD` in the Gregorian calendar.
    pub fn to_iso_string(&self) -> String {
        self.0.format("%Y-%m-%d").to_string()
    }

    /// `[start, end)` dates for an all-day calendar entry covering this day.
    pub fn all_day_range(&self) -> (NaiveDate, NaiveDate) {
        let end = self.0.succ_opt().unwrap_or(self.0);
        (self.0, end)
    }

    /// Long Thai rendering, e.g. `วันศุกร์ที่ 16 ตุลาคม พ.ศ. 2569`.
    pub fn to_thai_long_string(&self) -> String {
        format!(
            "วัน{}ที่ {} {} พ.ศ. {}",
            thai_weekday(self.0.weekday()),
            self.0.day(),
            THAI_MONTHS[self.0.month0() as usize],
            self.buddhist_year()
        )
    }
}

impl std::fmt::Display for BusinessDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_buddhist_string())
    }
}

/// Gregorian date to the case API's `DD/MM/YYYY` key.
pub fn to_buddhist_date_string(date: NaiveDate) -> String {
    format!(
        "{:02}/{:02}/{}",
        date.day(),
        date.month(),
        date.year() + BUDDHIST_ERA_OFFSET
    )
}

/// Buddhist-era key to an end-exclusive ISO pair for an all-day entry.
pub fn to_iso_date_range(buddhist: &str) -> Result<(String, String), DateError> {
    let (start, end) = BusinessDate::parse_buddhist(buddhist)?.all_day_range();
    Ok((
        start.format("%Y-%m-%d").to_string(),
        end.format("%Y-%m-%d").to_string(),
    ))
}

/// Minutes since midnight for an appointment time such as `09.30.00`.
///
/// The case API has been seen to send both `.` and `:` separators. Anything that
/// does not parse as a valid hour and minute yields 0, so malformed times sort
/// to the front of the day instead of failing it.
pub fn minutes_since_midnight(time: &str) -> u32 {
    let mut parts = time.trim().split(['.', ':']);
    let hours = parts.next().and_then(|h| h.trim().parse::<u32>().ok());
    let minutes = parts.next().and_then(|m| m.trim().parse::<u32>().ok());

    match (hours, minutes) {
        (Some(h), Some(m)) if h < 24 && m < 60 => h * 60 + m,
        _ => 0,
    }
}

/// `HH.MM` prefix of an appointment time, `None` when the API sent nothing.
pub fn short_time(time: &str) -> Option<String> {
    let trimmed = time.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.chars().take(5).collect())
    }
}

/// `DD/MM/YYYY HH:MM:SS` in Bangkok local time with a Buddhist-era year.
pub fn bangkok_timestamp(at: DateTime<Utc>) -> String {
    let local = at.with_timezone(&Bangkok);
    format!(
        "{:02}/{:02}/{} {}",
        local.day(),
        local.month(),
        local.year() + BUDDHIST_ERA_OFFSET,
        local.format("%H:%M:%S")
    )
}

const THAI_MONTHS: [&str; 12] = [
    "มกราคม",
    "กุมภาพันธ์",
    "มีนาคม",
    "เมษายน",
    "พฤษภาคม",
    "มิถุนายน",
    "กรกฎาคม",
    "สิงหาคม",
    "กันยายน",
    "ตุลาคม",
    "พฤศจิกายน",
    "ธันวาคม",
];

fn thai_weekday(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "จันทร์",
        Weekday::Tue => "อังคาร",
        Weekday::Wed => "พุธ",
        Weekday::Thu => "พฤหัสบดี",
        Weekday::Fri => "ศุกร์",
        Weekday::Sat => "เสาร์",
        Weekday::Sun => "อาทิตย์",
    }
}
