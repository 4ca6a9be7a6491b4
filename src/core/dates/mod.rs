pub mod business_date;

pub use business_date::{bangkok_timestamp, minutes_since_midnight, short_time, to_iso_date_range, BusinessDate};
