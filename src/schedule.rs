//! Weekday working-hours window in which the device is managed at all.

use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc, Weekday};
use chrono_tz::Tz;

pub const FIRST_ACTIVE_HOUR: u32 = 5;
pub const LAST_ACTIVE_HOUR: u32 = 16;

/// True Monday to Friday from 05:00 until 16:59 inclusive.
///
/// The timestamp must already be expressed in the policy timezone; only its
/// local weekday and hour are inspected.
pub fn is_active<T: TimeZone>(t: &DateTime<T>) -> bool {
    let weekday_ok = !matches!(t.weekday(), Weekday::Sat | Weekday::Sun);
    weekday_ok && (FIRST_ACTIVE_HOUR..=LAST_ACTIVE_HOUR).contains(&t.hour())
}

pub fn local_now(tz: Tz) -> DateTime<Tz> {
    Utc::now().with_timezone(&tz)
}
