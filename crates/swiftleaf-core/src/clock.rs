//! Wall-clock helpers. Reading days are calendar dates in the system time
//! zone, so streaks roll over at local midnight.

use jiff::civil::Date;
use jiff::tz::TimeZone;
use jiff::{Timestamp, Zoned};

pub fn now_millis() -> u64 {
    u64::try_from(Timestamp::now().as_millisecond()).unwrap_or(0)
}

/// Local calendar date of an epoch-millisecond timestamp.
pub fn date_of(millis: u64, tz: &TimeZone) -> Option<Date> {
    let millis = i64::try_from(millis).ok()?;
    let timestamp = Timestamp::from_millisecond(millis).ok()?;
    Some(timestamp.to_zoned(tz.clone()).date())
}

/// [`date_of`] in the system time zone.
pub fn local_date(millis: u64) -> Option<Date> {
    date_of(millis, &TimeZone::system())
}

pub fn today() -> Date {
    Zoned::now().date()
}

/// Short label such as `Mon 2024-03-11`.
pub fn format_day(day: Date) -> String {
    day.strftime("%a %Y-%m-%d").to_string()
}
