//! UTC calendar helpers. Days run from 00:00:00 to 23:59:59 inclusive and
//! instants carry whole-second precision.

use crate::error::ValueError;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, Duration, Month, OffsetDateTime, PrimitiveDateTime, UtcOffset};

/// Which end of a day a bare `YYYY-MM-DD` resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayBound {
    Start,
    End,
}

/// Current UTC time truncated to the second.
pub fn now_utc() -> OffsetDateTime {
    truncate_to_second(OffsetDateTime::now_utc())
}

pub fn truncate_to_second(t: OffsetDateTime) -> OffsetDateTime {
    let t = t.to_offset(UtcOffset::UTC);
    t - Duration::nanoseconds(i64::from(t.nanosecond()))
}

/// Fixed-width storage form, `YYYY-MM-DDTHH:MM:SSZ`. Sorts lexicographically.
pub fn format_instant(t: OffsetDateTime) -> String {
    let t = t.to_offset(UtcOffset::UTC);
    t.format(format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second]Z"
    ))
    .unwrap_or_else(|_| t.to_string())
}

/// Parse RFC 3339, `YYYY-MM-DD HH:MM:SS` (taken as UTC) or a bare date.
pub fn parse_instant(text: &str, bound: DayBound) -> Result<OffsetDateTime, ValueError> {
    let s = text.trim();
    if let Ok(t) = OffsetDateTime::parse(s, &Rfc3339) {
        return Ok(truncate_to_second(t));
    }
    if let Ok(t) =
        PrimitiveDateTime::parse(s, format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"))
    {
        return Ok(t.assume_utc());
    }
    if let Ok(d) = Date::parse(s, format_description!("[year]-[month]-[day]")) {
        return Ok(match bound {
            DayBound::Start => start_of_day(d),
            DayBound::End => end_of_day(d),
        });
    }
    Err(ValueError::InvalidTimestamp(text.to_string()))
}

/// Parse a value written by [`format_instant`].
pub fn parse_stored(text: &str) -> anyhow::Result<OffsetDateTime> {
    OffsetDateTime::parse(text, &Rfc3339)
        .map_err(|e| anyhow::anyhow!("corrupt stored timestamp '{text}': {e}"))
}

pub fn utc_date(t: OffsetDateTime) -> Date {
    t.to_offset(UtcOffset::UTC).date()
}

pub fn start_of_day(date: Date) -> OffsetDateTime {
    date.midnight().assume_utc()
}

pub fn end_of_day(date: Date) -> OffsetDateTime {
    start_of_day(date) + Duration::seconds(86_399)
}

pub fn start_of_month(date: Date) -> Date {
    date - Duration::days(i64::from(date.day()) - 1)
}

/// Monday of the ISO week containing `date`.
pub fn start_of_week(date: Date) -> Date {
    date - Duration::days(i64::from(date.weekday().number_days_from_monday()))
}

/// Every calendar day from `first` through `last`, inclusive. Empty when `first > last`.
pub fn days_between(first: Date, last: Date) -> impl Iterator<Item = Date> {
    std::iter::successors(Some(first), |d| d.next_day()).take_while(move |d| *d <= last)
}

/// `date` and every later day of its month.
pub fn days_to_month_end(date: Date) -> impl Iterator<Item = Date> {
    let month = date.month();
    std::iter::successors(Some(date), |d| d.next_day()).take_while(move |d| d.month() == month)
}

/// Same wall-clock time `months` calendar months earlier, clamping the day of month.
pub fn months_before(t: OffsetDateTime, months: u32) -> Result<OffsetDateTime, ValueError> {
    let t = t.to_offset(UtcOffset::UTC);
    let index = t.year() * 12 + i32::from(u8::from(t.month())) - 1 - months as i32;
    let year = index.div_euclid(12);
    let month = Month::try_from((index.rem_euclid(12) + 1) as u8)
        .map_err(|_| ValueError::InvalidTimestamp(format_instant(t)))?;
    let day = t.day().min(time::util::days_in_year_month(year, month));
    let date = Date::from_calendar_date(year, month, day)
        .map_err(|_| ValueError::InvalidTimestamp(format_instant(t)))?;
    Ok(PrimitiveDateTime::new(date, t.time()).assume_utc())
}
