//! League-local time helpers.
//!
//! Deadlines and tournament dates are stored as naive timestamps in the
//! league's timezone. Every helper takes the timezone and current instant
//! explicitly.

use chrono::{DateTime, Datelike, NaiveDateTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;

/// Storage format for naive league-local timestamps.
pub const NAIVE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Convert an instant to a naive league-local timestamp.
pub fn to_league_local(instant: DateTime<Utc>, tz: Tz) -> NaiveDateTime {
    instant.with_timezone(&tz).naive_local()
}

/// Convert a naive league-local timestamp back to an instant.
///
/// Ambiguous local times (DST fall-back) resolve to the earlier instant;
/// non-existent ones (spring-forward gap) return `None`.
pub fn league_local_to_utc(local: NaiveDateTime, tz: Tz) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&local)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Whether picks are closed. A tournament without a deadline stays open.
pub fn is_deadline_passed(deadline: Option<NaiveDateTime>, now: DateTime<Utc>, tz: Tz) -> bool {
    match deadline {
        Some(deadline) => to_league_local(now, tz) > deadline,
        None => false,
    }
}

/// Deadline used when no tee times are available: a fixed hour on the
/// tournament's start date.
pub fn fixed_deadline(start: NaiveDateTime, hour: u32) -> Option<NaiveDateTime> {
    start.date().and_hms_opt(hour, 0, 0)
}

/// Weekday in the league timezone.
pub fn league_weekday(now: DateTime<Utc>, tz: Tz) -> Weekday {
    now.with_timezone(&tz).weekday()
}

pub fn format_naive(value: NaiveDateTime) -> String {
    value.format(NAIVE_FORMAT).to_string()
}

pub fn parse_naive(value: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(value, NAIVE_FORMAT)
}

/// Human-readable deadline, e.g. "Thu Jan 15, 07:21 AM CST".
pub fn format_deadline(deadline: Option<NaiveDateTime>, tz: Tz) -> String {
    deadline
        .and_then(|d| tz.from_local_datetime(&d).earliest())
        .map(|d| d.format("%a %b %d, %I:%M %p %Z").to_string())
        .unwrap_or_else(|| "TBD".to_string())
}
