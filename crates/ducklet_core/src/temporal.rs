//! Date, time, timestamp and interval helpers.
//!
//! Physical encodings:
//! - `DATE`: days since 1970-01-01 (`i32`)
//! - `TIME`: microseconds since midnight (`i64`)
//! - `TIMESTAMP`: microseconds since the Unix epoch (`i64`), no zone
//! - `INTERVAL`: months, days and microseconds kept separately

use chrono::{Datelike, Months, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use std::fmt;

/// Days between 0001-01-01 (CE day 1) and 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Microseconds per second.
pub const MICROS_PER_SECOND: i64 = 1_000_000;

/// Microseconds per day.
pub const MICROS_PER_DAY: i64 = 86_400 * MICROS_PER_SECOND;

/// A calendar interval.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Interval {
    /// Whole months (years are folded in).
    pub months: i32,
    /// Whole days.
    pub days: i32,
    /// Sub-day part in microseconds.
    pub micros: i64,
}

impl Interval {
    /// Creates an interval from its parts.
    #[must_use]
    pub const fn new(months: i32, days: i32, micros: i64) -> Self {
        Self {
            months,
            days,
            micros,
        }
    }

    /// Negates every component, or `None` if one of them is the minimum value.
    #[must_use]
    pub fn checked_neg(self) -> Option<Self> {
        Some(Self::new(
            self.months.checked_neg()?,
            self.days.checked_neg()?,
            self.micros.checked_neg()?,
        ))
    }

    /// Adds two intervals component-wise.
    #[must_use]
    pub fn checked_add(self, other: Self) -> Option<Self> {
        Some(Self::new(
            self.months.checked_add(other.months)?,
            self.days.checked_add(other.days)?,
            self.micros.checked_add(other.micros)?,
        ))
    }

    /// Parses interval text such as `1 day`, `2 hours 30 minutes` or `01:30:00`.
    ///
    /// A bare number uses `default_unit` when given.
    #[must_use]
    pub fn parse(text: &str, default_unit: Option<&str>) -> Option<Self> {
        let mut interval = Interval::default();
        let mut parts = text.split_whitespace().peekable();
        let mut seen = false;

        while let Some(part) = parts.next() {
            seen = true;
            if part.contains(':') {
                interval.micros = interval.micros.checked_add(parse_time_of_day(part)?)?;
                continue;
            }
            let amount: f64 = part.parse().ok()?;
            let unit = match parts.next() {
                Some(unit) => unit,
                None => default_unit?,
            };
            interval = interval.checked_add(Self::from_unit(amount, unit)?)?;
        }

        seen.then_some(interval)
    }

    /// Builds an interval from an amount of a single unit.
    #[must_use]
    pub fn from_unit(amount: f64, unit: &str) -> Option<Self> {
        let lower = unit.to_ascii_lowercase();
        let unit = match lower.as_str() {
            "ms" => "millisecond",
            "us" => "microsecond",
            other => other.trim_end_matches('s'),
        };
        let whole = |v: f64| -> Option<i32> {
            (v.fract() == 0.0 && v.abs() <= f64::from(i32::MAX)).then_some(v as i32)
        };
        let micros = |factor: i64| -> Option<i64> {
            let v = (amount * factor as f64).round();
            (v.abs() <= i64::MAX as f64).then_some(v as i64)
        };
        let interval = match unit {
            "year" | "yr" | "y" => Interval::new(whole(amount * 12.0)?, 0, 0),
            "month" | "mon" => Interval::new(whole(amount)?, 0, 0),
            "week" | "w" => Interval::new(0, whole(amount * 7.0)?, 0),
            "day" | "d" => Interval::new(0, whole(amount)?, 0),
            "hour" | "hr" | "h" => Interval::new(0, 0, micros(3_600 * MICROS_PER_SECOND)?),
            "minute" | "min" | "m" => Interval::new(0, 0, micros(60 * MICROS_PER_SECOND)?),
            "second" | "sec" => Interval::new(0, 0, micros(MICROS_PER_SECOND)?),
            "millisecond" | "msec" => Interval::new(0, 0, micros(1_000)?),
            "microsecond" | "usec" | "u" => Interval::new(0, 0, micros(1)?),
            _ => return None,
        };
        Some(interval)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::new();
        let years = self.months / 12;
        let months = self.months % 12;
        let plural = |n: i64, unit: &str| {
            if n.abs() == 1 {
                format!("{n} {unit}")
            } else {
                format!("{n} {unit}s")
            }
        };
        if years != 0 {
            parts.push(plural(i64::from(years), "year"));
        }
        if months != 0 {
            parts.push(plural(i64::from(months), "month"));
        }
        if self.days != 0 {
            parts.push(plural(i64::from(self.days), "day"));
        }
        if self.micros != 0 || parts.is_empty() {
            let sign = if self.micros < 0 { "-" } else { "" };
            parts.push(format!("{sign}{}", format_time_of_day(self.micros.unsigned_abs())));
        }
        f.write_str(&parts.join(" "))
    }
}

fn date_to_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

fn days_to_date(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)?)
}

fn time_to_micros(time: NaiveTime) -> i64 {
    i64::from(time.num_seconds_from_midnight()) * MICROS_PER_SECOND
        + i64::from(time.nanosecond() / 1_000)
}

fn datetime_to_micros(dt: NaiveDateTime) -> Option<i64> {
    i64::from(date_to_days(dt.date()))
        .checked_mul(MICROS_PER_DAY)?
        .checked_add(time_to_micros(dt.time()))
}

fn micros_to_datetime(micros: i64) -> Option<NaiveDateTime> {
    let days = i32::try_from(micros.div_euclid(MICROS_PER_DAY)).ok()?;
    let time = micros.rem_euclid(MICROS_PER_DAY);
    let date = days_to_date(days)?;
    let secs = u32::try_from(time / MICROS_PER_SECOND).ok()?;
    let nanos = u32::try_from((time % MICROS_PER_SECOND) * 1_000).ok()?;
    Some(date.and_time(NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos)?))
}

fn parse_time_of_day(text: &str) -> Option<i64> {
    ["%H:%M:%S%.f", "%H:%M"]
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(text, fmt).ok())
        .map(time_to_micros)
}

fn format_time_of_day(micros: u64) -> String {
    let micros_per_second = MICROS_PER_SECOND as u64;
    let total_seconds = micros / micros_per_second;
    let fraction = micros % micros_per_second;
    let hours = total_seconds / 3_600;
    let minutes = (total_seconds / 60) % 60;
    let seconds = total_seconds % 60;
    let mut out = format!("{hours:02}:{minutes:02}:{seconds:02}");
    if fraction != 0 {
        let digits = format!("{fraction:06}");
        out.push('.');
        out.push_str(digits.trim_end_matches('0'));
    }
    out
}

/// Parses `YYYY-MM-DD` into days since the epoch.
#[must_use]
pub fn parse_date(text: &str) -> Option<i32> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .ok()
        .map(date_to_days)
}

/// Formats days since the epoch as `YYYY-MM-DD`.
#[must_use]
pub fn format_date(days: i32) -> String {
    match days_to_date(days) {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => format!("{days} days"),
    }
}

/// Parses `HH:MM[:SS[.ffffff]]` into microseconds since midnight.
#[must_use]
pub fn parse_time(text: &str) -> Option<i64> {
    parse_time_of_day(text.trim())
}

/// Formats microseconds since midnight as `HH:MM:SS[.ffffff]`.
#[must_use]
pub fn format_time(micros: i64) -> String {
    format_time_of_day(micros.rem_euclid(MICROS_PER_DAY) as u64)
}

/// Parses a timestamp. A bare date means midnight.
#[must_use]
pub fn parse_timestamp(text: &str) -> Option<i64> {
    let text = text.trim();
    let text = text
        .strip_suffix("+00")
        .or_else(|| text.strip_suffix('Z'))
        .unwrap_or(text)
        .trim_end();
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return datetime_to_micros(dt);
        }
    }
    parse_date(text).and_then(date_to_timestamp)
}

/// Formats microseconds since the epoch as `YYYY-MM-DD HH:MM:SS[.ffffff]`.
#[must_use]
pub fn format_timestamp(micros: i64) -> String {
    match micros_to_datetime(micros) {
        Some(dt) => format!(
            "{} {}",
            dt.date().format("%Y-%m-%d"),
            format_time(micros.rem_euclid(MICROS_PER_DAY))
        ),
        None => format!("{micros} us"),
    }
}

/// Converts a date to the timestamp at its midnight.
#[must_use]
pub fn date_to_timestamp(days: i32) -> Option<i64> {
    i64::from(days).checked_mul(MICROS_PER_DAY)
}

/// Truncates a timestamp to its date.
#[must_use]
pub fn timestamp_to_date(micros: i64) -> Option<i32> {
    i32::try_from(micros.div_euclid(MICROS_PER_DAY)).ok()
}

/// Adds an interval to a timestamp.
#[must_use]
pub fn add_interval(micros: i64, interval: Interval) -> Option<i64> {
    let mut dt = micros_to_datetime(micros)?;
    if interval.months > 0 {
        dt = dt.checked_add_months(Months::new(interval.months.unsigned_abs()))?;
    } else if interval.months < 0 {
        dt = dt.checked_sub_months(Months::new(interval.months.unsigned_abs()))?;
    }
    datetime_to_micros(dt)?
        .checked_add(i64::from(interval.days).checked_mul(MICROS_PER_DAY)?)?
        .checked_add(interval.micros)
}

/// Returns the current UTC timestamp.
#[must_use]
pub fn now_utc() -> i64 {
    datetime_to_micros(chrono::Utc::now().naive_utc()).unwrap_or_default()
}

/// Returns today's date in UTC.
#[must_use]
pub fn today_utc() -> i32 {
    date_to_days(chrono::Utc::now().date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dates() {
        assert_eq!(parse_date("1970-01-01"), Some(0));
        assert_eq!(parse_date("1970-01-02"), Some(1));
        assert_eq!(parse_date("1969-12-31"), Some(-1));
        assert_eq!(format_date(19_723), "2024-01-01");
        assert_eq!(parse_date("2024-02-30"), None);
        assert_eq!(format_date(0), "1970-01-01");
    }

    #[test]
    fn times() {
        assert_eq!(parse_time("00:00:01"), Some(MICROS_PER_SECOND));
        assert_eq!(parse_time("12:30"), Some(45_000 * MICROS_PER_SECOND));
        assert_eq!(format_time(parse_time("12:34:56.5").unwrap()), "12:34:56.5");
        assert_eq!(format_time(0), "00:00:00");
    }

    #[test]
    fn timestamps() {
        let ts = parse_timestamp("2024-01-01 10:00:00").unwrap();
        assert_eq!(format_timestamp(ts), "2024-01-01 10:00:00");
        assert_eq!(parse_timestamp("1970-01-01"), Some(0));
        assert_eq!(format_timestamp(-1), "1969-12-31 23:59:59.999999");
        assert_eq!(timestamp_to_date(ts), parse_date("2024-01-01"));
    }

    #[test]
    fn interval_negation() {
        let i = Interval::new(1, -2, 3);
        assert_eq!(i.checked_neg(), Some(Interval::new(-1, 2, -3)));
        assert_eq!(Interval::new(0, 0, i64::MIN).checked_neg(), None);
        assert_eq!(Interval::new(i32::MIN, 0, 0).checked_neg(), None);
    }

    #[test]
    fn intervals() {
        let i = Interval::parse("1 year 2 months 3 days", None).unwrap();
        assert_eq!(i, Interval::new(14, 3, 0));
        assert_eq!(i.to_string(), "1 year 2 months 3 days");

        let i = Interval::parse("3", Some("hour")).unwrap();
        assert_eq!(i.to_string(), "03:00:00");

        assert_eq!(Interval::default().to_string(), "00:00:00");
        assert!(Interval::parse("", None).is_none());
        assert!(Interval::parse("5 fortnights", None).is_none());
    }

    #[test]
    fn month_arithmetic_clamps() {
        let jan31 = parse_timestamp("2024-01-31").unwrap();
        let feb = add_interval(jan31, Interval::new(1, 0, 0)).unwrap();
        assert_eq!(format_timestamp(feb), "2024-02-29 00:00:00");
    }
}
