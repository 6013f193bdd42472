//! Date values.
//!
//! Dates are stored as whole seconds plus microseconds relative to
//! 2001-01-01T00:00:00Z, the reference epoch of the binary format. Unix
//! timestamps convert through [`Date::from_unix`] and [`Date::to_unix`].
//!
//! Dates are limited to years 0001 through 9999, the range that has a
//! four-digit ISO 8601 form.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::Error;

/// Seconds between 1970-01-01T00:00:00Z and 2001-01-01T00:00:00Z.
pub const APPLE_EPOCH_UNIX_SECONDS: i64 = 978_307_200;

const MICROS_PER_SECOND: u32 = 1_000_000;

/// 0001-01-01T00:00:00Z relative to the reference epoch.
const MIN_SECS: i64 = -63_113_904_000;
/// 9999-12-31T23:59:59Z relative to the reference epoch.
const MAX_SECS: i64 = 252_423_993_599;

/// A point in time with microsecond resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Date {
    secs: i64,
    micros: u32,
}

impl Date {
    /// Earliest representable date, 0001-01-01T00:00:00Z.
    pub const MIN: Date = Date {
        secs: MIN_SECS,
        micros: 0,
    };

    /// Latest representable date, 9999-12-31T23:59:59.999999Z.
    pub const MAX: Date = Date {
        secs: MAX_SECS,
        micros: MICROS_PER_SECOND - 1,
    };

    /// Create a date from seconds and microseconds since 2001-01-01T00:00:00Z.
    ///
    /// Microseconds of one second or more carry into `secs`. Values outside
    /// [`Date::MIN`]..=[`Date::MAX`] are clamped.
    pub fn new(secs: i64, micros: u32) -> Self {
        Self::carry(secs, micros).clamp(Self::MIN, Self::MAX)
    }

    /// Like [`Date::new`], but `None` outside [`Date::MIN`]..=[`Date::MAX`].
    pub fn try_new(secs: i64, micros: u32) -> Option<Self> {
        let date = Self::carry(secs, micros);
        (Self::MIN..=Self::MAX).contains(&date).then_some(date)
    }

    fn carry(secs: i64, micros: u32) -> Self {
        Self {
            secs: secs.saturating_add(i64::from(micros / MICROS_PER_SECOND)),
            micros: micros % MICROS_PER_SECOND,
        }
    }

    /// Whole seconds since 2001-01-01T00:00:00Z.
    #[inline]
    pub const fn seconds(&self) -> i64 {
        self.secs
    }

    /// Sub-second part in microseconds.
    #[inline]
    pub const fn micros(&self) -> u32 {
        self.micros
    }

    /// Create a date from a Unix timestamp (seconds + microseconds).
    pub fn from_unix(secs: i64, micros: u32) -> Self {
        Self::new(secs.saturating_sub(APPLE_EPOCH_UNIX_SECONDS), micros)
    }

    /// Convert to a Unix timestamp (seconds + microseconds).
    pub fn to_unix(&self) -> (i64, u32) {
        (self.secs.saturating_add(APPLE_EPOCH_UNIX_SECONDS), self.micros)
    }

    /// Create a date from the floating-point seconds stored in binary plists.
    ///
    /// Returns `None` for NaN, infinities and values outside the date range.
    /// [`Date::MAX`] rounds up to the next whole second as a double, so that
    /// second is still accepted and clamps back to [`Date::MAX`].
    pub fn from_apple_seconds(value: f64) -> Option<Self> {
        if !(MIN_SECS as f64..=(MAX_SECS + 1) as f64).contains(&value) {
            return None;
        }
        let secs = value.floor();
        let micros = ((value - secs) * f64::from(MICROS_PER_SECOND)).round() as u32;
        Some(Self::new(secs as i64, micros))
    }

    /// Floating-point seconds since 2001-01-01T00:00:00Z.
    pub fn to_apple_seconds(&self) -> f64 {
        self.secs as f64 + f64::from(self.micros) / f64::from(MICROS_PER_SECOND)
    }

    /// Convert from a chrono UTC timestamp, clamping to the date range.
    pub fn from_datetime(datetime: DateTime<Utc>) -> Self {
        Self::from_unix(datetime.timestamp(), datetime.timestamp_subsec_micros())
    }

    /// Convert to a chrono UTC timestamp.
    pub fn to_datetime(&self) -> DateTime<Utc> {
        let (secs, micros) = self.to_unix();
        DateTime::from_timestamp(secs, micros * 1_000).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// The current time.
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }
}

impl From<DateTime<Utc>> for Date {
    fn from(datetime: DateTime<Utc>) -> Self {
        Self::from_datetime(datetime)
    }
}

/// Formats as `YYYY-MM-DDTHH:MM:SSZ`, with `.ffffff` before the `Z` when the
/// date has a sub-second part.
impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_datetime().format("%Y-%m-%dT%H:%M:%S"))?;
        if self.micros != 0 {
            write!(f, ".{:06}", self.micros)?;
        }
        f.write_str("Z")
    }
}

impl FromStr for Date {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let datetime = match DateTime::parse_from_rfc3339(text) {
            Ok(datetime) => datetime.with_timezone(&Utc),
            // Zone-less timestamps are taken as UTC.
            Err(_) => NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
                .map_err(|_| Error::InvalidDate(s.to_string()))?
                .and_utc(),
        };
        Self::try_new(
            datetime.timestamp().saturating_sub(APPLE_EPOCH_UNIX_SECONDS),
            datetime.timestamp_subsec_micros(),
        )
        .ok_or_else(|| Error::InvalidDate(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch() {
        let date: Date = "2001-01-01T00:00:00Z".parse().unwrap();
        assert_eq!(date, Date::default());
        assert_eq!(date.to_unix(), (APPLE_EPOCH_UNIX_SECONDS, 0));
        assert_eq!(date.to_string(), "2001-01-01T00:00:00Z");
    }

    #[test]
    fn test_unix_conversion() {
        let date = Date::from_unix(0, 250_000);
        assert_eq!(date.seconds(), -APPLE_EPOCH_UNIX_SECONDS);
        assert_eq!(date.micros(), 250_000);
        assert_eq!(date.to_unix(), (0, 250_000));
        assert_eq!(date.to_string(), "1970-01-01T00:00:00.250000Z");
    }

    #[test]
    fn test_micros_carry() {
        let date = Date::new(10, 2_500_000);
        assert_eq!(date.seconds(), 12);
        assert_eq!(date.micros(), 500_000);
    }

    #[test]
    fn test_apple_seconds_round_trip() {
        for date in [
            Date::new(0, 0),
            Date::new(694_224_000, 123_456),
            Date::new(-1, 999_999),
            Date::new(-978_307_200, 1),
        ] {
            let seconds = date.to_apple_seconds();
            assert_eq!(Date::from_apple_seconds(seconds), Some(date));
        }
    }

    #[test]
    fn test_apple_seconds_rejects_non_finite() {
        assert_eq!(Date::from_apple_seconds(f64::NAN), None);
        assert_eq!(Date::from_apple_seconds(f64::INFINITY), None);
        assert_eq!(Date::from_apple_seconds(1.0e19), None);
        assert_eq!(Date::from_apple_seconds(MIN_SECS as f64 - 1.0), None);
        assert_eq!(Date::from_apple_seconds((MAX_SECS + 2) as f64), None);
    }

    #[test]
    fn test_range_is_clamped() {
        assert_eq!(Date::new(i64::MAX, 0), Date::MAX);
        assert_eq!(Date::new(i64::MAX / 2, 0), Date::MAX);
        assert_eq!(Date::new(i64::MIN, 0), Date::MIN);
        assert_eq!(Date::from_unix(i64::MIN, 0), Date::MIN);
        assert_eq!(Date::try_new(MAX_SECS + 1, 0), None);
        assert_eq!(Date::try_new(MIN_SECS - 1, 999_999), None);
        assert_eq!(Date::try_new(MAX_SECS, 999_999), Some(Date::MAX));
    }

    #[test]
    fn test_extremes_format_and_parse() {
        assert_eq!(Date::MIN.to_string(), "0001-01-01T00:00:00Z");
        assert_eq!(Date::MAX.to_string(), "9999-12-31T23:59:59.999999Z");
        for date in [Date::MIN, Date::MAX] {
            assert_eq!(date.to_string().parse::<Date>().unwrap(), date);
            assert_eq!(Date::from_apple_seconds(date.to_apple_seconds()), Some(date));
        }
    }

    #[test]
    fn test_parse_fractional_and_naive() {
        let date: Date = "2023-06-15T12:30:45.5Z".parse().unwrap();
        assert_eq!(date.micros(), 500_000);
        assert_eq!(date.to_string(), "2023-06-15T12:30:45.500000Z");

        let naive: Date = "2023-06-15T12:30:45".parse().unwrap();
        assert_eq!(naive.seconds(), date.seconds());
        assert_eq!(naive.micros(), 0);
    }

    #[test]
    fn test_parse_invalid() {
        let result = "yesterday".parse::<Date>();
        assert!(matches!(result, Err(Error::InvalidDate(_))));
    }
}
