//! Conversions from the raw values client libraries hand out into the typed values cells are built
//! from.

#![allow(dead_code)] // which helpers are used depends on the enabled backends

use std::fmt::Display;
use std::str::FromStr as _;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde_json::Number;

/// Timestamp layouts accepted from text, most specific first.
const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Time layouts accepted from text.
const TIME_FORMATS: [&str; 2] = ["%H:%M:%S%.f", "%H:%M"];

/// Parse an exact number from text without touching its digits.
///
/// Anything already spelled as a JSON number, exponents included, is kept as written. Other
/// decimal spellings such as `+5` are normalized through [`Decimal`] when they fit.
pub(crate) fn number_from_text(text: &str) -> Option<Number> {
    let text = text.trim();
    Number::from_str(text).ok().or_else(|| {
        Decimal::from_str(text).ok().and_then(number_from_display)
    })
}

/// The JSON number spelled by `value`'s display form.
///
/// Floats display their shortest round-trip digits in positional notation, so `0.1_f64` stays
/// `0.1`, `1e30` keeps all thirty-one digits and `1.5e-30` keeps its magnitude. NaN and the
/// infinities have no JSON form and yield `None`.
pub(crate) fn number_from_display(value: impl Display) -> Option<Number> {
    Number::from_str(&value.to_string()).ok()
}

/// Convert a binary float to an integer if it holds an integral value in range.
pub(crate) fn integer_from_f64(value: f64) -> Option<i64> {
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    let in_range = value >= i64::MIN as f64 && value < i64::MAX as f64;
    if value.fract() == 0.0 && in_range {
        #[allow(clippy::cast_possible_truncation)]
        Some(value as i64)
    } else {
        None
    }
}

/// Parse a timestamp. Values carrying an offset are normalized to UTC; a bare date is midnight.
pub(crate) fn timestamp_from_text(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if let Ok(zoned) = DateTime::parse_from_rfc3339(text) {
        return Some(zoned.naive_utc());
    }
    if let Ok(zoned) = DateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(zoned.naive_utc());
    }
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| date_from_text(text).and_then(|date| date.and_hms_opt(0, 0, 0)))
}

/// Parse a calendar date, taking the date part of a full timestamp.
pub(crate) fn date_from_text(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, "%Y-%m-%d").ok().or_else(|| {
        text.get(..10)
            .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
    })
}

/// Parse a time of day.
pub(crate) fn time_from_text(text: &str) -> Option<NaiveTime> {
    let text = text.trim();
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(text, format).ok())
}

/// Split a count of `per_second` units into whole seconds and leftover nanoseconds.
pub(crate) fn split_epoch(per_second: i64, value: i64) -> (i64, u32) {
    let seconds = value.div_euclid(per_second);
    let nanos = value.rem_euclid(per_second) * (1_000_000_000 / per_second);
    (seconds, u32::try_from(nanos).unwrap_or(0))
}

/// Interpret an offset from the Unix epoch as a UTC timestamp.
pub(crate) fn timestamp_from_unix(seconds: i64, nanos: u32) -> Option<NaiveDateTime> {
    DateTime::from_timestamp(seconds, nanos).map(|stamp| stamp.naive_utc())
}

/// Interpret days since the Unix epoch as a date.
pub(crate) fn date_from_unix_days(days: i32) -> Option<NaiveDate> {
    // 719_163 days separate 0001-01-01 from 1970-01-01.
    days.checked_add(719_163)
        .and_then(NaiveDate::from_num_days_from_ce_opt)
}

/// Interpret an offset from midnight as a time of day.
pub(crate) fn time_from_midnight(seconds: i64, nanos: u32) -> Option<NaiveTime> {
    NaiveTime::from_num_seconds_from_midnight_opt(u32::try_from(seconds).ok()?, nanos)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stamp(text: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f").unwrap()
    }

    fn digits(number: Option<Number>) -> Option<String> {
        number.map(|number| number.to_string())
    }

    #[test]
    fn floats_keep_their_shortest_digits() {
        assert_eq!(digits(number_from_display(0.1_f64)).as_deref(), Some("0.1"));
        assert_eq!(digits(number_from_display(0.1_f32)).as_deref(), Some("0.1"));
        assert_eq!(digits(number_from_display(2.5e-3)).as_deref(), Some("0.0025"));
        assert_eq!(
            digits(number_from_display(1e30)).as_deref(),
            Some("1000000000000000000000000000000")
        );
        assert_eq!(
            digits(number_from_display(1.5e-30)).as_deref(),
            Some("0.0000000000000000000000000000015")
        );
        assert_eq!(number_from_display(f64::NAN), None);
        assert_eq!(number_from_display(f64::NEG_INFINITY), None);
    }

    #[test]
    fn numbers_from_text_keep_every_digit() {
        assert_eq!(
            digits(number_from_text("123456789012345678901234567890")).as_deref(),
            Some("123456789012345678901234567890")
        );
        assert_eq!(
            digits(number_from_text(" -98765432109876543210.000000000000000000000000000001 "))
                .as_deref(),
            Some("-98765432109876543210.000000000000000000000000000001")
        );
        assert_eq!(digits(number_from_text("1.5e3")).as_deref(), Some("1.5e3"));
        assert_eq!(digits(number_from_text("+12.50")).as_deref(), Some("12.50"));
        assert_eq!(
            digits(number_from_display(i128::MIN)).as_deref(),
            Some("-170141183460469231731687303715884105728")
        );
        assert_eq!(number_from_text("twelve"), None);
        assert_eq!(number_from_text(""), None);
    }

    #[test]
    fn integral_floats_become_integers() {
        assert_eq!(integer_from_f64(42.0), Some(42));
        assert_eq!(integer_from_f64(42.5), None);
        assert_eq!(integer_from_f64(f64::INFINITY), None);
    }

    #[test]
    fn timestamps_from_text() {
        assert_eq!(
            timestamp_from_text("2024-01-01 12:30:00"),
            Some(stamp("2024-01-01 12:30:00"))
        );
        assert_eq!(
            timestamp_from_text("2024-01-01T12:30:00.5"),
            Some(stamp("2024-01-01 12:30:00.5"))
        );
        assert_eq!(
            timestamp_from_text("2024-01-01T12:30:00+02:00"),
            Some(stamp("2024-01-01 10:30:00"))
        );
        assert_eq!(timestamp_from_text("2024-01-01"), Some(stamp("2024-01-01 00:00:00")));
        assert_eq!(timestamp_from_text("yesterday"), None);
    }

    #[test]
    fn dates_and_times_from_text() {
        assert_eq!(date_from_text("2024-02-29"), NaiveDate::from_ymd_opt(2024, 2, 29));
        assert_eq!(date_from_text("2024-02-29 10:00:00"), NaiveDate::from_ymd_opt(2024, 2, 29));
        assert_eq!(time_from_text("07:05"), NaiveTime::from_hms_opt(7, 5, 0));
        assert_eq!(time_from_text("07:05:09.125"), NaiveTime::from_hms_milli_opt(7, 5, 9, 125));
    }

    #[test]
    fn epoch_offsets() {
        assert_eq!(split_epoch(1_000_000, 1_500_000), (1, 500_000_000));
        assert_eq!(split_epoch(1_000, -1), (-1, 999_000_000));
        assert_eq!(date_from_unix_days(0), NaiveDate::from_ymd_opt(1970, 1, 1));
        assert_eq!(date_from_unix_days(19_723), NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(
            timestamp_from_unix(1_704_067_200, 0),
            Some(stamp("2024-01-01 00:00:00"))
        );
        assert_eq!(
            timestamp_from_unix(1_704_067_200, 1_000),
            Some(stamp("2024-01-01 00:00:00.000001"))
        );
        assert_eq!(time_from_midnight(3_723, 0), NaiveTime::from_hms_opt(1, 2, 3));
        assert_eq!(time_from_midnight(-1, 0), None);
    }
}
