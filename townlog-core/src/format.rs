//! Time helpers shared by the reader path and the CLI.
//!
//! [`parse_duration`] accepts the relative windows users type for `--since`:
//! `30s`, `30m`, `1h`, `1h30m`, `1.5h`, `250ms`.

use crate::error::{Error, Result};
use chrono::{DateTime, Duration, Local, Utc};

const NANOS_PER: [(&str, f64); 7] = [
    ("ns", 1.0),
    ("us", 1e3),
    ("µs", 1e3),
    ("ms", 1e6),
    ("s", 1e9),
    ("m", 60e9),
    ("h", 3600e9),
];

fn invalid(input: &str, reason: impl Into<String>) -> Error {
    Error::InvalidDuration {
        input: input.to_string(),
        reason: reason.into(),
    }
}

/// Parse a duration such as `1h`, `30m` or `1h30m`.
///
/// Each group is a non-negative decimal number followed by one of `ns`, `us`
/// (or `µs`), `ms`, `s`, `m`, `h`. A bare `0` is accepted.
pub fn parse_duration(input: &str) -> Result<Duration> {
    let s = input.trim();
    if s.is_empty() {
        return Err(invalid(input, "empty duration"));
    }
    if s == "0" {
        return Ok(Duration::zero());
    }
    if s.starts_with('-') || s.starts_with('+') {
        return Err(invalid(input, "duration must be an unsigned window"));
    }

    let mut rest = s;
    let mut total_nanos = 0f64;

    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (number, tail) = rest.split_at(number_len);
        if number.is_empty() || number == "." {
            return Err(invalid(input, "expected a number"));
        }
        let value: f64 = number
            .parse()
            .map_err(|_| invalid(input, format!("bad number {:?}", number)))?;

        let unit_len = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, next) = tail.split_at(unit_len);
        if unit.is_empty() {
            return Err(invalid(input, "missing unit (use ns, us, ms, s, m or h)"));
        }
        let scale = NANOS_PER
            .iter()
            .find(|(name, _)| *name == unit)
            .map(|(_, scale)| *scale)
            .ok_or_else(|| invalid(input, format!("unknown unit {:?}", unit)))?;

        total_nanos += value * scale;
        rest = next;
    }

    if !total_nanos.is_finite() || total_nanos > i64::MAX as f64 {
        return Err(invalid(input, "duration out of range"));
    }

    Ok(Duration::nanoseconds(total_nanos.round() as i64))
}

/// Format a timestamp for event listings, in local time.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// Compact age of `ts` as seen at `now`: `45s ago`, `5m ago`, `3h ago`,
/// `2d ago`. Timestamps at or after `now` read as `just now`.
pub fn format_age(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
    match now.signed_duration_since(ts).num_seconds() {
        secs if secs < 1 => "just now".to_string(),
        secs if secs < 60 => format!("{}s ago", secs),
        secs if secs < 3_600 => format!("{}m ago", secs / 60),
        secs if secs < 86_400 => format!("{}h ago", secs / 3_600),
        secs => format!("{}d ago", secs / 86_400),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_units() {
        assert_eq!(parse_duration("1h").unwrap(), Duration::hours(1));
        assert_eq!(parse_duration("30m").unwrap(), Duration::minutes(30));
        assert_eq!(parse_duration("24h").unwrap(), Duration::hours(24));
        assert_eq!(parse_duration("45s").unwrap(), Duration::seconds(45));
        assert_eq!(parse_duration("250ms").unwrap(), Duration::milliseconds(250));
        assert_eq!(parse_duration("7us").unwrap(), Duration::microseconds(7));
        assert_eq!(parse_duration("7µs").unwrap(), Duration::microseconds(7));
        assert_eq!(parse_duration("9ns").unwrap(), Duration::nanoseconds(9));
    }

    #[test]
    fn test_parse_compound_and_fractional() {
        assert_eq!(parse_duration("1h30m").unwrap(), Duration::minutes(90));
        assert_eq!(parse_duration("1.5h").unwrap(), Duration::minutes(90));
        assert_eq!(parse_duration("2m3s").unwrap(), Duration::seconds(123));
        assert_eq!(parse_duration(" 10m ").unwrap(), Duration::minutes(10));
    }

    #[test]
    fn test_parse_zero() {
        assert_eq!(parse_duration("0").unwrap(), Duration::zero());
        assert_eq!(parse_duration("0s").unwrap(), Duration::zero());
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        for bad in ["", "h", "10", "1x", "1hh", "-1h", "+5m", "1..5h", ".h", "abc"] {
            let err = parse_duration(bad).unwrap_err();
            assert!(
                matches!(err, Error::InvalidDuration { .. }),
                "expected InvalidDuration for {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_format_timestamp_shape() {
        let formatted = format_timestamp(Utc::now());
        assert_eq!(formatted.len(), "2006-01-02 15:04:05".len());
    }

    #[test]
    fn test_age_buckets() {
        let now = Utc::now();
        assert_eq!(format_age(now + Duration::minutes(5), now), "just now");
        assert_eq!(format_age(now, now), "just now");
        assert_eq!(format_age(now - Duration::seconds(45), now), "45s ago");
        assert_eq!(format_age(now - Duration::minutes(5), now), "5m ago");
        assert_eq!(format_age(now - Duration::hours(3), now), "3h ago");
        assert_eq!(format_age(now - Duration::days(40), now), "40d ago");
    }
}
