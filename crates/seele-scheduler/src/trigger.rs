//! Trigger grammars for task creation.
//!
//! `once` accepts epoch seconds, ISO-8601 datetimes, or a restricted
//! relative grammar (`in N seconds|minutes|hours|days`, `tomorrow`,
//! `next week`). `interval` accepts `30s`, `5m`, `1h`, `1d`, `1w` or a
//! positive integer of seconds. Anything else fails with `BadArgument`.

use chrono::TimeZone;
use chrono_tz::Tz;

use crate::error::{Result, SchedulerError};

const DAY_SECS: i64 = 86_400;
const WEEK_SECS: i64 = 7 * DAY_SECS;

/// Parse a `once` trigger into UTC epoch seconds.
///
/// Naive datetimes (no offset) are interpreted in the configured zone.
pub fn parse_once(input: &str, now: i64, tz: Tz) -> Result<i64> {
    let s = input.trim();
    if s.is_empty() {
        return Err(SchedulerError::BadArgument("empty trigger time".into()));
    }

    // Bare integer: epoch seconds.
    if s.chars().all(|c| c.is_ascii_digit()) {
        return s
            .parse::<i64>()
            .map_err(|_| SchedulerError::BadArgument(format!("bad epoch value: {s}")));
    }

    // RFC 3339 with explicit offset.
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Ok(dt.timestamp());
    }

    // Naive ISO-8601 variants, read in the configured zone.
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, fmt) {
            return tz
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.timestamp())
                .ok_or_else(|| {
                    SchedulerError::BadArgument(format!("datetime does not exist in zone: {s}"))
                });
        }
    }

    // Relative grammar.
    let lower = s.to_lowercase();
    if lower == "tomorrow" {
        return Ok(now + DAY_SECS);
    }
    if lower == "next week" {
        return Ok(now + WEEK_SECS);
    }
    if let Some(rest) = lower.strip_prefix("in ") {
        let mut parts = rest.split_whitespace();
        let amount: i64 = parts
            .next()
            .and_then(|n| n.parse().ok())
            .filter(|n| *n > 0)
            .ok_or_else(|| SchedulerError::BadArgument(format!("bad relative amount: {s}")))?;
        let unit = parts.next().unwrap_or("");
        let per = match unit {
            "second" | "seconds" => 1,
            "minute" | "minutes" => 60,
            "hour" | "hours" => 3600,
            "day" | "days" => DAY_SECS,
            _ => {
                return Err(SchedulerError::BadArgument(format!(
                    "unknown relative unit '{unit}' in: {s}"
                )))
            }
        };
        if parts.next().is_some() {
            return Err(SchedulerError::BadArgument(format!(
                "trailing input in relative time: {s}"
            )));
        }
        return Ok(now + amount * per);
    }

    Err(SchedulerError::BadArgument(format!(
        "unparsable trigger time: {s}"
    )))
}

/// Parse an `interval` trigger into seconds.
pub fn parse_interval(input: &str) -> Result<u64> {
    let s = input.trim();
    if s.is_empty() {
        return Err(SchedulerError::BadArgument("empty interval".into()));
    }

    let (digits, unit) = match s.char_indices().find(|(_, c)| !c.is_ascii_digit()) {
        None => (s, ""),
        Some((idx, _)) => s.split_at(idx),
    };
    let amount: u64 = digits
        .parse()
        .map_err(|_| SchedulerError::BadArgument(format!("bad interval: {s}")))?;
    if amount == 0 {
        return Err(SchedulerError::BadArgument(format!(
            "interval must be positive: {s}"
        )));
    }
    let per = match unit {
        "" => 1,
        "s" => 1,
        "m" => 60,
        "h" => 3600,
        "d" => DAY_SECS as u64,
        "w" => WEEK_SECS as u64,
        _ => {
            return Err(SchedulerError::BadArgument(format!(
                "unknown interval unit '{unit}' in: {s}"
            )))
        }
    };
    Ok(amount * per)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn once(s: &str) -> Result<i64> {
        parse_once(s, NOW, chrono_tz::Tz::UTC)
    }

    #[test]
    fn epoch_seconds_pass_through() {
        assert_eq!(once("1700000500").unwrap(), 1_700_000_500);
    }

    #[test]
    fn rfc3339_is_accepted() {
        assert_eq!(once("2023-11-14T22:13:20Z").unwrap(), 1_700_000_000);
        assert_eq!(once("2023-11-15T00:13:20+02:00").unwrap(), 1_700_000_000);
    }

    #[test]
    fn naive_datetime_uses_the_configured_zone() {
        // 08:00 in Shanghai is 00:00 UTC.
        let epoch = parse_once("2026-01-01T08:00", NOW, chrono_tz::Asia::Shanghai).unwrap();
        assert_eq!(epoch, 1_767_225_600);
    }

    #[test]
    fn relative_grammar() {
        assert_eq!(once("in 30 seconds").unwrap(), NOW + 30);
        assert_eq!(once("in 5 minutes").unwrap(), NOW + 300);
        assert_eq!(once("in 2 hours").unwrap(), NOW + 7200);
        assert_eq!(once("in 1 day").unwrap(), NOW + 86_400);
        assert_eq!(once("tomorrow").unwrap(), NOW + 86_400);
        assert_eq!(once("next week").unwrap(), NOW + 7 * 86_400);
    }

    #[test]
    fn bad_once_inputs_are_rejected() {
        for s in ["", "soon", "in five minutes", "in 5 fortnights", "in -3 hours", "2026-13-40"] {
            assert!(
                matches!(once(s), Err(SchedulerError::BadArgument(_))),
                "input: {s}"
            );
        }
    }

    #[test]
    fn interval_grammar() {
        assert_eq!(parse_interval("30s").unwrap(), 30);
        assert_eq!(parse_interval("5m").unwrap(), 300);
        assert_eq!(parse_interval("1h").unwrap(), 3600);
        assert_eq!(parse_interval("1d").unwrap(), 86_400);
        assert_eq!(parse_interval("1w").unwrap(), 604_800);
        assert_eq!(parse_interval("45").unwrap(), 45);
    }

    #[test]
    fn bad_interval_inputs_are_rejected() {
        for s in ["", "0", "0s", "5x", "s", "-5m", "1.5h"] {
            assert!(
                matches!(parse_interval(s), Err(SchedulerError::BadArgument(_))),
                "input: {s}"
            );
        }
    }
}
