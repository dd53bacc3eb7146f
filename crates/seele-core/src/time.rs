//! Time helpers — everything stored is UTC epoch seconds; everything shown
//! to a human (or to the LLM as annotation) is rendered in the configured
//! IANA zone.

use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Current UTC epoch seconds.
pub fn now_epoch() -> i64 {
    Utc::now().timestamp()
}

/// Render an epoch-seconds instant as `YYYY-MM-DD HH:MM` in the given zone.
pub fn human_time(epoch: i64, tz: Tz) -> String {
    match Utc.timestamp_opt(epoch, 0) {
        chrono::offset::LocalResult::Single(dt) => {
            dt.with_timezone(&tz).format("%Y-%m-%d %H:%M").to_string()
        }
        _ => format!("epoch:{epoch}"),
    }
}

/// The UTC instant for a given epoch, when representable.
pub fn to_utc(epoch: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(epoch, 0).single()
}

/// Start of the local day containing `epoch`, as epoch seconds.
pub fn local_day_start(epoch: i64, tz: Tz) -> Option<i64> {
    let local = to_utc(epoch)?.with_timezone(&tz).date_naive();
    let start = local.and_hms_opt(0, 0, 0)?;
    tz.from_local_datetime(&start)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc).timestamp())
}

/// Parse a local `YYYY-MM-DD` date into the epoch of its local midnight.
pub fn parse_local_date(s: &str, tz: Tz) -> Option<i64> {
    let date = chrono::NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()?;
    let start = date.and_hms_opt(0, 0, 0)?;
    tz.from_local_datetime(&start)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc).timestamp())
}
