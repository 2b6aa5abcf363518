//! Time utilities: local "today" anchors and loose deadline parsing.

use anyhow::{Result, anyhow};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;

/// The calendar date of local midnight for `now`.
///
/// `tz` is an IANA name like "America/Chicago"; `None` uses the system zone.
pub fn local_today(tz: Option<&str>, now: DateTime<Utc>) -> Result<NaiveDate> {
    match tz {
        Some(name) => {
            let tz: Tz = name
                .parse()
                .map_err(|_| anyhow!("invalid timezone: {name}"))?;
            Ok(now.with_timezone(&tz).date_naive())
        }
        None => Ok(now.with_timezone(&Local).date_naive()),
    }
}

/// Parse a deadline as entered by a user or stored by older clients.
///
/// Accepts "2026-02-20", "2026-02-20 23:59", "2026-02-20T23:59" and RFC 3339.
/// Only the calendar date is kept.
pub fn parse_deadline(raw: &str) -> Result<NaiveDate> {
    let s = raw.trim();

    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(d);
    }
    for fmt in ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(ndt.date());
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.date_naive());
    }

    Err(anyhow!("invalid deadline '{raw}': expected YYYY-MM-DD"))
}

/// Bucket key format used in plans and exports.
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
