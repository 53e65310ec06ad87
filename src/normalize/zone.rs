//! Display zone and date-time parsing
//!
//! Formatted timestamps are naive (`YYYY-MM-DD HH:MM:SS`), so the same zone
//! that rendered them must be used to read them back.

use crate::error::{Error, Result};
use chrono::{
    DateTime, FixedOffset, Local, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc,
};
use std::fmt;
use std::str::FromStr;

/// Format used for every rendered timestamp
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Naive layouts accepted when reading a date-time back
const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"];

/// Time zone used to render epoch timestamps and to interpret naive strings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayZone {
    /// Host local time
    #[default]
    Local,
    /// Coordinated Universal Time
    Utc,
    /// Fixed offset from UTC
    Fixed(FixedOffset),
}

impl DisplayZone {
    /// Render epoch milliseconds, `None` when out of chrono's range
    pub fn format_millis(&self, millis: i64) -> Option<String> {
        let utc = DateTime::<Utc>::from_timestamp_millis(millis)?;
        let rendered = match self {
            Self::Local => utc.with_timezone(&Local).format(DATETIME_FORMAT).to_string(),
            Self::Utc => utc.format(DATETIME_FORMAT).to_string(),
            Self::Fixed(offset) => utc.with_timezone(offset).format(DATETIME_FORMAT).to_string(),
        };
        Some(rendered)
    }

    /// Attach this zone to a naive date-time
    fn localize(&self, naive: &NaiveDateTime) -> Option<DateTime<Utc>> {
        match self {
            Self::Local => earliest(Local.from_local_datetime(naive)),
            Self::Utc => Some(Utc.from_utc_datetime(naive)),
            Self::Fixed(offset) => earliest(offset.from_local_datetime(naive)),
        }
    }
}

fn earliest<Tz: TimeZone>(result: LocalResult<DateTime<Tz>>) -> Option<DateTime<Utc>> {
    result.earliest().map(|dt| dt.with_timezone(&Utc))
}

impl FromStr for DisplayZone {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "local" => Ok(Self::Local),
            "utc" | "z" => Ok(Self::Utc),
            other => other
                .parse::<FixedOffset>()
                .map(Self::Fixed)
                .map_err(|e| Error::invalid_value("timezone", format!("'{s}': {e}"))),
        }
    }
}

impl fmt::Display for DisplayZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("local"),
            Self::Utc => f.write_str("utc"),
            Self::Fixed(offset) => write!(f, "{offset}"),
        }
    }
}

/// Parse a date-time string into UTC
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS` with an optional numeric offset or
/// `UTC`/`Z` suffix, and a bare `YYYY-MM-DD`. Strings without zone
/// information are read in `zone`.
pub fn parse_datetime(text: &str, zone: DisplayZone) -> Result<DateTime<Utc>> {
    let text = text.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = DateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S %z") {
        return Ok(dt.with_timezone(&Utc));
    }

    // Explicit UTC markers win over the display zone
    let (body, zone) = match text
        .strip_suffix(" UTC")
        .or_else(|| text.strip_suffix('Z'))
    {
        Some(stripped) => (stripped.trim_end(), DisplayZone::Utc),
        None => (text, zone),
    };

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(body, format) {
            return zone
                .localize(&naive)
                .ok_or_else(|| Error::datetime(text, format!("does not exist in {zone} time")));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(body, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .and_then(|midnight| zone.localize(&midnight))
            .ok_or_else(|| Error::datetime(text, format!("does not exist in {zone} time")));
    }

    Err(Error::datetime(text, "unrecognized date-time format"))
}
