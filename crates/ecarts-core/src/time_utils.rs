use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Timelike, Utc};
use chrono_tz::Tz;
use tracing::warn;

use crate::error::{EcartsError, Result};

/// Prefix of every storage day key.
pub const DAY_KEY_PREFIX: &str = "Journée_";

// ── System timezone detection ─────────────────────────────────────────────────

/// Detect the IANA timezone name of the running system.
///
/// Falls back to `"UTC"` if detection fails.
pub fn get_system_timezone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}

// ── Clock ─────────────────────────────────────────────────────────────────────

/// Source of local wall-clock time for day and hour keys.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    tz: Tz,
}

impl Clock {
    /// Create a clock in the named IANA timezone.
    ///
    /// `"auto"` resolves to the system timezone. Unrecognised names fall back
    /// to UTC with a warning.
    pub fn new(tz_name: &str) -> Self {
        let resolved = if tz_name == "auto" {
            get_system_timezone()
        } else {
            tz_name.to_string()
        };
        let tz = resolved.parse::<Tz>().unwrap_or_else(|_| {
            warn!(
                "Clock: unrecognised timezone \"{}\", falling back to UTC",
                resolved
            );
            Tz::UTC
        });
        Self { tz }
    }

    pub fn utc() -> Self {
        Self { tz: Tz::UTC }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Convert a UTC instant to local wall-clock time.
    pub fn to_local(&self, dt: DateTime<Utc>) -> NaiveDateTime {
        dt.with_timezone(&self.tz).naive_local()
    }

    pub fn validate_timezone(tz_name: &str) -> bool {
        tz_name.parse::<Tz>().is_ok()
    }
}

// ── Keys and labels ───────────────────────────────────────────────────────────

/// Storage day key for a local time.
///
/// Hours before `rollover_hour` belong to the previous calendar day, so with
/// the default rollover of 1 the window 00:00-00:59 is filed under yesterday.
pub fn day_key(local: NaiveDateTime, rollover_hour: u32) -> String {
    let date = if local.hour() < rollover_hour {
        local.date() - Duration::days(1)
    } else {
        local.date()
    };
    format!("{}{}", DAY_KEY_PREFIX, date.format("%Y%m%d"))
}

/// Zero-padded `HH:00` key; lexicographic order equals chronological order.
pub fn hour_key(local: NaiveDateTime) -> String {
    local.format("%H:00").to_string()
}

/// `HH:MM` label shown in messages.
pub fn hour_label(local: NaiveDateTime) -> String {
    local.format("%H:%M").to_string()
}

/// Human-readable form of a day key (`Journée_20240115` → `Journée 20240115`).
pub fn day_label(day_key: &str) -> String {
    day_key.replace('_', " ")
}

/// Accept exactly `HH:00` with `HH` in `00..=23`.
pub fn validate_hour_key(key: &str) -> Result<()> {
    let valid = key.len() == 5
        && key.ends_with(":00")
        && key[..2].chars().all(|c| c.is_ascii_digit())
        && key[..2].parse::<u32>().map(|h| h < 24).unwrap_or(false);
    if valid {
        Ok(())
    } else {
        Err(EcartsError::InvalidHourKey(key.to_string()))
    }
}

/// Accept `Journée_YYYYMMDD` naming a real calendar date.
pub fn validate_day_key(key: &str) -> Result<()> {
    key.strip_prefix(DAY_KEY_PREFIX)
        .filter(|digits| digits.len() == 8)
        .and_then(|digits| NaiveDate::parse_from_str(digits, "%Y%m%d").ok())
        .map(|_| ())
        .ok_or_else(|| EcartsError::InvalidDayKey(key.to_string()))
}
