//! Time formatting and cadence helpers.

use chrono::{DateTime, Datelike, Duration as ChronoDuration, NaiveTime, Utc, Weekday};
use std::time::Duration;

/// Format a duration in seconds to a human-readable string.
pub fn format_duration(secs: u64) -> String {
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs < 86400 {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    } else {
        format!("{}d {}h", secs / 86400, (secs % 86400) / 3600)
    }
}

/// Time left until the next `hour:minute` UTC strictly after `now`.
pub fn until_next_daily(now: DateTime<Utc>, hour: u32, minute: u32) -> Duration {
    let at = NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN);
    let mut next = now.date_naive().and_time(at).and_utc();
    if next <= now {
        next += ChronoDuration::days(1);
    }
    (next - now).to_std().unwrap_or_default()
}

/// Time left until the next `weekday` at `hour:00` UTC strictly after `now`.
pub fn until_next_weekly(now: DateTime<Utc>, weekday: Weekday, hour: u32) -> Duration {
    let at = NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN);
    let days_ahead = (7 + weekday.num_days_from_monday() as i64
        - now.weekday().num_days_from_monday() as i64)
        % 7;
    let mut next = (now.date_naive() + ChronoDuration::days(days_ahead))
        .and_time(at)
        .and_utc();
    if next <= now {
        next += ChronoDuration::days(7);
    }
    (next - now).to_std().unwrap_or_default()
}
