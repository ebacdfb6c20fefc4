//! Local wall-clock rendering of stored instants.
//!
//! Everything persisted is UTC; the business works in one configured
//! zone, so every label and every picker value goes through here.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

/// Picker format of the combined date and time value.
pub const LOCAL_INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M";

pub fn to_local(at: &DateTime<Utc>, tz: Tz) -> DateTime<Tz> {
    at.with_timezone(&tz)
}

/// Day and month, e.g. `1/6`.
pub fn short_date(at: &DateTime<Utc>, tz: Tz) -> String {
    to_local(at, tz).format("%-d/%-m").to_string()
}

/// 24-hour clock, e.g. `14:30`.
pub fn time_of_day(at: &DateTime<Utc>, tz: Tz) -> String {
    to_local(at, tz).format("%H:%M").to_string()
}

/// Weekday, day and month, e.g. `Saturday, June 1`.
pub fn long_date(at: &DateTime<Utc>, tz: Tz) -> String {
    to_local(at, tz).format("%A, %B %-d").to_string()
}

/// `Today`, `Tomorrow`, or the weekday name, relative to `now` in the
/// business time zone.
pub fn relative_day_label(at: &DateTime<Utc>, now: &DateTime<Utc>, tz: Tz) -> String {
    let day = to_local(at, tz).date_naive();
    let today = to_local(now, tz).date_naive();

    if day == today {
        "Today".to_string()
    } else if today.succ_opt() == Some(day) {
        "Tomorrow".to_string()
    } else {
        day.format("%A").to_string()
    }
}

/// Resolve a local wall-clock value to an instant. A value skipped by a
/// DST transition has no instant; an ambiguous one takes the earlier.
pub fn local_instant(local: NaiveDateTime, tz: Tz) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&local)
        .earliest()
        .map(|at| at.with_timezone(&Utc))
}

/// Parse a `YYYY-MM-DD` date and an `HH:MM` time as local wall-clock.
pub fn parse_local(date: &str, time: &str, tz: Tz) -> Option<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()?;
    let time = NaiveTime::parse_from_str(time.trim(), "%H:%M").ok()?;
    local_instant(date.and_time(time), tz)
}

/// Default value offered when setting a reminder: one hour before the
/// appointment, minutes rounded to the nearest five (never 60).
pub fn suggest_reminder_time(scheduled_at: &DateTime<Utc>, tz: Tz) -> NaiveDateTime {
    let local = (to_local(scheduled_at, tz) - Duration::hours(1)).naive_local();
    let mut minute = ((f64::from(local.minute()) / 5.0).round() as u32) * 5;
    if minute == 60 {
        minute = 55;
    }
    let time = NaiveTime::from_hms_opt(local.hour(), minute, 0).unwrap_or(local.time());
    local.date().and_time(time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::America::Argentina::Buenos_Aires;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn formats_in_business_zone() {
        // 17:30 UTC is 14:30 in Buenos Aires (UTC-3)
        let at = utc(2024, 6, 1, 17, 30);
        assert_eq!(short_date(&at, Buenos_Aires), "1/6");
        assert_eq!(time_of_day(&at, Buenos_Aires), "14:30");
        assert_eq!(long_date(&at, Buenos_Aires), "Saturday, June 1");
    }

    #[test]
    fn day_boundary_follows_local_zone() {
        // 01:00 UTC on the 2nd is still the 1st locally
        let at = utc(2024, 6, 2, 1, 0);
        assert_eq!(short_date(&at, Buenos_Aires), "1/6");
        assert_eq!(time_of_day(&at, Buenos_Aires), "22:00");
    }

    #[test]
    fn relative_labels() {
        let now = utc(2024, 6, 1, 12, 0);
        assert_eq!(relative_day_label(&utc(2024, 6, 1, 22, 0), &now, Buenos_Aires), "Today");
        assert_eq!(relative_day_label(&utc(2024, 6, 2, 15, 0), &now, Buenos_Aires), "Tomorrow");
        assert_eq!(relative_day_label(&utc(2024, 6, 5, 15, 0), &now, Buenos_Aires), "Wednesday");
    }

    #[test]
    fn parse_local_wall_clock() {
        let at = parse_local("2024-06-01", "14:30", Buenos_Aires).unwrap();
        assert_eq!(at, utc(2024, 6, 1, 17, 30));
        assert!(parse_local("2024-06-01", "25:00", Buenos_Aires).is_none());
        assert!(parse_local("junio", "14:30", Buenos_Aires).is_none());
    }

    #[test]
    fn nonexistent_local_time_has_no_instant() {
        // Madrid skipped 02:00-03:00 on 2024-03-31
        let gap = NaiveDate::from_ymd_opt(2024, 3, 31)
            .unwrap()
            .and_hms_opt(2, 30, 0)
            .unwrap();
        assert!(local_instant(gap, chrono_tz::Europe::Madrid).is_none());
    }

    #[test]
    fn ambiguous_local_time_takes_earlier_instant() {
        // Madrid repeated 02:00-03:00 on 2024-10-27
        let repeated = NaiveDate::from_ymd_opt(2024, 10, 27)
            .unwrap()
            .and_hms_opt(2, 30, 0)
            .unwrap();
        let at = local_instant(repeated, chrono_tz::Europe::Madrid).unwrap();
        assert_eq!(at, utc(2024, 10, 27, 0, 30));
    }

    #[test]
    fn reminder_suggestion_is_an_hour_before_rounded() {
        // 14:32 local -> 13:30
        let at = utc(2024, 6, 1, 17, 32);
        assert_eq!(
            suggest_reminder_time(&at, Buenos_Aires).format(LOCAL_INPUT_FORMAT).to_string(),
            "2024-06-01T13:30"
        );
        // 14:58 local -> 13:55, not 14:00
        let at = utc(2024, 6, 1, 17, 58);
        assert_eq!(
            suggest_reminder_time(&at, Buenos_Aires).format(LOCAL_INPUT_FORMAT).to_string(),
            "2024-06-01T13:55"
        );
    }

    #[test]
    fn reminder_suggestion_crosses_midnight() {
        // 00:20 local on the 2nd -> 23:20 on the 1st
        let at = utc(2024, 6, 2, 3, 20);
        assert_eq!(
            suggest_reminder_time(&at, Buenos_Aires).format(LOCAL_INPUT_FORMAT).to_string(),
            "2024-06-01T23:20"
        );
    }
}
