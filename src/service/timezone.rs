use chrono::{DateTime, NaiveDate, Offset, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

use crate::error::{Result, SchedulerError};

pub fn parse_tz(id: &str) -> Result<Tz> {
    id.parse::<Tz>()
        .map_err(|_| SchedulerError::InvalidTimezone(id.to_string()))
}

fn utc_instant(utc_hour: u32, date: NaiveDate) -> Result<DateTime<Utc>> {
    let naive = date
        .and_hms_opt(utc_hour, 0, 0)
        .ok_or(SchedulerError::InvalidHour(utc_hour))?;
    Ok(Utc.from_utc_datetime(&naive))
}

/// Wall-clock time in `tz` at `utc_hour`:00 UTC on `date`.
///
/// The offset is the one in force at that instant, so DST and half-hour
/// zones come out right.
pub fn local_datetime(utc_hour: u32, date: NaiveDate, tz: Tz) -> Result<DateTime<Tz>> {
    Ok(utc_instant(utc_hour, date)?.with_timezone(&tz))
}

pub fn local_hour(utc_hour: u32, date: NaiveDate, timezone: &str) -> Result<u32> {
    let tz = parse_tz(timezone)?;
    Ok(local_datetime(utc_hour, date, tz)?.hour())
}

/// UTC offset of `tz` in minutes at `utc_hour`:00 UTC on `date`.
pub fn offset_minutes(utc_hour: u32, date: NaiveDate, tz: Tz) -> Result<i32> {
    let local = local_datetime(utc_hour, date, tz)?;
    Ok(local.offset().fix().local_minus_utc() / 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn utc_is_identity() {
        for hour in 0..24 {
            assert_eq!(local_hour(hour, day(2026, 6, 1), "UTC").unwrap(), hour);
        }
    }

    #[test]
    fn local_hour_stays_in_range() {
        for zone in ["Pacific/Auckland", "Asia/Kolkata", "America/Los_Angeles", "Pacific/Kiritimati"] {
            for hour in 0..24 {
                let local = local_hour(hour, day(2026, 1, 15), zone).unwrap();
                assert!(local < 24, "{zone} {hour} -> {local}");
            }
        }
    }

    #[test]
    fn fixed_half_hour_offset_truncates() {
        // Kolkata is +05:30 all year; 00:00 UTC is 05:30 local.
        assert_eq!(local_hour(0, day(2026, 7, 1), "Asia/Kolkata").unwrap(), 5);
        assert_eq!(local_hour(20, day(2026, 7, 1), "Asia/Kolkata").unwrap(), 1);
    }

    #[test]
    fn new_york_spring_forward() {
        // DST starts 2026-03-08 at 07:00 UTC.
        assert_eq!(local_hour(14, day(2026, 3, 7), "America/New_York").unwrap(), 9);
        assert_eq!(local_hour(14, day(2026, 3, 8), "America/New_York").unwrap(), 10);
        assert_eq!(local_hour(6, day(2026, 3, 8), "America/New_York").unwrap(), 1);
        assert_eq!(local_hour(7, day(2026, 3, 8), "America/New_York").unwrap(), 3);
    }

    #[test]
    fn new_york_fall_back() {
        // DST ends 2026-11-01 at 06:00 UTC.
        assert_eq!(local_hour(14, day(2026, 10, 31), "America/New_York").unwrap(), 10);
        assert_eq!(local_hour(14, day(2026, 11, 1), "America/New_York").unwrap(), 9);
        assert_eq!(local_hour(5, day(2026, 11, 1), "America/New_York").unwrap(), 1);
        assert_eq!(local_hour(6, day(2026, 11, 1), "America/New_York").unwrap(), 1);
    }

    #[test]
    fn offset_follows_the_date() {
        let tz = parse_tz("Europe/Berlin").unwrap();
        assert_eq!(offset_minutes(12, day(2026, 1, 10), tz).unwrap(), 60);
        assert_eq!(offset_minutes(12, day(2026, 7, 10), tz).unwrap(), 120);
    }

    #[test]
    fn rejects_unknown_zone_and_hour() {
        assert_eq!(
            local_hour(3, day(2026, 1, 1), "Nowhere/Special"),
            Err(SchedulerError::InvalidTimezone("Nowhere/Special".to_string()))
        );
        assert_eq!(
            local_hour(24, day(2026, 1, 1), "UTC"),
            Err(SchedulerError::InvalidHour(24))
        );
    }
}
