//! Dose schedule calculator
//!
//! Pure date arithmetic over a [`DoseFrequency`]: the next instant a dose is
//! due, and the dose times that fall inside one calendar day. Nothing here
//! reads the clock; callers pass the reference instant in.

use crate::models::DoseFrequency;
use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Timelike};
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

lazy_static! {
    static ref DOSE_TIME_RE: Regex = Regex::new(r"^(\d{2}):(\d{2})$").unwrap();
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidFrequency {
    #[error("Invalid frequency: interval must be positive, got {0} hours")]
    NonPositiveInterval(i32),

    #[error("Invalid frequency: first dose time is blank")]
    BlankFirstDoseTime,

    #[error("Invalid frequency: cannot parse first dose time '{0}' (expected HH:mm)")]
    UnparseableFirstDoseTime(String),
}

/// Parses a first-dose time in strict `HH:mm` form.
pub fn parse_dose_time(raw: &str) -> Result<NaiveTime, InvalidFrequency> {
    if raw.trim().is_empty() {
        return Err(InvalidFrequency::BlankFirstDoseTime);
    }

    let captures = DOSE_TIME_RE
        .captures(raw)
        .ok_or_else(|| InvalidFrequency::UnparseableFirstDoseTime(raw.to_string()))?;

    let hour: u32 = captures[1].parse().unwrap_or(u32::MAX);
    let minute: u32 = captures[2].parse().unwrap_or(u32::MAX);

    NaiveTime::from_hms_opt(hour, minute, 0)
        .ok_or_else(|| InvalidFrequency::UnparseableFirstDoseTime(raw.to_string()))
}

/// Validates both halves of a frequency, returning the parsed first dose
/// time and the interval as a duration.
pub fn validate(frequency: &DoseFrequency) -> Result<(NaiveTime, Duration), InvalidFrequency> {
    if frequency.interval_hours <= 0 {
        return Err(InvalidFrequency::NonPositiveInterval(frequency.interval_hours));
    }
    let first_dose = parse_dose_time(&frequency.first_dose_time)?;
    Ok((first_dose, Duration::hours(i64::from(frequency.interval_hours))))
}

/// Earliest instant at or after `now` that is today's first dose time plus
/// a whole number of intervals.
///
/// "Today" is the calendar date of `now` in its own zone. Intervals are
/// added as absolute durations, so a dose schedule keeps its spacing across
/// DST changes.
pub fn next_occurrence<Tz: TimeZone>(
    frequency: &DoseFrequency,
    now: &DateTime<Tz>,
) -> Result<DateTime<Tz>, InvalidFrequency> {
    let (first_dose, interval) = validate(frequency)?;

    let today = now.date_naive().and_time(first_dose);
    let first_candidate = resolve_local(&now.timezone(), today);

    if first_candidate >= *now {
        return Ok(first_candidate);
    }

    // Whole intervals needed to reach `now`, rounding up.
    let behind = now.clone().signed_duration_since(first_candidate.clone());
    let interval_secs = interval.num_seconds();
    let steps = (behind.num_seconds() + interval_secs - 1) / interval_secs;
    let mut candidate = first_candidate + Duration::seconds(steps * interval_secs);

    // Sub-second parts of `now` can leave the candidate one step short.
    while candidate < *now {
        candidate = candidate + interval;
    }

    Ok(candidate)
}

/// First occurrence strictly after an alarm that has just fired.
///
/// Dose instants carry no seconds, so stepping the reference one second
/// past the fire time excludes the dose that was just delivered.
pub fn next_occurrence_after<Tz: TimeZone>(
    frequency: &DoseFrequency,
    fired_at: &DateTime<Tz>,
    now: &DateTime<Tz>,
) -> Result<DateTime<Tz>, InvalidFrequency> {
    let just_after = fired_at.clone() + Duration::seconds(1);
    let reference = if *now > just_after { now.clone() } else { just_after };
    next_occurrence(frequency, &reference)
}

/// Dose times within one calendar day.
///
/// Yields `floor(24 / interval)` times (at least one) starting at the first
/// dose time. Time-of-day addition wraps at midnight, so 09:00 every 8 hours
/// gives 09:00, 17:00 and 01:00 in that order.
pub fn doses_in_day(
    frequency: &DoseFrequency,
    _day: NaiveDate,
) -> Result<Vec<NaiveTime>, InvalidFrequency> {
    let (first_dose, interval) = validate(frequency)?;

    let count = (24 / frequency.interval_hours).max(1);
    let times = (0..count)
        .map(|i| {
            let (time, _) = first_dose.overflowing_add_signed(interval * i);
            time
        })
        .collect();

    Ok(times)
}

fn resolve_local<Tz: TimeZone>(tz: &Tz, local: chrono::NaiveDateTime) -> DateTime<Tz> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _) => earliest,
        // Skipped by a DST jump: the wall clock reads one hour later.
        LocalResult::None => {
            let shifted = local + Duration::hours(1);
            tz.from_local_datetime(&shifted)
                .earliest()
                .unwrap_or_else(|| tz.from_utc_datetime(&shifted))
        }
    }
}

/// `HH:MM` rendering used by the agenda.
pub fn format_dose_time(time: NaiveTime) -> String {
    format!("{:02}:{:02}", time.hour(), time.minute())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use chrono_tz::America::New_York;

    fn freq(interval_hours: i32, first: &str) -> DoseFrequency {
        DoseFrequency::new(interval_hours, first)
    }

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn hhmm(times: &[NaiveTime]) -> Vec<String> {
        times.iter().map(|t| format_dose_time(*t)).collect()
    }

    #[test]
    fn test_parse_dose_time() {
        assert_eq!(parse_dose_time("09:30").unwrap(), NaiveTime::from_hms_opt(9, 30, 0).unwrap());
        assert_eq!(parse_dose_time("00:00").unwrap(), NaiveTime::from_hms_opt(0, 0, 0).unwrap());
        assert_eq!(parse_dose_time("").unwrap_err(), InvalidFrequency::BlankFirstDoseTime);
        assert_eq!(parse_dose_time("   ").unwrap_err(), InvalidFrequency::BlankFirstDoseTime);
        assert!(matches!(
            parse_dose_time("9:00"),
            Err(InvalidFrequency::UnparseableFirstDoseTime(_))
        ));
        assert!(matches!(
            parse_dose_time("24:00"),
            Err(InvalidFrequency::UnparseableFirstDoseTime(_))
        ));
        assert!(matches!(
            parse_dose_time("12:60"),
            Err(InvalidFrequency::UnparseableFirstDoseTime(_))
        ));
        assert!(matches!(
            parse_dose_time("morning"),
            Err(InvalidFrequency::UnparseableFirstDoseTime(_))
        ));
    }

    #[test]
    fn test_next_occurrence_steps_past_now() {
        let next = next_occurrence(&freq(8, "09:00"), &utc(2024, 1, 1, 10, 0)).unwrap();
        assert_eq!(next, utc(2024, 1, 1, 17, 0));
    }

    #[test]
    fn test_next_occurrence_exactly_now() {
        let now = utc(2024, 1, 1, 17, 0);
        assert_eq!(next_occurrence(&freq(8, "09:00"), &now).unwrap(), now);
    }

    #[test]
    fn test_next_occurrence_before_first_dose_is_today_first_dose() {
        let next = next_occurrence(&freq(4, "09:00"), &utc(2024, 1, 1, 1, 0)).unwrap();
        assert_eq!(next, utc(2024, 1, 1, 9, 0));
    }

    #[test]
    fn test_next_occurrence_crosses_midnight() {
        let next = next_occurrence(&freq(8, "09:00"), &utc(2024, 1, 1, 17, 30)).unwrap();
        assert_eq!(next, utc(2024, 1, 2, 1, 0));
    }

    #[test]
    fn test_next_occurrence_ignores_seconds_of_now() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 17, 0, 1).unwrap();
        let next = next_occurrence(&freq(8, "09:00"), &now).unwrap();
        assert_eq!(next, utc(2024, 1, 2, 1, 0));
    }

    #[test]
    fn test_next_occurrence_is_bounded_and_idempotent() {
        for interval in [1, 3, 5, 7, 8, 12, 24, 36] {
            for hour in 9..24 {
                let now = utc(2024, 3, 15, hour, 17);
                let f = freq(interval, "09:00");
                let first = next_occurrence(&f, &now).unwrap();
                let second = next_occurrence(&f, &now).unwrap();
                assert_eq!(first, second);
                assert!(first >= now);
                assert!(
                    first < now + Duration::hours(interval as i64),
                    "interval {} at {}:17 gave {}",
                    interval,
                    hour,
                    first
                );
            }
        }
    }

    #[test]
    fn test_next_occurrence_rejects_invalid() {
        let now = utc(2024, 1, 1, 10, 0);
        assert_eq!(
            next_occurrence(&freq(0, "09:00"), &now).unwrap_err(),
            InvalidFrequency::NonPositiveInterval(0)
        );
        assert_eq!(
            next_occurrence(&freq(-6, "09:00"), &now).unwrap_err(),
            InvalidFrequency::NonPositiveInterval(-6)
        );
        assert_eq!(
            next_occurrence(&freq(8, ""), &now).unwrap_err(),
            InvalidFrequency::BlankFirstDoseTime
        );
    }

    #[test]
    fn test_next_occurrence_in_local_zone() {
        // 10:00 in New York is 15:00 UTC in January.
        let now = New_York.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        let next = next_occurrence(&freq(8, "09:00"), &now).unwrap();
        assert_eq!(next, New_York.with_ymd_and_hms(2024, 1, 1, 17, 0, 0).unwrap());
        assert_eq!(next.with_timezone(&Utc), utc(2024, 1, 1, 22, 0));
    }

    #[test]
    fn test_next_occurrence_on_dst_gap() {
        // 02:30 does not exist in New York on 2024-03-10.
        let now = New_York.with_ymd_and_hms(2024, 3, 10, 0, 30, 0).unwrap();
        let next = next_occurrence(&freq(24, "02:30"), &now).unwrap();
        assert_eq!(next, New_York.with_ymd_and_hms(2024, 3, 10, 3, 30, 0).unwrap());
    }

    #[test]
    fn test_next_occurrence_after_fire_skips_fired_dose() {
        let fired = utc(2024, 1, 1, 17, 0);
        let next = next_occurrence_after(&freq(8, "09:00"), &fired, &fired).unwrap();
        assert_eq!(next, utc(2024, 1, 2, 1, 0));
    }

    #[test]
    fn test_next_occurrence_after_late_delivery_uses_now() {
        let fired = utc(2024, 1, 1, 9, 0);
        let now = utc(2024, 1, 1, 18, 0);
        let next = next_occurrence_after(&freq(8, "09:00"), &fired, &now).unwrap();
        assert_eq!(next, utc(2024, 1, 2, 1, 0));
    }

    #[test]
    fn test_doses_in_day_eight_hours_wraps() {
        let times = doses_in_day(&freq(8, "09:00"), day()).unwrap();
        assert_eq!(hhmm(&times), vec!["09:00", "17:00", "01:00"]);
    }

    #[test]
    fn test_doses_in_day_daily() {
        let times = doses_in_day(&freq(24, "07:00"), day()).unwrap();
        assert_eq!(hhmm(&times), vec!["07:00"]);
    }

    #[test]
    fn test_doses_in_day_non_divisor() {
        let times = doses_in_day(&freq(5, "06:00"), day()).unwrap();
        assert_eq!(hhmm(&times), vec!["06:00", "11:00", "16:00", "21:00"]);
    }

    #[test]
    fn test_doses_in_day_interval_longer_than_day() {
        let times = doses_in_day(&freq(48, "08:15"), day()).unwrap();
        assert_eq!(hhmm(&times), vec!["08:15"]);
    }

    #[test]
    fn test_doses_in_day_rejects_invalid() {
        assert!(doses_in_day(&freq(0, "09:00"), day()).is_err());
        assert!(doses_in_day(&freq(8, " "), day()).is_err());
    }
}
