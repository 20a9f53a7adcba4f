use chrono::{Datelike, Days, NaiveDate, NaiveTime, Timelike};

use crate::models::DayOfWeek;

/// Earliest candidate start time offered for days other than today.
pub const DEFAULT_DAY_START: &str = "06:00";
/// Start time applied when enabling a day other than today for the first time.
pub const DEFAULT_TOGGLE_START: &str = "08:00";

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Which boundary list `generate_time_options` produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeOptionKind {
    Start,
    End,
}

/// Parse `HH:MM` into minutes since midnight. Returns `None` on anything
/// malformed or out of range; callers surface that as a validation failure.
pub fn time_to_minutes(hhmm: &str) -> Option<u32> {
    let (hours, minutes) = hhmm.split_once(':')?;
    if hours.len() != 2 || minutes.len() != 2 {
        return None;
    }

    let hours: u32 = hours.parse().ok()?;
    let minutes: u32 = minutes.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }

    Some(hours * 60 + minutes)
}

/// Inverse of `time_to_minutes`, zero-padded. Callers clamp below 24:00.
pub fn minutes_to_time(total_minutes: u32) -> String {
    format!("{:02}:{:02}", total_minutes / 60, total_minutes % 60)
}

/// Next slot-aligned boundary at or after `now`: the minute is rounded up to
/// the next multiple of `slot_duration` within the hour, rolling into the
/// next hour at 60.
pub fn next_slot_boundary(now: NaiveTime, slot_duration: u32) -> u32 {
    let mut hour = now.hour();
    let mut minute = now.minute().div_ceil(slot_duration) * slot_duration;
    if minute >= 60 {
        hour += 1;
        minute -= 60;
    }
    hour * 60 + minute
}

/// Candidate `HH:MM` boundaries spaced exactly `slot_duration` minutes apart
/// up to 23:59.
///
/// Start options on today begin at the next slot boundary after the current
/// minute and are exhausted once that boundary lands in hour 23; on other
/// days they begin at 06:00. End options begin one slot after
/// `reference_start`, advanced past the current minute on today.
pub fn generate_time_options(
    day_is_today: bool,
    kind: TimeOptionKind,
    reference_start: Option<&str>,
    slot_duration: u32,
    now: NaiveTime,
) -> Vec<String> {
    if slot_duration == 0 {
        return Vec::new();
    }

    let lower_bound = match kind {
        TimeOptionKind::Start => {
            if day_is_today {
                let boundary = next_slot_boundary(now, slot_duration);
                if boundary / 60 >= 23 {
                    return Vec::new();
                }
                boundary
            } else {
                time_to_minutes(DEFAULT_DAY_START).unwrap_or(0)
            }
        }
        TimeOptionKind::End => {
            let start = match reference_start.and_then(time_to_minutes) {
                Some(start) => start,
                None => return Vec::new(),
            };

            let mut bound = start + slot_duration;
            if day_is_today {
                let now_minutes = now.hour() * 60 + now.minute();
                while bound <= now_minutes {
                    bound += slot_duration;
                }
            }
            if bound >= MINUTES_PER_DAY {
                return Vec::new();
            }
            bound
        }
    };

    let mut options = Vec::new();
    let mut current = lower_bound;
    while current < MINUTES_PER_DAY {
        options.push(minutes_to_time(current));
        current += slot_duration;
    }

    options
}

/// Monday-start bounds of the week `offset` weeks after the week containing
/// `today`.
pub fn week_bounds(today: NaiveDate, offset: u32) -> (NaiveDate, NaiveDate) {
    let days_from_monday = today.weekday().num_days_from_monday() as u64;
    let start = today - Days::new(days_from_monday) + Days::new(7 * offset as u64);
    (start, start + Days::new(6))
}

/// Whether `day` already passed within the viewed week. Only the currently
/// running week (offset 0) has past days; comparison is by weekday order.
pub fn is_past_day(day: DayOfWeek, today: NaiveDate, offset: u32) -> bool {
    offset == 0 && day.index() < today.weekday().num_days_from_monday()
}

/// Date range handed to slot materialization: never before today on the
/// current week, the full week otherwise.
pub fn generation_range(today: NaiveDate, offset: u32) -> (NaiveDate, NaiveDate) {
    let (start, end) = week_bounds(today, offset);
    if offset == 0 && today > start {
        (today, end)
    } else {
        (start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(hhmm: &str) -> NaiveTime {
        NaiveTime::parse_from_str(hhmm, "%H:%M").unwrap()
    }

    #[test]
    fn time_to_minutes_parses_well_formed_input() {
        assert_eq!(time_to_minutes("00:00"), Some(0));
        assert_eq!(time_to_minutes("09:30"), Some(570));
        assert_eq!(time_to_minutes("23:59"), Some(1439));
    }

    #[test]
    fn time_to_minutes_rejects_malformed_input() {
        assert_eq!(time_to_minutes("24:00"), None);
        assert_eq!(time_to_minutes("12:60"), None);
        assert_eq!(time_to_minutes("9:30"), None);
        assert_eq!(time_to_minutes("nonsense"), None);
        assert_eq!(time_to_minutes(""), None);
    }

    #[test]
    fn minutes_to_time_round_trips_every_well_formed_time() {
        for hours in 0..24 {
            for minutes in 0..60 {
                let s = format!("{:02}:{:02}", hours, minutes);
                assert_eq!(minutes_to_time(time_to_minutes(&s).unwrap()), s);
            }
        }
    }

    #[test]
    fn start_options_for_other_days_begin_at_default() {
        let options =
            generate_time_options(false, TimeOptionKind::Start, None, 30, t("14:10"));
        assert_eq!(options.first().map(String::as_str), Some("06:00"));
        assert_eq!(options.last().map(String::as_str), Some("23:30"));
        for pair in options.windows(2) {
            let gap = time_to_minutes(&pair[1]).unwrap() - time_to_minutes(&pair[0]).unwrap();
            assert_eq!(gap, 30);
        }
    }

    #[test]
    fn start_options_for_today_round_up_to_next_boundary() {
        let options =
            generate_time_options(true, TimeOptionKind::Start, None, 30, t("14:10"));
        assert_eq!(options.first().map(String::as_str), Some("14:30"));
    }

    #[test]
    fn start_boundary_on_the_dot_is_kept() {
        let options =
            generate_time_options(true, TimeOptionKind::Start, None, 30, t("14:30"));
        assert_eq!(options.first().map(String::as_str), Some("14:30"));
    }

    #[test]
    fn start_boundary_rolls_into_next_hour() {
        let options =
            generate_time_options(true, TimeOptionKind::Start, None, 45, t("14:50"));
        assert_eq!(options.first().map(String::as_str), Some("15:30"));
    }

    #[test]
    fn start_options_exhaust_in_final_hour() {
        let options =
            generate_time_options(true, TimeOptionKind::Start, None, 30, t("22:45"));
        assert!(options.is_empty());
    }

    #[test]
    fn end_options_start_one_slot_after_reference() {
        let options =
            generate_time_options(false, TimeOptionKind::End, Some("09:00"), 30, t("00:00"));
        assert_eq!(options.first().map(String::as_str), Some("09:30"));
    }

    #[test]
    fn end_options_stay_aligned_to_reference_grid() {
        let d = 45;
        let start = "07:15";
        let options =
            generate_time_options(false, TimeOptionKind::End, Some(start), d, t("00:00"));
        let start_minutes = time_to_minutes(start).unwrap();
        assert!(!options.is_empty());
        for option in &options {
            let minutes = time_to_minutes(option).unwrap();
            assert!(minutes >= start_minutes + d);
            assert_eq!((minutes - start_minutes) % d, 0);
        }
    }

    #[test]
    fn end_options_advance_past_now_on_today() {
        // start 09:00, now 14:10: candidates before 14:10 are unusable
        let options =
            generate_time_options(true, TimeOptionKind::End, Some("09:00"), 30, t("14:10"));
        assert_eq!(options.first().map(String::as_str), Some("14:30"));
    }

    #[test]
    fn end_options_empty_when_day_exhausted() {
        let options =
            generate_time_options(false, TimeOptionKind::End, Some("23:45"), 30, t("00:00"));
        assert!(options.is_empty());
    }

    #[test]
    fn end_options_empty_without_reference() {
        let options = generate_time_options(false, TimeOptionKind::End, None, 30, t("00:00"));
        assert!(options.is_empty());
    }

    #[test]
    fn week_bounds_start_on_monday() {
        // 2026-08-07 is a Friday
        let today = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
        let (start, end) = week_bounds(today, 0);
        assert_eq!(start, NaiveDate::from_ymd_opt(2026, 8, 3).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2026, 8, 9).unwrap());
    }

    #[test]
    fn week_bounds_handle_sunday() {
        // Sunday belongs to the week that started the previous Monday
        let sunday = NaiveDate::from_ymd_opt(2026, 8, 9).unwrap();
        let (start, _) = week_bounds(sunday, 0);
        assert_eq!(start, NaiveDate::from_ymd_opt(2026, 8, 3).unwrap());
    }

    #[test]
    fn week_bounds_apply_offset() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
        let (start, end) = week_bounds(today, 2);
        assert_eq!(start, NaiveDate::from_ymd_opt(2026, 8, 17).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2026, 8, 23).unwrap());
    }

    #[test]
    fn past_days_only_exist_on_current_week() {
        let friday = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
        assert!(is_past_day(DayOfWeek::Monday, friday, 0));
        assert!(is_past_day(DayOfWeek::Thursday, friday, 0));
        assert!(!is_past_day(DayOfWeek::Friday, friday, 0));
        assert!(!is_past_day(DayOfWeek::Saturday, friday, 0));
        assert!(!is_past_day(DayOfWeek::Monday, friday, 1));
    }

    #[test]
    fn generation_range_starts_today_mid_week() {
        let friday = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
        let (start, end) = generation_range(friday, 0);
        assert_eq!(start, friday);
        assert_eq!(end, NaiveDate::from_ymd_opt(2026, 8, 9).unwrap());

        let (next_start, next_end) = generation_range(friday, 1);
        assert_eq!(next_start, NaiveDate::from_ymd_opt(2026, 8, 10).unwrap());
        assert_eq!(next_end, NaiveDate::from_ymd_opt(2026, 8, 16).unwrap());
    }
}
