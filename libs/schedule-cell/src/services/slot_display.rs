use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use tracing::warn;

use crate::clock::Clock;
use crate::models::{DayOfWeek, ScheduleSlot, SlotStatus};
use crate::services::schedule::ScheduleClient;
use crate::timeutil::week_bounds;

/// Read-only weekly view of materialized slots, grouped by day. Used to
/// verify what the composer's save actually produced; never mutates.
pub struct WeekSlotOverview {
    week_start: NaiveDate,
    week_end: NaiveDate,
    days: BTreeMap<DayOfWeek, Vec<ScheduleSlot>>,
    error: Option<String>,
}

impl WeekSlotOverview {
    /// Fetch the current calendar week's slots for `doctor_id` in one range
    /// query. A fetch failure yields an empty overview with an error banner.
    pub async fn load(schedule: &ScheduleClient, doctor_id: &str, clock: &dyn Clock) -> Self {
        let (week_start, week_end) = week_bounds(clock.today(), 0);

        let day_end = NaiveTime::from_hms_opt(23, 59, 59).expect("valid time of day");
        let range_start = Utc.from_utc_datetime(&week_start.and_time(NaiveTime::MIN));
        let range_end = Utc.from_utc_datetime(&week_end.and_time(day_end));

        match schedule
            .fetch_schedule_with_status_for_doctor(doctor_id, range_start, range_end)
            .await
        {
            Ok(slots) => Self {
                week_start,
                week_end,
                days: group_slots_by_day(slots),
                error: None,
            },
            Err(err) => {
                warn!("Error fetching week slots: {}", err);
                Self {
                    week_start,
                    week_end,
                    days: BTreeMap::new(),
                    error: Some("Failed to load week slots".to_string()),
                }
            }
        }
    }

    pub fn week_start(&self) -> NaiveDate {
        self.week_start
    }

    pub fn week_end(&self) -> NaiveDate {
        self.week_end
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Slots for one day, in fetch order.
    pub fn slots_for(&self, day: DayOfWeek) -> &[ScheduleSlot] {
        self.days.get(&day).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn total_slots(&self) -> usize {
        self.days.values().map(Vec::len).sum()
    }

    /// Per-status tallies across the whole week.
    pub fn status_counts(&self) -> BTreeMap<SlotStatus, usize> {
        let mut counts = BTreeMap::new();
        for slot in self.days.values().flatten() {
            *counts.entry(slot.status).or_insert(0) += 1;
        }
        counts
    }
}

/// Group slots under the weekday of their own start instant.
pub fn group_slots_by_day(slots: Vec<ScheduleSlot>) -> BTreeMap<DayOfWeek, Vec<ScheduleSlot>> {
    let mut grouped: BTreeMap<DayOfWeek, Vec<ScheduleSlot>> = BTreeMap::new();

    for slot in slots {
        let day = DayOfWeek::from_weekday(slot.start_time.weekday());
        grouped.entry(day).or_default().push(slot);
    }

    grouped
}
