use std::collections::BTreeMap;

use chrono::{DateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Days of the week, Monday-first. The ordering here is the single week-start
/// convention for the whole crate: draft iteration, past-day cutoffs and week
/// range math all derive from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
        DayOfWeek::Sunday,
    ];

    /// Wire name, e.g. `MONDAY`.
    pub fn as_str(&self) -> &'static str {
        match self {
            DayOfWeek::Monday => "MONDAY",
            DayOfWeek::Tuesday => "TUESDAY",
            DayOfWeek::Wednesday => "WEDNESDAY",
            DayOfWeek::Thursday => "THURSDAY",
            DayOfWeek::Friday => "FRIDAY",
            DayOfWeek::Saturday => "SATURDAY",
            DayOfWeek::Sunday => "SUNDAY",
        }
    }

    /// Human label, e.g. `Monday`. Used in validation messages.
    pub fn label(&self) -> &'static str {
        match self {
            DayOfWeek::Monday => "Monday",
            DayOfWeek::Tuesday => "Tuesday",
            DayOfWeek::Wednesday => "Wednesday",
            DayOfWeek::Thursday => "Thursday",
            DayOfWeek::Friday => "Friday",
            DayOfWeek::Saturday => "Saturday",
            DayOfWeek::Sunday => "Sunday",
        }
    }

    /// Zero-based offset from Monday.
    pub fn index(&self) -> u32 {
        *self as u32
    }

    pub fn from_weekday(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
            Weekday::Sun => DayOfWeek::Sunday,
        }
    }
}

impl std::fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A doctor's recurring weekly rule for one day, as the backend stores it.
/// Not itself bookable; slots are materialized from it server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityTemplate {
    pub id: Option<Uuid>,
    pub day_of_week: DayOfWeek,
    pub start_time: String,
    pub end_time: String,
    pub slot_duration: u32,
}

/// Create/update body for one day's availability.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityPayload {
    pub day_of_week: DayOfWeek,
    pub start_time: String,
    pub end_time: String,
    pub slot_duration: u32,
}

/// One day's entry in the in-memory week draft. Times are wall-clock
/// `HH:MM` strings in the doctor's local clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayDraft {
    pub enabled: bool,
    pub start_time: String,
    pub end_time: String,
    pub slot_duration: u32,
    pub id: Option<Uuid>,
}

/// The transient client-side draft edited by the composer, keyed by day.
/// BTreeMap keeps iteration Monday-first.
pub type WeekDraft = BTreeMap<DayOfWeek, DayDraft>;

/// Derived status of a materialized slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlotStatus {
    Free,
    Booked,
    Blocked,
    Past,
}

impl SlotStatus {
    pub fn label(&self) -> &'static str {
        match self {
            SlotStatus::Free => "Available",
            SlotStatus::Booked => "Booked",
            SlotStatus::Blocked => "Blocked",
            SlotStatus::Past => "Past",
        }
    }
}

/// A concrete, dated time interval materialized from a template.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSlot {
    pub id: Uuid,
    pub doctor_id: Option<Uuid>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: SlotStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked_reason: Option<String>,
}

impl ScheduleSlot {
    pub fn status_text(&self) -> String {
        match (&self.status, &self.blocked_reason) {
            (SlotStatus::Blocked, Some(reason)) => reason.clone(),
            (status, _) => status.label().to_string(),
        }
    }
}

/// Create/update body for a single slot row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSlotPayload {
    pub doctor_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// Notification that schedule data changed for a doctor. A `None` doctor id
/// means every schedule view should refetch, whichever doctor it shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRefreshEvent {
    pub doctor_id: Option<String>,
    pub timestamp: i64,
}

impl ScheduleRefreshEvent {
    /// Whether a view showing `doctor_id` should react to this event.
    pub fn applies_to(&self, doctor_id: &str) -> bool {
        match &self.doctor_id {
            Some(target) => target == doctor_id,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_of_week_wire_names_round_trip() {
        for day in DayOfWeek::ALL {
            let json = serde_json::to_string(&day).unwrap();
            assert_eq!(json, format!("\"{}\"", day.as_str()));
            let back: DayOfWeek = serde_json::from_str(&json).unwrap();
            assert_eq!(back, day);
        }
    }

    #[test]
    fn days_iterate_monday_first() {
        let mut draft = WeekDraft::new();
        for day in [DayOfWeek::Sunday, DayOfWeek::Monday, DayOfWeek::Friday] {
            draft.insert(
                day,
                DayDraft {
                    enabled: false,
                    start_time: "09:00".to_string(),
                    end_time: "17:00".to_string(),
                    slot_duration: 30,
                    id: None,
                },
            );
        }

        let order: Vec<DayOfWeek> = draft.keys().copied().collect();
        assert_eq!(order, vec![DayOfWeek::Monday, DayOfWeek::Friday, DayOfWeek::Sunday]);
    }

    #[test]
    fn refresh_event_without_doctor_applies_everywhere() {
        let event = ScheduleRefreshEvent { doctor_id: None, timestamp: 1 };
        assert!(event.applies_to("doc-1"));
        assert!(event.applies_to("doc-2"));

        let targeted = ScheduleRefreshEvent {
            doctor_id: Some("doc-1".to_string()),
            timestamp: 1,
        };
        assert!(targeted.applies_to("doc-1"));
        assert!(!targeted.applies_to("doc-2"));
    }

    #[test]
    fn blocked_slot_status_text_prefers_reason() {
        let slot = ScheduleSlot {
            id: Uuid::new_v4(),
            doctor_id: None,
            start_time: Utc::now(),
            end_time: Utc::now(),
            status: SlotStatus::Blocked,
            blocked_reason: Some("Lunch break".to_string()),
        };
        assert_eq!(slot.status_text(), "Lunch break");
    }
}
