use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use chrono::Utc;
use tracing::debug;

use shared_prefs::{Preferences, RefreshTrigger};

use crate::models::ScheduleRefreshEvent;

type RefreshCallback = Arc<dyn Fn(&ScheduleRefreshEvent) + Send + Sync>;

/// Process-wide publish/subscribe channel for "schedule data changed"
/// notifications. Delivery is best-effort and at-most-once per subscriber
/// per trigger, in emission order; subscribers that join later see nothing.
///
/// An optional preferences mirror records the last trigger so views that
/// poll for staleness (instead of subscribing) can detect it.
pub struct ScheduleRefreshBus {
    subscribers: Mutex<Vec<(u64, RefreshCallback)>>,
    next_id: AtomicU64,
    mirror: Option<Arc<Preferences>>,
}

impl ScheduleRefreshBus {
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
            mirror: None,
        }
    }

    /// Bus that additionally mirrors each trigger through the preferences
    /// store.
    pub fn with_mirror(prefs: Arc<Preferences>) -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
            mirror: Some(prefs),
        }
    }

    /// Broadcast a refresh for `doctor_id`, or for every doctor when `None`.
    pub fn trigger_schedule_refresh(&self, doctor_id: Option<&str>) {
        let event = ScheduleRefreshEvent {
            doctor_id: doctor_id.map(str::to_string),
            timestamp: Utc::now().timestamp_millis(),
        };
        debug!("Triggering schedule refresh for {:?}", event.doctor_id);

        if let Some(prefs) = &self.mirror {
            prefs.set_refresh_trigger(RefreshTrigger {
                doctor_id: event.doctor_id.clone(),
                timestamp: event.timestamp,
            });
        }

        // Snapshot under the lock, invoke outside it so callbacks may
        // re-enter the bus.
        let callbacks: Vec<RefreshCallback> = {
            let subscribers = self.subscribers.lock().unwrap();
            subscribers.iter().map(|(_, cb)| Arc::clone(cb)).collect()
        };

        for callback in callbacks {
            callback(&event);
        }
    }

    /// Register `callback` for future triggers. The returned subscription
    /// deregisters it when dropped.
    pub fn on_schedule_refresh<F>(bus: &Arc<Self>, callback: F) -> Subscription
    where
        F: Fn(&ScheduleRefreshEvent) + Send + Sync + 'static,
    {
        let id = bus.next_id.fetch_add(1, Ordering::Relaxed);
        bus.subscribers
            .lock()
            .unwrap()
            .push((id, Arc::new(callback)));

        Subscription {
            id,
            bus: Arc::downgrade(bus),
        }
    }

    /// Whether the mirrored trigger shows activity for `doctor_id` newer
    /// than `last_refresh` (epoch milliseconds). Read errors report `false`.
    pub fn check_schedule_refresh_needed(&self, doctor_id: &str, last_refresh: i64) -> bool {
        let Some(prefs) = &self.mirror else {
            return false;
        };

        match prefs.refresh_trigger() {
            Some(trigger) => {
                let matches_doctor = trigger
                    .doctor_id
                    .as_deref()
                    .map_or(true, |id| id == doctor_id);
                matches_doctor && trigger.timestamp > last_refresh
            }
            None => false,
        }
    }

    fn remove_subscriber(&self, id: u64) {
        self.subscribers
            .lock()
            .unwrap()
            .retain(|(sub_id, _)| *sub_id != id);
    }
}

impl Default for ScheduleRefreshBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to a registered refresh callback; dropping it unsubscribes.
pub struct Subscription {
    id: u64,
    bus: Weak<ScheduleRefreshBus>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        // Drop does the work.
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.remove_subscriber(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use tempfile::tempdir;

    #[test]
    fn subscriber_receives_exactly_one_event_per_trigger() {
        let bus = Arc::new(ScheduleRefreshBus::new());
        let received = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&received);
        let _sub = ScheduleRefreshBus::on_schedule_refresh(&bus, move |event| {
            sink.lock().unwrap().push(event.clone());
        });

        bus.trigger_schedule_refresh(Some("doc-1"));

        let events = received.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].doctor_id.as_deref(), Some("doc-1"));
        assert!(events[0].timestamp > 0);
    }

    #[test]
    fn view_for_other_doctor_ignores_targeted_event() {
        let bus = Arc::new(ScheduleRefreshBus::new());
        let refetches = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&refetches);
        let viewed_doctor = "doc-2";
        let _sub = ScheduleRefreshBus::on_schedule_refresh(&bus, move |event| {
            if event.applies_to(viewed_doctor) {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        bus.trigger_schedule_refresh(Some("doc-1"));
        assert_eq!(refetches.load(Ordering::SeqCst), 0);

        bus.trigger_schedule_refresh(None);
        assert_eq!(refetches.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dropped_subscription_stops_delivery() {
        let bus = Arc::new(ScheduleRefreshBus::new());
        let count = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&count);
        let sub = ScheduleRefreshBus::on_schedule_refresh(&bus, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        bus.trigger_schedule_refresh(Some("doc-1"));
        sub.unsubscribe();
        bus.trigger_schedule_refresh(Some("doc-1"));

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn late_subscriber_sees_no_replay() {
        let bus = Arc::new(ScheduleRefreshBus::new());
        bus.trigger_schedule_refresh(Some("doc-1"));

        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let _sub = ScheduleRefreshBus::on_schedule_refresh(&bus, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn mirror_records_trigger_for_staleness_checks() {
        let dir = tempdir().unwrap();
        let prefs = Arc::new(Preferences::new(dir.path().join("preferences.json")));
        let bus = ScheduleRefreshBus::with_mirror(Arc::clone(&prefs));

        assert!(!bus.check_schedule_refresh_needed("doc-1", 0));

        bus.trigger_schedule_refresh(Some("doc-1"));

        assert!(bus.check_schedule_refresh_needed("doc-1", 0));
        assert!(!bus.check_schedule_refresh_needed("doc-2", 0));

        let trigger = prefs.refresh_trigger().unwrap();
        assert!(!bus.check_schedule_refresh_needed("doc-1", trigger.timestamp));
    }
}
