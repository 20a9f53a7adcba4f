use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use futures::future::{join_all, BoxFuture};
use tracing::{debug, warn};
use uuid::Uuid;

use shared_models::AppError;
use shared_prefs::Preferences;

use crate::clock::Clock;
use crate::models::{AvailabilityPayload, AvailabilityTemplate, DayDraft, DayOfWeek, WeekDraft};
use crate::refresh::ScheduleRefreshBus;
use crate::services::availability::AvailabilityApi;
use crate::services::schedule::ScheduleClient;
use crate::timeutil::{
    generate_time_options, generation_range, is_past_day, minutes_to_time, next_slot_boundary,
    time_to_minutes, week_bounds, TimeOptionKind, DEFAULT_TOGGLE_START,
};

/// How long callers keep the success confirmation on screen before closing.
pub const SAVED_CLOSE_DELAY_MS: u64 = 1500;

/// Weeks ahead of the current one that can be edited.
pub const MAX_WEEK_OFFSET: u32 = 4;

const FALLBACK_START: &str = "09:00";
const FALLBACK_END: &str = "17:00";
const LAST_MINUTE: u32 = 23 * 60 + 59;

/// Lifecycle of one composer session. A save is only reachable from
/// `Editing`, so "saving while loading" cannot be expressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposerState {
    /// Initial template fetch in flight.
    Loading,
    /// Doctor identity unavailable; terminal until the caller retries with
    /// a proper id.
    MissingContext,
    /// Draft populated, user edits allowed.
    Editing,
    /// Save in progress; reentrant saves are rejected.
    Saving,
    /// Save and materialization succeeded; caller closes after
    /// `SAVED_CLOSE_DELAY_MS`.
    Saved,
}

/// What a successful save amounted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Templates saved and slots materialized.
    Saved,
    /// Templates saved but materialization failed; the session stays open
    /// so the user sees the warning.
    SavedWithWarning(String),
}

/// State machine behind the weekly availability editor. Owns the draft for
/// the lifetime of one session; collaborators are injected and shared.
pub struct WeeklyAvailabilityComposer {
    availability: Arc<dyn AvailabilityApi>,
    schedule: Arc<ScheduleClient>,
    prefs: Arc<Preferences>,
    bus: Arc<ScheduleRefreshBus>,
    clock: Arc<dyn Clock>,
    doctor_id: String,
    state: ComposerState,
    templates: Vec<AvailabilityTemplate>,
    week_schedule: WeekDraft,
    dirty_days: HashSet<DayOfWeek>,
    selected_week_offset: u32,
    slot_duration: u32,
    error: Option<String>,
}

impl WeeklyAvailabilityComposer {
    /// Open an editing session for `doctor_id`, fetching the saved
    /// templates. An empty doctor id yields the `MissingContext` state.
    pub async fn open(
        availability: Arc<dyn AvailabilityApi>,
        schedule: Arc<ScheduleClient>,
        prefs: Arc<Preferences>,
        bus: Arc<ScheduleRefreshBus>,
        clock: Arc<dyn Clock>,
        doctor_id: impl Into<String>,
    ) -> Self {
        let doctor_id = doctor_id.into();
        let slot_duration = prefs.slot_duration();

        let mut composer = Self {
            availability,
            schedule,
            prefs,
            bus,
            clock,
            doctor_id: doctor_id.clone(),
            state: ComposerState::Loading,
            templates: Vec::new(),
            week_schedule: WeekDraft::new(),
            dirty_days: HashSet::new(),
            selected_week_offset: 0,
            slot_duration,
            error: None,
        };

        if doctor_id.trim().is_empty() {
            composer.state = ComposerState::MissingContext;
            composer.error = Some(AppError::MissingContext.user_message());
            return composer;
        }

        composer.refetch().await;
        composer
    }

    /// Fetch the template list and rebuild the draft around it. Days the
    /// user already touched this session are preserved verbatim. Fetch
    /// failure leaves an empty list plus an error banner; the session stays
    /// usable.
    pub async fn refetch(&mut self) {
        if self.state == ComposerState::MissingContext {
            return;
        }
        if self.week_schedule.is_empty() {
            self.state = ComposerState::Loading;
        }

        match self.availability.fetch_availabilities().await {
            Ok(templates) => {
                // First load adopts the saved templates' duration as the
                // session's global one.
                if self.week_schedule.is_empty() {
                    if let Some(first) = templates.first() {
                        if first.slot_duration > 0 {
                            self.slot_duration = first.slot_duration;
                        }
                    }
                }
                self.templates = templates;
                self.error = None;
            }
            Err(err) => {
                warn!("Failed to fetch availabilities: {}", err);
                self.templates.clear();
                self.error = Some(err.user_message());
            }
        }

        self.state = ComposerState::Editing;
        self.rebuild_draft();
    }

    // -- accessors ---------------------------------------------------------

    pub fn state(&self) -> &ComposerState {
        &self.state
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn doctor_id(&self) -> &str {
        &self.doctor_id
    }

    pub fn week_schedule(&self) -> &WeekDraft {
        &self.week_schedule
    }

    pub fn day(&self, day: DayOfWeek) -> Option<&DayDraft> {
        self.week_schedule.get(&day)
    }

    pub fn slot_duration(&self) -> u32 {
        self.slot_duration
    }

    pub fn selected_week_offset(&self) -> u32 {
        self.selected_week_offset
    }

    /// Days the user may still edit in the viewed week, Monday-first.
    pub fn editable_days(&self) -> Vec<DayOfWeek> {
        let today = self.clock.today();
        DayOfWeek::ALL
            .into_iter()
            .filter(|day| !is_past_day(*day, today, self.selected_week_offset))
            .collect()
    }

    /// Calendar bounds of the viewed week.
    pub fn week_range(&self) -> (NaiveDate, NaiveDate) {
        week_bounds(self.clock.today(), self.selected_week_offset)
    }

    /// Header label for the viewed week, e.g. `Aug 3 - Aug 9`.
    pub fn week_range_label(&self) -> String {
        let (start, end) = self.week_range();
        format!("{} - {}", start.format("%b %-d"), end.format("%b %-d"))
    }

    /// Candidate start times for `day` under the current duration.
    pub fn start_time_options(&self, day: DayOfWeek) -> Vec<String> {
        generate_time_options(
            self.is_today(day),
            TimeOptionKind::Start,
            None,
            self.slot_duration,
            self.clock.time_of_day(),
        )
    }

    /// Candidate end times for `day` given its drafted start time.
    pub fn end_time_options(&self, day: DayOfWeek) -> Vec<String> {
        let start = match self.week_schedule.get(&day) {
            Some(entry) => entry.start_time.clone(),
            None => return Vec::new(),
        };
        generate_time_options(
            self.is_today(day),
            TimeOptionKind::End,
            Some(&start),
            self.slot_duration,
            self.clock.time_of_day(),
        )
    }

    // -- editing -----------------------------------------------------------

    /// Switch the viewed week. The offset is clamped to
    /// `[0, MAX_WEEK_OFFSET]`; moving weeks abandons manual edits because
    /// the draft is rebuilt for a different week's context.
    pub fn select_week(&mut self, offset: u32) -> Result<(), AppError> {
        self.ensure_editing()?;

        let offset = offset.min(MAX_WEEK_OFFSET);
        if offset == self.selected_week_offset {
            return Ok(());
        }

        self.selected_week_offset = offset;
        self.dirty_days.clear();
        self.rebuild_draft();
        Ok(())
    }

    /// Enable or disable a day. Disabling retains the chosen times so
    /// re-enabling restores them; first-time enabling picks defaults (the
    /// next slot boundary on today, 08:00 otherwise).
    pub fn toggle_day(&mut self, day: DayOfWeek) -> Result<(), AppError> {
        self.ensure_editable(day)?;

        let is_today = self.is_today(day);
        let now = self.clock.time_of_day();
        let duration = self.slot_duration;
        let first_touch = !self.dirty_days.contains(&day);

        let entry = self
            .week_schedule
            .get_mut(&day)
            .expect("draft always holds all seven days");

        if entry.enabled {
            entry.enabled = false;
        } else {
            entry.enabled = true;

            if first_touch && entry.id.is_none() {
                entry.start_time = if is_today {
                    minutes_to_time(next_slot_boundary(now, duration).min(LAST_MINUTE))
                } else {
                    DEFAULT_TOGGLE_START.to_string()
                };
                entry.end_time.clear();
            }

            let start = entry.start_time.clone();
            let end_valid = match (time_to_minutes(&start), time_to_minutes(&entry.end_time)) {
                (Some(start), Some(end)) => end > start,
                _ => false,
            };
            if !end_valid {
                entry.end_time = first_end_option(is_today, &start, duration, now);
            }
        }

        self.dirty_days.insert(day);
        Ok(())
    }

    /// Change a day's start time. The end time snaps to the first valid
    /// candidate when it no longer fits the new start.
    pub fn set_start_time(&mut self, day: DayOfWeek, value: &str) -> Result<(), AppError> {
        self.ensure_editable(day)?;

        let start = time_to_minutes(value).ok_or_else(|| {
            AppError::ValidationError(format!("{}: Invalid time format", day.label()))
        })?;

        let is_today = self.is_today(day);
        let now = self.clock.time_of_day();
        let duration = self.slot_duration;

        let entry = self
            .week_schedule
            .get_mut(&day)
            .expect("draft always holds all seven days");
        entry.start_time = value.to_string();

        let end_fits = time_to_minutes(&entry.end_time)
            .map(|end| end >= start + duration)
            .unwrap_or(false);
        if !end_fits {
            entry.end_time = first_end_option(is_today, value, duration, now);
        }

        self.dirty_days.insert(day);
        Ok(())
    }

    pub fn set_end_time(&mut self, day: DayOfWeek, value: &str) -> Result<(), AppError> {
        self.ensure_editable(day)?;

        time_to_minutes(value).ok_or_else(|| {
            AppError::ValidationError(format!("{}: Invalid time format", day.label()))
        })?;

        let entry = self
            .week_schedule
            .get_mut(&day)
            .expect("draft always holds all seven days");
        entry.end_time = value.to_string();

        self.dirty_days.insert(day);
        Ok(())
    }

    /// Change the global slot duration. Every enabled editable day's end
    /// time becomes `start + duration`; the value is persisted as the
    /// default for the next session.
    pub fn set_slot_duration(&mut self, minutes: u32) -> Result<(), AppError> {
        self.ensure_editing()?;
        if minutes == 0 {
            return Err(AppError::ValidationError(
                "Slot duration must be positive".to_string(),
            ));
        }

        self.slot_duration = minutes;
        self.prefs.set_slot_duration(minutes);

        let today = self.clock.today();
        for (day, entry) in self.week_schedule.iter_mut() {
            if is_past_day(*day, today, self.selected_week_offset) {
                continue;
            }
            entry.slot_duration = minutes;
            if entry.enabled {
                if let Some(start) = time_to_minutes(&entry.start_time) {
                    entry.end_time = minutes_to_time((start + minutes).min(LAST_MINUTE));
                }
            }
        }
        Ok(())
    }

    // -- validation & save -------------------------------------------------

    /// Check the draft before any network call. Past days are skipped
    /// regardless of their stored flags.
    pub fn validate(&self) -> Result<(), AppError> {
        let today = self.clock.today();

        for (day, entry) in &self.week_schedule {
            if is_past_day(*day, today, self.selected_week_offset) || !entry.enabled {
                continue;
            }

            let (start, end) = match (
                time_to_minutes(&entry.start_time),
                time_to_minutes(&entry.end_time),
            ) {
                (Some(start), Some(end)) => (start, end),
                _ => {
                    return Err(AppError::ValidationError(format!(
                        "{}: Invalid time format",
                        day.label()
                    )))
                }
            };

            if start >= end {
                return Err(AppError::ValidationError(format!(
                    "{}: Start time must be before end time",
                    day.label()
                )));
            }

            let working_minutes = end - start;
            if working_minutes < self.slot_duration {
                return Err(AppError::ValidationError(format!(
                    "{}: Working hours too short for slot duration ({} minutes available, {} minutes required)",
                    day.label(),
                    working_minutes,
                    self.slot_duration
                )));
            }
        }

        Ok(())
    }

    /// Persist the draft: per-day upserts and deletes dispatched together,
    /// then slot materialization over the viewed week. Any per-day failure
    /// fails the whole save and leaves the draft untouched for retry.
    pub async fn save(&mut self) -> Result<SaveOutcome, AppError> {
        match self.state {
            ComposerState::Editing => {}
            ComposerState::Saving => {
                return Err(AppError::ValidationError(
                    "A save is already in progress".to_string(),
                ))
            }
            _ => {
                return Err(AppError::ValidationError(
                    "There is no editable draft to save".to_string(),
                ))
            }
        }

        self.validate()?;
        self.state = ComposerState::Saving;

        let today = self.clock.today();
        let results = join_all(self.build_save_ops(today)).await;

        let mut first_error = None;
        for result in results {
            match result {
                Ok(Some((day, id))) => {
                    // Record ids from creates and clear them on deletes so a
                    // retry after partial failure stays idempotent.
                    if let Some(entry) = self.week_schedule.get_mut(&day) {
                        entry.id = id;
                    }
                }
                Ok(None) => {}
                Err(err) => {
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
            }
        }

        if let Some(err) = first_error {
            self.state = ComposerState::Editing;
            return Err(AppError::Api(format!(
                "Failed to save availability: {}",
                err.user_message()
            )));
        }

        let (start_date, end_date) = generation_range(today, self.selected_week_offset);
        match self
            .schedule
            .generate_from_availability(&self.doctor_id, start_date, end_date)
            .await
        {
            Ok(()) => {
                debug!(
                    "Generated schedule slots for doctor {} from {} to {}",
                    self.doctor_id, start_date, end_date
                );
                self.dirty_days.clear();
                self.state = ComposerState::Saved;
                self.bus.trigger_schedule_refresh(Some(&self.doctor_id));
                Ok(SaveOutcome::Saved)
            }
            Err(err) => {
                warn!("Error generating schedule slots: {}", err);
                self.state = ComposerState::Editing;
                Ok(SaveOutcome::SavedWithWarning(
                    "Your availability has been saved, but there was an issue generating \
                     schedule slots for this week. You may need to generate them manually."
                        .to_string(),
                ))
            }
        }
    }

    // -- internals ---------------------------------------------------------

    fn build_save_ops(
        &self,
        today: NaiveDate,
    ) -> Vec<BoxFuture<'static, Result<Option<(DayOfWeek, Option<Uuid>)>, AppError>>> {
        let mut ops: Vec<BoxFuture<'static, Result<Option<(DayOfWeek, Option<Uuid>)>, AppError>>> =
            Vec::new();

        for (day, entry) in &self.week_schedule {
            if is_past_day(*day, today, self.selected_week_offset) {
                continue;
            }

            let day = *day;
            let api = Arc::clone(&self.availability);
            let payload = AvailabilityPayload {
                day_of_week: day,
                start_time: entry.start_time.clone(),
                end_time: entry.end_time.clone(),
                slot_duration: self.slot_duration,
            };

            if entry.enabled {
                match entry.id {
                    Some(id) => ops.push(Box::pin(async move {
                        api.update_availability(id, payload).await.map(|_| None)
                    })),
                    None => ops.push(Box::pin(async move {
                        api.create_availability(payload)
                            .await
                            .map(|created| Some((day, created.id)))
                    })),
                }
            } else if entry.id.is_some() {
                ops.push(Box::pin(async move {
                    api.delete_availability_for_day(day)
                        .await
                        .map(|_| Some((day, None)))
                }));
            }
        }

        ops
    }

    fn rebuild_draft(&mut self) {
        let mut draft = WeekDraft::new();

        for day in DayOfWeek::ALL {
            if self.dirty_days.contains(&day) {
                if let Some(entry) = self.week_schedule.get(&day) {
                    draft.insert(day, entry.clone());
                    continue;
                }
            }

            let entry = match self
                .templates
                .iter()
                .find(|template| template.day_of_week == day)
            {
                Some(template) => DayDraft {
                    enabled: true,
                    start_time: template.start_time.clone(),
                    end_time: template.end_time.clone(),
                    slot_duration: self.slot_duration,
                    id: template.id,
                },
                None => DayDraft {
                    enabled: false,
                    start_time: FALLBACK_START.to_string(),
                    end_time: FALLBACK_END.to_string(),
                    slot_duration: self.slot_duration,
                    id: None,
                },
            };
            draft.insert(day, entry);
        }

        self.week_schedule = draft;
    }

    fn is_today(&self, day: DayOfWeek) -> bool {
        self.selected_week_offset == 0
            && DayOfWeek::from_weekday(self.clock.today().weekday()) == day
    }

    fn ensure_editing(&self) -> Result<(), AppError> {
        match self.state {
            ComposerState::Editing => Ok(()),
            _ => Err(AppError::ValidationError(
                "The schedule draft is not editable right now".to_string(),
            )),
        }
    }

    fn ensure_editable(&self, day: DayOfWeek) -> Result<(), AppError> {
        self.ensure_editing()?;

        if is_past_day(day, self.clock.today(), self.selected_week_offset) {
            return Err(AppError::ValidationError(format!(
                "{} has already passed this week",
                day.label()
            )));
        }
        Ok(())
    }
}

/// First valid end-time candidate for `start`, falling back to
/// `start + duration` when the candidate list is empty.
fn first_end_option(is_today: bool, start: &str, duration: u32, now: chrono::NaiveTime) -> String {
    generate_time_options(is_today, TimeOptionKind::End, Some(start), duration, now)
        .into_iter()
        .next()
        .unwrap_or_else(|| {
            let start = time_to_minutes(start).unwrap_or(0);
            minutes_to_time((start + duration).min(LAST_MINUTE))
        })
}
