use std::sync::Arc;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use reqwest::Method;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use shared_backend::BackendClient;
use shared_models::AppError;

use crate::models::{ScheduleSlot, ScheduleSlotPayload};

/// Client for the materialized-slot endpoints: range queries, single-slot
/// CRUD, availability toggles and template materialization.
pub struct ScheduleClient {
    backend: Arc<BackendClient>,
}

impl ScheduleClient {
    pub fn new(backend: Arc<BackendClient>) -> Self {
        Self { backend }
    }

    /// All raw schedule rows for a doctor.
    pub async fn fetch_doctor_schedule(
        &self,
        doctor_id: &str,
    ) -> Result<Vec<ScheduleSlot>, AppError> {
        let path = format!("/schedules/doctor/{}", doctor_id);
        self.backend.request(Method::GET, &path, None).await
    }

    /// Free slots for a doctor within a date range.
    pub async fn fetch_available_slots(
        &self,
        doctor_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ScheduleSlot>, AppError> {
        let path = format!(
            "/schedules/available/{}?startDate={}&endDate={}",
            doctor_id,
            format_instant(start),
            format_instant(end)
        );
        self.backend.request(Method::GET, &path, None).await
    }

    /// Slots annotated with derived status, as shown to patients.
    pub async fn fetch_schedule_with_status(
        &self,
        doctor_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ScheduleSlot>, AppError> {
        let path = format!(
            "/schedules/doctor/{}/with-status?startDate={}&endDate={}",
            doctor_id,
            format_instant(start),
            format_instant(end)
        );
        self.backend.request(Method::GET, &path, None).await
    }

    /// Slots annotated with derived status, doctor's own view (includes
    /// past slots).
    pub async fn fetch_schedule_with_status_for_doctor(
        &self,
        doctor_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ScheduleSlot>, AppError> {
        let path = format!(
            "/schedules/doctor/{}/with-status-for-doctor?startDate={}&endDate={}",
            doctor_id,
            format_instant(start),
            format_instant(end)
        );
        self.backend.request(Method::GET, &path, None).await
    }

    pub async fn create_slot(
        &self,
        payload: ScheduleSlotPayload,
    ) -> Result<ScheduleSlot, AppError> {
        let body = serde_json::to_value(&payload)
            .map_err(|e| AppError::ValidationError(e.to_string()))?;
        self.backend.request(Method::POST, "/schedules", Some(body)).await
    }

    pub async fn update_slot(
        &self,
        slot_id: Uuid,
        payload: ScheduleSlotPayload,
    ) -> Result<ScheduleSlot, AppError> {
        let body = serde_json::to_value(&payload)
            .map_err(|e| AppError::ValidationError(e.to_string()))?;
        let path = format!("/schedules/{}", slot_id);
        self.backend.request(Method::PUT, &path, Some(body)).await
    }

    pub async fn delete_slot(&self, slot_id: Uuid) -> Result<(), AppError> {
        let path = format!("/schedules/{}", slot_id);
        self.backend.execute(Method::DELETE, &path, None).await
    }

    pub async fn delete_multiple(&self, slot_ids: &[Uuid]) -> Result<(), AppError> {
        self.backend
            .execute(
                Method::POST,
                "/schedules/delete-multiple",
                Some(json!({ "scheduleIds": slot_ids })),
            )
            .await
    }

    pub async fn mark_slot_available(&self, slot_id: Uuid) -> Result<ScheduleSlot, AppError> {
        let path = format!("/schedules/{}/available", slot_id);
        self.backend.request(Method::PATCH, &path, None).await
    }

    pub async fn mark_slot_unavailable(&self, slot_id: Uuid) -> Result<ScheduleSlot, AppError> {
        let path = format!("/schedules/{}/unavailable", slot_id);
        self.backend.request(Method::PATCH, &path, None).await
    }

    /// Ask the backend to expand the doctor's weekly templates into concrete
    /// slots over `[start_date, end_date]`. Only success or failure matters
    /// to callers; the response body is discarded.
    pub async fn generate_from_availability(
        &self,
        doctor_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<(), AppError> {
        debug!(
            "Generating schedule slots for doctor {} from {} to {}",
            doctor_id, start_date, end_date
        );

        let path = format!(
            "/schedules/doctor/{}/generate-from-availability?startDate={}&endDate={}",
            doctor_id,
            start_date.format("%Y-%m-%d"),
            end_date.format("%Y-%m-%d")
        );
        self.backend.execute(Method::POST, &path, None).await
    }
}

/// Instants are sent the way the backend expects them: UTC with millisecond
/// precision and a `Z` suffix.
fn format_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}
