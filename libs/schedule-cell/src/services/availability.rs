use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::Method;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use shared_backend::BackendClient;
use shared_models::AppError;

use crate::models::{AvailabilityPayload, AvailabilityTemplate, DayOfWeek};
use crate::timeutil::time_to_minutes;

/// Contract of the availability data access collaborator as the composer
/// consumes it. One implementation talks to the backend; tests may
/// substitute their own.
#[async_trait]
pub trait AvailabilityApi: Send + Sync {
    async fn fetch_availabilities(&self) -> Result<Vec<AvailabilityTemplate>, AppError>;
    async fn create_availability(
        &self,
        payload: AvailabilityPayload,
    ) -> Result<AvailabilityTemplate, AppError>;
    async fn update_availability(
        &self,
        id: Uuid,
        payload: AvailabilityPayload,
    ) -> Result<AvailabilityTemplate, AppError>;
    async fn delete_availability_for_day(&self, day: DayOfWeek) -> Result<(), AppError>;
}

/// Availability-template CRUD for one doctor. Keeps an in-memory snapshot of
/// the last known server state, updated after every successful mutation so
/// views sharing the client see a consistent list without refetching.
pub struct AvailabilityClient {
    backend: Arc<BackendClient>,
    doctor_id: String,
    snapshot: Mutex<Vec<AvailabilityTemplate>>,
}

impl AvailabilityClient {
    pub fn new(backend: Arc<BackendClient>, doctor_id: impl Into<String>) -> Self {
        Self {
            backend,
            doctor_id: doctor_id.into(),
            snapshot: Mutex::new(Vec::new()),
        }
    }

    pub fn doctor_id(&self) -> &str {
        &self.doctor_id
    }

    /// Last fetched/maintained server state, sorted Monday-first.
    pub fn availabilities(&self) -> Vec<AvailabilityTemplate> {
        self.snapshot.lock().unwrap().clone()
    }

    pub fn availability_by_day(&self, day: DayOfWeek) -> Option<AvailabilityTemplate> {
        self.snapshot
            .lock()
            .unwrap()
            .iter()
            .find(|template| template.day_of_week == day)
            .cloned()
    }

    pub fn has_availability_setup(&self) -> bool {
        !self.snapshot.lock().unwrap().is_empty()
    }

    /// Single-day lookup. A missing row is a normal answer, not an error.
    pub async fn fetch_availability_for_day(
        &self,
        day: DayOfWeek,
    ) -> Result<Option<AvailabilityTemplate>, AppError> {
        let path = format!(
            "/doctor-availability/doctor/{}/day/{}",
            self.doctor_id,
            day.as_str()
        );

        match self
            .backend
            .request::<AvailabilityTemplate>(Method::GET, &path, None)
            .await
        {
            Ok(template) => Ok(Some(template)),
            Err(AppError::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Delete a single template row by id.
    pub async fn delete_availability(&self, id: Uuid) -> Result<(), AppError> {
        debug!("Deleting availability: {}", id);

        let path = format!("/doctor-availability/{}", id);
        self.backend.execute(Method::DELETE, &path, None).await?;

        self.snapshot
            .lock()
            .unwrap()
            .retain(|template| template.id != Some(id));
        Ok(())
    }

    fn validate_payload(payload: &AvailabilityPayload) -> Result<(), AppError> {
        let start = time_to_minutes(&payload.start_time);
        let end = time_to_minutes(&payload.end_time);

        match (start, end) {
            (Some(start), Some(end)) if start < end => Ok(()),
            (Some(_), Some(_)) => Err(AppError::ValidationError(
                "Start time must be before end time".to_string(),
            )),
            _ => Err(AppError::ValidationError(
                "Times must be in HH:MM format".to_string(),
            )),
        }
    }

    fn replace_in_snapshot(&self, template: AvailabilityTemplate) {
        let mut snapshot = self.snapshot.lock().unwrap();
        snapshot.retain(|existing| existing.day_of_week != template.day_of_week);
        snapshot.push(template);
        snapshot.sort_by_key(|existing| existing.day_of_week);
    }
}

#[async_trait]
impl AvailabilityApi for AvailabilityClient {
    async fn fetch_availabilities(&self) -> Result<Vec<AvailabilityTemplate>, AppError> {
        debug!("Fetching availability for doctor: {}", self.doctor_id);

        let path = format!("/doctor-availability/doctor/{}", self.doctor_id);
        match self
            .backend
            .request::<Vec<AvailabilityTemplate>>(Method::GET, &path, None)
            .await
        {
            Ok(mut templates) => {
                templates.sort_by_key(|template| template.day_of_week);
                *self.snapshot.lock().unwrap() = templates.clone();
                Ok(templates)
            }
            Err(err) => {
                self.snapshot.lock().unwrap().clear();
                if err.is_auth() {
                    return Err(AppError::Auth(
                        "Access denied. Please ensure you are logged in as a doctor.".to_string(),
                    ));
                }
                Err(err)
            }
        }
    }

    async fn create_availability(
        &self,
        payload: AvailabilityPayload,
    ) -> Result<AvailabilityTemplate, AppError> {
        debug!(
            "Creating availability for doctor {} on {}",
            self.doctor_id, payload.day_of_week
        );
        Self::validate_payload(&payload)?;

        let mut body = serde_json::to_value(&payload)
            .map_err(|e| AppError::ValidationError(e.to_string()))?;
        body["doctorId"] = json!(self.doctor_id);

        let created: AvailabilityTemplate = self
            .backend
            .request(Method::POST, "/doctor-availability", Some(body))
            .await?;

        self.replace_in_snapshot(created.clone());
        Ok(created)
    }

    async fn update_availability(
        &self,
        id: Uuid,
        payload: AvailabilityPayload,
    ) -> Result<AvailabilityTemplate, AppError> {
        debug!("Updating availability: {}", id);
        Self::validate_payload(&payload)?;

        let body = serde_json::to_value(&payload)
            .map_err(|e| AppError::ValidationError(e.to_string()))?;
        let path = format!("/doctor-availability/{}", id);

        let updated: AvailabilityTemplate =
            self.backend.request(Method::PUT, &path, Some(body)).await?;

        self.replace_in_snapshot(updated.clone());
        Ok(updated)
    }

    async fn delete_availability_for_day(&self, day: DayOfWeek) -> Result<(), AppError> {
        debug!(
            "Deleting availability for doctor {} on {}",
            self.doctor_id, day
        );

        let path = format!(
            "/doctor-availability/doctor/{}/day/{}",
            self.doctor_id,
            day.as_str()
        );
        self.backend.execute(Method::DELETE, &path, None).await?;

        self.snapshot
            .lock()
            .unwrap()
            .retain(|template| template.day_of_week != day);
        Ok(())
    }
}
