//! Schedule endpoints
//!
//! - GET    /api/horarios - Schedule grouped by weekday
//! - POST   /api/horarios - Create a time slot
//! - DELETE /api/horarios/:id - Delete a time slot

use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::client::{ClinicClient, Deadline};
use super::error::ApiResult;

/// Slots configured for one weekday
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct DaySchedule {
    pub dia_semana: String,
    #[serde(default)]
    pub franjas: Vec<TimeSlot>,
}

/// A configured attention slot
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TimeSlot {
    pub id: i64,
    pub hora_inicio: String,
    pub hora_fin: String,
    /// Appointment length in minutes
    pub duracion: u32,
}

/// Slot sent when creating
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewSlot {
    pub dia_semana: String,
    pub hora_inicio: String,
    pub hora_fin: String,
    pub duracion: u32,
}

impl ClinicClient {
    /// Fetch the weekly schedule
    pub async fn schedules(&self) -> ApiResult<Vec<DaySchedule>> {
        self.get_json("/api/horarios").await
    }

    /// Create a slot
    pub async fn create_slot(&self, slot: &NewSlot) -> ApiResult<TimeSlot> {
        self.call_json(Method::POST, "/api/horarios", Some(slot), Deadline::Default)
            .await
    }

    /// Delete a slot
    pub async fn delete_slot(&self, id: i64) -> ApiResult<()> {
        self.call_empty::<()>(Method::DELETE, &format!("/api/horarios/{}", id), None)
            .await
    }
}
