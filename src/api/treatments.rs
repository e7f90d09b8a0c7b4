//! Treatment lifecycle endpoints
//!
//! - GET /api/tratamientos/all - Every treatment
//! - PUT /api/tratamientos/updateStatus/:id - Set `estado`
//! - PUT /api/tratamientos/confirmar/:id - Confirm (activate) a pre-registration
//! - GET /api/tratamientos/:id/citas - Appointments of a treatment

use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::client::{ClinicClient, Deadline};
use super::error::ApiResult;

/// A treatment as returned by the backend
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Treatment {
    pub id: i64,
    #[serde(default)]
    pub paciente_nombre: Option<String>,
    #[serde(default)]
    pub servicio_nombre: Option<String>,
    pub estado: String,
    #[serde(default)]
    pub citas_completadas: u32,
    #[serde(default)]
    pub total_citas_programadas: u32,
    #[serde(default)]
    pub fecha_inicio: Option<String>,
    #[serde(default)]
    pub fecha_estimada_fin: Option<String>,
    #[serde(default)]
    pub notas: Option<String>,
}

/// An appointment belonging to a treatment
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Appointment {
    pub id: i64,
    pub fecha_hora: String,
    pub estado: String,
    #[serde(default)]
    pub numero_cita_tratamiento: Option<u32>,
    #[serde(default)]
    pub notas: Option<String>,
}

#[derive(Serialize)]
struct StatusBody<'a> {
    estado: &'a str,
}

impl ClinicClient {
    /// List every treatment
    pub async fn treatments(&self) -> ApiResult<Vec<Treatment>> {
        self.get_json("/api/tratamientos/all").await
    }

    /// Set a treatment's status
    pub async fn update_treatment_status(&self, id: i64, estado: &str) -> ApiResult<()> {
        self.call_empty(
            Method::PUT,
            &format!("/api/tratamientos/updateStatus/{}", id),
            Some(&StatusBody { estado }),
        )
        .await
    }

    /// Confirm a pre-registered treatment, making it active
    pub async fn confirm_treatment(&self, id: i64) -> ApiResult<()> {
        self.call_empty::<()>(
            Method::PUT,
            &format!("/api/tratamientos/confirmar/{}", id),
            None,
        )
        .await
    }

    /// Appointments scheduled for a treatment
    pub async fn treatment_appointments(&self, id: i64) -> ApiResult<Vec<Appointment>> {
        self.call_json::<(), _>(
            Method::GET,
            &format!("/api/tratamientos/{}/citas", id),
            None,
            Deadline::Default,
        )
        .await
    }
}
