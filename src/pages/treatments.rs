//! Treatment tracking page
//!
//! Lists treatments and drives their lifecycle:
//!
//! ```text
//! Pre-Registro --MarkPending--> Pendiente --Activate--> Activo --Finalize--> Finalizado
//!      |                                                   ^
//!      +-------------------- Activate --------------------+
//! ```
//!
//! `Finalize` is only offered once every scheduled appointment is complete.
//! An action outside the allowed set is refused before any request is sent.

use async_trait::async_trait;
use std::collections::HashMap;

use super::{Notifier, Outcome, Page};
use crate::api::treatments::{Appointment, Treatment};
use crate::api::ClinicClient;
use crate::notification::{DismissReason, NotificationRequest};

/// Lifecycle status of a treatment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreatmentStatus {
    PreRegistered,
    Pending,
    Active,
    Finished,
    Abandoned,
    Unknown,
}

impl TreatmentStatus {
    pub fn parse(estado: &str) -> Self {
        match estado.trim().to_lowercase().as_str() {
            "pre-registro" | "preregistro" => TreatmentStatus::PreRegistered,
            "pendiente" => TreatmentStatus::Pending,
            "activo" => TreatmentStatus::Active,
            "finalizado" => TreatmentStatus::Finished,
            "abandonado" => TreatmentStatus::Abandoned,
            _ => TreatmentStatus::Unknown,
        }
    }

    /// Backend spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            TreatmentStatus::PreRegistered => "Pre-Registro",
            TreatmentStatus::Pending => "Pendiente",
            TreatmentStatus::Active => "Activo",
            TreatmentStatus::Finished => "Finalizado",
            TreatmentStatus::Abandoned => "Abandonado",
            TreatmentStatus::Unknown => "Desconocido",
        }
    }
}

/// Something an administrator can do to a treatment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreatmentAction {
    MarkPending,
    Activate,
    Finalize,
}

impl TreatmentAction {
    /// Status the treatment ends up in
    pub fn target(&self) -> TreatmentStatus {
        match self {
            TreatmentAction::MarkPending => TreatmentStatus::Pending,
            TreatmentAction::Activate => TreatmentStatus::Active,
            TreatmentAction::Finalize => TreatmentStatus::Finished,
        }
    }
}

/// Actions offered for a treatment in its current state
pub fn allowed_actions(treatment: &Treatment) -> Vec<TreatmentAction> {
    match TreatmentStatus::parse(&treatment.estado) {
        TreatmentStatus::PreRegistered => {
            vec![TreatmentAction::MarkPending, TreatmentAction::Activate]
        }
        TreatmentStatus::Pending => vec![TreatmentAction::Activate],
        TreatmentStatus::Active
            if treatment.citas_completadas == treatment.total_citas_programadas =>
        {
            vec![TreatmentAction::Finalize]
        }
        _ => Vec::new(),
    }
}

/// Completion as a fraction in `[0, 1]`
pub fn progress(treatment: &Treatment) -> f64 {
    if treatment.total_citas_programadas == 0 {
        return 0.0;
    }
    (f64::from(treatment.citas_completadas) / f64::from(treatment.total_citas_programadas))
        .min(1.0)
}

#[derive(Default)]
pub struct TreatmentsPage {
    treatments: Vec<Treatment>,
    loaded: bool,
    appointments: HashMap<i64, Vec<Appointment>>,
    status_filter: Option<TreatmentStatus>,
    slot: Notifier,
}

impl TreatmentsPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn treatment(&self, id: i64) -> Option<&Treatment> {
        self.treatments.iter().find(|t| t.id == id)
    }

    pub fn filter_by(&mut self, status: Option<TreatmentStatus>) {
        self.status_filter = status;
    }

    /// Treatments passing the status filter
    pub fn visible(&self) -> Vec<&Treatment> {
        self.treatments
            .iter()
            .filter(|t| match self.status_filter {
                Some(status) => TreatmentStatus::parse(&t.estado) == status,
                None => true,
            })
            .collect()
    }

    pub fn actions(&self, id: i64) -> Vec<TreatmentAction> {
        self.treatment(id).map(allowed_actions).unwrap_or_default()
    }

    /// Appointments loaded for a treatment
    pub fn appointments(&self, id: i64) -> Option<&[Appointment]> {
        self.appointments.get(&id).map(Vec::as_slice)
    }

    /// Fetch the appointments of one treatment
    pub async fn load_appointments(&mut self, client: &ClinicClient, id: i64) -> Outcome {
        match client.treatment_appointments(id).await {
            Ok(mut appointments) => {
                appointments.sort_by_key(|a| a.numero_cita_tratamiento);
                self.appointments.insert(id, appointments);
                Outcome::Quiet
            }
            Err(e) => self.slot.failure(&e, "No se pudieron cargar las citas del tratamiento."),
        }
    }

    /// Apply an action if the treatment currently allows it
    pub async fn apply(
        &mut self,
        client: &ClinicClient,
        id: i64,
        action: TreatmentAction,
    ) -> Outcome {
        if !self.loaded {
            return self.slot.notify(NotificationRequest::warning(
                "Los tratamientos no se han cargado. Recarga la página e intenta de nuevo.",
            ));
        }
        if !self.actions(id).contains(&action) {
            tracing::warn!(id, action = ?action, "Refusing disallowed treatment action");
            return self.slot.notify(NotificationRequest::warning(
                "Esta acción no está disponible para el estado actual del tratamiento.",
            ));
        }

        let target = action.target();
        let result = match action {
            TreatmentAction::Activate => client.confirm_treatment(id).await,
            TreatmentAction::MarkPending | TreatmentAction::Finalize => {
                client.update_treatment_status(id, target.as_str()).await
            }
        };

        match result {
            Ok(()) => {
                if let Some(treatment) = self.treatments.iter_mut().find(|t| t.id == id) {
                    treatment.estado = target.as_str().to_string();
                }
                tracing::info!(id, estado = target.as_str(), "Treatment updated");
                self.slot.notify(NotificationRequest::success(format!(
                    "Tratamiento actualizado a {}.",
                    target.as_str()
                )))
            }
            Err(e) => self.slot.failure(&e, "No se pudo actualizar el tratamiento."),
        }
    }
}

#[async_trait]
impl Page for TreatmentsPage {
    fn title(&self) -> &'static str {
        "Tratamientos"
    }

    async fn load(&mut self, client: &ClinicClient) -> Outcome {
        match client.treatments().await {
            Ok(treatments) => {
                self.treatments = treatments;
                self.loaded = true;
                Outcome::Quiet
            }
            Err(e) => self.slot.failure(&e, "No se pudieron cargar los tratamientos."),
        }
    }

    fn notification(&self) -> &NotificationRequest {
        self.slot.current()
    }

    fn close_notification(&mut self, reason: DismissReason) {
        self.slot.close(reason);
    }
}
