//! Schedule configuration page
//!
//! Shows the weekly attention slots and edits one draft slot at a time.
//!
//! ```text
//! Idle --start_draft--> Editing --save--> Saving --ok--> Idle
//!                          ^                 |
//!                          +---- edit ---- Failed <--err-+
//! ```

use async_trait::async_trait;
use chrono::NaiveTime;
use thiserror::Error;

use super::{Notifier, Outcome, Page};
use crate::api::schedules::{DaySchedule, NewSlot, TimeSlot};
use crate::api::ClinicClient;
use crate::notification::{DismissReason, NotificationRequest};

/// Clinic opening time
pub const OPENING: (u32, u32) = (8, 0);
/// Clinic closing time
pub const CLOSING: (u32, u32) = (20, 0);

/// Why a draft slot was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlotError {
    #[error("Hora inválida: {0}")]
    BadTime(String),

    #[error("La hora de inicio debe ser anterior a la hora de fin.")]
    StartNotBeforeEnd,

    #[error("El horario debe estar entre las 08:00 y las 20:00.")]
    OutsideHours,

    #[error("La duración debe ser mayor a 0 y dividir el rango en citas completas.")]
    DurationMismatch,

    #[error("La franja se traslapa con otra de {start} a {end}.")]
    Overlap { start: String, end: String },
}

/// Parse `HH:MM` or `HH:MM:SS`
pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

fn clock(hm: (u32, u32)) -> NaiveTime {
    NaiveTime::from_hms_opt(hm.0, hm.1, 0).unwrap_or(NaiveTime::MIN)
}

/// Check a draft against clinic hours and the day's existing slots
pub fn validate_slot(draft: &NewSlot, existing: &[TimeSlot]) -> Result<(), SlotError> {
    let start = parse_time(&draft.hora_inicio)
        .ok_or_else(|| SlotError::BadTime(draft.hora_inicio.clone()))?;
    let end =
        parse_time(&draft.hora_fin).ok_or_else(|| SlotError::BadTime(draft.hora_fin.clone()))?;

    if start >= end {
        return Err(SlotError::StartNotBeforeEnd);
    }
    if start < clock(OPENING) || end > clock(CLOSING) {
        return Err(SlotError::OutsideHours);
    }

    let minutes = (end - start).num_minutes();
    if draft.duracion == 0 || minutes % i64::from(draft.duracion) != 0 {
        return Err(SlotError::DurationMismatch);
    }

    for slot in existing {
        let (Some(other_start), Some(other_end)) =
            (parse_time(&slot.hora_inicio), parse_time(&slot.hora_fin))
        else {
            tracing::warn!(id = slot.id, "Skipping slot with unreadable times");
            continue;
        };
        if start < other_end && other_start < end {
            return Err(SlotError::Overlap {
                start: slot.hora_inicio.clone(),
                end: slot.hora_fin.clone(),
            });
        }
    }

    Ok(())
}

/// Draft editor state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditorState {
    #[default]
    Idle,
    Editing,
    Saving,
    Failed,
}

#[derive(Default)]
pub struct SchedulePage {
    days: Vec<DaySchedule>,
    /// Set once the weekly slots were fetched; overlap checks need them
    loaded: bool,
    draft: Option<NewSlot>,
    state: EditorState,
    slot: Notifier,
}

impl SchedulePage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn days(&self) -> &[DaySchedule] {
        &self.days
    }

    pub fn state(&self) -> EditorState {
        self.state
    }

    pub fn draft(&self) -> Option<&NewSlot> {
        self.draft.as_ref()
    }

    fn slots_of(&self, day: &str) -> &[TimeSlot] {
        self.days
            .iter()
            .find(|d| d.dia_semana.eq_ignore_ascii_case(day))
            .map(|d| d.franjas.as_slice())
            .unwrap_or(&[])
    }

    /// Open a blank draft for `day`
    pub fn start_draft(&mut self, day: &str) {
        self.draft = Some(NewSlot {
            dia_semana: day.to_string(),
            hora_inicio: String::new(),
            hora_fin: String::new(),
            duracion: 30,
        });
        self.state = EditorState::Editing;
    }

    /// Mutable access to the draft while editing
    pub fn edit(&mut self) -> Option<&mut NewSlot> {
        if self.state == EditorState::Failed {
            self.state = EditorState::Editing;
        }
        match self.state {
            EditorState::Editing => self.draft.as_mut(),
            _ => None,
        }
    }

    pub fn cancel(&mut self) {
        self.draft = None;
        self.state = EditorState::Idle;
    }

    /// Validate and create the draft slot
    pub async fn save(&mut self, client: &ClinicClient) -> Outcome {
        let draft = match (&self.draft, self.state) {
            (Some(draft), EditorState::Editing | EditorState::Failed) => draft.clone(),
            _ => {
                return self
                    .slot
                    .notify(NotificationRequest::warning("No hay una franja en edición."))
            }
        };

        if !self.loaded {
            self.state = EditorState::Editing;
            return self.slot.notify(NotificationRequest::warning(
                "Los horarios no se han cargado. Recarga la página antes de guardar.",
            ));
        }

        if let Err(e) = validate_slot(&draft, self.slots_of(&draft.dia_semana)) {
            self.state = EditorState::Editing;
            return self.slot.notify(NotificationRequest::error(e.to_string()));
        }

        self.state = EditorState::Saving;
        match client.create_slot(&draft).await {
            Ok(created) => {
                self.insert(&draft.dia_semana, created);
                self.cancel();
                self.slot
                    .notify(NotificationRequest::success("Franja horaria creada."))
            }
            Err(e) => {
                self.state = EditorState::Failed;
                self.slot.failure(&e, "No se pudo guardar la franja.")
            }
        }
    }

    fn insert(&mut self, day: &str, slot: TimeSlot) {
        let index = match self
            .days
            .iter()
            .position(|d| d.dia_semana.eq_ignore_ascii_case(day))
        {
            Some(index) => index,
            None => {
                self.days.push(DaySchedule {
                    dia_semana: day.to_string(),
                    franjas: Vec::new(),
                });
                self.days.len() - 1
            }
        };
        let franjas = &mut self.days[index].franjas;
        franjas.push(slot);
        franjas.sort_by_key(|s| parse_time(&s.hora_inicio));
    }

    /// Delete a slot
    pub async fn delete(&mut self, client: &ClinicClient, id: i64) -> Outcome {
        match client.delete_slot(id).await {
            Ok(()) => {
                for day in &mut self.days {
                    day.franjas.retain(|s| s.id != id);
                }
                self.slot
                    .notify(NotificationRequest::success("Franja horaria eliminada."))
            }
            Err(e) => self.slot.failure(&e, "No se pudo eliminar la franja."),
        }
    }
}

#[async_trait]
impl Page for SchedulePage {
    fn title(&self) -> &'static str {
        "Configuración de horarios"
    }

    async fn load(&mut self, client: &ClinicClient) -> Outcome {
        match client.schedules().await {
            Ok(days) => {
                self.days = days;
                self.loaded = true;
                Outcome::Quiet
            }
            Err(e) => self.slot.failure(&e, "No se pudieron cargar los horarios."),
        }
    }

    fn notification(&self) -> &NotificationRequest {
        self.slot.current()
    }

    fn close_notification(&mut self, reason: DismissReason) {
        self.slot.close(reason);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::Severity;
    use crate::testing::MockBackend;
    use axum::{
        extract::Path,
        http::StatusCode,
        routing::{delete, get},
        Json, Router,
    };

    fn existing() -> Vec<TimeSlot> {
        vec![TimeSlot {
            id: 1,
            hora_inicio: "09:00:00".to_string(),
            hora_fin: "11:00:00".to_string(),
            duracion: 30,
        }]
    }

    fn draft(start: &str, end: &str, duracion: u32) -> NewSlot {
        NewSlot {
            dia_semana: "Lunes".to_string(),
            hora_inicio: start.to_string(),
            hora_fin: end.to_string(),
            duracion,
        }
    }

    #[test]
    fn test_validate_slot() {
        let slots = existing();
        assert_eq!(validate_slot(&draft("11:00", "12:00", 30), &slots), Ok(()));
        assert_eq!(
            validate_slot(&draft("12:00", "11:00", 30), &slots),
            Err(SlotError::StartNotBeforeEnd)
        );
        assert_eq!(
            validate_slot(&draft("07:30", "08:30", 30), &slots),
            Err(SlotError::OutsideHours)
        );
        assert_eq!(
            validate_slot(&draft("12:00", "13:00", 45), &slots),
            Err(SlotError::DurationMismatch)
        );
        assert_eq!(
            validate_slot(&draft("12:00", "13:00", 0), &slots),
            Err(SlotError::DurationMismatch)
        );
        assert!(matches!(
            validate_slot(&draft("10:30", "11:30", 30), &slots),
            Err(SlotError::Overlap { .. })
        ));
        assert_eq!(
            validate_slot(&draft("nueve", "10:00", 30), &slots),
            Err(SlotError::BadTime("nueve".to_string()))
        );
        assert_eq!(validate_slot(&draft("19:00", "20:00", 60), &[]), Ok(()));
    }

    fn router(create_status: StatusCode) -> Router {
        Router::new()
            .route(
                "/api/horarios",
                get(|| async {
                    Json(serde_json::json!([
                        {"dia_semana": "Lunes", "franjas": [
                            {"id": 1, "hora_inicio": "09:00:00", "hora_fin": "11:00:00", "duracion": 30}
                        ]}
                    ]))
                })
                .post(move |Json(body): Json<serde_json::Value>| async move {
                    let mut body = body;
                    body["id"] = serde_json::json!(5);
                    (create_status, Json(body))
                }),
            )
            .route("/api/horarios/:id", delete(|Path(_id): Path<i64>| async { StatusCode::NO_CONTENT }))
    }

    #[tokio::test]
    async fn test_editor_flow() {
        let backend = MockBackend::start(router(StatusCode::OK)).await;
        let client = backend.client();
        let mut page = SchedulePage::new();
        page.load(&client).await;
        assert_eq!(page.state(), EditorState::Idle);

        page.start_draft("Lunes");
        assert_eq!(page.state(), EditorState::Editing);
        {
            let draft = page.edit().unwrap();
            draft.hora_inicio = "10:00".to_string();
            draft.hora_fin = "12:00".to_string();
        }
        let outcome = page.save(&client).await;
        assert_eq!(outcome.notification().unwrap().severity, Severity::Error);
        assert_eq!(page.state(), EditorState::Editing);
        assert_eq!(backend.hits("POST /api/horarios"), 0);

        page.edit().unwrap().hora_inicio = "08:00".to_string();
        page.edit().unwrap().hora_fin = "09:00".to_string();
        let outcome = page.save(&client).await;
        assert_eq!(outcome.notification().unwrap().severity, Severity::Success);
        assert_eq!(page.state(), EditorState::Idle);
        let ids: Vec<i64> = page.days()[0].franjas.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![5, 1]);

        page.delete(&client, 1).await;
        assert_eq!(page.days()[0].franjas.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_save_can_be_retried() {
        let backend = MockBackend::start(router(StatusCode::INTERNAL_SERVER_ERROR)).await;
        let client = backend.client();
        let mut page = SchedulePage::new();
        page.load(&client).await;

        page.start_draft("Martes");
        {
            let draft = page.edit().unwrap();
            draft.hora_inicio = "14:00".to_string();
            draft.hora_fin = "16:00".to_string();
        }
        let outcome = page.save(&client).await;
        assert!(outcome.notification().unwrap().message.starts_with("Error del servidor"));
        assert_eq!(page.state(), EditorState::Failed);
        assert!(page.draft().is_some());

        assert!(page.edit().is_some());
        assert_eq!(page.state(), EditorState::Editing);
    }

    #[tokio::test]
    async fn test_save_refused_until_slots_are_loaded() {
        let backend = MockBackend::start(
            Router::new().route(
                "/api/horarios",
                get(|| async { StatusCode::INTERNAL_SERVER_ERROR })
                    .post(|| async { (StatusCode::OK, Json(serde_json::json!({"id": 9}))) }),
            ),
        )
        .await;
        let client = backend.client();
        let mut page = SchedulePage::new();

        let outcome = page.load(&client).await;
        assert_eq!(outcome.notification().unwrap().severity, Severity::Error);

        page.start_draft("Lunes");
        {
            let draft = page.edit().unwrap();
            draft.hora_inicio = "09:00".to_string();
            draft.hora_fin = "10:00".to_string();
        }
        let outcome = page.save(&client).await;

        assert_eq!(outcome.notification().unwrap().severity, Severity::Warning);
        assert_eq!(page.state(), EditorState::Editing);
        assert!(page.draft().is_some());
        assert_eq!(backend.hits("POST /api/horarios"), 0);
    }
}
