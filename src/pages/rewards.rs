//! Reward administration page
//!
//! Lists the gamification rewards and edits them through a single form.
//! The form is used both for new rewards and for the one being edited.

use async_trait::async_trait;

use super::{Notifier, Outcome, Page};
use crate::api::rewards::{Reward, RewardInput};
use crate::api::ClinicClient;
use crate::notification::{DismissReason, NotificationRequest};
use crate::validation::{self, FieldErrors, ValidationError};

/// Editable reward fields, as typed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardForm {
    pub nombre: String,
    pub descripcion: String,
    pub tipo: String,
    pub puntos_requeridos: String,
    pub icono: String,
    pub estado: bool,
}

impl Default for RewardForm {
    fn default() -> Self {
        Self {
            nombre: String::new(),
            descripcion: String::new(),
            tipo: String::new(),
            puntos_requeridos: String::new(),
            icono: String::new(),
            estado: true,
        }
    }
}

impl RewardForm {
    fn from_reward(reward: &Reward) -> Self {
        let input = RewardInput::from(reward);
        Self {
            nombre: input.nombre,
            descripcion: input.descripcion,
            tipo: input.tipo,
            puntos_requeridos: input.puntos_requeridos.to_string(),
            icono: input.icono.unwrap_or_default(),
            estado: input.estado,
        }
    }

    /// Check the form and build the request body
    pub fn validate(&self) -> Result<RewardInput, ValidationError> {
        let mut errors = FieldErrors::new();
        errors.check("nombre", validation::required(&self.nombre, "El nombre"));

        let points = self.puntos_requeridos.trim().parse::<u32>().ok();
        if !matches!(points, Some(p) if p > 0) {
            errors.check(
                "puntos_requeridos",
                Err("Los puntos deben ser un número mayor a 0.".to_string()),
            );
        }

        match points {
            Some(puntos_requeridos) if errors.is_empty() => Ok(RewardInput {
                nombre: self.nombre.trim().to_string(),
                descripcion: self.descripcion.trim().to_string(),
                tipo: self.tipo.trim().to_string(),
                puntos_requeridos,
                icono: Some(self.icono.trim().to_string()).filter(|s| !s.is_empty()),
                estado: self.estado,
            }),
            _ => Err(ValidationError(errors)),
        }
    }
}

#[derive(Default)]
pub struct RewardsPage {
    rewards: Vec<Reward>,
    pub form: RewardForm,
    editing: Option<i64>,
    errors: FieldErrors,
    slot: Notifier,
}

impl RewardsPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rewards(&self) -> &[Reward] {
        &self.rewards
    }

    pub fn editing(&self) -> Option<i64> {
        self.editing
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// Load a reward into the form for editing
    pub fn start_edit(&mut self, id: i64) -> bool {
        match self.rewards.iter().find(|r| r.id == id) {
            Some(reward) => {
                self.form = RewardForm::from_reward(reward);
                self.editing = Some(id);
                self.errors.clear();
                true
            }
            None => false,
        }
    }

    pub fn cancel_edit(&mut self) {
        self.form = RewardForm::default();
        self.editing = None;
        self.errors.clear();
    }

    /// Create a new reward or update the one being edited
    pub async fn save(&mut self, client: &ClinicClient) -> Outcome {
        let input = match self.form.validate() {
            Ok(input) => input,
            Err(ValidationError(errors)) => {
                tracing::debug!(fields = %errors, "Reward form rejected locally");
                self.errors = errors;
                return self.slot.notify(NotificationRequest::error(
                    "Por favor, revisa los campos marcados.",
                ));
            }
        };
        self.errors.clear();

        match self.editing {
            Some(id) => match client.update_reward(id, &input).await {
                Ok(updated) => {
                    if let Some(slot) = self.rewards.iter_mut().find(|r| r.id == id) {
                        *slot = updated;
                    }
                    self.cancel_edit();
                    self.slot
                        .notify(NotificationRequest::success("Recompensa actualizada."))
                }
                Err(e) => self.slot.failure(&e, "No se pudo actualizar la recompensa."),
            },
            None => match client.create_reward(&input).await {
                Ok(created) => {
                    tracing::info!(id = created.id, "Reward created");
                    self.rewards.push(created);
                    self.form = RewardForm::default();
                    self.slot
                        .notify(NotificationRequest::success("Recompensa creada."))
                }
                Err(e) => self.slot.failure(&e, "No se pudo crear la recompensa."),
            },
        }
    }

    /// Delete a reward
    pub async fn delete(&mut self, client: &ClinicClient, id: i64) -> Outcome {
        match client.delete_reward(id).await {
            Ok(()) => {
                self.rewards.retain(|r| r.id != id);
                if self.editing == Some(id) {
                    self.cancel_edit();
                }
                self.slot
                    .notify(NotificationRequest::success("Recompensa eliminada."))
            }
            Err(e) => self.slot.failure(&e, "No se pudo eliminar la recompensa."),
        }
    }
}

#[async_trait]
impl Page for RewardsPage {
    fn title(&self) -> &'static str {
        "Recompensas"
    }

    async fn load(&mut self, client: &ClinicClient) -> Outcome {
        match client.rewards().await {
            Ok(rewards) => {
                self.rewards = rewards;
                Outcome::Quiet
            }
            Err(e) => self.slot.failure(&e, "No se pudieron cargar las recompensas."),
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
        routing::{get, put},
        Json, Router,
    };

    fn router() -> Router {
        Router::new()
            .route(
                "/api/gamificacion/recompensas",
                get(|| async {
                    Json(serde_json::json!([
                        {"id": 1, "nombre": "Limpieza gratis", "puntos_requeridos": 100},
                        {"id": 2, "nombre": "Descuento", "puntos_requeridos": 50, "estado": false}
                    ]))
                })
                .post(|Json(body): Json<serde_json::Value>| async move {
                    let mut body = body;
                    body["id"] = serde_json::json!(3);
                    Json(body)
                }),
            )
            .route(
                "/api/gamificacion/recompensas/:id",
                put(|Path(id): Path<i64>, Json(body): Json<serde_json::Value>| async move {
                    let mut body = body;
                    body["id"] = serde_json::json!(id);
                    Json(body)
                })
                .delete(|Path(id): Path<i64>| async move {
                    if id == 2 {
                        (
                            StatusCode::CONFLICT,
                            Json(serde_json::json!({"message": "La recompensa tiene canjes"})),
                        )
                    } else {
                        (StatusCode::OK, Json(serde_json::json!({})))
                    }
                }),
            )
    }

    async fn loaded(backend: &MockBackend) -> RewardsPage {
        let mut page = RewardsPage::new();
        assert_eq!(page.load(&backend.client()).await, Outcome::Quiet);
        page
    }

    #[tokio::test]
    async fn test_create_and_update() {
        let backend = MockBackend::start(router()).await;
        let client = backend.client();
        let mut page = loaded(&backend).await;
        assert!(page.rewards()[0].estado);
        assert!(!page.rewards()[1].estado);

        page.form.nombre = "Blanqueamiento".to_string();
        page.form.puntos_requeridos = "300".to_string();
        let outcome = page.save(&client).await;
        assert_eq!(outcome.notification().unwrap().severity, Severity::Success);
        assert_eq!(page.rewards().len(), 3);
        assert_eq!(page.rewards()[2].puntos_requeridos, 300);

        assert!(page.start_edit(1));
        assert_eq!(page.form.puntos_requeridos, "100");
        page.form.puntos_requeridos = "120".to_string();
        page.save(&client).await;
        assert_eq!(page.rewards()[0].puntos_requeridos, 120);
        assert_eq!(page.editing(), None);
    }

    #[tokio::test]
    async fn test_invalid_points_never_sent() {
        let backend = MockBackend::start(router()).await;
        let mut page = RewardsPage::new();
        page.form.nombre = "Algo".to_string();
        page.form.puntos_requeridos = "0".to_string();

        let outcome = page.save(&backend.client()).await;

        assert_eq!(outcome.notification().unwrap().severity, Severity::Error);
        assert!(page.errors().get("puntos_requeridos").is_some());
        assert!(page.errors().get("nombre").is_none());
        assert_eq!(backend.total_hits(), 0);
    }

    #[tokio::test]
    async fn test_delete_rejection_keeps_record() {
        let backend = MockBackend::start(router()).await;
        let client = backend.client();
        let mut page = loaded(&backend).await;

        let outcome = page.delete(&client, 2).await;
        let note = outcome.notification().unwrap();
        assert_eq!(note.severity, Severity::Warning);
        assert_eq!(note.message, "La recompensa tiene canjes");
        assert_eq!(page.rewards().len(), 2);

        page.delete(&client, 1).await;
        assert_eq!(page.rewards().len(), 1);
    }

    #[test]
    fn test_form_validation() {
        let form = RewardForm {
            nombre: " ".to_string(),
            puntos_requeridos: "abc".to_string(),
            ..RewardForm::default()
        };
        let err = form.validate().unwrap_err();
        assert_eq!(err.0.len(), 2);
        assert_eq!(err.to_string(), "Invalid fields: nombre, puntos_requeridos");

        let form = RewardForm {
            nombre: "Cepillo".to_string(),
            puntos_requeridos: " 25 ".to_string(),
            icono: String::new(),
            ..RewardForm::default()
        };
        let input = form.validate().unwrap();
        assert_eq!(input.puntos_requeridos, 25);
        assert_eq!(input.icono, None);
    }
}
