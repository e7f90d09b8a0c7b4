//! No-show prediction page

use async_trait::async_trait;
use std::fmt;

use super::{Notifier, Outcome, Page};
use crate::api::ml::{NoShowInput, NoShowPrediction};
use crate::api::ClinicClient;
use crate::notification::{DismissReason, NotificationRequest};
use crate::validation::{FieldErrors, ValidationError};

/// Risk band reported by the model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Unknown,
}

impl RiskLevel {
    pub fn parse(tag: &str) -> Self {
        match tag.trim().to_lowercase().as_str() {
            "bajo" | "low" => RiskLevel::Low,
            "medio" | "medium" => RiskLevel::Medium,
            "alto" | "high" => RiskLevel::High,
            _ => RiskLevel::Unknown,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RiskLevel::Low => "bajo",
            RiskLevel::Medium => "medio",
            RiskLevel::High => "alto",
            RiskLevel::Unknown => "desconocido",
        };
        f.write_str(label)
    }
}

/// Range checks on the model inputs
pub fn validate_input(input: &NoShowInput) -> Result<(), ValidationError> {
    let mut errors = FieldErrors::new();
    if input.paciente_id <= 0 {
        errors.check("paciente_id", Err("Selecciona un paciente.".to_string()));
    }
    if input.edad == 0 || input.edad > 120 {
        errors.check("edad", Err("La edad debe estar entre 1 y 120 años.".to_string()));
    }
    if input.genero.trim().is_empty() {
        errors.check("genero", Err("Selecciona el género.".to_string()));
    }
    if input.hora_cita > 23 {
        errors.check("hora_cita", Err("La hora debe estar entre 0 y 23.".to_string()));
    }
    if input.dia_semana > 6 {
        errors.check("dia_semana", Err("El día debe estar entre 0 y 6.".to_string()));
    }
    if input.inasistencias_previas > input.citas_previas {
        errors.check(
            "inasistencias_previas",
            Err("Las inasistencias no pueden superar las citas previas.".to_string()),
        );
    }
    errors.into_result()
}

#[derive(Default)]
pub struct PredictionsPage {
    pub input: NoShowInput,
    errors: FieldErrors,
    last: Option<(RiskLevel, NoShowPrediction)>,
    slot: Notifier,
}

impl PredictionsPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// Most recent successful prediction
    pub fn last(&self) -> Option<&(RiskLevel, NoShowPrediction)> {
        self.last.as_ref()
    }

    pub async fn predict(&mut self, client: &ClinicClient) -> Outcome {
        if let Err(ValidationError(errors)) = validate_input(&self.input) {
            tracing::debug!(fields = %errors, "Prediction input rejected locally");
            self.errors = errors;
            return self.slot.notify(NotificationRequest::error(
                "Por favor, revisa los campos marcados.",
            ));
        }
        self.errors.clear();

        let response = match client.predict_no_show(&self.input).await {
            Ok(response) => response,
            Err(e) => return self.slot.failure(&e, "No se pudo calcular la predicción."),
        };

        let prediction = match response.prediction {
            Some(prediction) if response.success => prediction,
            _ => {
                let message = response
                    .message
                    .unwrap_or_else(|| "El modelo no devolvió una predicción.".to_string());
                return self.slot.notify(NotificationRequest::warning(message));
            }
        };

        let level = RiskLevel::parse(&prediction.risk_level);
        let percent = (prediction.probability * 100.0).round();
        tracing::info!(
            paciente_id = self.input.paciente_id,
            probability = prediction.probability,
            level = %level,
            "No-show prediction"
        );

        let message = format!(
            "Probabilidad de inasistencia: {}% (riesgo {}).",
            percent, level
        );
        let request = match level {
            RiskLevel::High => NotificationRequest::warning(message),
            _ => NotificationRequest::success(message),
        };
        self.last = Some((level, prediction));
        self.slot.notify(request)
    }
}

#[async_trait]
impl Page for PredictionsPage {
    fn title(&self) -> &'static str {
        "Predicción de inasistencias"
    }

    async fn load(&mut self, _client: &ClinicClient) -> Outcome {
        Outcome::Quiet
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
    use axum::{routing::post, Json, Router};

    fn valid_input() -> NoShowInput {
        NoShowInput {
            paciente_id: 7,
            edad: 34,
            genero: "F".to_string(),
            dias_anticipacion: 10,
            citas_previas: 4,
            inasistencias_previas: 1,
            hora_cita: 9,
            dia_semana: 1,
            tipo_tratamiento: None,
        }
    }

    fn backend(level: &'static str) -> Router {
        Router::new().route(
            "/api/ml/predict-no-show",
            post(move || async move {
                Json(serde_json::json!({
                    "success": true,
                    "prediction": {"probability": 0.72, "risk_level": level, "risk_factors": ["historial"]}
                }))
            }),
        )
    }

    #[tokio::test]
    async fn test_high_risk_is_a_warning() {
        let backend = MockBackend::start(backend("alto")).await;
        let mut page = PredictionsPage::new();
        page.input = valid_input();

        let outcome = page.predict(&backend.client()).await;

        let note = outcome.notification().unwrap();
        assert_eq!(note.severity, Severity::Warning);
        assert!(note.message.contains("72%"));
        assert_eq!(page.last().unwrap().0, RiskLevel::High);
    }

    #[tokio::test]
    async fn test_unrecognised_level_is_unknown_success() {
        let backend = MockBackend::start(backend("???")).await;
        let mut page = PredictionsPage::new();
        page.input = valid_input();

        let outcome = page.predict(&backend.client()).await;

        assert_eq!(outcome.notification().unwrap().severity, Severity::Success);
        assert_eq!(page.last().unwrap().0, RiskLevel::Unknown);
    }

    #[tokio::test]
    async fn test_invalid_input_never_sent() {
        let backend = MockBackend::start(backend("bajo")).await;
        let mut page = PredictionsPage::new();
        page.input = NoShowInput {
            inasistencias_previas: 9,
            hora_cita: 30,
            ..valid_input()
        };

        let outcome = page.predict(&backend.client()).await;

        assert_eq!(outcome.notification().unwrap().severity, Severity::Error);
        assert_eq!(page.errors().len(), 2);
        assert_eq!(backend.total_hits(), 0);
    }

    #[test]
    fn test_risk_level_parse() {
        assert_eq!(RiskLevel::parse("Bajo"), RiskLevel::Low);
        assert_eq!(RiskLevel::parse(" medium "), RiskLevel::Medium);
        assert_eq!(RiskLevel::parse(""), RiskLevel::Unknown);
    }
}
