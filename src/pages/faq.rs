//! FAQ page
//!
//! Lists published questions and lets visitors ask new ones. An email
//! lookup recognises registered patients and prefills their name.

use async_trait::async_trait;

use super::{Notifier, Outcome, Page};
use crate::api::content::{EmailCheck, FaqEntry, NewQuestion};
use crate::api::ClinicClient;
use crate::notification::{DismissReason, NotificationRequest};
use crate::validation::{self, FieldErrors};

/// Question form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionForm {
    pub email: String,
    pub nombre: String,
    pub pregunta: String,
}

#[derive(Default)]
pub struct FaqPage {
    entries: Vec<FaqEntry>,
    expanded: Option<i64>,
    pub form: QuestionForm,
    /// Lookup result together with the email it was made for
    patient: Option<(String, EmailCheck)>,
    errors: FieldErrors,
    slot: Notifier,
}

impl FaqPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[FaqEntry] {
        &self.entries
    }

    /// Expand one answer, collapsing any other
    pub fn toggle(&mut self, id: i64) {
        self.expanded = if self.expanded == Some(id) { None } else { Some(id) };
    }

    pub fn expanded(&self) -> Option<i64> {
        self.expanded
    }

    /// The recognised patient, if the email lookup matched
    pub fn patient(&self) -> Option<&EmailCheck> {
        self.patient.as_ref().map(|(_, check)| check)
    }

    /// Patient id, only while the form still holds the email that was checked
    fn patient_id(&self) -> Option<i64> {
        self.patient
            .as_ref()
            .filter(|(email, _)| email == self.form.email.trim())
            .and_then(|(_, check)| check.paciente_id)
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// Look up the form's email among registered patients
    pub async fn check_email(&mut self, client: &ClinicClient) -> Outcome {
        self.errors.check("email", validation::email(&self.form.email));
        if self.errors.get("email").is_some() {
            return self
                .slot
                .notify(NotificationRequest::error("Ingresa un correo electrónico válido."));
        }

        let email = self.form.email.trim().to_string();
        match client.check_email(&email).await {
            Ok(check) if check.exists => {
                let full_name = [check.name.as_deref(), check.apellido_paterno.as_deref()]
                    .into_iter()
                    .flatten()
                    .collect::<Vec<_>>()
                    .join(" ");
                if !full_name.is_empty() {
                    self.form.nombre = full_name.clone();
                }
                self.patient = Some((email, check));
                self.slot
                    .notify(NotificationRequest::success(format!("¡Hola, {}!", full_name)))
            }
            Ok(_) => {
                self.patient = None;
                self.slot.notify(NotificationRequest::info(
                    "No encontramos tu correo. Puedes enviar tu pregunta como visitante.",
                ))
            }
            Err(e) => {
                self.patient = None;
                self.slot.failure(&e, "No se pudo verificar el correo.")
            }
        }
    }

    /// Validate and send the question
    pub async fn submit(&mut self, client: &ClinicClient) -> Outcome {
        self.errors.clear();
        self.errors.check("email", validation::email(&self.form.email));
        self.errors.check("nombre", validation::name(&self.form.nombre));
        self.errors.check("pregunta", validation::message(&self.form.pregunta));
        if !self.errors.is_empty() {
            return self.slot.notify(NotificationRequest::error(
                "Por favor, revisa los campos marcados.",
            ));
        }

        let question = NewQuestion {
            email: self.form.email.trim().to_string(),
            nombre: self.form.nombre.trim().to_string(),
            pregunta: self.form.pregunta.trim().to_string(),
            paciente_id: self.patient_id(),
        };

        match client.submit_question(&question).await {
            Ok(()) => {
                self.form.pregunta.clear();
                self.slot.notify(NotificationRequest::success(
                    "Tu pregunta fue enviada. Te responderemos por correo.",
                ))
            }
            Err(e) => self.slot.failure(&e, "No se pudo enviar tu pregunta."),
        }
    }
}

#[async_trait]
impl Page for FaqPage {
    fn title(&self) -> &'static str {
        "Preguntas frecuentes"
    }

    async fn load(&mut self, client: &ClinicClient) -> Outcome {
        match client.faqs().await {
            Ok(entries) => {
                self.entries = entries;
                Outcome::Quiet
            }
            Err(e) => self.slot.failure(&e, "No se pudieron cargar las preguntas."),
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
    use crate::testing::{unreachable_client, MockBackend};
    use axum::{extract::State, routing::post, Json, Router};
    use std::sync::{Arc, Mutex};

    type Sent = Arc<Mutex<Vec<serde_json::Value>>>;

    fn router() -> Router {
        router_recording(Sent::default())
    }

    fn router_recording(sent: Sent) -> Router {
        Router::new()
            .route(
                "/api/preguntas/verificar-correo",
                post(|Json(body): Json<serde_json::Value>| async move {
                    if body["email"] == "ana@clinica.mx" {
                        Json(serde_json::json!({
                            "exists": true, "name": "Ana", "apellido_paterno": "Ruiz", "paciente_id": 42
                        }))
                    } else {
                        Json(serde_json::json!({"exists": false}))
                    }
                }),
            )
            .route(
                "/api/preguntas/nueva",
                post(
                    |State(sent): State<Sent>, Json(body): Json<serde_json::Value>| async move {
                        sent.lock().unwrap().push(body);
                        Json(serde_json::json!({"ok": true}))
                    },
                ),
            )
            .with_state(sent)
    }

    #[tokio::test]
    async fn test_known_patient_is_greeted_and_prefilled() {
        let sent = Sent::default();
        let backend = MockBackend::start(router_recording(Arc::clone(&sent))).await;
        let client = backend.client();
        let mut page = FaqPage::new();
        page.form.email = "ana@clinica.mx".to_string();

        let outcome = page.check_email(&client).await;
        let note = outcome.notification().unwrap();
        assert_eq!(note.severity, Severity::Success);
        assert!(note.message.contains("Ana Ruiz"));
        assert_eq!(page.form.nombre, "Ana Ruiz");

        page.form.pregunta = "¿Atienden sábados?".to_string();
        let outcome = page.submit(&client).await;
        assert_eq!(outcome.notification().unwrap().severity, Severity::Success);
        assert!(page.form.pregunta.is_empty());
        assert_eq!(backend.hits("POST /api/preguntas/nueva"), 1);
        assert_eq!(sent.lock().unwrap()[0]["paciente_id"], 42);
    }

    #[tokio::test]
    async fn test_changed_email_drops_patient_link() {
        let sent = Sent::default();
        let backend = MockBackend::start(router_recording(Arc::clone(&sent))).await;
        let client = backend.client();
        let mut page = FaqPage::new();
        page.form.email = "ana@clinica.mx".to_string();
        page.check_email(&client).await;
        assert_eq!(page.patient().and_then(|p| p.paciente_id), Some(42));

        page.form.email = "otra.persona@correo.com".to_string();
        page.form.nombre = "Luis Perez".to_string();
        page.form.pregunta = "Hola, ¿tienen estacionamiento?".to_string();
        let outcome = page.submit(&client).await;

        assert_eq!(outcome.notification().unwrap().severity, Severity::Success);
        let sent = sent.lock().unwrap();
        let body = &sent[0];
        assert_eq!(body["email"], "otra.persona@correo.com");
        assert!(body.get("paciente_id").map_or(true, |id| id.is_null()));
    }

    #[tokio::test]
    async fn test_failed_lookup_forgets_patient() {
        let backend = MockBackend::start(router()).await;
        let mut page = FaqPage::new();
        page.form.email = "ana@clinica.mx".to_string();
        page.check_email(&backend.client()).await;
        assert!(page.patient().is_some());

        let outcome = page.check_email(&unreachable_client()).await;
        assert_eq!(outcome.notification().unwrap().severity, Severity::Error);
        assert!(page.patient().is_none());
    }

    #[tokio::test]
    async fn test_unknown_email_is_info() {
        let backend = MockBackend::start(router()).await;
        let mut page = FaqPage::new();
        page.form.email = "nadie@correo.com".to_string();

        let outcome = page.check_email(&backend.client()).await;
        assert_eq!(outcome.notification().unwrap().severity, Severity::Info);
        assert!(page.patient().is_none());
    }

    #[tokio::test]
    async fn test_invalid_question_is_not_sent() {
        let backend = MockBackend::start(router()).await;
        let mut page = FaqPage::new();
        page.form.email = "mal".to_string();

        let outcome = page.check_email(&backend.client()).await;
        assert_eq!(outcome.notification().unwrap().severity, Severity::Error);

        let outcome = page.submit(&backend.client()).await;
        assert_eq!(outcome.notification().unwrap().severity, Severity::Error);
        assert!(page.errors().get("pregunta").is_some());
        assert_eq!(backend.total_hits(), 0);
    }

    #[test]
    fn test_toggle() {
        let mut page = FaqPage::new();
        page.toggle(3);
        assert_eq!(page.expanded(), Some(3));
        page.toggle(4);
        assert_eq!(page.expanded(), Some(4));
        page.toggle(4);
        assert_eq!(page.expanded(), None);
    }
}
