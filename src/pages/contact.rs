//! Contact page
//!
//! Validates the contact form locally and only posts it when every field
//! passes.

use async_trait::async_trait;

use super::{Notifier, Outcome, Page};
use crate::api::content::ContactMessage;
use crate::api::ClinicClient;
use crate::notification::{DismissReason, NotificationRequest};
use crate::validation::{self, FieldErrors};

/// Message shown when the form has invalid fields
pub const INVALID_FORM_MESSAGE: &str = "Por favor, revisa los campos marcados antes de enviar.";

/// Editable contact form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactForm {
    pub nombre: String,
    pub email: String,
    pub telefono: String,
    pub mensaje: String,
}

impl ContactForm {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.check("nombre", validation::name(&self.nombre));
        errors.check("email", validation::email(&self.email));
        errors.check("telefono", validation::phone(&self.telefono));
        errors.check("mensaje", validation::message(&self.mensaje));
        errors
    }

    fn to_message(&self) -> ContactMessage {
        ContactMessage {
            nombre: self.nombre.trim().to_string(),
            email: self.email.trim().to_string(),
            telefono: self.telefono.trim().to_string(),
            mensaje: self.mensaje.trim().to_string(),
        }
    }
}

#[derive(Default)]
pub struct ContactPage {
    pub form: ContactForm,
    errors: FieldErrors,
    submitting: bool,
    slot: Notifier,
}

impl ContactPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Validate and send the form
    pub async fn submit(&mut self, client: &ClinicClient) -> Outcome {
        self.errors = self.form.validate();
        if !self.errors.is_empty() {
            tracing::debug!(fields = %self.errors, "Contact form rejected locally");
            return self
                .slot
                .notify(NotificationRequest::error(INVALID_FORM_MESSAGE));
        }

        self.submitting = true;
        let result = client.send_contact(&self.form.to_message()).await;
        self.submitting = false;

        match result {
            Ok(ack) if !ack.ok => {
                tracing::warn!(message = ?ack.message, "Contact message refused by backend");
                let message = ack
                    .message
                    .unwrap_or_else(|| "No se pudo enviar tu mensaje. Intenta más tarde.".to_string());
                self.slot.notify(NotificationRequest::warning(message))
            }
            Ok(ack) => {
                tracing::info!("Contact message sent");
                self.form = ContactForm::default();
                let message = ack
                    .message
                    .unwrap_or_else(|| "Mensaje enviado. Te contactaremos pronto.".to_string());
                self.slot
                    .notify(NotificationRequest::success(message).with_auto_hide(
                        std::time::Duration::from_millis(4000),
                    ))
            }
            Err(e) => self
                .slot
                .failure(&e, "No se pudo enviar tu mensaje. Intenta más tarde."),
        }
    }
}

#[async_trait]
impl Page for ContactPage {
    fn title(&self) -> &'static str {
        "Contacto"
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

    fn backend_router() -> Router {
        Router::new().route(
            "/api/contacto/msj",
            post(|Json(body): Json<serde_json::Value>| async move {
                assert_eq!(body["email"], "ana@clinica.mx");
                Json(serde_json::json!({"ok": true}))
            }),
        )
    }

    fn valid_form() -> ContactForm {
        ContactForm {
            nombre: "Ana Ruiz".to_string(),
            email: "ana@clinica.mx".to_string(),
            telefono: "7711234567".to_string(),
            mensaje: "Quisiera una cita".to_string(),
        }
    }

    #[tokio::test]
    async fn test_invalid_email_never_reaches_network() {
        let backend = MockBackend::start(backend_router()).await;
        let mut page = ContactPage::new();
        page.form = ContactForm {
            email: "not-an-email".to_string(),
            ..valid_form()
        };

        let outcome = page.submit(&backend.client()).await;

        assert!(page.errors().get("email").is_some());
        assert!(page.errors().get("nombre").is_none());
        let note = outcome.notification().unwrap();
        assert_eq!(note.severity, Severity::Error);
        assert!(note.message.contains("revisa los campos"));
        assert_eq!(backend.total_hits(), 0);
    }

    #[tokio::test]
    async fn test_valid_form_is_sent_and_cleared() {
        let backend = MockBackend::start(backend_router()).await;
        let mut page = ContactPage::new();
        page.form = valid_form();

        let outcome = page.submit(&backend.client()).await;

        let note = outcome.notification().unwrap();
        assert_eq!(note.severity, Severity::Success);
        assert_eq!(note.auto_hide_ms(), 4000);
        assert_eq!(backend.hits("POST /api/contacto/msj"), 1);
        assert_eq!(page.form, ContactForm::default());
        assert!(!page.is_submitting());
    }

    #[tokio::test]
    async fn test_backend_failure_keeps_form() {
        let backend = MockBackend::start(Router::new()).await;
        let mut page = ContactPage::new();
        page.form = valid_form();

        let outcome = page.submit(&backend.client()).await;

        assert_eq!(outcome.notification().unwrap().severity, Severity::Warning);
        assert_eq!(page.form, valid_form());
    }

    #[tokio::test]
    async fn test_refusal_with_ok_status_is_a_warning() {
        let backend = MockBackend::start(Router::new().route(
            "/api/contacto/msj",
            post(|| async {
                Json(serde_json::json!({"ok": false, "message": "Límite de mensajes alcanzado"}))
            }),
        ))
        .await;
        let mut page = ContactPage::new();
        page.form = valid_form();

        let outcome = page.submit(&backend.client()).await;

        let note = outcome.notification().unwrap();
        assert_eq!(note.severity, Severity::Warning);
        assert_eq!(note.message, "Límite de mensajes alcanzado");
        assert_eq!(page.form, valid_form());
    }
}
