//! Login page
//!
//! Credential login, lockout reporting and email verification codes. The
//! remembered email is read from the session store when the page mounts.
//!
//! Timeouts and server errors on these calls leave the page: they are
//! escalated to the error route instead of shown as a notification.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{ErrorRoute, Notifier, Outcome, Page};
use crate::api::auth::{Credentials, LoginResponse};
use crate::api::{ApiError, ClinicClient, FailureKind};
use crate::notification::{DismissReason, NotificationRequest};
use crate::session::SessionStore;
use crate::validation::{self, FieldErrors};

/// Attempts allowed before the backend locks the account
pub const MAX_ATTEMPTS: u32 = 5;

/// Shown on the error route when a login call times out
pub const TIMEOUT_MESSAGE: &str = "La solicitud tardó demasiado. Por favor, intenta de nuevo.";

const SERVER_ERROR_MESSAGE: &str = "Error interno del servidor. Intenta más tarde.";

/// Format a lock expiry as `dd/mm/YYYY HH:MM` in UTC
pub fn format_lock_until(raw: &str) -> Option<String> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc).format("%d/%m/%Y %H:%M").to_string())
}

fn lockout_message(lock_until: Option<&str>) -> String {
    match lock_until {
        Some(raw) => {
            let when = format_lock_until(raw).unwrap_or_else(|| raw.to_string());
            format!("Tu cuenta está bloqueada hasta el {}.", when)
        }
        None => "Tu cuenta está bloqueada temporalmente.".to_string(),
    }
}

/// Where the verification flow stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerificationStep {
    #[default]
    NotStarted,
    CodeSent,
    Verified,
}

pub struct LoginPage {
    pub email: String,
    pub password: String,
    pub code: String,
    remember_me: bool,
    session: SessionStore,
    errors: FieldErrors,
    verification: VerificationStep,
    slot: Notifier,
}

impl LoginPage {
    pub fn new(session: SessionStore) -> Self {
        Self {
            email: String::new(),
            password: String::new(),
            code: String::new(),
            remember_me: false,
            session,
            errors: FieldErrors::new(),
            verification: VerificationStep::default(),
            slot: Notifier::default(),
        }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn remember_me(&self) -> bool {
        self.remember_me
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn verification(&self) -> VerificationStep {
        self.verification
    }

    /// Toggle "remember me" and persist it right away
    pub fn set_remember_me(&mut self, remember: bool) {
        self.remember_me = remember;
        if let Err(e) = self.session.set_remember_me(remember, &self.email) {
            tracing::warn!(error = %e, "Could not persist remember-me flag");
        }
    }

    /// Submit the credentials
    pub async fn login(&mut self, client: &ClinicClient) -> Outcome {
        self.errors.clear();
        self.errors.check("email", validation::email(&self.email));
        self.errors.check("password", validation::password(&self.password));
        if !self.errors.is_empty() {
            return self.slot.notify(NotificationRequest::error(
                "Por favor, revisa los campos marcados.",
            ));
        }

        let credentials = Credentials {
            email: self.email.trim().to_string(),
            password: self.password.clone(),
        };

        match client.login(&credentials).await {
            Ok((status, body)) => self.apply_login(status, body),
            Err(e) => self.escalate(&e, "No se pudo iniciar sesión."),
        }
    }

    fn apply_login(&mut self, status: u16, body: LoginResponse) -> Outcome {
        if body.is_locked() {
            tracing::info!(lock_until = ?body.lock_until, "Account locked");
            return self.slot.notify(NotificationRequest::error(lockout_message(
                body.lock_until.as_deref(),
            )));
        }

        if status >= 500 {
            return Outcome::Redirect(ErrorRoute {
                error_code: status,
                error_message: body
                    .message
                    .unwrap_or_else(|| SERVER_ERROR_MESSAGE.to_string()),
            });
        }

        if status >= 400 {
            self.password.clear();
            let message = match body.failed_attempts {
                Some(failed) => {
                    let remaining = MAX_ATTEMPTS.saturating_sub(failed);
                    format!(
                        "Credenciales incorrectas. Te quedan {} de {} intentos.",
                        remaining, MAX_ATTEMPTS
                    )
                }
                None => body
                    .message
                    .unwrap_or_else(|| "Credenciales incorrectas.".to_string()),
            };
            return self.slot.notify(NotificationRequest::warning(message));
        }

        let user_type = body.resolved_user_type().map(str::to_string);
        self.sign_in(user_type.as_deref());
        self.slot
            .notify(NotificationRequest::success("¡Bienvenido! Has iniciado sesión."))
    }

    fn sign_in(&mut self, user_type: Option<&str>) {
        if let Err(e) = self.session.record_login(user_type) {
            tracing::warn!(error = %e, "Could not persist session");
        }
        if self.remember_me {
            if let Err(e) = self.session.set_remember_me(true, &self.email) {
                tracing::warn!(error = %e, "Could not persist remembered email");
            }
        }
        self.password.clear();
        tracing::info!(user_type = ?user_type, "Signed in");
    }

    /// Ask for a one-time code by email
    pub async fn send_code(&mut self, client: &ClinicClient) -> Outcome {
        self.errors.clear();
        self.errors.check("email", validation::email(&self.email));
        if !self.errors.is_empty() {
            return self
                .slot
                .notify(NotificationRequest::error("Ingresa un correo electrónico válido."));
        }

        match client.send_verification_code(self.email.trim()).await {
            Ok(answer) => {
                self.verification = VerificationStep::CodeSent;
                let message = answer
                    .message
                    .unwrap_or_else(|| "Te enviamos un código a tu correo.".to_string());
                self.slot.notify(NotificationRequest::info(message))
            }
            Err(e) => self.escalate(&e, "No se pudo enviar el código."),
        }
    }

    /// Check the code the user typed
    pub async fn verify_code(&mut self, client: &ClinicClient) -> Outcome {
        if self.verification == VerificationStep::NotStarted {
            return self
                .slot
                .notify(NotificationRequest::warning("Primero solicita un código."));
        }

        self.errors.clear();
        self.errors.check("code", validation::verification_code(&self.code));
        if !self.errors.is_empty() {
            return self
                .slot
                .notify(NotificationRequest::error("El código debe tener 6 dígitos."));
        }

        match client
            .verify_verification_code(self.email.trim(), self.code.trim())
            .await
        {
            Ok(answer) => {
                self.verification = VerificationStep::Verified;
                self.code.clear();
                self.sign_in(answer.user_type.as_deref());
                self.slot
                    .notify(NotificationRequest::success("Código verificado correctamente."))
            }
            Err(e) => {
                self.code.clear();
                self.escalate(&e, "Código inválido o expirado.")
            }
        }
    }

    /// Timeouts and server errors go to the error route
    fn escalate(&mut self, err: &ApiError, context: &str) -> Outcome {
        if err.kind() == FailureKind::Timeout {
            tracing::warn!(error = %err, "Login flow timed out");
            return Outcome::Redirect(ErrorRoute {
                error_code: 408,
                error_message: TIMEOUT_MESSAGE.to_string(),
            });
        }
        if err.is_server_error() {
            tracing::error!(error = %err, "Login flow hit a server error");
            return Outcome::Redirect(ErrorRoute {
                error_code: err.status().unwrap_or(500),
                error_message: SERVER_ERROR_MESSAGE.to_string(),
            });
        }
        self.slot.failure(err, context)
    }
}

#[async_trait]
impl Page for LoginPage {
    fn title(&self) -> &'static str {
        "Iniciar sesión"
    }

    async fn load(&mut self, _client: &ClinicClient) -> Outcome {
        if let Some(email) = self.session.remembered_email() {
            self.email = email.to_string();
            self.remember_me = true;
        }
        Outcome::Quiet
    }

    fn notification(&self) -> &NotificationRequest {
        self.slot.current()
    }

    fn close_notification(&mut self, reason: DismissReason) {
        self.slot.close(reason);
    }
}
