//! Page controllers
//!
//! Each page fetches from the backend, keeps its own view state and owns a
//! single notification slot. Every user-initiated action returns an
//! [`Outcome`]: a terminal notification or a redirect to the error route.
//!
//! - **about**: clinic mission, vision and values
//! - **contact**: contact form
//! - **news**: news feed with search
//! - **faq**: published questions, patient lookup, question submission
//! - **login**: credentials, lockout handling, verification codes
//! - **rewards**: gamification reward administration
//! - **segmentation**: patient segmentation dashboard
//! - **predictions**: no-show risk scoring
//! - **schedule**: weekly slot configuration
//! - **treatments**: treatment lifecycle tracking
//! - **images**: image asset management

pub mod about;
pub mod contact;
pub mod faq;
pub mod images;
pub mod login;
pub mod news;
pub mod predictions;
pub mod rewards;
pub mod schedule;
pub mod segmentation;
pub mod treatments;

pub use about::AboutPage;
pub use contact::ContactPage;
pub use faq::FaqPage;
pub use images::ImagesPage;
pub use login::LoginPage;
pub use news::NewsPage;
pub use predictions::PredictionsPage;
pub use rewards::RewardsPage;
pub use schedule::SchedulePage;
pub use segmentation::SegmentationPage;
pub use treatments::TreatmentsPage;

use async_trait::async_trait;

use crate::api::{ApiError, ClinicClient, FailureKind};
use crate::notification::{DismissReason, NotificationRequest};

/// Payload carried to the dedicated error route
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRoute {
    pub error_code: u16,
    pub error_message: String,
}

/// How an action ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Mount-time load succeeded; nothing to announce
    Quiet,
    /// A notification is now showing
    Notify(NotificationRequest),
    /// Failure escalated to the error route
    Redirect(ErrorRoute),
}

impl Outcome {
    pub fn notification(&self) -> Option<&NotificationRequest> {
        match self {
            Outcome::Notify(request) => Some(request),
            _ => None,
        }
    }

    pub fn redirect(&self) -> Option<&ErrorRoute> {
        match self {
            Outcome::Redirect(route) => Some(route),
            _ => None,
        }
    }
}

/// A page's single notification slot
#[derive(Debug, Clone, Default)]
pub struct Notifier {
    current: NotificationRequest,
}

impl Notifier {
    /// Replace whatever is showing and report it
    pub fn notify(&mut self, request: NotificationRequest) -> Outcome {
        self.current = request.clone();
        Outcome::Notify(request)
    }

    /// Report a backend failure with a page-specific context message
    pub fn failure(&mut self, err: &ApiError, context: &str) -> Outcome {
        let request = failure_notification(err, context);
        self.notify(request)
    }

    pub fn current(&self) -> &NotificationRequest {
        &self.current
    }

    /// `on_close` from the controller: clear `open`
    pub fn close(&mut self, reason: DismissReason) {
        tracing::trace!(reason = ?reason, "Notification slot closed");
        self.current.close();
    }
}

/// Convert a backend failure into a user-facing notification.
///
/// The raw error is logged; the user sees a generic message, or the
/// backend's own message for business-rule rejections.
pub fn failure_notification(err: &ApiError, context: &str) -> NotificationRequest {
    tracing::error!(error = %err, context, "Backend call failed");

    match err.kind() {
        FailureKind::Timeout => NotificationRequest::warning(format!(
            "La solicitud tardó demasiado. {}",
            context
        )),
        FailureKind::Rejected => match err.backend_message() {
            Some(message) => NotificationRequest::warning(message.to_string()),
            None => NotificationRequest::warning(context.to_string()),
        },
        FailureKind::Validation => NotificationRequest::error(context.to_string()),
        FailureKind::Network if err.is_server_error() => NotificationRequest::error(format!(
            "Error del servidor. {}",
            context
        )),
        FailureKind::Network => NotificationRequest::error(format!(
            "No se pudo conectar con el servidor. {}",
            context
        )),
    }
}

/// Common page surface
#[async_trait]
pub trait Page: Send {
    /// Page title
    fn title(&self) -> &'static str;

    /// Fetch whatever the page shows on mount
    async fn load(&mut self, client: &ClinicClient) -> Outcome;

    /// The page's notification slot
    fn notification(&self) -> &NotificationRequest;

    /// Called by the notification controller once it has closed
    fn close_notification(&mut self, reason: DismissReason);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::Severity;
    use reqwest::Method;

    fn status(code: u16, message: &str) -> ApiError {
        ApiError::Status {
            status: code,
            message: message.to_string(),
            url: "http://localhost/api".to_string(),
            method: Method::POST,
        }
    }

    #[test]
    fn test_failure_mapping() {
        let req = failure_notification(&ApiError::Timeout(10_000), "Intenta de nuevo.");
        assert_eq!(req.severity, Severity::Warning);
        assert!(req.message.contains("tardó demasiado"));

        let req = failure_notification(&status(409, "Ya existe"), "No se pudo guardar.");
        assert_eq!(req.severity, Severity::Warning);
        assert_eq!(req.message, "Ya existe");

        let req = failure_notification(&status(500, "boom"), "No se pudo guardar.");
        assert_eq!(req.severity, Severity::Error);
        assert!(req.message.starts_with("Error del servidor"));
        assert!(!req.message.contains("boom"));

        let req = failure_notification(&ApiError::Unavailable("refused".into()), "x");
        assert_eq!(req.severity, Severity::Error);
        assert!(req.message.contains("No se pudo conectar"));
    }

    #[test]
    fn test_notifier_slot() {
        let mut slot = Notifier::default();
        assert!(!slot.current().open);

        let outcome = slot.notify(NotificationRequest::success("ok"));
        assert_eq!(outcome.notification().map(|n| n.message.as_str()), Some("ok"));
        assert!(slot.current().open);

        slot.notify(NotificationRequest::error("otro"));
        assert_eq!(slot.current().message, "otro");

        slot.close(DismissReason::Timeout);
        assert!(!slot.current().open);
    }
}
