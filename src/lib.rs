//! # Clinic Portal
//!
//! Client for the dental clinic's management backend: the public pages
//! (about, contact, news, FAQ, login) and the administrative ones (rewards,
//! segmentation, no-show prediction, schedules, treatments, images).
//!
//! Every page is a controller that fetches from the backend, keeps its own
//! view state and reports the result of each action through a single
//! notification slot.
//!
//! ## Modules
//!
//! - [`notification`]: Notification requests and the timer-driven controller
//! - [`api`]: Backend client, error taxonomy and stale-response guard
//! - [`pages`]: Page controllers
//! - [`validation`]: Client-side form checks
//! - [`session`]: Persisted session flags
//! - [`config`]: TOML configuration with environment overrides
//! - [`logging`]: Tracing subscriber setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use clinic_portal::api::{ClientConfig, ClinicClient};
//! use clinic_portal::pages::{ContactPage, Page};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ClinicClient::new(ClientConfig::default())?;
//!
//!     let mut contact = ContactPage::new();
//!     contact.load(&client).await;
//!     contact.form.nombre = "Ana Ruiz".to_string();
//!     contact.form.email = "ana@example.com".to_string();
//!     contact.form.telefono = "7711234567".to_string();
//!     contact.form.mensaje = "Quisiera agendar una limpieza".to_string();
//!
//!     let outcome = contact.submit(&client).await;
//!     if let Some(note) = outcome.notification() {
//!         println!("{} {}", note.severity.icon(), note.message);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod logging;
pub mod notification;
pub mod pages;
pub mod session;
pub mod validation;

#[cfg(test)]
mod testing;

// Re-export top-level types for convenience
pub use api::{ApiError, ApiResult, ClientConfig, ClinicClient, FailureKind, RequestTracker};

pub use notification::{
    DismissReason, NotificationController, NotificationRequest, NotificationView, Phase, Severity,
    Timings,
};

pub use pages::{ErrorRoute, Notifier, Outcome, Page};

pub use config::{Config, ConfigError, LoggingConfig, NotificationConfig};

pub use session::{SessionError, SessionStore, UserType};

pub use validation::{FieldErrors, ValidationError};
