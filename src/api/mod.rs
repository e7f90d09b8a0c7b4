//! Clinic backend client
//!
//! JSON-over-HTTPS client for the clinic backend. The backend itself is an
//! external collaborator; this module only encodes its contract.
//!
//! # Endpoint groups
//!
//! - [`content`]: About, contact, news and FAQ
//! - [`auth`]: Login and email verification codes
//! - [`rewards`]: Gamification reward CRUD
//! - [`ml`]: Segmentation and no-show scoring
//! - [`schedules`]: Weekly attention slots
//! - [`treatments`]: Treatment lifecycle and appointments
//! - [`images`]: Image asset management
//!
//! # Example
//!
//! ```rust,no_run
//! use clinic_portal::api::{ClientConfig, ClinicClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ClinicClient::new(ClientConfig::default())?;
//!     let news = client.news().await?;
//!     println!("{} articles", news.len());
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod content;
pub mod error;
pub mod guard;
pub mod images;
pub mod ml;
pub mod rewards;
pub mod schedules;
pub mod treatments;

pub use client::{with_deadline, ClientConfig, ClinicClient, Deadline, DEFAULT_BASE_URL};
pub use error::{ApiError, ApiResult, FailureKind};
pub use guard::{RequestTracker, Ticket};
