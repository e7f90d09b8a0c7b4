//! Transient notifications
//!
//! Every page surfaces the outcome of its asynchronous operations through a
//! single notification slot.
//!
//! - **request**: the parent-owned [`NotificationRequest`] and [`Severity`]
//! - **controller**: the timer-driven [`NotificationController`]
//! - **render**: terminal toast rendering
//!
//! # Lifecycle
//!
//! ```text
//! Hidden --open--> Visible --timer | user dismiss--> Dismissing --exit delay--> Hidden
//!                     ^  |                                                  (on_close)
//!                     +--+ click-away (ignored)
//! ```

pub mod controller;
pub mod render;
pub mod request;

pub use controller::{
    CloseHandler, DismissReason, NotificationController, NotificationView, Phase, Timings,
};
pub use request::{
    duration_for_message, NotificationRequest, Severity, DEFAULT_AUTO_HIDE, EXTENDED_AUTO_HIDE,
};
