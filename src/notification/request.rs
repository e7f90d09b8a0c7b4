//! Notification requests
//!
//! A [`NotificationRequest`] is the parent-owned description of what the
//! notification slot should show. Pages hold exactly one and mutate it when
//! an operation completes.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::time::Duration;

/// Default time before auto-dismiss begins
pub const DEFAULT_AUTO_HIDE: Duration = Duration::from_millis(3000);

/// Auto-dismiss time for messages about a blocked account
pub const EXTENDED_AUTO_HIDE: Duration = Duration::from_millis(6000);

/// Whole words identifying a blocked/locked-account message
const LOCKOUT_MARKERS: [&str; 4] = ["bloqueada", "bloqueado", "blocked", "locked"];

/// Severity selects icon and colour; behaviour is the same for all four.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
    Warning,
    #[default]
    Info,
}

impl Severity {
    /// Parse a severity tag. Unknown or missing tags fall back to `Info`.
    pub fn parse(tag: Option<&str>) -> Self {
        match tag.map(|t| t.trim().to_ascii_lowercase()).as_deref() {
            Some("success") => Severity::Success,
            Some("error") => Severity::Error,
            Some("warning") | Some("warn") => Severity::Warning,
            _ => Severity::Info,
        }
    }

    /// Icon shown next to the message
    pub fn icon(&self) -> &'static str {
        match self {
            Severity::Success => "✓",
            Severity::Error => "✕",
            Severity::Warning => "⚠",
            Severity::Info => "ℹ",
        }
    }

    /// ANSI colour escape used by the terminal renderer
    pub fn color(&self) -> &'static str {
        match self {
            Severity::Success => "\x1b[32m",
            Severity::Error => "\x1b[31m",
            Severity::Warning => "\x1b[33m",
            Severity::Info => "\x1b[34m",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Success => "success",
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

impl From<&str> for Severity {
    fn from(tag: &str) -> Self {
        Severity::parse(Some(tag))
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = Option::<String>::deserialize(deserializer)?;
        Ok(Severity::parse(tag.as_deref()))
    }
}

/// Auto-dismiss time for a message, extended for lockout notices
pub fn duration_for_message(message: &str) -> Duration {
    let lower = message.to_lowercase();
    let is_lockout = lower
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| LOCKOUT_MARKERS.contains(&word));
    if is_lockout {
        EXTENDED_AUTO_HIDE
    } else {
        DEFAULT_AUTO_HIDE
    }
}

/// What the notification slot should currently show
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRequest {
    /// Whether the notification should be visible
    pub open: bool,
    /// User-facing text, may be empty
    pub message: String,
    /// Icon and colour treatment
    pub severity: Severity,
    /// Time before auto-dismiss begins (always positive)
    pub auto_hide: Duration,
}

impl Default for NotificationRequest {
    fn default() -> Self {
        Self::closed()
    }
}

impl NotificationRequest {
    /// An open request; the duration follows the message content
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            open: true,
            auto_hide: duration_for_message(&message),
            message,
            severity,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Severity::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    /// The resting state of a slot
    pub fn closed() -> Self {
        Self {
            open: false,
            message: String::new(),
            severity: Severity::Info,
            auto_hide: DEFAULT_AUTO_HIDE,
        }
    }

    /// Override the auto-dismiss time. Zero keeps the current value.
    pub fn with_auto_hide(mut self, auto_hide: Duration) -> Self {
        if !auto_hide.is_zero() {
            self.auto_hide = auto_hide;
        }
        self
    }

    /// Auto-dismiss time in milliseconds
    pub fn auto_hide_ms(&self) -> u64 {
        self.auto_hide.as_millis() as u64
    }

    /// Parent-side close: the slot goes back to rest, content is kept
    pub fn close(&mut self) {
        self.open = false;
    }
}
