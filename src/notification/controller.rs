//! Notification Controller
//!
//! Drives one notification slot through `Hidden → Visible → Dismissing →
//! Hidden`. The parent owns the [`NotificationRequest`]; the controller only
//! mirrors a visible flag so the exit transition can play before the parent
//! is told to clear `open`.
//!
//! Timers run as tokio tasks. Each display gets a generation number, and a
//! timer only acts if its generation is still current, so a timer left over
//! from an earlier display can never close a newer one. Dropping the
//! controller aborts every pending timer.

use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;

use super::request::{NotificationRequest, Severity};

/// Why a dismissal was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DismissReason {
    /// The auto-dismiss timer elapsed
    Timeout,
    /// The user closed the notification
    UserAction,
    /// The user clicked somewhere else on the page (ignored)
    ClickAway,
}

/// Lifecycle phase of the slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Hidden,
    Visible,
    Dismissing,
}

/// Exit transition timings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    /// Delay between hiding the bubble and invoking `on_close`
    pub exit_delay: Duration,
    /// Length of the exit transition; `exit_delay` must be shorter
    pub exit_transition: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            exit_delay: Duration::from_millis(400),
            exit_transition: Duration::from_millis(500),
        }
    }
}

impl Timings {
    /// Build timings, keeping `exit_delay` strictly inside the transition
    pub fn new(exit_delay: Duration, exit_transition: Duration) -> Self {
        let exit_delay = if exit_delay < exit_transition {
            exit_delay
        } else {
            exit_transition.saturating_sub(Duration::from_millis(1))
        };
        Self {
            exit_delay,
            exit_transition,
        }
    }
}

/// Snapshot of what the slot currently renders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationView {
    pub phase: Phase,
    /// Mirrored visible flag; false as soon as dismissal starts
    pub visible: bool,
    pub message: String,
    pub severity: Severity,
}

/// Callback invoked once the exit transition has played
pub type CloseHandler = Arc<dyn Fn(DismissReason) + Send + Sync>;

struct Shared {
    phase: Phase,
    message: String,
    severity: Severity,
    generation: u64,
    timer: Option<JoinHandle<()>>,
    terminated: bool,
}

impl Shared {
    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

/// Controller for a single transient notification.
///
/// Must be used from within a tokio runtime.
pub struct NotificationController {
    shared: Arc<Mutex<Shared>>,
    timings: Timings,
    on_close: CloseHandler,
}

impl NotificationController {
    /// Create a hidden controller
    pub fn new<F>(timings: Timings, on_close: F) -> Self
    where
        F: Fn(DismissReason) + Send + Sync + 'static,
    {
        Self {
            shared: Arc::new(Mutex::new(Shared {
                phase: Phase::Hidden,
                message: String::new(),
                severity: Severity::Info,
                generation: 0,
                timer: None,
                terminated: false,
            })),
            timings,
            on_close: Arc::new(on_close),
        }
    }

    pub fn timings(&self) -> Timings {
        self.timings
    }

    /// Mirror the parent's request: `open=true` shows, `open=false` hides.
    pub fn set_open(&self, request: &NotificationRequest) {
        if request.open {
            self.show(request);
        } else {
            self.hide();
        }
    }

    /// Show a request, replacing whatever is displayed and re-arming the
    /// auto-dismiss timer.
    pub fn show(&self, request: &NotificationRequest) {
        let mut shared = lock(&self.shared);
        if shared.terminated {
            return;
        }

        shared.cancel_timer();
        shared.generation += 1;
        shared.phase = Phase::Visible;
        shared.message = request.message.clone();
        shared.severity = request.severity;

        let generation = shared.generation;
        tracing::debug!(
            generation,
            severity = %request.severity,
            auto_hide_ms = request.auto_hide_ms(),
            "Showing notification"
        );

        shared.timer = Some(tokio::spawn(auto_hide(
            Arc::downgrade(&self.shared),
            generation,
            request.auto_hide,
            self.timings.exit_delay,
            Arc::clone(&self.on_close),
        )));
    }

    /// Hide immediately without invoking `on_close` (the parent cleared `open`)
    pub fn hide(&self) {
        let mut shared = lock(&self.shared);
        shared.cancel_timer();
        shared.generation += 1;
        shared.phase = Phase::Hidden;
    }

    /// Request a dismissal.
    ///
    /// Click-away is ignored, as is any request while not visible. Returns
    /// whether the close sequence started.
    pub fn dismiss(&self, reason: DismissReason) -> bool {
        if reason == DismissReason::ClickAway {
            tracing::trace!("Ignoring click-away dismissal");
            return false;
        }

        let mut shared = lock(&self.shared);
        if shared.terminated || shared.phase != Phase::Visible {
            return false;
        }

        shared.cancel_timer();
        shared.phase = Phase::Dismissing;

        let generation = shared.generation;
        shared.timer = Some(tokio::spawn(finish_exit(
            Arc::downgrade(&self.shared),
            generation,
            self.timings.exit_delay,
            reason,
            Arc::clone(&self.on_close),
        )));

        true
    }

    pub fn phase(&self) -> Phase {
        lock(&self.shared).phase
    }

    /// Whether the bubble is currently rendered as visible
    pub fn is_visible(&self) -> bool {
        self.phase() == Phase::Visible
    }

    pub fn view(&self) -> NotificationView {
        let shared = lock(&self.shared);
        NotificationView {
            phase: shared.phase,
            visible: shared.phase == Phase::Visible,
            message: shared.message.clone(),
            severity: shared.severity,
        }
    }
}

impl Drop for NotificationController {
    fn drop(&mut self) {
        let mut shared = lock(&self.shared);
        shared.terminated = true;
        shared.cancel_timer();
    }
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Auto-dismiss timer: wait, start the exit transition, then close.
async fn auto_hide(
    shared: Weak<Mutex<Shared>>,
    generation: u64,
    after: Duration,
    exit_delay: Duration,
    on_close: CloseHandler,
) {
    tokio::time::sleep(after).await;

    {
        let Some(strong) = shared.upgrade() else {
            return;
        };
        let mut state = lock(&strong);
        if state.terminated || state.generation != generation || state.phase != Phase::Visible {
            return;
        }
        state.phase = Phase::Dismissing;
    }

    finish_exit(shared, generation, exit_delay, DismissReason::Timeout, on_close).await;
}

/// Second phase of a dismissal: let the exit transition play, then notify.
async fn finish_exit(
    shared: Weak<Mutex<Shared>>,
    generation: u64,
    exit_delay: Duration,
    reason: DismissReason,
    on_close: CloseHandler,
) {
    tokio::time::sleep(exit_delay).await;

    {
        let Some(strong) = shared.upgrade() else {
            return;
        };
        let mut state = lock(&strong);
        if state.terminated
            || state.generation != generation
            || state.phase != Phase::Dismissing
        {
            return;
        }
        state.phase = Phase::Hidden;
        state.timer = None;
    }

    tracing::debug!(generation, reason = ?reason, "Notification closed");
    on_close(reason);
}
