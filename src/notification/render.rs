//! Terminal rendering of the notification slot

use super::controller::NotificationView;

const RESET: &str = "\x1b[0m";

/// Render the slot as a single toast line.
///
/// Returns `None` while nothing is visible, including during the exit
/// transition.
pub fn toast(view: &NotificationView, colored: bool) -> Option<String> {
    if !view.visible {
        return None;
    }

    let icon = view.severity.icon();
    if colored {
        Some(format!(
            "{}{} {}{}",
            view.severity.color(),
            icon,
            view.message,
            RESET
        ))
    } else {
        Some(format!("{} {}", icon, view.message))
    }
}
