//! Stale response guard
//!
//! A page that can fire the same load several times (filters changing,
//! search typed quickly) takes a ticket before each request and only
//! applies the answer if its ticket is still the latest one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Ticket identifying one issued request
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// Issues tickets and tells whether a ticket is still current
#[derive(Debug, Clone, Default)]
pub struct RequestTracker {
    latest: Arc<AtomicU64>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new request, superseding every earlier ticket
    pub fn begin(&self) -> Ticket {
        Ticket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Whether `ticket` belongs to the most recent request
    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }

    /// Invalidate every outstanding ticket (page unmounted)
    pub fn invalidate(&self) {
        self.latest.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_ticket_wins() {
        let tracker = RequestTracker::new();
        let first = tracker.begin();
        assert!(tracker.is_current(first));

        let second = tracker.begin();
        assert!(!tracker.is_current(first));
        assert!(tracker.is_current(second));
        assert!(second > first);
    }

    #[test]
    fn test_invalidate() {
        let tracker = RequestTracker::new();
        let ticket = tracker.begin();
        tracker.invalidate();
        assert!(!tracker.is_current(ticket));
    }

    #[test]
    fn test_clones_share_state() {
        let tracker = RequestTracker::new();
        let clone = tracker.clone();
        let ticket = tracker.begin();
        clone.begin();
        assert!(!tracker.is_current(ticket));
    }
}
