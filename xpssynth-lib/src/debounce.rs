use std::time::Duration;

/// Coalesces bursts of events into a single firing after a quiet period.
///
/// Time is passed in by the caller as a `Duration` since any fixed epoch, so
/// the same code runs under a browser clock or `std::time::Instant`.
#[derive(Debug, Clone, PartialEq)]
pub struct Debouncer {
    quiet: Duration,
    last_event: Option<Duration>,
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Debouncer {
            quiet,
            last_event: None,
        }
    }

    /// Record an event at `now`, restarting the quiet period.
    pub fn notify(&mut self, now: Duration) {
        self.last_event = Some(now);
    }

    pub fn is_pending(&self) -> bool {
        self.last_event.is_some()
    }

    /// True exactly once per burst, when `quiet` has elapsed since the last event.
    pub fn poll(&mut self, now: Duration) -> bool {
        match self.last_event {
            Some(t) if now.saturating_sub(t) >= self.quiet => {
                self.last_event = None;
                true
            }
            _ => false,
        }
    }

    /// Drop a pending burst without firing.
    pub fn cancel(&mut self) {
        self.last_event = None;
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(Duration::from_millis(50))
    }
}
