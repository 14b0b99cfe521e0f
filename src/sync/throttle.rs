//! Leading-edge throttle

use std::time::Duration;
use tokio::time::Instant;

/// Lets the first event through, then drops everything for `window`
#[derive(Debug, Clone)]
pub struct Throttle {
    window: Duration,
    last_fired: Option<Instant>,
}

impl Throttle {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_fired: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Returns true (and starts a new window) if the event may fire now
    pub fn try_fire(&mut self) -> bool {
        self.try_fire_at(Instant::now())
    }

    pub fn try_fire_at(&mut self, now: Instant) -> bool {
        match self.last_fired {
            Some(last) if now.saturating_duration_since(last) < self.window => false,
            _ => {
                self.last_fired = Some(now);
                true
            }
        }
    }
}
