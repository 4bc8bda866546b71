use std::time::Duration;
use tokio::time::Instant;

/// Lets at most one update through per interval. The first update always passes.
#[derive(Debug, Clone)]
pub struct ProgressThrottle {
    interval: Duration,
    last: Option<Instant>,
}

impl ProgressThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// True if an update at `now` should be emitted; records it if so.
    pub fn ready_at(&mut self, now: Instant) -> bool {
        match self.last {
            Some(last) if now.saturating_duration_since(last) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }

    pub fn ready(&mut self) -> bool {
        self.ready_at(Instant::now())
    }
}
