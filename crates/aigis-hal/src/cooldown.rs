use std::time::{Duration, Instant};

/// Throttles an action to at most once per interval.
///
/// The timestamp is taken when the action is triggered, not when it completes.
#[derive(Debug, Clone)]
pub struct Cooldown {
    interval: Duration,
    last: Option<Instant>,
}

impl Cooldown {
    /// Creates a cooldown that is ready immediately.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns true if the action may run at `now`.
    pub fn ready(&self, now: Instant) -> bool {
        match self.last {
            Some(last) => now.saturating_duration_since(last) >= self.interval,
            None => true,
        }
    }

    /// Returns true and restarts the cooldown if the action may run at `now`.
    pub fn trigger(&mut self, now: Instant) -> bool {
        if self.ready(now) {
            self.last = Some(now);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_immediately() {
        let mut cooldown = Cooldown::new(Duration::from_secs(10));
        assert!(cooldown.trigger(Instant::now()));
    }

    #[test]
    fn test_blocks_within_interval() {
        let start = Instant::now();
        let mut cooldown = Cooldown::new(Duration::from_secs(10));
        assert!(cooldown.trigger(start));
        for ms in [0, 50, 5_000, 9_999] {
            assert!(!cooldown.trigger(start + Duration::from_millis(ms)));
        }
        assert!(cooldown.trigger(start + Duration::from_secs(10)));
        assert!(!cooldown.trigger(start + Duration::from_secs(11)));
    }

    #[test]
    fn test_clock_going_backwards() {
        let start = Instant::now() + Duration::from_secs(60);
        let mut cooldown = Cooldown::new(Duration::from_secs(1));
        assert!(cooldown.trigger(start));
        assert!(!cooldown.ready(start - Duration::from_secs(30)));
    }
}
