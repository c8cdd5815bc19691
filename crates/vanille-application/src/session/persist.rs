use std::time::{Duration, Instant};

/// Rate limit for message-file rewrites while a response streams in.
///
/// The first call is always ready; later calls are ready once `interval`
/// has passed since the last recorded write.
#[derive(Debug, Clone)]
pub struct PersistThrottle {
    interval: Duration,
    last_write: Option<Instant>,
}

impl PersistThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_write: None,
        }
    }

    pub fn is_ready(&self, now: Instant) -> bool {
        match self.last_write {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        }
    }

    pub fn record(&mut self, now: Instant) {
        self.last_write = Some(now);
    }

    /// Returns whether a write is due at `now`, recording it if so.
    pub fn try_acquire(&mut self, now: Instant) -> bool {
        if self.is_ready(now) {
            self.record(now);
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
    fn writes_are_spaced_by_interval() {
        let start = Instant::now();
        let mut throttle = PersistThrottle::new(Duration::from_millis(250));

        assert!(throttle.try_acquire(start));
        assert!(!throttle.try_acquire(start + Duration::from_millis(100)));
        assert!(!throttle.try_acquire(start + Duration::from_millis(249)));
        assert!(throttle.try_acquire(start + Duration::from_millis(250)));
        assert!(!throttle.is_ready(start + Duration::from_millis(300)));
    }

    #[test]
    fn zero_interval_is_always_ready() {
        let start = Instant::now();
        let mut throttle = PersistThrottle::new(Duration::ZERO);
        assert!(throttle.try_acquire(start));
        assert!(throttle.try_acquire(start));
    }
}
