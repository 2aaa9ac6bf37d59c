//! Rolling window of recent call outcomes.

use crate::core::Outcome;

use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

/// A bounded, time-limited log of call outcomes.
///
/// Entries older than the retention horizon are evicted lazily whenever the
/// window is updated or read, so the error rate only reflects recent calls.
/// The entry cap bounds memory under bursts shorter than the horizon.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    horizon: Duration,
    capacity: usize,
    entries: VecDeque<(Instant, Outcome)>,
    failures: usize,
}

impl RollingWindow {
    /// Creates an empty window.
    pub fn new(horizon: Duration, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            horizon,
            capacity,
            entries: VecDeque::with_capacity(capacity.min(64)),
            failures: 0,
        }
    }

    /// Appends an outcome observed at `at`.
    pub fn record(&mut self, outcome: Outcome, at: Instant) {
        self.evict(at);
        if self.entries.len() >= self.capacity {
            self.pop_oldest();
        }
        if outcome.is_failure() {
            self.failures += 1;
        }
        self.entries.push_back((at, outcome));
    }

    /// Returns the failure percentage (0-100) over entries still in the window.
    ///
    /// An empty window has an error rate of zero.
    pub fn error_rate(&mut self, now: Instant) -> f64 {
        self.evict(now);
        if self.entries.is_empty() {
            return 0.0;
        }
        self.failures as f64 * 100.0 / self.entries.len() as f64
    }

    /// Returns the number of entries still in the window.
    pub fn len(&mut self, now: Instant) -> usize {
        self.evict(now);
        self.entries.len()
    }

    /// Returns `true` if no entries remain in the window.
    pub fn is_empty(&mut self, now: Instant) -> bool {
        self.len(now) == 0
    }

    /// Returns the number of failures (including timeouts) in the window.
    pub fn failures(&mut self, now: Instant) -> usize {
        self.evict(now);
        self.failures
    }

    /// Returns the number of timeouts in the window.
    pub fn timeouts(&mut self, now: Instant) -> usize {
        self.evict(now);
        self.entries
            .iter()
            .filter(|(_, outcome)| *outcome == Outcome::Timeout)
            .count()
    }

    /// Removes all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.failures = 0;
    }

    fn evict(&mut self, now: Instant) {
        while let Some((at, _)) = self.entries.front() {
            if now.saturating_duration_since(*at) < self.horizon {
                break;
            }
            self.pop_oldest();
        }
    }

    fn pop_oldest(&mut self) {
        if let Some((_, outcome)) = self.entries.pop_front() {
            if outcome.is_failure() {
                self.failures = self.failures.saturating_sub(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window() -> RollingWindow {
        RollingWindow::new(Duration::from_secs(10), 100)
    }

    #[test]
    fn test_empty_window_has_zero_error_rate() {
        let mut window = window();
        let now = Instant::now();
        assert_eq!(window.error_rate(now), 0.0);
        assert!(window.is_empty(now));
    }

    #[test]
    fn test_error_rate() {
        let mut window = window();
        let now = Instant::now();

        window.record(Outcome::Failure, now);
        window.record(Outcome::Failure, now);
        window.record(Outcome::Success, now);
        window.record(Outcome::Timeout, now);

        assert_eq!(window.len(now), 4);
        assert_eq!(window.failures(now), 3);
        assert_eq!(window.timeouts(now), 1);
        assert_eq!(window.error_rate(now), 75.0);
    }

    #[test]
    fn test_stale_entries_are_evicted() {
        let mut window = window();
        let start = Instant::now();

        window.record(Outcome::Failure, start);
        window.record(Outcome::Failure, start + Duration::from_secs(5));

        let later = start + Duration::from_secs(11);
        assert_eq!(window.len(later), 1);

        window.record(Outcome::Success, later);
        assert_eq!(window.error_rate(later), 50.0);

        let much_later = start + Duration::from_secs(60);
        assert_eq!(window.error_rate(much_later), 0.0);
    }

    #[test]
    fn test_capacity_bounds_window() {
        let mut window = RollingWindow::new(Duration::from_secs(10), 3);
        let now = Instant::now();

        window.record(Outcome::Failure, now);
        for _ in 0..3 {
            window.record(Outcome::Success, now);
        }

        assert_eq!(window.len(now), 3);
        assert_eq!(window.failures(now), 0);
    }

    #[test]
    fn test_clear() {
        let mut window = window();
        let now = Instant::now();
        window.record(Outcome::Failure, now);
        window.clear();
        assert_eq!(window.len(now), 0);
        assert_eq!(window.error_rate(now), 0.0);
    }
}
