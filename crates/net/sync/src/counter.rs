use parking_lot::Mutex;
use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};

/// Rolling counter of events over a fixed trailing window.
///
/// Drives the blocks-per-second telemetry during sync.
#[derive(Debug)]
pub(crate) struct RateCounter {
    window: Duration,
    events: Mutex<VecDeque<Instant>>,
}

impl RateCounter {
    pub(crate) fn new(window: Duration) -> Self {
        Self { window, events: Mutex::new(VecDeque::new()) }
    }

    /// Records one event at the current instant.
    pub(crate) fn incr(&self) {
        let now = Instant::now();
        let mut events = self.events.lock();
        Self::prune(&mut events, now, self.window);
        events.push_back(now);
    }

    /// Events per second over the trailing window.
    pub(crate) fn rate(&self) -> f64 {
        let now = Instant::now();
        let mut events = self.events.lock();
        Self::prune(&mut events, now, self.window);
        events.len() as f64 / self.window.as_secs_f64()
    }

    fn prune(events: &mut VecDeque<Instant>, now: Instant, window: Duration) {
        while events.front().is_some_and(|at| now.duration_since(*at) > window) {
            events.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_reflects_events_in_window() {
        let counter = RateCounter::new(Duration::from_secs(10));
        for _ in 0..25 {
            counter.incr();
        }
        assert_eq!(counter.rate(), 2.5);
    }

    #[test]
    fn stale_events_are_pruned() {
        let counter = RateCounter::new(Duration::from_millis(20));
        counter.incr();
        std::thread::sleep(Duration::from_millis(40));
        assert_eq!(counter.rate(), 0.0);
    }
}
