//! Deadline-based pulse pacing.
//!
//! This is the timing-critical primitive of the direct-pulse backend. Each
//! edge deadline is the previous deadline plus the edge interval, so
//! lateness on one edge is not carried into the next. Waiting polls the
//! monotonic clock: short sleeps while the deadline is far, a spin loop
//! inside the final window.

use std::hint;
use std::thread;
use std::time::{Duration, Instant};

/// Below this remaining time the wait spins instead of sleeping.
const SPIN_WINDOW: Duration = Duration::from_micros(200);

/// Lower bound on one sleep slice.
const MIN_SLICE: Duration = Duration::from_micros(50);

/// Block until `deadline`, sleeping in slices no longer than `slice`.
pub fn wait_until(deadline: Instant, slice: Duration) {
    loop {
        let now = Instant::now();
        if now >= deadline {
            return;
        }
        let remaining = deadline - now;
        if remaining > SPIN_WINDOW {
            thread::sleep((remaining - SPIN_WINDOW).min(slice));
        } else {
            hint::spin_loop();
        }
    }
}

/// Edge clock for one pulse train.
#[derive(Debug, Clone)]
pub struct EdgeClock {
    interval: Duration,
    slice: Duration,
    deadline: Instant,
}

impl EdgeClock {
    /// Start a clock whose first deadline is `interval` from now.
    pub fn start(interval: Duration) -> Self {
        Self::start_at(Instant::now(), interval)
    }

    /// Start a clock anchored at `origin`.
    pub fn start_at(origin: Instant, interval: Duration) -> Self {
        Self {
            interval,
            slice: (interval / 10).max(MIN_SLICE),
            deadline: origin,
        }
    }

    /// Advance the deadline by one interval without waiting.
    #[inline]
    pub fn advance(&mut self) -> Instant {
        self.deadline += self.interval;
        self.deadline
    }

    /// Advance the deadline and wait for it.
    pub fn wait_next_edge(&mut self) {
        let deadline = self.advance();
        wait_until(deadline, self.slice);
    }

    /// The most recent deadline.
    #[inline]
    pub fn deadline(&self) -> Instant {
        self.deadline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_wait_until_past_deadline_returns() {
        let start = Instant::now();
        wait_until(start, Duration::from_millis(1));
        assert!(start.elapsed() < Duration::from_millis(5));
    }

    #[test]
    fn test_wait_until_reaches_deadline() {
        let deadline = Instant::now() + Duration::from_millis(3);
        wait_until(deadline, Duration::from_micros(300));
        assert!(Instant::now() >= deadline);
    }

    #[test]
    fn test_late_edge_does_not_shift_schedule() {
        let interval = Duration::from_millis(1);
        let origin = Instant::now();
        let mut clock = EdgeClock::start_at(origin, interval);

        clock.wait_next_edge();
        // Simulate being descheduled past the next deadline
        thread::sleep(Duration::from_millis(3));
        clock.wait_next_edge();
        clock.wait_next_edge();

        assert_eq!(clock.deadline(), origin + interval * 3);
    }

    proptest! {
        #[test]
        fn prop_deadlines_accumulate_exactly(edges in 1u32..10_000, micros in 1u64..10_000) {
            let interval = Duration::from_micros(micros);
            let origin = Instant::now();
            let mut clock = EdgeClock::start_at(origin, interval);
            for _ in 0..edges {
                clock.advance();
            }
            prop_assert_eq!(clock.deadline(), origin + interval * edges);
        }
    }
}
