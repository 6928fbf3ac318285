//! Cancellable debounce timer.
//!
//! Time is passed in rather than read from a clock, so the host decides how
//! to wait (event-loop timeout, sleep, test steps) and tests never sleep.

use std::time::{Duration, Instant};

/// Identifies one scheduling of the timer. A handle is never reused.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct TimerHandle(u64);

#[derive(Clone, Debug)]
pub struct DebounceTimer {
    delay: Duration,
    next_id: u64,
    armed: Option<(TimerHandle, Instant)>,
}

impl DebounceTimer {
    pub fn new(delay: Duration) -> Self {
        DebounceTimer {
            delay,
            next_id: 0,
            armed: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Cancel any outstanding schedule and arm a new one at `now + delay`.
    pub fn schedule(&mut self, now: Instant) -> TimerHandle {
        if let Some(old) = self.cancel() {
            log::trace!("debounce {:?} superseded", old);
        }
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        self.armed = Some((handle, now + self.delay));
        handle
    }

    /// Disarm, returning the handle that was cancelled.
    pub fn cancel(&mut self) -> Option<TimerHandle> {
        self.armed.take().map(|(handle, _)| handle)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.armed.map(|(_, deadline)| deadline)
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// Disarm and return the handle if its deadline has passed.
    pub fn fire(&mut self, now: Instant) -> Option<TimerHandle> {
        match self.armed {
            Some((handle, deadline)) if now >= deadline => {
                self.armed = None;
                Some(handle)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(300);

    #[test]
    fn test_fires_once_after_delay() {
        let start = Instant::now();
        let mut timer = DebounceTimer::new(DELAY);
        let handle = timer.schedule(start);

        assert_eq!(timer.fire(start + Duration::from_millis(299)), None);
        assert_eq!(timer.fire(start + DELAY), Some(handle));
        assert_eq!(timer.fire(start + DELAY * 2), None);
    }

    #[test]
    fn test_reschedule_cancels_previous_handle() {
        let start = Instant::now();
        let mut timer = DebounceTimer::new(DELAY);
        let first = timer.schedule(start);
        let second = timer.schedule(start + Duration::from_millis(200));

        assert_ne!(first, second);
        assert_eq!(timer.fire(start + DELAY), None);
        assert_eq!(timer.deadline(), Some(start + Duration::from_millis(500)));
        assert_eq!(timer.fire(start + Duration::from_millis(500)), Some(second));
    }

    #[test]
    fn test_cancel_disarms() {
        let start = Instant::now();
        let mut timer = DebounceTimer::new(DELAY);
        let handle = timer.schedule(start);
        assert_eq!(timer.cancel(), Some(handle));
        assert!(!timer.is_armed());
        assert_eq!(timer.fire(start + DELAY), None);
    }
}
