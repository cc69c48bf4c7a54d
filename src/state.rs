//! The state shared by every promise and future of one pair.
//!
//! One `Mutex` guards the slot, the status and the producer count, so every
//! transition on a state is totally ordered. Blocking futures park on the
//! paired `Condvar` and always recheck the status when they wake.
use std::fmt;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use crate::Error;

/// Where a state is in its handoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Status {
    /// No value has been written yet (or a reusable state was reset).
    YetEmpty = 0,
    /// Every promise was dropped before a value was written.
    Spoiled,
    /// A value is waiting in the slot.
    Ready,
    /// An exclusive future already took the value.
    MovedFrom,
}

impl Status {
    pub fn is_ready(self) -> bool {
        self == Status::Ready
    }

    /// No further value will ever arrive for this generation without a reset.
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Spoiled | Status::MovedFrom)
    }

    /// The error a retrieval reports after observing this status.
    ///
    /// Returns `None` for [`Status::Ready`].
    pub fn into_error(self) -> Option<Error> {
        match self {
            Status::YetEmpty => Some(Error::NotReady),
            Status::Spoiled => Some(Error::Spoiled),
            Status::MovedFrom => Some(Error::MovedFrom),
            Status::Ready => None,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Status::YetEmpty => "yet empty",
            Status::Spoiled => "spoiled",
            Status::Ready => "ready",
            Status::MovedFrom => "moved from",
        })
    }
}

/// The lock-protected part of a state. `value` is `Some` iff `status == Ready`.
#[doc(hidden)]
#[derive(Debug)]
pub struct Slot<S> {
    pub(crate) value: Option<S>,
    pub(crate) status: Status,
    pub(crate) producers: usize,
}

impl<S> Slot<S> {
    pub(crate) fn new() -> Self {
        Slot {
            value: None,
            status: Status::YetEmpty,
            producers: 0,
        }
    }
}

#[derive(Debug)]
pub(crate) struct State<S> {
    slot: Mutex<Slot<S>>,
    ready: Condvar,
}

impl<S> State<S> {
    /// A fresh state owned by exactly one promise.
    pub(crate) fn with_producer() -> Self {
        let mut slot = Slot::new();
        slot.producers = 1;
        State {
            slot: Mutex::new(slot),
            ready: Condvar::new(),
        }
    }

    // Every mutation completes before the guard is released, so a poisoned
    // lock still holds a consistent slot.
    pub(crate) fn lock(&self) -> MutexGuard<'_, Slot<S>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn status(&self) -> Status {
        self.lock().status
    }

    pub(crate) fn notify_all(&self) {
        self.ready.notify_all();
    }

    /// Parks until `settled` holds for the current status.
    pub(crate) fn wait_while_pending(
        &self,
        settled: fn(Status) -> bool,
    ) -> MutexGuard<'_, Slot<S>> {
        let guard = self.lock();
        self.ready
            .wait_while(guard, |slot| !settled(slot.status))
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Parks until `settled` holds or `deadline` passes, whichever is first.
    pub(crate) fn wait_while_pending_until(
        &self,
        settled: fn(Status) -> bool,
        deadline: Instant,
    ) -> MutexGuard<'_, Slot<S>> {
        let mut guard = self.lock();
        // Condvar::wait_timeout_while takes a relative timeout, so recompute it
        // from the deadline on every spurious wake.
        while !settled(guard.status) {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            guard = match self.ready.wait_timeout(guard, deadline - now) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
        guard
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn not_empty(status: Status) -> bool {
        status != Status::YetEmpty
    }

    #[test]
    fn fresh_state_has_one_producer() {
        let state = State::<u8>::with_producer();
        let slot = state.lock();
        assert_eq!(slot.producers, 1);
        assert_eq!(slot.status, Status::YetEmpty);
        assert!(slot.value.is_none());
    }

    #[test]
    fn status_maps_to_errors() {
        assert_eq!(Status::YetEmpty.into_error(), Some(Error::NotReady));
        assert_eq!(Status::Spoiled.into_error(), Some(Error::Spoiled));
        assert_eq!(Status::MovedFrom.into_error(), Some(Error::MovedFrom));
        assert_eq!(Status::Ready.into_error(), None);
        assert!(Status::Spoiled.is_terminal());
        assert!(!Status::YetEmpty.is_terminal());
        assert!(Status::Ready.is_ready());
    }

    #[test]
    fn wait_until_deadline_times_out() {
        let state = State::<u8>::with_producer();
        let start = Instant::now();
        let slot = state.wait_while_pending_until(not_empty, start + Duration::from_millis(30));
        assert_eq!(slot.status, Status::YetEmpty);
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn waiter_is_released_by_notify() {
        let state = Arc::new(State::<u8>::with_producer());
        let waiter = {
            let state = state.clone();
            thread::spawn(move || state.wait_while_pending(not_empty).status)
        };
        thread::sleep(Duration::from_millis(20));
        {
            let mut slot = state.lock();
            slot.value = Some(1);
            slot.status = Status::Ready;
        }
        state.notify_all();
        assert_eq!(waiter.join().expect("The waiter thread has panicked"), Status::Ready);
    }

    #[test]
    fn status_display() {
        assert_eq!(Status::MovedFrom.to_string(), "moved from");
        assert_eq!(Status::YetEmpty.to_string(), "yet empty");
    }
}
