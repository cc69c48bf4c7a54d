use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, MutexGuard};
use std::time::{Duration, Instant};

use crate::policy::{Blocking, Exclusive, Retrieval, Reuse, Shared, SingleUse, Wait};
use crate::state::{Slot, State, Status};
use crate::{Error, Result};

/// The consumer side of a pair. Minted by [`Promise::get_future`].
///
/// What [`get`](Future::get) returns is fixed by `R`: an [`Exclusive`] future
/// moves the `T` out once, a [`Shared`] future hands out an `Arc<T>` as many
/// times as asked and can be cloned.
///
/// # Examples
///
/// ```
/// use spoilable_promise::Promise;
/// use std::thread;
/// let promise = Promise::<String>::new();
/// let future = promise.get_future();
///
/// let task1 = thread::spawn(move || future.get());
/// promise.set_value("🍓".into()).unwrap();
/// assert_eq!(task1.join().expect("The task1 thread has panicked.").unwrap(), "🍓");
/// ```
///
/// [`Promise::get_future`]: crate::Promise::get_future
pub struct Future<T, R: Retrieval = Exclusive, W: Wait = Blocking, U: Reuse = SingleUse> {
    state: Option<Arc<State<R::Stored<T>>>>,
    _policy: PhantomData<fn() -> (W, U)>,
}

impl<T, R: Retrieval, W: Wait, U: Reuse> Future<T, R, W, U> {
    pub(crate) fn bind(state: Arc<State<R::Stored<T>>>) -> Self {
        Future {
            state: Some(state),
            _policy: PhantomData,
        }
    }

    fn state(&self) -> Result<&State<R::Stored<T>>> {
        self.state.as_deref().ok_or(Error::Unbound)
    }

    /// Locks the state once it holds a value, parking first if `park`.
    fn acquire(&self, park: bool) -> Result<MutexGuard<'_, Slot<R::Stored<T>>>> {
        let state = self.state()?;
        let slot = if park {
            state.wait_while_pending(U::settled)
        } else {
            state.lock()
        };
        match slot.status.into_error() {
            Some(err) => Err(err),
            None => Ok(slot),
        }
    }

    /// Retrieves the value.
    ///
    /// A blocking future parks until the state settles; a waitless one
    /// fails right away unless the value is there. Failures carry the status
    /// that was observed: [`Error::NotReady`], [`Error::Spoiled`] or
    /// [`Error::MovedFrom`].
    pub fn get(&self) -> Result<R::Output<T>> {
        let mut slot = self.acquire(W::BLOCKING)?;
        R::retrieve::<T>(&mut *slot)
    }

    /// `true` iff this future is bound to a state.
    pub fn valid(&self) -> bool {
        self.state.is_some()
    }

    /// Snapshot of the status. Never parks.
    pub fn get_state(&self) -> Result<Status> {
        Ok(self.state()?.status())
    }
}

impl<T, R: Retrieval, U: Reuse> Future<T, R, Blocking, U> {
    /// Like a waitless `get`: fails with the current status instead of parking.
    pub fn try_get(&self) -> Result<R::Output<T>> {
        let mut slot = self.acquire(false)?;
        R::retrieve::<T>(&mut *slot)
    }

    /// Parks until the state settles and returns what was observed, without
    /// consuming the value.
    pub fn wait(&self) -> Result<Status> {
        Ok(self.state()?.wait_while_pending(U::settled).status)
    }

    /// [`wait`](Future::wait) with a relative timeout.
    ///
    /// Expiry is not an error: the still-pending status is returned
    /// (`YetEmpty`, or `MovedFrom` for a drained reusable state).
    ///
    /// ```
    /// use spoilable_promise::{Promise, Status};
    /// use std::time::Duration;
    /// let promise = Promise::<u32>::new();
    /// let future = promise.get_future();
    /// assert_eq!(future.wait_for(Duration::from_millis(10)), Ok(Status::YetEmpty));
    /// promise.set_value(1).unwrap();
    /// assert_eq!(future.wait_for(Duration::from_millis(10)), Ok(Status::Ready));
    /// ```
    pub fn wait_for(&self, timeout: Duration) -> Result<Status> {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.wait_until(deadline),
            None => self.wait(),
        }
    }

    /// [`wait`](Future::wait) with an absolute deadline.
    pub fn wait_until(&self, deadline: Instant) -> Result<Status> {
        Ok(self
            .state()?
            .wait_while_pending_until(U::settled, deadline)
            .status)
    }
}

impl<T, W: Wait, U: Reuse> Clone for Future<T, Shared, W, U> {
    fn clone(&self) -> Self {
        Future {
            state: self.state.clone(),
            _policy: PhantomData,
        }
    }
}

/// An unbound future; every operation on it fails with [`Error::Unbound`].
impl<T, R: Retrieval, W: Wait, U: Reuse> Default for Future<T, R, W, U> {
    fn default() -> Self {
        Future {
            state: None,
            _policy: PhantomData,
        }
    }
}

impl<T, R: Retrieval, W: Wait, U: Reuse> fmt::Debug for Future<T, R, W, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Future")
            .field("status", &self.state.as_deref().map(State::status))
            .finish()
    }
}
