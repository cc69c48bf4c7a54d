use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, trace};

use crate::future::Future;
use crate::policy::{Blocking, Exclusive, Retrieval, Reuse, SingleUse, Wait};
use crate::state::{State, Status};
use crate::{Error, Result};

type Handle<T, R> = Option<Arc<State<<R as Retrieval>::Stored<T>>>>;

/// The producer side of a pair.
///
/// A promise starts unbound and creates its state on the first
/// [`get_future`](Promise::get_future) or [`set_value`](Promise::set_value).
/// Clones are extra producers of the same state. When the last producer is
/// dropped before a value was written, the state spoils and every waiter is
/// released with [`Status::Spoiled`].
///
/// All methods take `&self`: a per-handle lock serializes them, so one
/// promise can be shared by reference between threads.
///
/// # Examples
///
/// ```
/// use spoilable_promise::{Promise, Status};
/// use std::thread;
/// let promise = Promise::<u32>::new();
/// let future = promise.get_future();
///
/// let task1 = thread::spawn(move || future.wait());
/// drop(promise);
/// assert_eq!(task1.join().expect("The task1 thread has panicked."), Ok(Status::Spoiled));
/// ```
pub struct Promise<T, R: Retrieval = Exclusive, W: Wait = Blocking, U: Reuse = SingleUse> {
    state: Mutex<Handle<T, R>>,
    _policy: PhantomData<fn() -> (W, U)>,
}

impl<T, R: Retrieval, W: Wait, U: Reuse> Promise<T, R, W, U> {
    /// An unbound promise.
    pub fn new() -> Self {
        Promise {
            state: Mutex::new(None),
            _policy: PhantomData,
        }
    }

    fn handle(&self) -> MutexGuard<'_, Handle<T, R>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn bind_lazily(handle: &mut Handle<T, R>) -> &Arc<State<R::Stored<T>>> {
        handle.get_or_insert_with(|| {
            trace!("binding promise to a new state");
            Arc::new(State::with_producer())
        })
    }

    /// Releases one producer reference, spoiling the state if it was the last
    /// one and nothing was written.
    fn unbind(handle: Handle<T, R>) {
        let Some(state) = handle else {
            return;
        };
        let mut slot = state.lock();
        slot.producers = slot.producers.saturating_sub(1);
        trace!(producers = slot.producers, "promise unbound");
        if slot.producers == 0 && slot.status == Status::YetEmpty {
            slot.status = Status::Spoiled;
            debug!("every promise dropped before a value was set; state spoiled");
        }
        drop(slot);
        if W::BLOCKING {
            state.notify_all();
        }
    }

    /// Mints a future over this promise's state, creating the state if needed.
    ///
    /// May be called any number of times; every future shares the one state.
    pub fn get_future(&self) -> Future<T, R, W, U> {
        let mut handle = self.handle();
        Future::bind(Self::bind_lazily(&mut handle).clone())
    }

    /// Stores `value` and releases any blocked futures.
    ///
    /// A single-use state accepts exactly one value; later calls fail with
    /// [`Error::AlreadySet`] and drop `value`. A reusable state overwrites.
    pub fn set_value(&self, value: T) -> Result<()> {
        let mut handle = self.handle();
        let state = Self::bind_lazily(&mut handle);
        let mut slot = state.lock();
        if !U::accepts(slot.status) {
            return Err(Error::AlreadySet);
        }
        let stale = slot.value.replace(R::store(value));
        slot.status = Status::Ready;
        trace!(overwrote = stale.is_some(), "value stored");
        drop(slot);
        if W::BLOCKING {
            state.notify_all();
        }
        drop(stale);
        Ok(())
    }

    /// Reusable: empties the slot and returns the state to
    /// [`Status::YetEmpty`], whatever it was. Otherwise: unbinds this promise,
    /// which spoils the state if it was the last producer and nothing was
    /// written.
    pub fn reset(&self) {
        let mut handle = self.handle();
        if !U::REUSABLE {
            Self::unbind(handle.take());
            return;
        }
        if let Some(state) = handle.as_ref() {
            let mut slot = state.lock();
            let stale = slot.value.take();
            slot.status = Status::YetEmpty;
            trace!(previous = stale.is_some(), "state reset");
            drop(slot);
            drop(stale);
        }
    }

    /// `true` iff this promise references a state.
    pub fn is_bound(&self) -> bool {
        self.handle().is_some()
    }

    /// Live producer handles on the bound state.
    pub fn producer_count(&self) -> Option<usize> {
        self.handle().as_ref().map(|state| state.lock().producers)
    }
}

impl<T, R: Retrieval, W: Wait, U: Reuse> Default for Promise<T, R, W, U> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, R: Retrieval, W: Wait, U: Reuse> Clone for Promise<T, R, W, U> {
    /// Another producer of the same state. Cloning an unbound promise gives an
    /// unbound promise.
    fn clone(&self) -> Self {
        let handle = self.handle();
        if let Some(state) = handle.as_ref() {
            state.lock().producers += 1;
        }
        Promise {
            state: Mutex::new(handle.clone()),
            _policy: PhantomData,
        }
    }

    /// Rebinds `self` to `source`'s state, releasing the current one first.
    fn clone_from(&mut self, source: &Self) {
        let incoming = source.handle().clone();
        let current = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        let same = match (current.as_ref(), incoming.as_ref()) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        if same {
            return;
        }
        // `source` still holds its reference, so the count cannot hit zero here.
        if let Some(state) = incoming.as_ref() {
            state.lock().producers += 1;
        }
        Self::unbind(std::mem::replace(current, incoming));
    }
}

impl<T, R: Retrieval, W: Wait, U: Reuse> Drop for Promise<T, R, W, U> {
    fn drop(&mut self) {
        let handle = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        Self::unbind(handle.take());
    }
}

impl<T, R: Retrieval, W: Wait, U: Reuse> fmt::Debug for Promise<T, R, W, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let handle = self.handle();
        let snapshot = handle.as_ref().map(|state| {
            let slot = state.lock();
            (slot.status, slot.producers)
        });
        f.debug_struct("Promise")
            .field("status", &snapshot.map(|(status, _)| status))
            .field("producers", &snapshot.map(|(_, producers)| producers))
            .finish()
    }
}
