//! The three policy axes of a promise/future pair.
//!
//! Every axis is a pair of uninhabited marker types implementing a sealed
//! trait. Handles carry them as type parameters, so the choice is made once
//! at the type level and costs nothing at runtime.
use std::sync::Arc;

use crate::state::{Slot, Status};
use crate::{Error, Result};

mod sealed {
    pub trait Sealed {}
}

/// How a future hands the value out.
pub trait Retrieval: sealed::Sealed + 'static {
    /// What the shared slot actually stores.
    type Stored<T>;
    /// What a successful `get()` returns.
    type Output<T>;

    #[doc(hidden)]
    fn store<T>(value: T) -> Self::Stored<T>;

    /// Called with the state lock held and `status == Ready`.
    #[doc(hidden)]
    fn retrieve<T>(slot: &mut Slot<Self::Stored<T>>) -> Result<Self::Output<T>>;
}

/// The value is moved out by the first successful `get()`.
#[derive(Debug)]
pub enum Exclusive {}

/// The value stays in place and every `get()` returns a handle to it.
#[derive(Debug)]
pub enum Shared {}

impl sealed::Sealed for Exclusive {}
impl sealed::Sealed for Shared {}

impl Retrieval for Exclusive {
    type Stored<T> = T;
    type Output<T> = T;

    fn store<T>(value: T) -> T {
        value
    }

    fn retrieve<T>(slot: &mut Slot<T>) -> Result<T> {
        let value = slot.value.take().ok_or(Error::MovedFrom)?;
        slot.status = Status::MovedFrom;
        Ok(value)
    }
}

impl Retrieval for Shared {
    type Stored<T> = Arc<T>;
    type Output<T> = Arc<T>;

    fn store<T>(value: T) -> Arc<T> {
        Arc::new(value)
    }

    fn retrieve<T>(slot: &mut Slot<Arc<T>>) -> Result<Arc<T>> {
        slot.value.clone().ok_or(Error::NotReady)
    }
}

/// Whether retrieval may park the calling thread.
pub trait Wait: sealed::Sealed + 'static {
    /// `true` when producers must notify the wait-queue.
    const BLOCKING: bool;
}

/// Retrieval parks on the state's wait-queue until a value or a spoil arrives.
#[derive(Debug)]
pub enum Blocking {}

/// Retrieval never parks; it fails with the current status instead.
#[derive(Debug)]
pub enum Waitless {}

impl sealed::Sealed for Blocking {}
impl sealed::Sealed for Waitless {}

impl Wait for Blocking {
    const BLOCKING: bool = true;
}

impl Wait for Waitless {
    const BLOCKING: bool = false;
}

/// Whether the slot can be refilled for further generations.
pub trait Reuse: sealed::Sealed + 'static {
    const REUSABLE: bool;

    /// A blocked waiter may return once this holds.
    fn settled(status: Status) -> bool;

    /// `set_value` is allowed from this status.
    fn accepts(status: Status) -> bool;
}

/// One value per state, ever.
#[derive(Debug)]
pub enum SingleUse {}

/// The producer may `reset()` and write again.
#[derive(Debug)]
pub enum Reusable {}

impl sealed::Sealed for SingleUse {}
impl sealed::Sealed for Reusable {}

impl Reuse for SingleUse {
    const REUSABLE: bool = false;

    fn settled(status: Status) -> bool {
        status != Status::YetEmpty
    }

    fn accepts(status: Status) -> bool {
        status == Status::YetEmpty
    }
}

impl Reuse for Reusable {
    const REUSABLE: bool = true;

    // A consumed value means "awaiting refill" here, not "done".
    fn settled(status: Status) -> bool {
        !matches!(status, Status::YetEmpty | Status::MovedFrom)
    }

    fn accepts(_status: Status) -> bool {
        true
    }
}
