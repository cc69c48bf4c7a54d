//! Promise/future pairs that hand one value from a producing thread to one or
//! more consuming threads.
//!
//! Behaviour is chosen by three type parameters:
//!
//! * [`Exclusive`] or [`Shared`]: `get()` moves the value out once, or hands
//!   out an `Arc` to it as often as asked.
//! * [`Blocking`] or [`Waitless`]: `get()` parks until the value arrives, or
//!   fails right away.
//! * [`SingleUse`] or [`Reusable`]: one value per state, or `reset()` and write
//!   again.
//!
//! The eight combinations are plain type aliases over [`Promise`] and
//! [`Future`]. When every promise of a state is dropped before a value was
//! written the state is *spoiled*: blocked futures wake up and see
//! [`Status::Spoiled`].
//!
//! ## Examples
//!
//! ```
//! use spoilable_promise::{Promise, Status};
//! use std::thread;
//! let promise = Promise::<String>::new();
//! let future = promise.get_future();
//!
//! let task1 = thread::spawn(move || future.get());
//! let task2 = thread::spawn(move || promise.set_value(String::from("🍓")));
//! task2.join().expect("The task2 thread has panicked").unwrap();
//! assert_eq!(task1.join().expect("The task1 thread has panicked").unwrap(), "🍓");
//! ```
//!
//! A shared, waitless, reusable pair:
//!
//! ```
//! use spoilable_promise::{Error, SharedWaitlessReusablePromise};
//! let promise = SharedWaitlessReusablePromise::<&str>::new();
//! let future = promise.get_future();
//! assert_eq!(future.get(), Err(Error::NotReady));
//! promise.set_value("hello").unwrap();
//! assert_eq!(*future.clone().get().unwrap(), "hello");
//! promise.reset();
//! assert_eq!(future.get(), Err(Error::NotReady));
//! ```
mod future;
pub mod policy;
mod promise;
mod state;

pub use crate::future::Future;
pub use crate::policy::{Blocking, Exclusive, Reusable, Shared, SingleUse, Waitless};
pub use crate::promise::Promise;
pub use crate::state::Status;

/// Why a promise or future operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum Error {
    #[error("future is not ready yet")]
    NotReady,
    #[error("every promise was dropped before a value was set")]
    Spoiled,
    #[error("value was already taken by an exclusive future")]
    MovedFrom,
    #[error("value already set on a single-use promise")]
    AlreadySet,
    #[error("handle is not bound to a state")]
    Unbound,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

pub type WaitlessPromise<T> = Promise<T, Exclusive, Waitless, SingleUse>;
pub type WaitlessFuture<T> = Future<T, Exclusive, Waitless, SingleUse>;

pub type SharedPromise<T> = Promise<T, Shared, Blocking, SingleUse>;
pub type SharedFuture<T> = Future<T, Shared, Blocking, SingleUse>;

pub type SharedWaitlessPromise<T> = Promise<T, Shared, Waitless, SingleUse>;
pub type SharedWaitlessFuture<T> = Future<T, Shared, Waitless, SingleUse>;

pub type ReusablePromise<T> = Promise<T, Exclusive, Blocking, Reusable>;
pub type ReusableFuture<T> = Future<T, Exclusive, Blocking, Reusable>;

pub type WaitlessReusablePromise<T> = Promise<T, Exclusive, Waitless, Reusable>;
pub type WaitlessReusableFuture<T> = Future<T, Exclusive, Waitless, Reusable>;

pub type SharedReusablePromise<T> = Promise<T, Shared, Blocking, Reusable>;
pub type SharedReusableFuture<T> = Future<T, Shared, Blocking, Reusable>;

pub type SharedWaitlessReusablePromise<T> = Promise<T, Shared, Waitless, Reusable>;
pub type SharedWaitlessReusableFuture<T> = Future<T, Shared, Waitless, Reusable>;
