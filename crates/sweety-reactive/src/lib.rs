#![forbid(unsafe_code)]

//! Reactive cells for sweety forms.
//!
//! This crate provides the change-tracking primitive every form node is built
//! from:
//!
//! - [`Observable`]: A shared, version-tracked value wrapper with change
//!   notification via subscriber callbacks.
//! - [`Subscription`]: RAII guard that automatically unsubscribes on drop.
//! - [`BatchScope`]: RAII guard that defers all `Observable` notifications
//!   until the scope exits, so a multi-cell update is observed once.
//!
//! # Architecture
//!
//! `Observable<T>` uses `Rc<RefCell<..>>` for single-threaded shared ownership.
//! Subscribers are stored as `Weak` function pointers and cleaned up lazily
//! during notification.
//!
//! `BatchScope` uses a thread-local context to defer notifications. Nested
//! scopes are supported; only the outermost scope triggers flush.
//!
//! # Invariants
//!
//! 1. Version increments exactly once per mutation that changes the value.
//! 2. Subscribers are notified in registration order.
//! 3. Setting a value equal to the current value is a no-op (no version bump,
//!    no notifications).
//! 4. Dropping a [`Subscription`] removes the callback before the next
//!    notification cycle.
//! 5. Within a `BatchScope`, values are updated immediately but notifications
//!    are deferred until the outermost scope exits, at most once per cell.

pub mod batch;
pub mod observable;

pub use batch::{BatchScope, batch, schedule};
pub use observable::{Observable, Subscription};
