#![forbid(unsafe_code)]

//! Shared, version-tracked value cells with change notification.
//!
//! # Design
//!
//! [`Observable<T>`] wraps a value and its subscriber list in shared,
//! reference-counted storage. Cloning an `Observable` creates a new handle to
//! the **same** cell, so a write through any handle is visible through all of
//! them.
//!
//! Subscribers are held weakly; the strong reference lives in the
//! [`Subscription`] returned by [`Observable::subscribe`]. Dead entries are
//! pruned on every subscribe and every notification.
//!
//! Notification happens after the write has completed and the cell borrow has
//! been released: callbacks receive a snapshot of the new value and may read
//! or write any cell, including the one that notified them. Inside a
//! [`BatchScope`](crate::BatchScope) the notification is deferred and
//! coalesced with any other write to the same cell.
//!
//! # Failure Modes
//!
//! - **Re-entrant write from `with`**: writing to a cell from inside its own
//!   [`with`](Observable::with) closure panics on the `RefCell` borrow. Read
//!   with [`get`](Observable::get) first when the closure needs to write.

use std::any::Any;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::batch::schedule;

type Callback<T> = dyn Fn(&T);

struct ObservableInner<T> {
    value: T,
    /// Bumped once per write that changed the value.
    version: u64,
    subscribers: Vec<Weak<Callback<T>>>,
}

/// A shared value cell that notifies subscribers when it changes.
///
/// # Invariants
///
/// 1. `version` increments by exactly 1 per write that changes the value.
/// 2. A write equal to the current value (per the comparator in use) is a
///    no-op: no version bump, no notification.
/// 3. Subscribers are notified in registration order.
pub struct Observable<T> {
    inner: Rc<RefCell<ObservableInner<T>>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Observable")
            .field("value", &inner.value)
            .field("version", &inner.version)
            .field("subscribers", &inner.subscribers.len())
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    /// Create a new cell holding `value`, at version 0.
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ObservableInner {
                value,
                version: 0,
                subscribers: Vec::new(),
            })),
        }
    }

    /// Clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Read the current value by reference.
    ///
    /// # Panics
    ///
    /// Panics if `f` writes to this same cell.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow().value)
    }

    /// Replace the value, notifying subscribers if it differs.
    pub fn set(&self, value: T) {
        self.set_with(value, |current, next| current == next);
    }

    /// Replace the value unless `eq(current, next)` holds.
    ///
    /// Returns whether the value changed.
    pub fn set_with(&self, value: T, eq: impl Fn(&T, &T) -> bool) -> bool {
        {
            let mut inner = self.inner.borrow_mut();
            if eq(&inner.value, &value) {
                return false;
            }
            inner.value = value;
            inner.version += 1;
            #[cfg(feature = "tracing")]
            tracing::trace!(version = inner.version, "observable changed");
        }
        self.notify();
        true
    }

    /// Replace the value with `f(current)`.
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let next = self.with(f);
        self.set(next);
    }

    /// Register `callback`, called with the new value after every change.
    ///
    /// The callback stays registered for as long as the returned
    /// [`Subscription`] is alive.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let callback: Rc<Callback<T>> = Rc::new(callback);
        let mut inner = self.inner.borrow_mut();
        // Quiet cells never notify, so prune here too.
        inner.subscribers.retain(|weak| weak.strong_count() > 0);
        inner.subscribers.push(Rc::downgrade(&callback));
        drop(inner);
        Subscription::holding(callback)
    }

    /// Number of changes applied since construction.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Number of subscribers whose [`Subscription`] is still alive.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .borrow()
            .subscribers
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    /// Whether both handles point at the same cell.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn key(&self) -> usize {
        Rc::as_ptr(&self.inner) as *const () as usize
    }

    fn notify(&self) {
        let weak = Rc::downgrade(&self.inner);
        schedule(self.key(), move || {
            if let Some(inner) = weak.upgrade() {
                Self::notify_now(&inner);
            }
        });
    }

    fn notify_now(inner: &Rc<RefCell<ObservableInner<T>>>) {
        let (snapshot, callbacks) = {
            let mut inner = inner.borrow_mut();
            inner.subscribers.retain(|weak| weak.strong_count() > 0);
            let callbacks: Vec<Rc<Callback<T>>> =
                inner.subscribers.iter().filter_map(Weak::upgrade).collect();
            (inner.value.clone(), callbacks)
        };
        for callback in callbacks {
            callback(&snapshot);
        }
    }
}

/// RAII guard keeping one or more callbacks registered.
///
/// Dropping the guard releases the strong references; the cells holding the
/// matching weak references skip and prune them on their next notification.
#[must_use = "dropping a Subscription unsubscribes immediately"]
#[derive(Default)]
pub struct Subscription {
    guards: Vec<Box<dyn Any>>,
}

impl Subscription {
    /// A guard holding nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A guard keeping `guard` alive until it is dropped.
    pub fn holding(guard: impl Any) -> Self {
        Self {
            guards: vec![Box::new(guard)],
        }
    }

    /// Combine several guards into one.
    pub fn merge(subscriptions: impl IntoIterator<Item = Subscription>) -> Self {
        let mut merged = Self::empty();
        for subscription in subscriptions {
            merged.push(subscription);
        }
        merged
    }

    /// Move the guards of `other` into this one.
    pub fn push(&mut self, other: Subscription) {
        self.guards.extend(other.guards);
    }

    /// Whether this guard holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("guards", &self.guards.len())
            .finish()
    }
}
