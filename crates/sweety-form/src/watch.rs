#![forbid(unsafe_code)]

//! Derived observables over form nodes.
//!
//! A [`Watch`] holds a projection of a node's aggregate value or error in an
//! [`Observable`] and refreshes it whenever the node reports a change. The
//! refresh goes through [`schedule`], so inside a [`batch`](sweety_reactive::batch)
//! it runs once when the outermost batch ends, however many cells changed.
//!
//! The stored projection only changes, and watch subscribers only fire, when
//! the comparator says the new projection differs from the old one. This is
//! how a consumer that reads `shape.error()` avoids reacting to unrelated
//! edits that leave the error structurally equal.

use std::rc::Rc;

use sweety_form_core::{FormNode, Listener, Subscription};
use sweety_reactive::{Observable, schedule};

/// A projection of a form node kept in sync with the node.
pub struct Watch<T> {
    state: Observable<T>,
    refresh: Rc<dyn Fn()>,
    _source: Subscription,
}

impl<T: Clone + PartialEq + 'static> Watch<T> {
    /// Watch `compute(node)`, treating projections equal under `==` as
    /// unchanged.
    pub fn new<N: FormNode>(node: &N, compute: impl Fn(&N) -> T + 'static) -> Self {
        Self::with_comparator(node, compute, |a: &T, b: &T| a == b)
    }

    /// Watch `compute(node)`, treating projections for which `same` returns
    /// `true` as unchanged.
    pub fn with_comparator<N: FormNode>(
        node: &N,
        compute: impl Fn(&N) -> T + 'static,
        same: impl Fn(&T, &T) -> bool + 'static,
    ) -> Self {
        let state = Observable::new(compute(node));

        let refresh: Rc<dyn Fn()> = {
            let node = node.clone();
            let state = state.clone();
            Rc::new(move || {
                state.set_with(compute(&node), &same);
            })
        };

        // Keyed on the refresh closure so a batch coalesces every change
        // notification from this node into one recompute.
        let key = Rc::as_ptr(&refresh) as *const () as usize;
        let weak = Rc::downgrade(&refresh);
        let listener: Listener = Rc::new(move || {
            let weak = weak.clone();
            schedule(key, move || {
                if let Some(refresh) = weak.upgrade() {
                    refresh();
                }
            });
        });
        let source = node.subscribe(listener);

        Self {
            state,
            refresh,
            _source: source,
        }
    }

    #[must_use]
    pub fn get(&self) -> T {
        self.state.get()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.state.with(f)
    }

    /// Observe projection changes.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        self.state.subscribe(callback)
    }

    /// Number of times the projection has changed.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.state.version()
    }

    /// Recompute now, outside the change notification path.
    pub fn refresh(&self) {
        (self.refresh)();
    }
}

/// Watch a node's whole aggregate value.
pub fn watch_value<N>(node: &N) -> Watch<N::Value>
where
    N: FormNode,
    N::Value: Clone + PartialEq,
{
    Watch::new(node, N::value)
}

/// Watch a node's aggregate error.
pub fn watch_error<N>(node: &N) -> Watch<Option<N::Error>>
where
    N: FormNode,
    N::Error: Clone + PartialEq,
{
    Watch::new(node, N::error)
}

/// Watch a projection of a node's value.
pub fn watch_value_with<N, T>(node: &N, select: impl Fn(&N::Value) -> T + 'static) -> Watch<T>
where
    N: FormNode,
    T: Clone + PartialEq + 'static,
{
    Watch::new(node, move |node: &N| node.value_with(&select))
}

/// Watch a projection of a node's error.
pub fn watch_error_with<N, T>(
    node: &N,
    select: impl Fn(Option<&N::Error>) -> T + 'static,
) -> Watch<T>
where
    N: FormNode,
    T: Clone + PartialEq + 'static,
{
    Watch::new(node, move |node: &N| node.error_with(&select))
}

impl<T: std::fmt::Debug> std::fmt::Debug for Watch<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watch").field("state", &self.state).finish()
    }
}
