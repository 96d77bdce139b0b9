#![forbid(unsafe_code)]

//! The capability every form node shares, plus the error-collapsing helpers
//! used by the containers.
//!
//! # Aggregation
//!
//! A container's value is its children's values, rebuilt on every read. Its
//! error pairs the container's own error with its children's errors and
//! collapses to `None` when neither side contributes:
//!
//! | own error | any child error | result                              |
//! |-----------|-----------------|-------------------------------------|
//! | none      | no              | `None`                              |
//! | none      | yes             | `Some { own: None, children: Some }` |
//! | some      | no              | `Some { own: Some, children: None }` |
//! | some      | yes             | `Some { own: Some, children: Some }` |
//!
//! When children are reported, every child has an entry (`None` for clean
//! ones); the per-child collection is never sparse.

use std::convert::Infallible;
use std::rc::Rc;

use sweety_reactive::Subscription;

/// Error type of a node that can never carry its own error.
pub type NoError = Infallible;

/// Callback attached to every cell of a subtree by [`FormNode::subscribe`].
pub type Listener = Rc<dyn Fn()>;

/// A field, shape or list.
///
/// Node handles are cheap to clone and every clone addresses the same cells.
/// Equality is identity: two handles are equal when they point at the same
/// node, regardless of the values they hold.
pub trait FormNode: Clone + PartialEq + 'static {
    /// Aggregate value of the node.
    type Value;
    /// Aggregate error of the node when one is present.
    type Error;

    /// Current aggregate value.
    fn value(&self) -> Self::Value;

    /// Current aggregate error, `None` when nothing in the subtree has one.
    fn error(&self) -> Option<Self::Error>;

    /// Apply `select` to the current aggregate value.
    ///
    /// # Panics
    ///
    /// Implementations may borrow the node's cells for the duration of
    /// `select`; writing to the same node from inside it can panic.
    fn value_with<R>(&self, select: impl FnOnce(&Self::Value) -> R) -> R {
        select(&self.value())
    }

    /// Apply `select` to the current aggregate error, passing `None`
    /// explicitly when there is none.
    ///
    /// # Panics
    ///
    /// Same as [`value_with`](Self::value_with).
    fn error_with<R>(&self, select: impl FnOnce(Option<&Self::Error>) -> R) -> R {
        select(self.error().as_ref())
    }

    /// Call `listener` whenever any cell of this subtree changes.
    ///
    /// Containers whose children can be replaced keep the attachment current
    /// across structural edits.
    fn subscribe(&self, listener: Listener) -> Subscription;
}

/// Combine a container's own error with its children's errors.
///
/// Returns `None` when both are absent.
pub(crate) fn collapse<O, C>(own: Option<O>, children: Option<C>) -> Option<(Option<O>, Option<C>)> {
    if own.is_none() && children.is_none() {
        None
    } else {
        Some((own, children))
    }
}

/// Keep a non-sparse list of child errors only if one of them is present.
pub(crate) fn present<E>(errors: Vec<Option<E>>) -> Option<Vec<Option<E>>> {
    errors.iter().any(Option::is_some).then_some(errors)
}
