#![forbid(unsafe_code)]

//! Variable-length, index-ordered composition of child nodes.
//!
//! # Design
//!
//! A [`List`] keeps its items in an observable cell holding a `Vec` of node
//! handles, plus a list-level error cell. Since node equality is identity,
//! the items cell changes only on a structural edit (insert, remove, reorder,
//! replace with different nodes). Writes to an item's own cells leave the
//! items cell untouched.
//!
//! The two kinds of edit are separate operations:
//!
//! - [`List::mutate_items`] hands the current items to a callback that writes
//!   through their handles;
//! - [`List::replace_items`] stores the `Vec` returned by its callback.
//!
//! # Invariants
//!
//! 1. `value()` has one entry per item, in item order.
//! 2. `error()` is `None` iff the list error and every item error are absent.
//! 3. `error().items` is `None` iff every item error is absent (including when
//!    there are no items); otherwise it has exactly one entry per item.

use std::cell::RefCell;
use std::rc::Rc;

use sweety_reactive::{Observable, Subscription};

use crate::error::{FormError, Result};
use crate::node::{FormNode, Listener, NoError, collapse, present};

/// Aggregate error of a [`List`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListError<I, E = NoError> {
    /// The list's own error.
    pub list: Option<E>,
    /// One entry per item, `None` when no item has an error.
    pub items: Option<Vec<Option<I>>>,
}

impl<I, E> ListError<I, E> {
    fn collapse(list: Option<E>, items: Option<Vec<Option<I>>>) -> Option<Self> {
        collapse(list, items).map(|(list, items)| Self { list, items })
    }
}

/// An ordered, resizable sequence of homogeneous nodes plus a list-level
/// error.
///
/// ```
/// use sweety_form_core::{Field, FormNode, List, ListError};
///
/// let tags: List<Field<String, String>, String> =
///     List::with_error([Field::of("rust".to_string())], "too few".to_string());
///
/// tags.push_item(Field::with_error(String::new(), "empty".to_string()));
/// assert_eq!(tags.value(), vec!["rust".to_string(), String::new()]);
/// assert_eq!(
///     tags.error(),
///     Some(ListError {
///         list: Some("too few".to_string()),
///         items: Some(vec![None, Some("empty".to_string())]),
///     })
/// );
/// ```
pub struct List<I, E = NoError> {
    items: Observable<Vec<I>>,
    error: Observable<Option<E>>,
}

impl<I, E> Clone for List<I, E> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
            error: self.error.clone(),
        }
    }
}

impl<I, E> List<I, E>
where
    I: FormNode,
    E: Clone + PartialEq + 'static,
{
    pub fn of(items: impl IntoIterator<Item = I>) -> Self {
        Self {
            items: Observable::new(items.into_iter().collect()),
            error: Observable::new(None),
        }
    }

    pub fn with_error(items: impl IntoIterator<Item = I>, error: E) -> Self {
        Self {
            items: Observable::new(items.into_iter().collect()),
            error: Observable::new(Some(error)),
        }
    }

    /// Handles to the current items.
    #[must_use]
    pub fn items(&self) -> Vec<I> {
        self.items.get()
    }

    /// Apply `select` to the current items without cloning the `Vec`.
    ///
    /// # Panics
    ///
    /// Panics if `select` makes a structural edit to this list; use
    /// [`replace_items`](Self::replace_items) for that. Writing through the
    /// item handles is fine.
    pub fn items_with<R>(&self, select: impl FnOnce(&[I]) -> R) -> R {
        self.items.with(|items| select(items))
    }

    #[must_use]
    pub fn item(&self, index: usize) -> Option<I> {
        self.items.with(|items| items.get(index).cloned())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.with(Vec::len)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.with(Vec::is_empty)
    }

    /// The list's own error, ignoring the items.
    #[must_use]
    pub fn list_error(&self) -> Option<E> {
        self.error.get()
    }

    pub fn set_list_error(&self, error: Option<E>) {
        self.error.set(error);
    }

    pub fn update_list_error(&self, transform: impl FnOnce(Option<&E>) -> Option<E>) {
        self.error.update(|current| transform(current.as_ref()));
    }

    /// Write to existing items through their handles.
    ///
    /// The item sequence itself is left as it is.
    pub fn mutate_items(&self, mutate: impl FnOnce(&[I])) {
        let items = self.items.get();
        mutate(&items);
    }

    /// Replace the item sequence with the one built by `replace`.
    ///
    /// Returning the same handles in the same order is not a change.
    pub fn replace_items(&self, replace: impl FnOnce(&[I]) -> Vec<I>) {
        let current = self.items.get();
        let next = replace(&current);
        tracing::trace!(from = current.len(), to = next.len(), "list items replaced");
        self.items.set(next);
    }

    pub fn push_item(&self, item: I) {
        self.replace_items(|items| {
            let mut next = items.to_vec();
            next.push(item);
            next
        });
    }

    /// Insert `item` before `index`; `index == len` appends.
    pub fn insert_item(&self, index: usize, item: I) -> Result<()> {
        let len = self.len();
        if index > len {
            return Err(FormError::out_of_bounds(index, len));
        }
        self.replace_items(|items| {
            let mut next = items.to_vec();
            next.insert(index, item);
            next
        });
        Ok(())
    }

    /// Remove and return the item at `index`.
    pub fn remove_item(&self, index: usize) -> Result<I> {
        let mut next = self.items.get();
        if index >= next.len() {
            return Err(FormError::out_of_bounds(index, next.len()));
        }
        let removed = next.remove(index);
        self.replace_items(|_| next);
        Ok(removed)
    }

    pub fn swap_items(&self, a: usize, b: usize) -> Result<()> {
        let len = self.len();
        if let Some(index) = [a, b].into_iter().find(|&i| i >= len) {
            return Err(FormError::out_of_bounds(index, len));
        }
        self.replace_items(|items| {
            let mut next = items.to_vec();
            next.swap(a, b);
            next
        });
        Ok(())
    }

    /// Move the item at `from` so that it ends up at `to`.
    pub fn move_item(&self, from: usize, to: usize) -> Result<()> {
        let len = self.len();
        if let Some(index) = [from, to].into_iter().find(|&i| i >= len) {
            return Err(FormError::out_of_bounds(index, len));
        }
        self.replace_items(|items| {
            let mut next = items.to_vec();
            let item = next.remove(from);
            next.insert(to, item);
            next
        });
        Ok(())
    }

    /// Number of structural edits applied since construction.
    #[must_use]
    pub fn structure_version(&self) -> u64 {
        self.items.version()
    }
}

fn subscribe_all<I: FormNode>(items: &[I], listener: &Listener) -> Subscription {
    Subscription::merge(items.iter().map(|item| item.subscribe(Rc::clone(listener))))
}

impl<I, E> FormNode for List<I, E>
where
    I: FormNode,
    E: Clone + PartialEq + 'static,
{
    type Value = Vec<I::Value>;
    type Error = ListError<I::Error, E>;

    fn value(&self) -> Vec<I::Value> {
        self.items
            .with(|items| items.iter().map(FormNode::value).collect())
    }

    fn error(&self) -> Option<Self::Error> {
        let items = self
            .items
            .with(|items| items.iter().map(FormNode::error).collect::<Vec<_>>());
        ListError::collapse(self.error.get(), present(items))
    }

    fn subscribe(&self, listener: Listener) -> Subscription {
        // Re-attached to the new items on every structural edit.
        let children = Rc::new(RefCell::new(
            self.items.with(|items| subscribe_all(items, &listener)),
        ));

        let weak_children = Rc::downgrade(&children);
        let on_items = Rc::clone(&listener);
        let items_sub = self.items.subscribe(move |items: &Vec<I>| {
            if let Some(children) = weak_children.upgrade() {
                *children.borrow_mut() = subscribe_all(items, &on_items);
            }
            on_items();
        });
        let error_sub = self.error.subscribe(move |_| listener());

        Subscription::merge([items_sub, error_sub, Subscription::holding(children)])
    }
}

impl<I, E> PartialEq for List<I, E>
where
    I: FormNode,
    E: Clone + PartialEq + 'static,
{
    fn eq(&self, other: &Self) -> bool {
        self.items.ptr_eq(&other.items)
    }
}

impl<I, E> Eq for List<I, E>
where
    I: FormNode,
    E: Clone + PartialEq + 'static,
{
}

impl<I: std::fmt::Debug, E: std::fmt::Debug> std::fmt::Debug for List<I, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("List")
            .field("items", &self.items)
            .field("error", &self.error)
            .finish()
    }
}
