#![forbid(unsafe_code)]

//! Leaf node: one value cell and one error cell.

use sweety_reactive::{Observable, Subscription};

use crate::node::{FormNode, Listener, NoError};

/// A single form value with its validation error.
///
/// The error cell distinguishes "no error recorded" (`None`) from an error
/// whose payload happens to be falsy, such as `Some(0)` or `Some(false)`.
///
/// ```
/// use sweety_form_core::{Field, FormNode};
///
/// let age: Field<u32, String> = Field::of(17);
/// age.set_error(Some("too young".to_string()));
/// age.update_value(|v| v + 1);
/// age.clear_error();
///
/// assert_eq!(age.value(), 18);
/// assert_eq!(age.error(), None);
/// ```
pub struct Field<V, E = NoError> {
    value: Observable<V>,
    error: Observable<Option<E>>,
}

impl<V, E> Clone for Field<V, E> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            error: self.error.clone(),
        }
    }
}

impl<V, E> Field<V, E>
where
    V: Clone + PartialEq + 'static,
    E: Clone + PartialEq + 'static,
{
    /// A field holding `value` and no error.
    pub fn of(value: V) -> Self {
        Self {
            value: Observable::new(value),
            error: Observable::new(None),
        }
    }

    /// A field holding `value` and `error`.
    pub fn with_error(value: V, error: E) -> Self {
        Self {
            value: Observable::new(value),
            error: Observable::new(Some(error)),
        }
    }

    pub fn set_value(&self, value: V) {
        self.value.set(value);
    }

    /// Replace the value with `transform(current)`.
    pub fn update_value(&self, transform: impl FnOnce(&V) -> V) {
        self.value.update(transform);
    }

    /// Replace the error; `None` clears it whatever it held before.
    pub fn set_error(&self, error: Option<E>) {
        self.error.set(error);
    }

    /// Replace the error with `transform(current)`, where `current` is `None`
    /// when no error is recorded.
    pub fn update_error(&self, transform: impl FnOnce(Option<&E>) -> Option<E>) {
        self.error.update(|current| transform(current.as_ref()));
    }

    pub fn clear_error(&self) {
        self.error.set(None);
    }

    #[must_use]
    pub fn has_error(&self) -> bool {
        self.error.with(Option::is_some)
    }

    /// Run `validate` against the current value and error and store its
    /// result as the new error.
    ///
    /// Returns `true` when the field ends up without an error.
    pub fn validate(&self, validate: impl FnOnce(&V, Option<&E>) -> Option<E>) -> bool {
        let value = self.value.get();
        let current = self.error.get();
        let next = validate(&value, current.as_ref());
        let valid = next.is_none();
        self.error.set(next);
        tracing::trace!(valid, "field validated");
        valid
    }

    /// Cell versions `(value, error)`, each bumped once per change.
    #[must_use]
    pub fn versions(&self) -> (u64, u64) {
        (self.value.version(), self.error.version())
    }
}

impl<V, E> FormNode for Field<V, E>
where
    V: Clone + PartialEq + 'static,
    E: Clone + PartialEq + 'static,
{
    type Value = V;
    type Error = E;

    fn value(&self) -> V {
        self.value.get()
    }

    fn error(&self) -> Option<E> {
        self.error.get()
    }

    /// # Panics
    ///
    /// Panics if `select` writes this field's value.
    fn value_with<R>(&self, select: impl FnOnce(&V) -> R) -> R {
        self.value.with(select)
    }

    /// # Panics
    ///
    /// Panics if `select` writes this field's error.
    fn error_with<R>(&self, select: impl FnOnce(Option<&E>) -> R) -> R {
        self.error.with(|error| select(error.as_ref()))
    }

    fn subscribe(&self, listener: Listener) -> Subscription {
        let on_value = listener.clone();
        Subscription::merge([
            self.value.subscribe(move |_| on_value()),
            self.error.subscribe(move |_| listener()),
        ])
    }
}

impl<V, E> PartialEq for Field<V, E>
where
    V: Clone + PartialEq + 'static,
    E: Clone + PartialEq + 'static,
{
    fn eq(&self, other: &Self) -> bool {
        self.value.ptr_eq(&other.value)
    }
}

impl<V, E> Eq for Field<V, E>
where
    V: Clone + PartialEq + 'static,
    E: Clone + PartialEq + 'static,
{
}

impl<V: std::fmt::Debug, E: std::fmt::Debug> std::fmt::Debug for Field<V, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Field")
            .field("value", &self.value)
            .field("error", &self.error)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    struct Foo {
        foo: String,
    }

    fn foo(s: &str) -> Foo {
        Foo { foo: s.to_string() }
    }

    #[test]
    fn returns_stored_value() {
        let field: Field<Foo> = Field::of(foo("bar"));
        assert_eq!(field.value(), foo("bar"));
    }

    #[test]
    fn returns_selected_value() {
        let field: Field<Foo> = Field::of(foo("bar"));
        assert_eq!(field.value_with(|x| x.clone()), foo("bar"));
        assert_eq!(field.value_with(|x| x.foo.clone()), "bar");
    }

    #[test]
    fn set_value_replaces() {
        let field: Field<Foo> = Field::of(foo("bar"));
        field.set_value(foo("baz"));
        assert_eq!(field.value(), foo("baz"));
    }

    #[test]
    fn update_value_receives_current() {
        let field: Field<i32> = Field::of(0);
        field.update_value(|x| x + 1);
        assert_eq!(field.value(), 1);
    }

    #[test]
    fn error_absent_by_default() {
        let field: Field<i32, String> = Field::of(0);
        assert_eq!(field.error(), None);
        assert!(!field.has_error());
    }

    #[test]
    fn returns_stored_error() {
        let field = Field::with_error((), foo("bar"));
        assert_eq!(field.error(), Some(foo("bar")));
        assert_eq!(field.error_with(|e| e.map(|e| e.foo.clone())), Some("bar".into()));
    }

    #[test]
    fn select_receives_absent_error() {
        let field: Field<String, Foo> = Field::of(String::new());
        assert!(field.error_with(|e| e.is_none()));
        assert_eq!(field.error_with(|e| e.map(|e| e.foo.clone())), None);
    }

    #[test]
    fn set_error_replaces_and_clears() {
        let field = Field::with_error((), foo("bar"));
        field.set_error(Some(foo("baz")));
        assert_eq!(field.error(), Some(foo("baz")));
        field.set_error(None);
        assert_eq!(field.error(), None);
    }

    #[test]
    fn update_error_receives_current() {
        let field = Field::with_error((), 0);
        field.update_error(|x| Some(x.copied().unwrap_or(-1) + 1));
        assert_eq!(field.error(), Some(1));
    }

    #[test]
    fn update_error_receives_none_when_absent() {
        let field: Field<String, i32> = Field::of(String::new());
        field.update_error(|x| Some(x.copied().unwrap_or(-1) + 1));
        assert_eq!(field.error(), Some(0));
    }

    #[test]
    fn falsy_error_is_still_an_error() {
        let zero = Field::with_error("", 0);
        let no = Field::with_error("", false);
        assert_eq!(zero.error(), Some(0));
        assert_eq!(no.error(), Some(false));
        assert!(zero.has_error());
    }

    #[test]
    fn validate_stores_result() {
        let field: Field<String, String> = Field::of("ab".into());
        let min3 = |v: &String, _: Option<&String>| (v.len() < 3).then(|| "short".to_string());

        assert!(!field.validate(min3));
        assert_eq!(field.error(), Some("short".into()));

        field.set_value("abc".into());
        assert!(field.validate(min3));
        assert_eq!(field.error(), None);
    }

    #[test]
    fn validate_sees_previous_error() {
        let field = Field::with_error(1, "old");
        field.validate(|_, prev| {
            assert_eq!(prev, Some(&"old"));
            None
        });
        assert_eq!(field.error(), None);
    }

    #[test]
    fn clones_share_cells() {
        let a: Field<i32, String> = Field::of(1);
        let b = a.clone();
        b.set_value(2);
        b.set_error(Some("e".into()));
        assert_eq!(a.value(), 2);
        assert_eq!(a.error(), Some("e".into()));
        assert_eq!(a, b);
        assert_ne!(a, Field::of(2));
    }

    #[test]
    #[should_panic]
    fn writing_value_inside_value_with_panics() {
        let field: Field<i32, String> = Field::of(1);
        field.value_with(|v| field.set_value(v + 1));
    }

    #[test]
    fn writing_error_inside_value_with_is_fine() {
        let field: Field<i32, String> = Field::of(1);
        field.value_with(|v| field.set_error(Some(v.to_string())));
        assert_eq!(field.error(), Some("1".into()));
    }

    #[test]
    fn subscribe_fires_on_value_and_error() {
        let field: Field<i32, String> = Field::of(1);
        let hits = Rc::new(Cell::new(0));
        let hits_in_cb = Rc::clone(&hits);
        let _sub = field.subscribe(Rc::new(move || hits_in_cb.set(hits_in_cb.get() + 1)));

        field.set_value(2);
        field.set_error(Some("e".into()));
        field.set_value(2);
        assert_eq!(hits.get(), 2);
        assert_eq!(field.versions(), (1, 1));
    }
}
