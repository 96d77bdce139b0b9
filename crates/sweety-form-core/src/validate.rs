#![forbid(unsafe_code)]

//! Caller-supplied validators.
//!
//! A validator maps a value, together with the error currently recorded for
//! it, to the next error. The core never decides what is valid; it only
//! stores what validators return.

use std::rc::Rc;

/// Shared validator: `(value, current error) -> next error`.
pub type Validator<V, E> = Rc<dyn Fn(&V, Option<&E>) -> Option<E>>;

/// Wrap a closure as a [`Validator`].
pub fn validator<V, E>(validate: impl Fn(&V, Option<&E>) -> Option<E> + 'static) -> Validator<V, E> {
    Rc::new(validate)
}

/// Validator that never reports an error.
pub fn no_error<V, E>(_value: &V, _current: Option<&E>) -> Option<E> {
    None
}

/// A [`Validator`] wrapping [`no_error`].
pub fn always_valid<V: 'static, E: 'static>() -> Validator<V, E> {
    Rc::new(no_error::<V, E>)
}

/// Run `validators` in order and keep the first error reported.
pub fn first_error<V: 'static, E: 'static>(
    validators: impl IntoIterator<Item = Validator<V, E>>,
) -> Validator<V, E> {
    let validators: Vec<Validator<V, E>> = validators.into_iter().collect();
    Rc::new(move |value: &V, current: Option<&E>| {
        validators
            .iter()
            .find_map(|validate| validate(value, current))
    })
}
