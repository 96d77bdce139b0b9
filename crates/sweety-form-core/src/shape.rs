#![forbid(unsafe_code)]

//! Fixed-key composition of named child nodes.
//!
//! # Design
//!
//! A [`Shape`] owns a field set `F` and one shape-level error cell. The field
//! set is anything implementing [`ShapeFields`]:
//!
//! - a struct declared with [`form_shape!`](crate::form_shape), which also
//!   declares the matching value and per-field error structs, so aggregate
//!   types follow the child types to any depth;
//! - a `BTreeMap<K, N>` of homogeneous nodes, for key sets only known at
//!   runtime.
//!
//! The key set is fixed once the shape is built. Children are reached through
//! [`Shape::fields`] and mutated through their own handles; the shape never
//! proxies child writes.
//!
//! # Invariants
//!
//! 1. `value()` is rebuilt from the children on every call.
//! 2. `error()` is `None` iff the shape error and every field error are absent.
//! 3. `error().fields` is `None` iff every field error is absent, even when the
//!    shape error is set.
//! 4. Shape-level error writes never touch field errors.

use std::collections::BTreeMap;
use std::rc::Rc;

use sweety_reactive::{Observable, Subscription};

use crate::node::{FormNode, Listener, NoError, collapse};

/// A set of named child nodes that a [`Shape`] can aggregate.
pub trait ShapeFields: 'static {
    /// One value per field.
    type Value;
    /// One `Option<error>` per field.
    type Errors;

    fn value(&self) -> Self::Value;

    /// Every field's error, or `None` when no field has one.
    fn errors(&self) -> Option<Self::Errors>;

    /// Attach `listener` to every field.
    fn subscribe(&self, listener: &Listener) -> Subscription;
}

/// Aggregate error of a [`Shape`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShapeError<F, E = NoError> {
    /// The shape's own error.
    pub shape: Option<E>,
    /// Per-field errors, `None` when no field has one.
    pub fields: Option<F>,
}

impl<F, E> ShapeError<F, E> {
    fn collapse(shape: Option<E>, fields: Option<F>) -> Option<Self> {
        collapse(shape, fields).map(|(shape, fields)| Self { shape, fields })
    }
}

/// A fixed set of named fields plus a shape-level error.
///
/// ```
/// use sweety_form_core::{Field, FormNode, Shape, ShapeError, form_shape};
///
/// form_shape! {
///     pub struct Login {
///         pub email: Field<String, String>,
///         pub password: Field<String, String>,
///     }
///     value LoginValue;
///     errors LoginErrors;
/// }
///
/// let form: Shape<Login, String> = Shape::of(Login {
///     email: Field::of("me@example.com".to_string()),
///     password: Field::of(String::new()),
/// });
/// assert_eq!(form.error(), None);
///
/// form.fields().password.set_error(Some("required".to_string()));
/// assert_eq!(
///     form.error(),
///     Some(ShapeError {
///         shape: None,
///         fields: Some(LoginErrors {
///             email: None,
///             password: Some("required".to_string()),
///         }),
///     })
/// );
/// ```
pub struct Shape<F, E = NoError> {
    fields: Rc<F>,
    error: Observable<Option<E>>,
}

impl<F, E> Clone for Shape<F, E> {
    fn clone(&self) -> Self {
        Self {
            fields: Rc::clone(&self.fields),
            error: self.error.clone(),
        }
    }
}

impl<F, E> Shape<F, E>
where
    F: ShapeFields,
    E: Clone + PartialEq + 'static,
{
    pub fn of(fields: F) -> Self {
        Self {
            fields: Rc::new(fields),
            error: Observable::new(None),
        }
    }

    pub fn with_error(fields: F, error: E) -> Self {
        Self {
            fields: Rc::new(fields),
            error: Observable::new(Some(error)),
        }
    }

    /// The child nodes. Mutate a child through its own handle.
    #[must_use]
    pub fn fields(&self) -> &F {
        &self.fields
    }

    /// The shape's own error, ignoring the fields.
    #[must_use]
    pub fn shape_error(&self) -> Option<E> {
        self.error.get()
    }

    pub fn set_shape_error(&self, error: Option<E>) {
        self.error.set(error);
    }

    pub fn update_shape_error(&self, transform: impl FnOnce(Option<&E>) -> Option<E>) {
        self.error.update(|current| transform(current.as_ref()));
    }
}

impl<F, E> FormNode for Shape<F, E>
where
    F: ShapeFields,
    E: Clone + PartialEq + 'static,
{
    type Value = F::Value;
    type Error = ShapeError<F::Errors, E>;

    fn value(&self) -> F::Value {
        self.fields.value()
    }

    fn error(&self) -> Option<Self::Error> {
        let fields = self.fields.errors();
        ShapeError::collapse(self.error.get(), fields)
    }

    fn subscribe(&self, listener: Listener) -> Subscription {
        let mut subscription = self.fields.subscribe(&listener);
        subscription.push(self.error.subscribe(move |_| listener()));
        subscription
    }
}

impl<F, E> PartialEq for Shape<F, E>
where
    E: Clone + PartialEq + 'static,
{
    fn eq(&self, other: &Self) -> bool {
        self.error.ptr_eq(&other.error)
    }
}

impl<F, E> Eq for Shape<F, E> where E: Clone + PartialEq + 'static {}

impl<F: std::fmt::Debug, E: std::fmt::Debug> std::fmt::Debug for Shape<F, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shape")
            .field("fields", &self.fields)
            .field("error", &self.error)
            .finish()
    }
}

impl<K, N> ShapeFields for BTreeMap<K, N>
where
    K: Ord + Clone + 'static,
    N: FormNode,
{
    type Value = BTreeMap<K, N::Value>;
    type Errors = BTreeMap<K, Option<N::Error>>;

    fn value(&self) -> Self::Value {
        self.iter()
            .map(|(key, node)| (key.clone(), node.value()))
            .collect()
    }

    fn errors(&self) -> Option<Self::Errors> {
        let errors: Self::Errors = self
            .iter()
            .map(|(key, node)| (key.clone(), node.error()))
            .collect();
        errors.values().any(Option::is_some).then_some(errors)
    }

    fn subscribe(&self, listener: &Listener) -> Subscription {
        Subscription::merge(self.values().map(|node| node.subscribe(Rc::clone(listener))))
    }
}

/// Declare a struct of form nodes usable as a [`Shape`]'s field set.
///
/// Alongside the struct this declares a value struct holding each field's
/// `Value` and an errors struct holding each field's `Option<Error>`, then
/// implements [`ShapeFields`] for the struct. A struct with no fields is
/// allowed; its errors are always `None`. The generated struct derives
/// `Clone` and `PartialEq`; the value and errors structs derive `Debug`,
/// `Clone` and `PartialEq`.
///
/// ```
/// use sweety_form_core::{Field, FormNode, List, Shape, form_shape};
///
/// form_shape! {
///     pub struct Order {
///         pub customer: Field<String>,
///         pub quantities: List<Field<u32, String>>,
///     }
///     value OrderValue;
///     errors OrderErrors;
/// }
///
/// let order: Shape<Order> = Shape::of(Order {
///     customer: Field::of("Ada".to_string()),
///     quantities: List::of([Field::of(1), Field::of(2)]),
/// });
/// assert_eq!(
///     order.value(),
///     OrderValue { customer: "Ada".to_string(), quantities: vec![1, 2] }
/// );
/// ```
#[macro_export]
macro_rules! form_shape {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_vis:vis $field:ident : $node:ty
            ),* $(,)?
        }
        value $value:ident;
        errors $errors:ident;
    ) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq)]
        $vis struct $name {
            $(
                $(#[$field_meta])*
                $field_vis $field: $node,
            )*
        }

        #[doc = concat!("Aggregate value of [`", stringify!($name), "`].")]
        #[derive(Debug, Clone, PartialEq)]
        $vis struct $value {
            $( pub $field: <$node as $crate::FormNode>::Value, )*
        }

        #[doc = concat!("Per-field errors of [`", stringify!($name), "`].")]
        #[derive(Debug, Clone, PartialEq)]
        $vis struct $errors {
            $( pub $field: ::core::option::Option<<$node as $crate::FormNode>::Error>, )*
        }

        impl $crate::ShapeFields for $name {
            type Value = $value;
            type Errors = $errors;

            fn value(&self) -> $value {
                $value {
                    $( $field: $crate::FormNode::value(&self.$field), )*
                }
            }

            fn errors(&self) -> ::core::option::Option<$errors> {
                let errors = $errors {
                    $( $field: $crate::FormNode::error(&self.$field), )*
                };
                if false $( || errors.$field.is_some() )* {
                    ::core::option::Option::Some(errors)
                } else {
                    ::core::option::Option::None
                }
            }

            #[allow(unused_variables)]
            fn subscribe(&self, listener: &$crate::Listener) -> $crate::Subscription {
                $crate::Subscription::merge([
                    $( $crate::FormNode::subscribe(&self.$field, ::std::rc::Rc::clone(listener)), )*
                ])
            }
        }
    };
}
