#![forbid(unsafe_code)]

//! Sweety form public facade crate.
//!
//! Re-exports the node model from [`sweety_form_core`] and the reactive
//! primitives from [`sweety_reactive`], and adds the input-side layer:
//!
//! - [`Watch`]: a node projection that only changes when the projection does.
//! - [`FormSession`]: a root node plus [`FormConfig`], with submit.
//! - [`FieldBinding`]: a field attached to a validator under the session's
//!   validation timing.
//!
//! Most applications only need the [`prelude`].

pub mod binding;
pub mod config;
pub mod session;
pub mod watch;

pub use binding::FieldBinding;
pub use config::{
    ConfigError, FormConfig, FormReValidateMode, FormValidateMode, REVALIDATE_MODE_ENV,
    VALIDATE_MODE_ENV, ValidationTrigger,
};
pub use session::{FormSession, Submission};
pub use watch::{Watch, watch_error, watch_error_with, watch_value, watch_value_with};

pub use sweety_form_core::{
    Field, FormError, FormNode, List, ListError, Listener, NoError, Shape, ShapeError,
    ShapeFields, Validator, always_valid, first_error, form_shape, no_error, validator,
};
pub use sweety_reactive::{BatchScope, Observable, Subscription, batch};

/// Everything needed to declare, bind and submit a form.
pub mod prelude {
    pub use crate::{
        FieldBinding, FormConfig, FormReValidateMode, FormSession, FormValidateMode, Submission,
        Watch, watch_error, watch_value,
    };
    pub use sweety_form_core::{
        Field, FormNode, List, ListError, Shape, ShapeError, ShapeFields, Validator, form_shape,
        validator,
    };
    pub use sweety_reactive::{Subscription, batch};
}
