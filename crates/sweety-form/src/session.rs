#![forbid(unsafe_code)]

//! Form sessions: one form tree, its validation config, and submit.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use sweety_form_core::{Field, FormNode, Validator};
use sweety_reactive::{Observable, batch};

use crate::binding::FieldBinding;
use crate::config::FormConfig;
use crate::watch::{Watch, watch_error, watch_value};

/// Aggregate value and error captured at submit time.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission<V, E> {
    pub value: V,
    pub error: Option<E>,
}

impl<V, E> Submission<V, E> {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }
}

/// State shared between a session and the bindings it hands out.
pub(crate) struct SessionState {
    submit_count: Observable<u32>,
    validators: RefCell<Vec<Weak<dyn Fn()>>>,
}

impl SessionState {
    fn new() -> Self {
        Self {
            submit_count: Observable::new(0),
            validators: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn submitted(&self) -> bool {
        self.submit_count.get() > 0
    }

    pub(crate) fn register(&self, validate: Weak<dyn Fn()>) {
        let mut validators = self.validators.borrow_mut();
        validators.retain(|v| v.strong_count() > 0);
        validators.push(validate);
    }

    /// Run every live binding's validator; returns how many ran.
    fn validate_all(&self) -> usize {
        let live: Vec<Rc<dyn Fn()>> = {
            let mut validators = self.validators.borrow_mut();
            validators.retain(|v| v.strong_count() > 0);
            validators.iter().filter_map(Weak::upgrade).collect()
        };
        for validate in &live {
            validate();
        }
        live.len()
    }
}

/// A form tree with its validation timing.
///
/// The session owns the root node handle. Fields are attached to validators
/// with [`bind`](Self::bind); the resulting [`FieldBinding`]s validate
/// according to the session's [`FormConfig`] and are all validated again by
/// [`submit`](Self::submit).
///
/// ```
/// use sweety_form::prelude::*;
///
/// let email: Field<String, String> = Field::of("foo".to_string());
/// let session = FormSession::new(email.clone(), FormConfig::default());
/// let binding = session.bind(
///     &email,
///     validator(|v: &String, _| (!v.contains('@')).then(|| "Invalid email".to_string())),
/// );
///
/// assert_eq!(binding.error(), Some("Invalid email".to_string()));
/// binding.set_value("foo@bar.baz".to_string());
/// assert!(session.submit().is_valid());
/// ```
pub struct FormSession<N> {
    form: N,
    config: FormConfig,
    state: Rc<SessionState>,
}

impl<N: FormNode> FormSession<N> {
    pub fn new(form: N, config: FormConfig) -> Self {
        Self {
            form,
            config,
            state: Rc::new(SessionState::new()),
        }
    }

    /// Build the form tree with `init` and start a session over it.
    pub fn init(init: impl FnOnce() -> N, config: FormConfig) -> Self {
        Self::new(init(), config)
    }

    /// The root node.
    #[must_use]
    pub fn form(&self) -> &N {
        &self.form
    }

    #[must_use]
    pub fn config(&self) -> FormConfig {
        self.config
    }

    /// Number of completed submits.
    #[must_use]
    pub fn submit_count(&self) -> u32 {
        self.state.submit_count.get()
    }

    #[must_use]
    pub fn is_submitted(&self) -> bool {
        self.state.submitted()
    }

    /// Attach `validate` to `field` under this session's config.
    ///
    /// The field need not be part of [`form`](Self::form); binding a field
    /// that is not reachable from the root still validates it, but its error
    /// will not appear in submissions.
    pub fn bind<V, E>(&self, field: &Field<V, E>, validate: Validator<V, E>) -> FieldBinding<V, E>
    where
        V: Clone + PartialEq + 'static,
        E: Clone + PartialEq + 'static,
    {
        FieldBinding::new(field.clone(), validate, self.config, Rc::clone(&self.state))
    }

    /// Validate every live binding, count the submit, and capture the form.
    ///
    /// Validation runs in one batch, so observers see the whole result once.
    pub fn submit(&self) -> Submission<N::Value, N::Error> {
        let validated = batch(|| {
            let validated = self.state.validate_all();
            self.state.submit_count.update(|count| count.saturating_add(1));
            validated
        });
        let submission = Submission {
            value: self.form.value(),
            error: self.form.error(),
        };
        tracing::debug!(
            submit_count = self.submit_count(),
            validated,
            valid = submission.is_valid(),
            "form submitted"
        );
        submission
    }

    /// [`submit`](Self::submit), then hand the submission to `on_submit`.
    pub fn submit_with<R>(&self, on_submit: impl FnOnce(&Submission<N::Value, N::Error>) -> R) -> R {
        let submission = self.submit();
        on_submit(&submission)
    }

    /// Watch the root's aggregate value.
    pub fn watch_value(&self) -> Watch<N::Value>
    where
        N::Value: Clone + PartialEq,
    {
        watch_value(&self.form)
    }

    /// Watch the root's aggregate error.
    pub fn watch_error(&self) -> Watch<Option<N::Error>>
    where
        N::Error: Clone + PartialEq,
    {
        watch_error(&self.form)
    }
}

impl<N: std::fmt::Debug> std::fmt::Debug for FormSession<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormSession")
            .field("form", &self.form)
            .field("config", &self.config)
            .field("submit_count", &self.state.submit_count.get())
            .finish()
    }
}
