#![forbid(unsafe_code)]

//! A field attached to a validator and a session's validation timing.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use sweety_form_core::{Field, FormNode, Validator};
use sweety_reactive::batch;

use crate::config::{FormConfig, ValidationTrigger};
use crate::session::SessionState;

/// Input-side handle on a [`Field`].
///
/// Writes through the binding validate according to the session's
/// [`FormConfig`]. A value write and the validation it triggers land in one
/// batch, so observers never see the new value paired with a stale error.
///
/// Dropping the binding detaches its validator from the session; the field
/// itself keeps its value and error.
pub struct FieldBinding<V, E> {
    field: Field<V, E>,
    validator: Rc<RefCell<Validator<V, E>>>,
    touched: Cell<bool>,
    config: FormConfig,
    session: Rc<SessionState>,
    _registration: Rc<dyn Fn()>,
}

fn run<V, E>(field: &Field<V, E>, validator: &RefCell<Validator<V, E>>) -> bool
where
    V: Clone + PartialEq + 'static,
    E: Clone + PartialEq + 'static,
{
    let validate = Rc::clone(&validator.borrow());
    field.validate(|value, current| validate(value, current))
}

impl<V, E> FieldBinding<V, E>
where
    V: Clone + PartialEq + 'static,
    E: Clone + PartialEq + 'static,
{
    pub(crate) fn new(
        field: Field<V, E>,
        validate: Validator<V, E>,
        config: FormConfig,
        session: Rc<SessionState>,
    ) -> Self {
        let validator = Rc::new(RefCell::new(validate));
        let registration: Rc<dyn Fn()> = {
            let field = field.clone();
            let validator = Rc::clone(&validator);
            Rc::new(move || {
                run(&field, &validator);
            })
        };
        session.register(Rc::downgrade(&registration));

        let binding = Self {
            field,
            validator,
            touched: Cell::new(false),
            config,
            session,
            _registration: registration,
        };
        if binding.should_validate(ValidationTrigger::Bind) {
            binding.validate();
        }
        binding
    }

    /// The bound field.
    #[must_use]
    pub fn field(&self) -> &Field<V, E> {
        &self.field
    }

    #[must_use]
    pub fn value(&self) -> V {
        self.field.value()
    }

    #[must_use]
    pub fn error(&self) -> Option<E> {
        self.field.error()
    }

    /// Write a new value, validating if the config asks for it on change.
    pub fn set_value(&self, value: V) {
        batch(|| {
            self.field.set_value(value);
            self.on(ValidationTrigger::Change);
        });
    }

    pub fn update_value(&self, transform: impl FnOnce(&V) -> V) {
        batch(|| {
            self.field.update_value(transform);
            self.on(ValidationTrigger::Change);
        });
    }

    /// Mark the field touched, validating if the config asks for it on blur.
    pub fn blur(&self) {
        self.touched.set(true);
        self.on(ValidationTrigger::Blur);
    }

    #[must_use]
    pub fn is_touched(&self) -> bool {
        self.touched.get()
    }

    /// Validate now, regardless of config. Returns `true` when valid.
    pub fn validate(&self) -> bool {
        run(&self.field, &self.validator)
    }

    /// Swap the validator and re-validate with it.
    ///
    /// The new validator sees the error left by the old one as `current`.
    pub fn set_validator(&self, validate: Validator<V, E>) {
        *self.validator.borrow_mut() = validate;
        self.validate();
    }

    fn should_validate(&self, trigger: ValidationTrigger) -> bool {
        self.config
            .should_validate(trigger, self.session.submitted(), self.touched.get())
    }

    fn on(&self, trigger: ValidationTrigger) {
        if self.should_validate(trigger) {
            let valid = self.validate();
            tracing::debug!(?trigger, valid, "binding validated");
        }
    }
}

impl<V: std::fmt::Debug, E: std::fmt::Debug> std::fmt::Debug for FieldBinding<V, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldBinding")
            .field("field", &self.field)
            .field("touched", &self.touched.get())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{FormConfig, FormReValidateMode, FormValidateMode};
    use crate::session::FormSession;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;
    use sweety_form_core::{Field, FormNode, Validator, validator};

    fn min_len(n: usize) -> Validator<String, String> {
        validator(move |v: &String, _| (v.len() < n).then(|| format!("min {n}")))
    }

    fn session(mode: FormValidateMode) -> (Field<String, String>, FormSession<Field<String, String>>) {
        let field: Field<String, String> = Field::of("ab".to_string());
        let session = FormSession::new(field.clone(), FormConfig::new().with_validate_mode(mode));
        (field, session)
    }

    #[test]
    fn on_change_validates_at_bind_and_on_write() {
        let (field, session) = session(FormValidateMode::OnChange);
        let binding = session.bind(&field, min_len(3));
        assert_eq!(binding.error(), Some("min 3".to_string()));

        binding.set_value("abc".to_string());
        assert_eq!(field.error(), None);
    }

    #[test]
    fn on_blur_waits_for_blur() {
        let (field, session) = session(FormValidateMode::OnBlur);
        let binding = session.bind(&field, min_len(3));
        binding.set_value("a".to_string());
        assert_eq!(binding.error(), None);

        binding.blur();
        assert!(binding.is_touched());
        assert_eq!(binding.error(), Some("min 3".to_string()));
    }

    #[test]
    fn on_touched_validates_changes_after_first_blur() {
        let (field, session) = session(FormValidateMode::OnTouched);
        let binding = session.bind(&field, min_len(3));
        binding.set_value("a".to_string());
        assert_eq!(binding.error(), None);

        binding.blur();
        binding.set_value("abcd".to_string());
        assert_eq!(binding.error(), None);
        binding.update_value(|v| v[..1].to_string());
        assert_eq!(binding.error(), Some("min 3".to_string()));
    }

    #[test]
    fn revalidate_mode_after_submit() {
        let field: Field<String, String> = Field::of("ab".to_string());
        let config = FormConfig::new()
            .with_validate_mode(FormValidateMode::OnSubmit)
            .with_revalidate_mode(FormReValidateMode::OnChange);
        let session = FormSession::new(field.clone(), config);
        let binding = session.bind(&field, min_len(3));

        binding.set_value("a".to_string());
        assert_eq!(binding.error(), None);

        session.submit();
        assert_eq!(binding.error(), Some("min 3".to_string()));

        binding.set_value("abc".to_string());
        assert_eq!(binding.error(), None);
    }

    #[test]
    fn observers_never_see_value_with_stale_error() {
        let (field, session) = session(FormValidateMode::OnChange);
        let binding = session.bind(&field, min_len(3));

        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_in_cb = Rc::clone(&seen);
        let observed = field.clone();
        let _sub = field.subscribe(Rc::new(move || {
            seen_in_cb.borrow_mut().push((observed.value(), observed.error()));
        }));

        binding.set_value("abc".to_string());
        let seen = seen.borrow();
        assert!(!seen.is_empty());
        assert!(seen.iter().all(|pair| *pair == ("abc".to_string(), None)));
    }

    #[test]
    fn set_validator_revalidates_with_previous_error() {
        let (field, session) = session(FormValidateMode::OnChange);
        let binding = session.bind(&field, min_len(3));

        let seen = Rc::new(Cell::new(false));
        let seen_in_fn = Rc::clone(&seen);
        binding.set_validator(validator(move |v: &String, current: Option<&String>| {
            seen_in_fn.set(v == "ab" && current == Some(&"min 3".to_string()));
            None
        }));
        assert!(seen.get());
        assert_eq!(field.error(), None);
    }
}
