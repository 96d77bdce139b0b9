#![forbid(unsafe_code)]

//! Validation timing configuration.
//!
//! A [`FormConfig`] is handed to a [`FormSession`](crate::FormSession) when it
//! is built and copied into every binding it creates. There is no global
//! default beyond [`FormConfig::default`].

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Environment variable read by [`FormConfig::from_env`] for the validate mode.
pub const VALIDATE_MODE_ENV: &str = "SWEETY_FORM_VALIDATE_MODE";
/// Environment variable read by [`FormConfig::from_env`] for the re-validate mode.
pub const REVALIDATE_MODE_ENV: &str = "SWEETY_FORM_REVALIDATE_MODE";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("unknown validate mode: {value}")]
    UnknownValidateMode { value: String },

    #[error("unknown re-validate mode: {value}")]
    UnknownReValidateMode { value: String },
}

/// When a bound field validates before the form has been submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FormValidateMode {
    /// On bind and on every value change.
    #[default]
    OnChange,
    /// On blur.
    OnBlur,
    /// Only when the form is submitted.
    OnSubmit,
    /// On the first blur, then on every change.
    OnTouched,
    /// On bind, on change and on blur.
    All,
}

/// When a bound field validates once the form has been submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FormReValidateMode {
    #[default]
    OnChange,
    OnBlur,
    OnSubmit,
}

/// What caused a binding to consider validating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationTrigger {
    /// The binding was just created.
    Bind,
    /// The value was written through the binding.
    Change,
    /// The input lost focus.
    Blur,
    /// The form was submitted.
    Submit,
}

fn normalize(value: &str) -> String {
    value
        .chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

impl FormValidateMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OnChange => "onChange",
            Self::OnBlur => "onBlur",
            Self::OnSubmit => "onSubmit",
            Self::OnTouched => "onTouched",
            Self::All => "all",
        }
    }
}

impl FromStr for FormValidateMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "onchange" => Ok(Self::OnChange),
            "onblur" => Ok(Self::OnBlur),
            "onsubmit" => Ok(Self::OnSubmit),
            "ontouched" => Ok(Self::OnTouched),
            "all" => Ok(Self::All),
            _ => Err(ConfigError::UnknownValidateMode {
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for FormValidateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FormReValidateMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OnChange => "onChange",
            Self::OnBlur => "onBlur",
            Self::OnSubmit => "onSubmit",
        }
    }
}

impl FromStr for FormReValidateMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "onchange" => Ok(Self::OnChange),
            "onblur" => Ok(Self::OnBlur),
            "onsubmit" => Ok(Self::OnSubmit),
            _ => Err(ConfigError::UnknownReValidateMode {
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for FormReValidateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation timing for a form session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FormConfig {
    /// Timing before the first submit.
    pub validate_mode: FormValidateMode,
    /// Timing after the first submit.
    pub revalidate_mode: FormReValidateMode,
}

impl FormConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_validate_mode(mut self, mode: FormValidateMode) -> Self {
        self.validate_mode = mode;
        self
    }

    #[must_use]
    pub fn with_revalidate_mode(mut self, mode: FormReValidateMode) -> Self {
        self.revalidate_mode = mode;
        self
    }

    /// Build from [`VALIDATE_MODE_ENV`] and [`REVALIDATE_MODE_ENV`], falling
    /// back to the defaults for unset variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to an unknown mode.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to an unknown mode.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(mode) = lookup(VALIDATE_MODE_ENV) {
            config.validate_mode = mode.parse()?;
        }
        if let Some(mode) = lookup(REVALIDATE_MODE_ENV) {
            config.revalidate_mode = mode.parse()?;
        }
        Ok(config)
    }

    /// Whether a binding should validate on `trigger`.
    ///
    /// `submitted` selects between the validate and re-validate modes;
    /// `touched` is whether the field has been blurred at least once.
    #[must_use]
    pub fn should_validate(&self, trigger: ValidationTrigger, submitted: bool, touched: bool) -> bool {
        use ValidationTrigger::{Bind, Blur, Change, Submit};

        match trigger {
            Submit => true,
            Bind => matches!(self.validate_mode, FormValidateMode::OnChange | FormValidateMode::All),
            Change | Blur if submitted => matches!(
                (self.revalidate_mode, trigger),
                (FormReValidateMode::OnChange, Change) | (FormReValidateMode::OnBlur, Blur)
            ),
            Change | Blur => match self.validate_mode {
                FormValidateMode::OnChange => trigger == Change,
                FormValidateMode::OnBlur => trigger == Blur,
                FormValidateMode::OnSubmit => false,
                FormValidateMode::OnTouched => trigger == Blur || touched,
                FormValidateMode::All => true,
            },
        }
    }
}
