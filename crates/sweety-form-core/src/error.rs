#![forbid(unsafe_code)]

//! Errors raised by structural edits.
//!
//! These are usage errors of the form tree itself. Validation errors carried
//! by nodes are the caller's own `E` payloads and never pass through here.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FormError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("item index {index} out of bounds for list of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },
}

impl FormError {
    #[must_use]
    pub fn out_of_bounds(index: usize, len: usize) -> Self {
        Self::IndexOutOfBounds { index, len }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_index_and_len() {
        let err = FormError::out_of_bounds(4, 2);
        assert_eq!(
            err.to_string(),
            "item index 4 out of bounds for list of length 2"
        );
    }
}
