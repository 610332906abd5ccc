use thiserror::Error;

/// Indicates that the input ran out of data in the middle of the labeled read operation.
///
/// This error is never used to represent a clean end of stream; readers communicate that by
/// returning `None` from `next()` instead.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("ran out of input while reading {label}")]
pub struct IncompleteError {
    label: &'static str,
}

impl IncompleteError {
    pub(crate) fn new(label: &'static str) -> Self {
        IncompleteError { label }
    }

    /// A short description of the read operation that was interrupted.
    pub fn label(&self) -> &'static str {
        self.label
    }
}
