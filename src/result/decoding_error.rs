use thiserror::Error;

/// Indicates that a read operation failed due to invalid input. Unlike
/// [`IncompleteError`](crate::result::incomplete::IncompleteError), this error means the bytes
/// that were read cannot be a legal encoding no matter what follows them.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("{description}")]
pub struct DecodingError {
    description: String,
}

impl DecodingError {
    pub(crate) fn new<S: Into<String>>(description: S) -> Self {
        DecodingError {
            description: description.into(),
        }
    }
}
