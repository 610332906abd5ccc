use thiserror::Error;

/// Indicates that a write operation failed before any bytes were committed to the output.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("{description}")]
pub struct EncodingError {
    description: String,
}

impl EncodingError {
    pub(crate) fn new<S: Into<String>>(description: S) -> Self {
        EncodingError {
            description: description.into(),
        }
    }
}
