use thiserror::Error;

/// Indicates that the user has performed an operation that is not legal in the current state,
/// such as stepping out of a container while the cursor is at the top level or interning a new
/// symbol into a sealed symbol table.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("the user has performed an operation that is not legal in the current state: {operation}")]
pub struct IllegalOperation {
    operation: String,
}

impl IllegalOperation {
    pub(crate) fn new<S: Into<String>>(operation: S) -> Self {
        IllegalOperation {
            operation: operation.into(),
        }
    }
}
