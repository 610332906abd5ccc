use thiserror::Error;

/// Indicates that an `imports` entry in a symbol table could not be resolved against the
/// catalog and no substitute table could be synthesized for it. This is fatal for the stream
/// being decoded: symbol IDs in the unresolved range cannot be assigned any meaning.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("unresolvable symbol table import: {description}")]
pub struct UnresolvableImportError {
    description: String,
}

impl UnresolvableImportError {
    pub(crate) fn new<S: Into<String>>(description: S) -> Self {
        UnresolvableImportError {
            description: description.into(),
        }
    }
}
