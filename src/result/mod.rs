use std::convert::From;
use std::{fmt, io};

use thiserror::Error;

use crate::result::decoding_error::DecodingError;
use crate::result::encoding_error::EncodingError;
use crate::result::illegal_operation::IllegalOperation;
use crate::result::import_error::UnresolvableImportError;
use crate::result::incomplete::IncompleteError;
use crate::result::io_error::IoError;

pub mod decoding_error;
pub mod encoding_error;
pub mod illegal_operation;
pub mod import_error;
pub mod incomplete;
pub mod io_error;

/// A unified Result type representing the outcome of method calls that may fail.
pub type IonResult<T> = Result<T, IonError>;

/// Represents the different types of high-level failures that might occur when reading or writing
/// Ion data.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum IonError {
    /// Indicates that an IO error was encountered while reading or writing.
    #[error("{0}")]
    Io(#[from] IoError),

    /// Indicates that the input ended in the middle of a value, header, or encoding primitive.
    /// This is a distinct condition from a clean end of stream, which readers report as `None`.
    #[error("{0}")]
    Incomplete(#[from] IncompleteError),

    /// Indicates that the writer encountered a problem while serializing a given piece of data,
    /// including being asked to emit a symbol ID that is not defined in the active symbol table.
    #[error("{0}")]
    Encoding(#[from] EncodingError),

    /// Indicates that the data stream being read contained illegal or otherwise unreadable data.
    #[error("{0}")]
    Decoding(#[from] DecodingError),

    /// Indicates that a symbol table import declaration could not be resolved against the catalog,
    /// not even by synthesizing a substitute table.
    #[error("{0}")]
    UnresolvableImport(#[from] UnresolvableImportError),

    /// Returned when the user has performed an operation that is not legal in the current state
    /// (for example: calling `step_out()` at the top level).
    #[error("{0}")]
    IllegalOperation(#[from] IllegalOperation),
}

impl From<io::Error> for IonError {
    fn from(io_error: io::Error) -> Self {
        IoError::from(io_error).into()
    }
}

impl From<fmt::Error> for IonError {
    fn from(error: fmt::Error) -> Self {
        EncodingError::new(error.to_string()).into()
    }
}

pub(crate) fn incomplete<T>(label: &'static str) -> IonResult<T> {
    Err(incomplete_error(label))
}

pub(crate) fn incomplete_error(label: &'static str) -> IonError {
    IncompleteError::new(label).into()
}

/// A convenience method for creating an IonResult containing an IonError::Decoding with the
/// provided description text.
pub fn decoding_error<T, S: Into<String>>(description: S) -> IonResult<T> {
    Err(decoding_error_raw(description))
}

/// A convenience method for creating an IonError::Decoding with the provided description
/// text. Useful for calling Option#ok_or_else.
#[inline(never)]
pub(crate) fn decoding_error_raw<S: Into<String>>(description: S) -> IonError {
    DecodingError::new(description).into()
}

/// A convenience method for creating an IonResult containing an IonError::Encoding with the
/// provided description text.
pub fn encoding_error<T, S: Into<String>>(description: S) -> IonResult<T> {
    Err(encoding_error_raw(description))
}

#[inline(never)]
pub(crate) fn encoding_error_raw<S: Into<String>>(description: S) -> IonError {
    EncodingError::new(description).into()
}

/// A convenience method for creating an IonResult containing an IonError::UnresolvableImport
/// with the provided description text.
pub fn unresolvable_import<T, S: Into<String>>(description: S) -> IonResult<T> {
    Err(UnresolvableImportError::new(description).into())
}

/// A convenience method for creating an IonResult containing an IonError::IllegalOperation with
/// the provided operation text.
pub fn illegal_operation<T, S: Into<String>>(operation: S) -> IonResult<T> {
    Err(illegal_operation_raw(operation))
}

/// A convenience method for creating an IonError::IllegalOperation with the provided operation
/// text. Useful for calling Option#ok_or_else.
#[inline(never)]
pub(crate) fn illegal_operation_raw<S: Into<String>>(operation: S) -> IonError {
    IllegalOperation::new(operation).into()
}
