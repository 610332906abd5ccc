use std::io;
use std::sync::Arc;

use thiserror::Error;

/// Wraps an [`io::Error`] raised by the underlying data source or sink.
// io::Error does not implement Clone or PartialEq. Storing it behind an Arc restores Clone, and
// comparing ErrorKinds offers a weak-but-useful definition of equality that lets IonResult
// values appear on either side of an assert_eq!().
#[derive(Clone, Debug, Error)]
#[error("{source:?}")]
pub struct IoError {
    source: Arc<io::Error>,
}

impl IoError {
    pub fn source(&self) -> &io::Error {
        &self.source
    }
}

impl PartialEq for IoError {
    fn eq(&self, other: &Self) -> bool {
        self.source.kind() == other.source.kind()
    }
}

impl From<io::Error> for IoError {
    fn from(source: io::Error) -> Self {
        IoError {
            source: Arc::new(source),
        }
    }
}
