//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug)]
pub enum QlearnError {
    /// An operation received an argument it cannot work with.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Record key error.
    #[error("record key error: {0}")]
    RecordKey(String),

    /// Record value type error.
    #[error("record value type error: {0}")]
    RecordValueType(String),
}
