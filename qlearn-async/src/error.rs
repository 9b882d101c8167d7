//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug)]
pub enum AsyncTrainerError {
    /// A worker thread terminated abnormally.
    #[error("worker thread panicked")]
    WorkerPanicked,
}
