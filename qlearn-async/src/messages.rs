//! Messages sent from worker threads to the trainer.
use qlearn_core::EpochResult;

/// An epoch result reported by a worker.
#[derive(Clone, Debug)]
pub struct EpochResultMessage {
    /// Id of the reporting worker.
    pub worker_id: usize,

    /// The completed epoch.
    pub entry: EpochResult,
}
