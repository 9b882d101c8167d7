//! Model synchronization across training workers.
use qlearn_core::Model;

/// A model whose parameters can be reconciled across training workers.
pub trait SyncModel: Model + Sized {
    /// Merges a worker-trained copy into `self`.
    ///
    /// Called by [`AsyncGlobal`](crate::AsyncGlobal) with its own lock held;
    /// implementations see a consistent canonical model and must leave it
    /// consistent.
    fn merge_update(&mut self, local: &Self);
}
