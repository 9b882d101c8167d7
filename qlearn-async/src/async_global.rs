//! Canonical shared model and global step counter.
use crate::SyncModel;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Mutex,
};

/// Owns the canonical model and the global step counter.
///
/// Workers pull fresh snapshots of the canonical model at epoch start and
/// submit locally trained copies, which are applied one at a time.
pub struct AsyncGlobal<M> {
    model: Mutex<M>,
    step_counter: AtomicUsize,
    max_steps: usize,
}

impl<M: SyncModel> AsyncGlobal<M> {
    /// Constructs the coordinator around an initial model.
    pub fn new(model: M, max_steps: usize) -> Self {
        Self {
            model: Mutex::new(model),
            step_counter: AtomicUsize::new(0),
            max_steps,
        }
    }

    /// Returns a copy of the canonical model.
    ///
    /// The copy reflects every update applied before the call.
    pub fn current_snapshot(&self) -> M {
        self.model.lock().unwrap().clone_model()
    }

    /// Merges a worker update and advances the global step counter.
    ///
    /// Concurrent submissions are serialized; an update is either fully
    /// applied or not visible at all. The counter ends up as the sum of all
    /// submitted `steps_taken`, regardless of interleaving.
    pub fn apply_update(&self, local: &M, steps_taken: usize) {
        let mut model = self.model.lock().unwrap();
        model.merge_update(local);
        self.step_counter.fetch_add(steps_taken, Ordering::SeqCst);
    }

    /// The number of environment steps applied so far.
    ///
    /// May lag an in-flight submission by one update.
    pub fn global_steps(&self) -> usize {
        self.step_counter.load(Ordering::SeqCst)
    }

    /// Whether the configured step budget is exhausted.
    pub fn is_training_complete(&self) -> bool {
        self.global_steps() >= self.max_steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use qlearn_core::Model;
    use std::sync::Arc;

    #[derive(Clone)]
    struct MeanModel {
        weight: f32,
    }

    impl Model for MeanModel {
        type Obs = f32;

        fn output(&self, _obs: &f32) -> Vec<f32> {
            vec![self.weight]
        }

        fn fit(&mut self, _features: &[f32], _targets: &[Vec<f32>]) -> Result<()> {
            Ok(())
        }

        fn clone_model(&self) -> Self {
            self.clone()
        }

        fn latest_score(&self) -> f32 {
            0.0
        }
    }

    impl SyncModel for MeanModel {
        fn merge_update(&mut self, local: &Self) {
            self.weight = 0.5 * (self.weight + local.weight);
        }
    }

    #[test]
    fn counts_every_submission_under_contention() {
        let n_workers = 8;
        let submissions = 100;
        let steps_each = 5;
        let global = Arc::new(AsyncGlobal::new(MeanModel { weight: 0.0 }, usize::MAX));

        let handles: Vec<_> = (0..n_workers)
            .map(|i| {
                let global = global.clone();
                std::thread::spawn(move || {
                    let local = MeanModel { weight: i as f32 };
                    for _ in 0..submissions {
                        global.apply_update(&local, steps_each);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(global.global_steps(), n_workers * submissions * steps_each);
    }

    #[test]
    fn snapshot_reflects_applied_updates() {
        let global = AsyncGlobal::new(MeanModel { weight: 0.0 }, 10);
        assert!(!global.is_training_complete());

        global.apply_update(&MeanModel { weight: 2.0 }, 10);
        assert_eq!(global.current_snapshot().weight, 1.0);
        assert!(global.is_training_complete());
    }
}
