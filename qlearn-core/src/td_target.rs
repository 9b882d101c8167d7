//! TD-target computation for Q-learning.
use crate::{error::QlearnError, replay_buffer::Transition, util, Model};
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Selection of the bootstrap rule used for TD targets.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub enum TdAlgorithm {
    /// The target network both selects and evaluates the bootstrapped
    /// action. Prone to overestimation bias.
    Standard,

    /// The online network selects the action, the target network evaluates
    /// it, reducing overestimation bias.
    Double,
}

/// Converts a batch of transitions into training targets.
///
/// The adjusted target is written into the action slot of the online output
/// vector, leaving the other slots unchanged, so a fit only pushes gradient
/// through the taken action.
#[derive(Clone, Debug)]
pub struct TdTargets {
    algorithm: TdAlgorithm,
    gamma: f32,
    error_clamp: f32,
}

impl TdTargets {
    /// Constructs a TD-target computer.
    pub fn new(algorithm: TdAlgorithm, gamma: f32, error_clamp: f32) -> Self {
        Self {
            algorithm,
            gamma,
            error_clamp,
        }
    }

    /// Computes (features, targets) pairs suitable for a single fit call.
    ///
    /// Fails when the batch is empty.
    pub fn compute<M>(
        &self,
        batch: &[Transition<M::Obs>],
        online: &M,
        target: &M,
    ) -> Result<(Vec<M::Obs>, Vec<Vec<f32>>)>
    where
        M: Model,
        M::Obs: Clone,
    {
        if batch.is_empty() {
            return Err(QlearnError::InvalidArgument("too few transitions".into()).into());
        }

        let mut features = Vec::with_capacity(batch.len());
        let mut targets = Vec::with_capacity(batch.len());

        for tr in batch.iter() {
            let v_next = if tr.is_terminal {
                0.0
            } else {
                match self.algorithm {
                    TdAlgorithm::Standard => util::max_value(&target.output(&tr.next_obs)),
                    TdAlgorithm::Double => {
                        let selected = util::argmax(&online.output(&tr.next_obs));
                        target.output(&tr.next_obs)[selected]
                    }
                }
            };
            let y = tr.reward + self.gamma * v_next;

            let mut out = online.output(&tr.obs);
            let q = out[tr.action];
            let e = (y - q).clamp(-self.error_clamp, self.error_clamp);
            out[tr.action] = q + e;

            features.push(tr.obs.clone());
            targets.push(out);
        }

        Ok((features, targets))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Maps observations to fixed value vectors.
    struct TableModel {
        rows: Vec<Vec<f32>>,
    }

    impl TableModel {
        fn new(rows: Vec<Vec<f32>>) -> Self {
            Self { rows }
        }
    }

    impl Model for TableModel {
        type Obs = usize;

        fn output(&self, obs: &usize) -> Vec<f32> {
            self.rows[*obs].clone()
        }

        fn fit(&mut self, _features: &[usize], _targets: &[Vec<f32>]) -> Result<()> {
            Ok(())
        }

        fn clone_model(&self) -> Self {
            Self {
                rows: self.rows.clone(),
            }
        }

        fn latest_score(&self) -> f32 {
            0.0
        }
    }

    fn terminal(obs: usize, action: usize, reward: f32) -> Transition<usize> {
        Transition {
            obs,
            action,
            reward,
            is_terminal: true,
            next_obs: obs,
        }
    }

    fn assert_invalid_argument(err: anyhow::Error) {
        match err.downcast_ref::<QlearnError>() {
            Some(QlearnError::InvalidArgument(_)) => {}
            _ => panic!("unexpected error: {}", err),
        }
    }

    #[test]
    fn empty_batch_fails_for_both_algorithms() {
        let online = TableModel::new(vec![vec![0.0, 0.0]]);
        let target = online.clone_model();

        for algorithm in [TdAlgorithm::Standard, TdAlgorithm::Double] {
            let td = TdTargets::new(algorithm, 0.99, 1.0);
            let err = td.compute(&[], &online, &target).unwrap_err();
            assert_invalid_argument(err);
        }
    }

    #[test]
    fn terminal_target_is_the_reward_regardless_of_the_target_model() {
        let online = TableModel::new(vec![vec![0.0, 0.0]]);
        // Huge target-model outputs must not leak into terminal targets.
        let target = TableModel::new(vec![vec![1e6, 1e6]]);
        let td = TdTargets::new(TdAlgorithm::Standard, 0.99, 10.0);

        let (features, targets) = td
            .compute(&[terminal(0, 1, 1.5)], &online, &target)
            .unwrap();
        assert_eq!(features, vec![0]);
        assert_eq!(targets[0][1], 1.5);
        // The untaken action slot keeps the online estimate.
        assert_eq!(targets[0][0], 0.0);
    }

    #[test]
    fn error_clamp_bounds_the_adjustment() {
        let online = TableModel::new(vec![vec![0.0, 0.0]]);
        let target = online.clone_model();
        let td = TdTargets::new(TdAlgorithm::Standard, 0.99, 0.5);

        let (_, targets) = td
            .compute(&[terminal(0, 0, 8.0)], &online, &target)
            .unwrap();
        assert_eq!(targets[0][0], 0.5);
    }

    #[test]
    fn standard_bootstrap_uses_the_target_maximum() {
        // obs 0 transitions to obs 1.
        let online = TableModel::new(vec![vec![0.0, 0.0], vec![0.0, 9.0]]);
        let target = TableModel::new(vec![vec![0.0, 0.0], vec![2.0, 1.0]]);
        let td = TdTargets::new(TdAlgorithm::Standard, 0.5, 100.0);

        let batch = [Transition {
            obs: 0,
            action: 0,
            reward: 1.0,
            is_terminal: false,
            next_obs: 1,
        }];
        let (_, targets) = td.compute(&batch, &online, &target).unwrap();
        // y = 1 + 0.5 * max(target(1)) = 1 + 0.5 * 2.
        assert_eq!(targets[0][0], 2.0);
    }

    #[test]
    fn double_bootstrap_lets_the_online_model_select() {
        let target = TableModel::new(vec![vec![0.0, 0.0], vec![2.0, 1.0]]);
        let td = TdTargets::new(TdAlgorithm::Double, 0.5, 100.0);
        let batch = [Transition {
            obs: 0,
            action: 0,
            reward: 1.0,
            is_terminal: false,
            next_obs: 1,
        }];

        // Online argmax at next_obs is action 1; the target evaluates it.
        let online = TableModel::new(vec![vec![0.0, 0.0], vec![0.0, 9.0]]);
        let (_, targets) = td.compute(&batch, &online, &target).unwrap();
        assert_eq!(targets[0][0], 1.5);

        // Flipping the online argmax changes which target slot is used.
        let online = TableModel::new(vec![vec![0.0, 0.0], vec![9.0, 0.0]]);
        let (_, targets) = td.compute(&batch, &online, &target).unwrap();
        assert_eq!(targets[0][0], 2.0);
    }
}
