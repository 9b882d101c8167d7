//! Configuration of [`QLearning`](super::QLearning).
use crate::{EpsilonGreedy, TdAlgorithm};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`QLearning`](super::QLearning).
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct QLearningConfig {
    /// The maximum number of environment steps.
    pub max_steps: usize,

    /// The maximum number of environment steps per epoch.
    pub max_epoch_steps: usize,

    /// Number of transitions per training batch.
    pub batch_size: usize,

    /// Discount factor.
    pub gamma: f32,

    /// Bound on the TD error per transition.
    pub error_clamp: f32,

    /// Environment steps before model updates start, on top of the
    /// history/batch warm-up.
    pub update_start: usize,

    /// Interval of refreshing the target network in environment steps.
    /// Zero disables the refresh.
    pub target_update_interval: usize,

    /// Frame-skip factor; the previous action is repeated on skipped ticks.
    pub skip_frame: usize,

    /// Number of stacked history frames assumed by the model.
    pub history_length: usize,

    /// Factor applied to rewards before transitions are stored.
    pub reward_factor: f32,

    /// Selection of the TD-target bootstrap rule.
    pub td_algorithm: TdAlgorithm,

    /// Exploration schedule.
    pub explorer: EpsilonGreedy,
}

impl Default for QLearningConfig {
    /// There is no special intention behind these initial values.
    fn default() -> Self {
        Self {
            max_steps: 100_000,
            max_epoch_steps: 10_000,
            batch_size: 32,
            gamma: 0.99,
            error_clamp: 1.0,
            update_start: 100,
            target_update_interval: 500,
            skip_frame: 1,
            history_length: 1,
            reward_factor: 1.0,
            td_algorithm: TdAlgorithm::Standard,
            explorer: EpsilonGreedy::default(),
        }
    }
}

impl QLearningConfig {
    /// Sets the maximum number of environment steps.
    pub fn max_steps(mut self, v: usize) -> Self {
        self.max_steps = v;
        self
    }

    /// Sets the maximum number of environment steps per epoch.
    pub fn max_epoch_steps(mut self, v: usize) -> Self {
        self.max_epoch_steps = v;
        self
    }

    /// Sets the number of transitions per training batch.
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Sets the discount factor.
    pub fn gamma(mut self, v: f32) -> Self {
        self.gamma = v;
        self
    }

    /// Sets the bound on the TD error per transition.
    pub fn error_clamp(mut self, v: f32) -> Self {
        self.error_clamp = v;
        self
    }

    /// Sets the number of steps before model updates start.
    pub fn update_start(mut self, v: usize) -> Self {
        self.update_start = v;
        self
    }

    /// Sets the interval of refreshing the target network.
    pub fn target_update_interval(mut self, v: usize) -> Self {
        self.target_update_interval = v;
        self
    }

    /// Sets the frame-skip factor.
    pub fn skip_frame(mut self, v: usize) -> Self {
        self.skip_frame = v;
        self
    }

    /// Sets the number of stacked history frames assumed by the model.
    pub fn history_length(mut self, v: usize) -> Self {
        self.history_length = v;
        self
    }

    /// Sets the factor applied to rewards before transitions are stored.
    pub fn reward_factor(mut self, v: f32) -> Self {
        self.reward_factor = v;
        self
    }

    /// Sets the TD-target bootstrap rule.
    pub fn td_algorithm(mut self, v: TdAlgorithm) -> Self {
        self.td_algorithm = v;
        self
    }

    /// Sets the exploration schedule.
    pub fn explorer(mut self, v: EpsilonGreedy) -> Self {
        self.explorer = v;
        self
    }

    /// Constructs [`QLearningConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`QLearningConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn yaml_round_trip() -> Result<()> {
        let config = QLearningConfig::default()
            .max_steps(1000)
            .batch_size(16)
            .td_algorithm(TdAlgorithm::Double)
            .explorer(EpsilonGreedy::default().eps_final(0.05).decay_steps(500));

        let dir = TempDir::new("qlearning_config")?;
        let path = dir.path().join("config.yaml");
        config.save(&path)?;
        let loaded = QLearningConfig::load(&path)?;
        assert_eq!(config, loaded);
        Ok(())
    }
}
