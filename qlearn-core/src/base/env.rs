//! Environment.
use super::step::StepReply;
use anyhow::Result;
use std::fmt::Debug;

/// Represents an environment with a discrete action space, typically an MDP.
///
/// Actions are indices into `0..n_actions()`. Observation preprocessing and
/// history stacking, if any, happen behind this trait.
pub trait Env {
    /// Configuration used to build the environment.
    type Config: Clone;

    /// Observation of the environment.
    type Obs: Clone + Debug;

    /// Builds an environment with a given random seed.
    fn build(config: &Self::Config, seed: i64) -> Result<Self>
    where
        Self: Sized;

    /// Resets the environment and returns the initial observation.
    fn reset(&mut self) -> Result<Self::Obs>;

    /// Performs an environment step with the given action.
    fn step(&mut self, action: usize) -> Result<StepReply<Self::Obs>>;

    /// The number of discrete actions.
    fn n_actions(&self) -> usize;
}
