//! Value-estimating model.
use anyhow::Result;

/// A trainable action-value model.
///
/// The network itself lives outside this crate; training loops rely only on
/// this capability surface.
pub trait Model {
    /// Observation the model consumes.
    type Obs;

    /// Returns action-value estimates for an observation.
    ///
    /// The length of the returned vector is the number of discrete actions.
    fn output(&self, obs: &Self::Obs) -> Vec<f32>;

    /// Fits the model on pairs of features and target value vectors.
    fn fit(&mut self, features: &[Self::Obs], targets: &[Vec<f32>]) -> Result<()>;

    /// Returns a copy of the model with the same parameters.
    fn clone_model(&self) -> Self
    where
        Self: Sized;

    /// The score of the latest fit.
    fn latest_score(&self) -> f32;
}
