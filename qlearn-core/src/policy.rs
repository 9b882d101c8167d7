//! Action selection over action-value estimates.
use crate::util;
use serde::{Deserialize, Serialize};

/// Deterministic greedy policy.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Greedy;

impl Greedy {
    /// Selects the action with the highest value estimate.
    pub fn action(&self, q: &[f32]) -> usize {
        util::argmax(q)
    }
}

/// Epsilon-greedy exploration wrapping a [`Greedy`] policy.
///
/// Before the warm-up step count is reached, actions are drawn uniformly at
/// random. Afterwards the exploration rate decays linearly from `eps_init`
/// to `eps_final` over `decay_steps` elapsed steps and stays at `eps_final`.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct EpsilonGreedy {
    /// Exploration rate when the warm-up ends.
    pub eps_init: f64,

    /// Exploration rate floor.
    pub eps_final: f64,

    /// Steps during which actions are purely random.
    pub warmup_steps: usize,

    /// Steps over which the exploration rate decays to its floor.
    pub decay_steps: usize,

    #[serde(skip)]
    step: usize,

    #[serde(skip)]
    greedy: Greedy,
}

impl Default for EpsilonGreedy {
    fn default() -> Self {
        Self {
            eps_init: 1.0,
            eps_final: 0.02,
            warmup_steps: 0,
            decay_steps: 100_000,
            step: 0,
            greedy: Greedy,
        }
    }
}

impl EpsilonGreedy {
    /// Sets the exploration rate at the end of the warm-up.
    pub fn eps_init(mut self, v: f64) -> Self {
        self.eps_init = v;
        self
    }

    /// Sets the exploration rate floor.
    pub fn eps_final(mut self, v: f64) -> Self {
        self.eps_final = v;
        self
    }

    /// Sets the number of purely random warm-up steps.
    pub fn warmup_steps(mut self, v: usize) -> Self {
        self.warmup_steps = v;
        self
    }

    /// Sets the length of the decay schedule in steps.
    pub fn decay_steps(mut self, v: usize) -> Self {
        self.decay_steps = v;
        self
    }

    /// The current exploration rate.
    pub fn epsilon(&self) -> f64 {
        let elapsed = self.step.saturating_sub(self.warmup_steps) as f64;
        let d = (self.eps_init - self.eps_final) / self.decay_steps as f64;
        (self.eps_init - d * elapsed).max(self.eps_final)
    }

    /// The number of action selections so far.
    pub fn step_count(&self) -> usize {
        self.step
    }

    /// Selects an action given value estimates for all actions.
    ///
    /// Advances the internal step counter exactly once per call.
    pub fn action(&mut self, q: &[f32]) -> usize {
        let action = if self.step < self.warmup_steps {
            fastrand::usize(..q.len())
        } else if fastrand::f64() < self.epsilon() {
            fastrand::usize(..q.len())
        } else {
            self.greedy.action(q)
        };
        self.step += 1;
        action
    }
}
