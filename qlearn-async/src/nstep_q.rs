//! n-step Q-learning over a worker-local model copy.
use crate::{AsyncAgent, AsyncAgentConfig, AsyncGlobal, SubEpochReturn, SyncModel};
use anyhow::Result;
use log::trace;
use qlearn_core::{replay_buffer::Transition, util, Env, EpsilonGreedy};
use serde::{Deserialize, Serialize};
use std::{marker::PhantomData, sync::Arc};

/// Configuration of [`NStepQLearning`].
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct NStepQLearningConfig {
    /// Discount factor.
    pub gamma: f32,

    /// Factor applied to rewards before they enter target computation.
    pub reward_factor: f32,

    /// Exploration schedule; may differ between workers.
    pub explorer: EpsilonGreedy,
}

impl Default for NStepQLearningConfig {
    fn default() -> Self {
        Self {
            gamma: 0.99,
            reward_factor: 1.0,
            explorer: EpsilonGreedy::default(),
        }
    }
}

impl NStepQLearningConfig {
    /// Sets the discount factor.
    pub fn gamma(mut self, v: f32) -> Self {
        self.gamma = v;
        self
    }

    /// Sets the reward scaling factor.
    pub fn reward_factor(mut self, v: f32) -> Self {
        self.reward_factor = v;
        self
    }

    /// Sets the exploration schedule.
    pub fn explorer(mut self, v: EpsilonGreedy) -> Self {
        self.explorer = v;
        self
    }
}

/// The rollout algorithm run by each async worker.
///
/// Acts epsilon-greedily with a private copy of the canonical model,
/// accumulates n-step returns over each segment and submits the fitted copy
/// back to the coordinator.
pub struct NStepQLearning<E, M>
where
    E: Env,
    M: SyncModel<Obs = E::Obs>,
{
    global: Arc<AsyncGlobal<M>>,
    local: M,
    explorer: EpsilonGreedy,
    gamma: f32,
    reward_factor: f32,
    phantom: PhantomData<E>,
}

impl<E, M> NStepQLearning<E, M>
where
    E: Env,
    M: SyncModel<Obs = E::Obs>,
{
    /// Builds the agent with a fresh snapshot of the canonical model.
    pub fn build(config: NStepQLearningConfig, global: Arc<AsyncGlobal<M>>) -> Self {
        let local = global.current_snapshot();
        Self {
            global,
            local,
            explorer: config.explorer,
            gamma: config.gamma,
            reward_factor: config.reward_factor,
            phantom: PhantomData,
        }
    }

    /// The worker-local model copy.
    pub fn local_model(&self) -> &M {
        &self.local
    }
}

impl<E, M> AsyncAgent<E> for NStepQLearning<E, M>
where
    E: Env,
    M: SyncModel<Obs = E::Obs>,
{
    fn pre_epoch(&mut self) {
        self.local = self.global.current_snapshot();
    }

    fn post_epoch(&mut self) {
        trace!("n-step segment state released");
    }

    fn train_sub_epoch(
        &mut self,
        env: &mut E,
        obs: Option<E::Obs>,
        nstep: usize,
    ) -> Result<SubEpochReturn<E::Obs>> {
        let mut obs = match obs {
            Some(obs) => obs,
            None => env.reset()?,
        };

        let mut transitions: Vec<Transition<E::Obs>> = Vec::with_capacity(nstep);
        let mut reward = 0f32;
        let mut done = false;

        for _ in 0..nstep {
            let q = self.local.output(&obs);
            let action = self.explorer.action(&q);
            let reply = env.step(action)?;
            reward += reply.reward;
            done = reply.done;
            let next_obs = reply.obs;
            transitions.push(Transition {
                obs,
                action,
                reward: reply.reward * self.reward_factor,
                is_terminal: done,
                next_obs: next_obs.clone(),
            });
            obs = next_obs;
            if done {
                break;
            }
        }

        // The n-step return accumulates in reverse temporal order.
        let mut ret = if done {
            0.0
        } else {
            util::max_value(&self.local.output(&obs))
        };
        let mut features = Vec::with_capacity(transitions.len());
        let mut targets = Vec::with_capacity(transitions.len());
        for tr in transitions.iter().rev() {
            ret = tr.reward + self.gamma * ret;
            let mut out = self.local.output(&tr.obs);
            out[tr.action] = ret;
            features.push(tr.obs.clone());
            targets.push(out);
        }

        let steps = transitions.len();
        if steps > 0 {
            self.local.fit(&features, &targets)?;
            self.global.apply_update(&self.local, steps);
        }

        Ok(SubEpochReturn {
            steps,
            last_obs: Some(obs),
            reward,
            score: self.local.latest_score(),
            done,
        })
    }
}

impl<E, M> AsyncAgentConfig<E, M> for NStepQLearningConfig
where
    E: Env,
    M: SyncModel<Obs = E::Obs>,
{
    type Agent = NStepQLearning<E, M>;

    fn build_agent(&self, global: Arc<AsyncGlobal<M>>) -> Self::Agent {
        NStepQLearning::build(self.clone(), global)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qlearn_core::{Model, StepReply};

    /// Zero-valued estimates; records every fit call.
    #[derive(Clone, Default)]
    struct RecordingModel {
        fits: Vec<(Vec<usize>, Vec<Vec<f32>>)>,
        merges: usize,
    }

    impl Model for RecordingModel {
        type Obs = usize;

        fn output(&self, _obs: &usize) -> Vec<f32> {
            vec![0.0, 0.0]
        }

        fn fit(&mut self, features: &[usize], targets: &[Vec<f32>]) -> Result<()> {
            self.fits.push((features.to_vec(), targets.to_vec()));
            Ok(())
        }

        fn clone_model(&self) -> Self {
            self.clone()
        }

        fn latest_score(&self) -> f32 {
            0.5
        }
    }

    impl SyncModel for RecordingModel {
        fn merge_update(&mut self, local: &Self) {
            self.merges += 1;
            self.fits = local.fits.clone();
        }
    }

    /// Terminates on the third tick; reward is always 1.
    struct ShortEpisodeEnv {
        t: usize,
    }

    impl Env for ShortEpisodeEnv {
        type Config = ();
        type Obs = usize;

        fn build(_config: &(), _seed: i64) -> Result<Self> {
            Ok(Self { t: 0 })
        }

        fn reset(&mut self) -> Result<usize> {
            self.t = 0;
            Ok(0)
        }

        fn step(&mut self, _action: usize) -> Result<StepReply<usize>> {
            self.t += 1;
            Ok(StepReply::new(self.t, 1.0, self.t >= 3))
        }

        fn n_actions(&self) -> usize {
            2
        }
    }

    #[test]
    fn accumulates_returns_in_reverse_order() -> Result<()> {
        fastrand::seed(11);
        let global = Arc::new(AsyncGlobal::new(RecordingModel::default(), 100));
        let config = NStepQLearningConfig::default()
            .gamma(0.5)
            .explorer(EpsilonGreedy::default().eps_init(0.0).eps_final(0.0));
        let mut agent: NStepQLearning<ShortEpisodeEnv, _> =
            NStepQLearning::build(config, global.clone());
        let mut env = ShortEpisodeEnv::build(&(), 0)?;
        let obs = env.reset()?;

        let segment = agent.train_sub_epoch(&mut env, Some(obs), 5)?;

        // The episode ends after 3 ticks even though 5 were allowed.
        assert_eq!(segment.steps, 3);
        assert!(segment.done);
        assert_eq!(segment.reward, 3.0);
        assert_eq!(global.global_steps(), 3);

        // Terminal bootstrap is zero; returns walk backwards from it.
        let (features, targets) = &agent.local_model().fits[0];
        assert_eq!(features, &vec![2, 1, 0]);
        let returns: Vec<f32> = targets
            .iter()
            .map(|t| t.iter().cloned().fold(f32::NEG_INFINITY, f32::max))
            .collect();
        assert_eq!(returns, vec![1.0, 1.5, 1.75]);
        Ok(())
    }

    #[test]
    fn pre_epoch_refreshes_the_local_copy() -> Result<()> {
        let global = Arc::new(AsyncGlobal::new(RecordingModel::default(), 100));
        let config = NStepQLearningConfig::default();
        let mut agent: NStepQLearning<ShortEpisodeEnv, _> =
            NStepQLearning::build(config, global.clone());

        let mut other = RecordingModel::default();
        other.fits.push((vec![9], vec![vec![9.0, 9.0]]));
        global.apply_update(&other, 1);

        assert!(agent.local_model().fits.is_empty());
        agent.pre_epoch();
        assert_eq!(agent.local_model().fits.len(), 1);
        Ok(())
    }
}
