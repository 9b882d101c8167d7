//! Train a value model with sequential Q-learning.
mod config;

use crate::{
    record::{Record, RecordValue::Scalar, Recorder},
    replay_buffer::{ReplayBuffer, ReplayBufferConfig, Transition},
    util, Env, EpochResult, EpsilonGreedy, ListenerResponse, Model, StepReply, TdTargets,
    TrainingListeners,
};
use anyhow::Result;
pub use config::QLearningConfig;
use log::{info, trace};
use std::marker::PhantomData;

/// Diagnostics of a single [`QLearning::train_step`] call.
#[derive(Debug)]
pub struct QStepReturn<O> {
    /// Highest action-value estimate at the pre-step observation.
    /// Absent on skipped ticks, where the model is not queried.
    pub max_q: Option<f32>,

    /// Latest model score.
    pub score: f32,

    /// The raw environment step result.
    pub reply: StepReply<O>,
}

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Sequential deep Q-learning loop.
///
/// # Training loop
///
/// [`QLearning::train`] runs epochs until the step budget is exhausted or a
/// listener requests a stop. Each epoch resets the environment and calls
/// [`QLearning::train_step`] until the episode terminates or the epoch step
/// limit is reached. A step interacts as shown below:
///
/// ```mermaid
/// graph LR
///     A[Model]-->|action values|B[EpsilonGreedy]
///     B -->|action|C[Env]
///     C -->|"StepReply"|D[ReplayBuffer]
///     D -->|batch|E[TdTargets]
///     E -->|"(features, targets)"|A
/// ```
///
/// * On skipped ticks (see `skip_frame`) the previous action is repeated and
///   neither the model nor the exploration policy is consulted.
/// * Rewards are scaled and accumulated between non-skipped ticks; a
///   [`Transition`] is stored on every non-skipped or terminal tick.
/// * Once enough steps have passed, every stored transition triggers a batch
///   sample, a TD-target computation and a fit of the online model.
/// * The target network is refreshed by cloning the online model on a
///   separate, coarser schedule (`target_update_interval`).
pub struct QLearning<E, M>
where
    E: Env,
    M: Model<Obs = E::Obs>,
{
    config: QLearningConfig,

    /// Online network, used for action selection and fitted every update.
    qnet: M,

    /// Frozen copy stabilizing the TD targets.
    qnet_tgt: M,

    buffer: ReplayBuffer<E::Obs>,
    explorer: EpsilonGreedy,
    td: TdTargets,
    step_counter: usize,
    epoch_counter: usize,
    last_action: usize,
    accu_reward: f32,
    phantom: PhantomData<E>,
}

impl<E, M> QLearning<E, M>
where
    E: Env,
    M: Model<Obs = E::Obs>,
{
    /// Constructs a trainer around an online model.
    ///
    /// The target network starts as a copy of `qnet`.
    pub fn build(
        config: QLearningConfig,
        replay_buffer_config: ReplayBufferConfig,
        qnet: M,
    ) -> Self {
        let qnet_tgt = qnet.clone_model();
        let explorer = config.explorer.clone();
        let td = TdTargets::new(config.td_algorithm, config.gamma, config.error_clamp);
        Self {
            qnet,
            qnet_tgt,
            explorer,
            td,
            buffer: ReplayBuffer::build(&replay_buffer_config),
            step_counter: 0,
            epoch_counter: 0,
            last_action: 0,
            accu_reward: 0.0,
            config,
            phantom: PhantomData,
        }
    }

    /// Environment steps taken so far.
    pub fn step_counter(&self) -> usize {
        self.step_counter
    }

    /// Completed epochs.
    pub fn epoch_counter(&self) -> usize {
        self.epoch_counter
    }

    /// The online model.
    pub fn qnet(&self) -> &M {
        &self.qnet
    }

    /// The exploration policy.
    pub fn explorer(&self) -> &EpsilonGreedy {
        &self.explorer
    }

    /// The number of stored transitions.
    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }

    /// First step at which model updates may run.
    ///
    /// Mixes batch size, history length and skip factor so enough history
    /// exists before the first fit. The exact boundary is not load-bearing;
    /// tune `update_start` rather than relying on it.
    fn update_start_threshold(&self) -> usize {
        let skip = self.config.skip_frame.max(1);
        self.config.update_start + (self.config.batch_size + self.config.history_length) * skip
    }

    fn pre_epoch(&mut self) {
        self.last_action = 0;
        self.accu_reward = 0.0;
    }

    fn post_epoch(&mut self) {
        trace!("epoch {} finished", self.epoch_counter);
    }

    /// Performs a single training tick from `obs`.
    ///
    /// Advances the step counter once per call. Fails when a sampled batch
    /// is empty, which indicates a configuration error such as a zero batch
    /// size; the error aborts the current step and is not recovered here.
    pub fn train_step(&mut self, env: &mut E, obs: &E::Obs) -> Result<QStepReturn<E::Obs>> {
        let skip = self.config.skip_frame.max(1);
        let skipped = self.step_counter % skip != 0;

        let (action, max_q) = if skipped {
            (self.last_action, None)
        } else {
            let q = self.qnet.output(obs);
            let action = self.explorer.action(&q);
            (action, Some(util::max_value(&q)))
        };
        self.last_action = action;

        let reply = env.step(action)?;
        self.accu_reward += reply.reward * self.config.reward_factor;

        if !skipped || reply.done {
            self.buffer.store(Transition {
                obs: obs.clone(),
                action,
                reward: self.accu_reward,
                is_terminal: reply.done,
                next_obs: reply.obs.clone(),
            });

            if self.step_counter > self.update_start_threshold() {
                let batch = self.buffer.sample_batch(self.config.batch_size);
                let (features, targets) = self.td.compute(&batch, &self.qnet, &self.qnet_tgt)?;
                self.qnet.fit(&features, &targets)?;
            }

            self.accu_reward = 0.0;
        }

        self.step_counter += 1;

        Ok(QStepReturn {
            max_q,
            score: self.qnet.latest_score(),
            reply,
        })
    }

    /// Runs the full training loop.
    ///
    /// One record per epoch is written to `recorder`; listeners are notified
    /// before each epoch and after each epoch result and may stop training.
    pub fn train(
        &mut self,
        env: &mut E,
        recorder: &mut dyn Recorder,
        listeners: &mut TrainingListeners,
    ) -> Result<()> {
        info!("Started training for at most {} steps", self.config.max_steps);

        while self.step_counter < self.config.max_steps {
            if listeners.notify_new_epoch() == ListenerResponse::Stop {
                info!("Training stopped by a listener");
                break;
            }
            self.pre_epoch();

            let mut obs = env.reset()?;
            let mut epoch_reward = 0f32;
            let mut epoch_length = 0usize;
            let mut score = 0f32;

            loop {
                let ret = self.train_step(env, &obs)?;
                epoch_length += 1;
                epoch_reward += ret.reply.reward;
                score = ret.score;

                if self.config.target_update_interval > 0
                    && self.step_counter % self.config.target_update_interval == 0
                {
                    self.qnet_tgt = self.qnet.clone_model();
                    info!("Updated the target network at step {}", self.step_counter);
                }

                let done = ret.reply.done;
                obs = ret.reply.obs;
                if done
                    || epoch_length >= self.config.max_epoch_steps
                    || self.step_counter >= self.config.max_steps
                {
                    break;
                }
            }

            self.post_epoch();
            let entry = EpochResult {
                epoch_counter: self.epoch_counter,
                step_counter: self.step_counter,
                reward: epoch_reward,
                episode_length: epoch_length,
                score,
            };
            recorder.write(Record::from_slice(&[
                ("epoch", Scalar(entry.epoch_counter as f32)),
                ("env_steps", Scalar(entry.step_counter as f32)),
                ("epoch_reward", Scalar(entry.reward)),
                ("score", Scalar(entry.score)),
            ]));

            let response = listeners.notify_epoch_training_result(&entry);
            self.epoch_counter += 1;
            if response == ListenerResponse::Stop {
                info!("Training stopped by a listener");
                break;
            }
        }

        Ok(())
    }
}
