use super::stat::WorkerStat;
use crate::{AsyncGlobal, SyncModel, WorkerState, WorkerStateStore};
use anyhow::Result;
use log::{error, info};
use qlearn_core::{Env, EpochResult, ListenerResponse, TrainingListeners};
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::SystemTime};

/// Result of one rollout segment.
#[derive(Clone, Debug)]
pub struct SubEpochReturn<O> {
    /// Environment ticks run in the segment.
    pub steps: usize,

    /// Observation after the last tick, if the segment produced one.
    pub last_obs: Option<O>,

    /// Cumulative raw reward over the segment.
    pub reward: f32,

    /// Latest model score.
    pub score: f32,

    /// Whether the episode terminated inside the segment.
    pub done: bool,
}

/// Per-worker learning algorithm driven by [`AsyncWorker`].
pub trait AsyncAgent<E: Env> {
    /// Prepares per-epoch state, typically refreshing the local model copy
    /// from the coordinator.
    fn pre_epoch(&mut self);

    /// Releases per-epoch resources. Runs exactly once per epoch, also when
    /// the epoch is cut short by a stop request.
    fn post_epoch(&mut self);

    /// Runs up to `nstep` environment ticks starting from `obs`.
    fn train_sub_epoch(
        &mut self,
        env: &mut E,
        obs: Option<E::Obs>,
        nstep: usize,
    ) -> Result<SubEpochReturn<E::Obs>>;
}

/// Configuration of [`AsyncWorker`].
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct AsyncWorkerConfig {
    /// Upper bound of a rollout segment in environment ticks.
    pub nstep: usize,

    /// The maximum number of environment steps per epoch, warmup included.
    pub max_epoch_steps: usize,

    /// No-op ticks run after each environment reset.
    ///
    /// Fills the frame history consumed by observation preprocessing before
    /// the agent starts acting.
    pub epoch_warmup_steps: usize,
}

impl Default for AsyncWorkerConfig {
    fn default() -> Self {
        Self {
            nstep: 5,
            max_epoch_steps: 10_000,
            epoch_warmup_steps: 0,
        }
    }
}

impl AsyncWorkerConfig {
    /// Sets the upper bound of a rollout segment.
    pub fn nstep(mut self, v: usize) -> Self {
        self.nstep = v;
        self
    }

    /// Sets the maximum number of environment steps per epoch.
    pub fn max_epoch_steps(mut self, v: usize) -> Self {
        self.max_epoch_steps = v;
        self
    }

    /// Sets the number of no-op ticks run after each environment reset.
    pub fn epoch_warmup_steps(mut self, v: usize) -> Self {
        self.epoch_warmup_steps = v;
        self
    }
}

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Per-thread rollout loop of the asynchronous mode.
///
/// # Worker loop
///
/// ```mermaid
/// graph LR
///     A[AsyncGlobal]-->|snapshot|B[AsyncAgent]
///     B -->|rollout segments|C[Env]
///     B -->|local update|A
///     D[AsyncWorker] -->|"EpochResult"|E[TrainingListeners]
/// ```
///
/// Each epoch starts by resetting the environment and running the configured
/// warmup ticks, then repeatedly asks the agent for rollout segments of at
/// most `nstep` ticks. An epoch ends when a segment reports a terminal step
/// or the epoch step limit is reached; the agent's `post_epoch` then runs,
/// listeners are notified with the epoch result and, before the next epoch,
/// with `on_new_epoch`. Either notification may stop the worker.
///
/// The loop terminates when the coordinator reports the global step budget
/// exhausted or a listener requests a stop. Cancellation is cooperative and
/// observed only at these boundaries; a segment already running completes.
pub struct AsyncWorker<A, E, M>
where
    A: AsyncAgent<E>,
    E: Env,
    M: SyncModel,
{
    id: usize,
    env: E,
    agent: A,
    global: Arc<AsyncGlobal<M>>,
    listeners: TrainingListeners,
    states: Arc<WorkerStateStore>,
    config: AsyncWorkerConfig,
    step_counter: usize,
    epoch_counter: usize,
}

impl<A, E, M> AsyncWorker<A, E, M>
where
    A: AsyncAgent<E>,
    E: Env,
    M: SyncModel,
{
    /// Builds a worker and registers it with the state store.
    pub fn build(
        id: usize,
        env: E,
        agent: A,
        global: Arc<AsyncGlobal<M>>,
        listeners: TrainingListeners,
        states: Arc<WorkerStateStore>,
        config: AsyncWorkerConfig,
    ) -> Self {
        states.update_state(id, WorkerState::NotStarted);
        Self {
            id,
            env,
            agent,
            global,
            listeners,
            states,
            config,
            step_counter: 0,
            epoch_counter: 0,
        }
    }

    /// Environment steps taken by this worker so far.
    pub fn step_counter(&self) -> usize {
        self.step_counter
    }

    /// Completed epochs.
    pub fn epoch_counter(&self) -> usize {
        self.epoch_counter
    }

    /// The worker's learning algorithm.
    pub fn agent(&self) -> &A {
        &self.agent
    }

    /// Runs the worker to completion, returning its rollout stats.
    ///
    /// The worker state is published as `Running` while the loop executes,
    /// then `Stopped` on normal termination (step budget or listener stop)
    /// or `Failed` when an environment error propagates.
    pub fn run(&mut self) -> Result<WorkerStat> {
        info!("worker-{} started", self.id);
        self.states.update_state(self.id, WorkerState::Running);
        let time = SystemTime::now();

        let result = self.run_loop();
        let duration = time.elapsed().unwrap_or_default();

        match &result {
            Ok(()) => {
                self.states.update_state(self.id, WorkerState::Stopped);
                info!("worker-{} stopped after {} steps", self.id, self.step_counter);
            }
            Err(e) => {
                self.states.update_state(self.id, WorkerState::Failed);
                error!("worker-{} failed: {}", self.id, e);
            }
        }

        result.map(|()| WorkerStat {
            env_steps: self.step_counter,
            duration,
        })
    }

    /// Resets the environment and runs the configured warmup ticks.
    fn init_env(&mut self) -> Result<(usize, E::Obs, f32)> {
        let mut obs = self.env.reset()?;
        let mut reward = 0f32;
        let mut steps = 0;
        while steps < self.config.epoch_warmup_steps {
            let reply = self.env.step(0)?;
            reward += reply.reward;
            obs = reply.obs;
            steps += 1;
        }
        Ok((steps, obs, reward))
    }

    fn run_loop(&mut self) -> Result<()> {
        let (mut length, first_obs, mut rewards) = self.init_env()?;
        let mut obs = Some(first_obs);

        self.agent.pre_epoch();
        let mut epoch_open = true;
        if self.listeners.notify_new_epoch() == ListenerResponse::Stop {
            self.agent.post_epoch();
            return Ok(());
        }

        while !self.global.is_training_complete() {
            // At least one tick, so a warmup longer than the epoch limit
            // cannot stall the loop.
            let nstep = self
                .config
                .nstep
                .min(self.config.max_epoch_steps.saturating_sub(length))
                .max(1);
            let segment = self.agent.train_sub_epoch(&mut self.env, obs.take(), nstep)?;
            self.step_counter += segment.steps;
            length += segment.steps;
            rewards += segment.reward;
            let score = segment.score;
            let done = segment.done;
            obs = segment.last_obs;

            if done || length >= self.config.max_epoch_steps {
                self.agent.post_epoch();
                epoch_open = false;

                let entry = EpochResult {
                    epoch_counter: self.epoch_counter,
                    step_counter: self.step_counter,
                    reward: rewards,
                    episode_length: length,
                    score,
                };
                if self.listeners.notify_epoch_training_result(&entry) == ListenerResponse::Stop {
                    break;
                }

                let (l, o, r) = self.init_env()?;
                length = l;
                rewards = r;
                obs = Some(o);

                self.agent.pre_epoch();
                epoch_open = true;
                self.epoch_counter += 1;
                if self.listeners.notify_new_epoch() == ListenerResponse::Stop {
                    break;
                }
            }
        }

        if epoch_open {
            self.agent.post_epoch();
        }
        Ok(())
    }
}
