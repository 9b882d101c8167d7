use super::AsyncTrainerConfig;
use crate::{
    AsyncAgent, AsyncGlobal, AsyncWorker, EpochResultMessage, SyncModel, WorkerStat,
    WorkerStateStore,
};
use anyhow::Result;
use crossbeam_channel::{bounded, Receiver, Sender};
use log::{info, warn};
use qlearn_core::{
    record::{Record, RecordValue::Scalar, Recorder},
    Env, EpochResult, ListenerResponse, TrainingListener, TrainingListeners,
};
use std::{
    marker::PhantomData,
    sync::{Arc, Mutex},
    thread::JoinHandle,
};

/// Builds per-worker agents from a cloneable configuration.
pub trait AsyncAgentConfig<E: Env, M: SyncModel>: Clone {
    /// The agent type built from this configuration.
    type Agent: AsyncAgent<E>;

    /// Builds an agent attached to the given coordinator.
    fn build_agent(&self, global: Arc<AsyncGlobal<M>>) -> Self::Agent;
}

/// Forwards epoch results from a worker thread to the recording loop.
struct ChannelListener {
    worker_id: usize,
    sender: Sender<EpochResultMessage>,
}

impl TrainingListener for ChannelListener {
    fn on_epoch_training_result(&mut self, entry: &EpochResult) -> ListenerResponse {
        let msg = EpochResultMessage {
            worker_id: self.worker_id,
            entry: entry.clone(),
        };
        if self.sender.try_send(msg).is_err() {
            // Recording is best-effort; a full channel must not stall training.
            warn!("worker-{} dropped an epoch result", self.worker_id);
        }
        ListenerResponse::Continue
    }
}

/// Requests a stop at the next listener boundary once the flag is set.
struct StopFlagListener {
    stop: Arc<Mutex<bool>>,
}

impl StopFlagListener {
    fn response(&self) -> ListenerResponse {
        match *self.stop.lock().unwrap() {
            true => ListenerResponse::Stop,
            false => ListenerResponse::Continue,
        }
    }
}

impl TrainingListener for StopFlagListener {
    fn on_new_epoch(&mut self) -> ListenerResponse {
        self.response()
    }

    fn on_epoch_training_result(&mut self, _entry: &EpochResult) -> ListenerResponse {
        self.response()
    }
}

/// Manages [`AsyncWorker`]s training against one shared [`AsyncGlobal`].
///
/// Each worker thread builds its own environment, seeded with the worker id,
/// and its own agent attached to the coordinator. Workers report epoch
/// results over a bounded channel, which [`AsyncTrainer::train`] drains into
/// a [`Recorder`] until every worker finished.
pub struct AsyncTrainer<C, E, M>
where
    C: AsyncAgentConfig<E, M>,
    E: Env,
    M: SyncModel,
{
    /// Configurations of the agents, one per worker.
    ///
    /// Workers cycle through the list, so a single shared configuration may
    /// be given for any number of workers.
    agent_configs: Vec<C>,

    /// Configuration of [`Env`].
    env_config: E::Config,

    config: AsyncTrainerConfig,
    global: Arc<AsyncGlobal<M>>,
    states: Arc<WorkerStateStore>,

    /// Flag to stop training.
    stop: Arc<Mutex<bool>>,

    /// Thread handles.
    threads: Vec<JoinHandle<Result<WorkerStat>>>,

    phantom: PhantomData<E>,
}

impl<C, E, M> AsyncTrainer<C, E, M>
where
    C: AsyncAgentConfig<E, M> + Send + 'static,
    E: Env + 'static,
    E::Config: Send + 'static,
    M: SyncModel + Send + 'static,
{
    /// Builds an [`AsyncTrainer`] around the initial canonical model.
    pub fn build(
        config: AsyncTrainerConfig,
        agent_configs: Vec<C>,
        env_config: E::Config,
        model: M,
    ) -> Self {
        let global = Arc::new(AsyncGlobal::new(model, config.max_steps));
        Self {
            agent_configs,
            env_config,
            config,
            global,
            states: Arc::new(WorkerStateStore::new()),
            stop: Arc::new(Mutex::new(false)),
            threads: vec![],
            phantom: PhantomData,
        }
    }

    /// The coordinator shared by all workers.
    pub fn global(&self) -> &Arc<AsyncGlobal<M>> {
        &self.global
    }

    /// The store of last-known worker states.
    pub fn states(&self) -> &Arc<WorkerStateStore> {
        &self.states
    }

    /// Spawns the worker threads and returns the epoch result channel.
    ///
    /// The channel disconnects once every worker finished.
    pub fn run(&mut self) -> Receiver<EpochResultMessage> {
        let (sender, receiver) = bounded(1000);

        for id in 0..self.config.n_workers {
            let agent_config = self.agent_configs[id % self.agent_configs.len()].clone();
            let env_config = self.env_config.clone();
            let worker_config = self.config.worker.clone();
            let global = self.global.clone();
            let states = self.states.clone();
            let stop = self.stop.clone();
            let sender = sender.clone();

            let handle = std::thread::spawn(move || {
                let env = E::build(&env_config, id as i64)?;
                let agent = agent_config.build_agent(global.clone());
                let mut listeners = TrainingListeners::new();
                listeners.add(Box::new(ChannelListener {
                    worker_id: id,
                    sender,
                }));
                listeners.add(Box::new(StopFlagListener { stop }));
                let mut worker =
                    AsyncWorker::build(id, env, agent, global, listeners, states, worker_config);
                worker.run()
            });
            self.threads.push(handle);
            info!("Spawned worker-{}", id);
        }

        receiver
    }

    /// Requests all workers to stop at their next listener boundary.
    pub fn stop(&self) {
        let mut stop = self.stop.lock().unwrap();
        *stop = true;
    }

    /// Waits until all workers finish and returns their stats.
    pub fn join(&mut self) -> Result<Vec<WorkerStat>> {
        let mut stats = vec![];
        for handle in std::mem::take(&mut self.threads) {
            let stat = handle
                .join()
                .map_err(|_| crate::AsyncTrainerError::WorkerPanicked)??;
            stats.push(stat);
        }
        Ok(stats)
    }

    /// Runs asynchronous training to completion.
    ///
    /// Spawns the workers, writes one record per reported epoch to
    /// `recorder` and joins the workers once the result channel disconnects.
    pub fn train(&mut self, recorder: &mut dyn Recorder) -> Result<Vec<WorkerStat>> {
        let receiver = self.run();

        for msg in receiver.iter() {
            recorder.write(Record::from_slice(&[
                ("worker", Scalar(msg.worker_id as f32)),
                ("epoch", Scalar(msg.entry.epoch_counter as f32)),
                ("env_steps", Scalar(msg.entry.step_counter as f32)),
                ("epoch_reward", Scalar(msg.entry.reward)),
                ("score", Scalar(msg.entry.score)),
            ]));
        }

        let stats = self.join()?;
        info!(
            "Training finished after {} global steps",
            self.global.global_steps()
        );
        Ok(stats)
    }
}
