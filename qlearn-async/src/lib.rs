#![warn(missing_docs)]
//! Asynchronous Q-learning with a shared global model.
//!
//! Workers run epochs of n-step rollouts against private copies of the
//! canonical model owned by [`AsyncGlobal`] and submit their locally trained
//! copies back, one at a time. [`AsyncTrainer`] spawns one OS thread per
//! worker and records the epoch results they report.
mod async_global;
mod error;
mod messages;
mod nstep_q;
mod state_store;
mod sync_model;
mod worker;
mod worker_manager;

pub use async_global::AsyncGlobal;
pub use error::AsyncTrainerError;
pub use messages::EpochResultMessage;
pub use nstep_q::{NStepQLearning, NStepQLearningConfig};
pub use state_store::{WorkerState, WorkerStateStore};
pub use sync_model::SyncModel;
pub use worker::{
    workers_stat_fmt, AsyncAgent, AsyncWorker, AsyncWorkerConfig, SubEpochReturn, WorkerStat,
};
pub use worker_manager::{AsyncAgentConfig, AsyncTrainer, AsyncTrainerConfig};
