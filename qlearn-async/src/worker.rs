//! Worker-side rollout loop.
mod base;
mod stat;
pub use base::{AsyncAgent, AsyncWorker, AsyncWorkerConfig, SubEpochReturn};
pub use stat::{workers_stat_fmt, WorkerStat};
