//! Spawns and supervises worker threads.
mod base;
mod config;
pub use base::{AsyncAgentConfig, AsyncTrainer};
pub use config::AsyncTrainerConfig;
