//! Configuration of [`AsyncTrainer`](super::AsyncTrainer).
use crate::AsyncWorkerConfig;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`AsyncTrainer`](super::AsyncTrainer).
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct AsyncTrainerConfig {
    /// The number of worker threads.
    pub n_workers: usize,

    /// The maximum number of global environment steps.
    pub max_steps: usize,

    /// Configuration shared by all workers.
    pub worker: AsyncWorkerConfig,
}

impl Default for AsyncTrainerConfig {
    fn default() -> Self {
        Self {
            n_workers: 1,
            max_steps: 100_000,
            worker: AsyncWorkerConfig::default(),
        }
    }
}

impl AsyncTrainerConfig {
    /// Sets the number of worker threads.
    pub fn n_workers(mut self, v: usize) -> Self {
        self.n_workers = v;
        self
    }

    /// Sets the maximum number of global environment steps.
    pub fn max_steps(mut self, v: usize) -> Self {
        self.max_steps = v;
        self
    }

    /// Sets the worker configuration.
    pub fn worker(mut self, v: AsyncWorkerConfig) -> Self {
        self.worker = v;
        self
    }

    /// Constructs [`AsyncTrainerConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`AsyncTrainerConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
