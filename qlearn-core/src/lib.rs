#![warn(missing_docs)]
//! A library for deep Q-learning training loops.
pub mod error;
pub mod record;
pub mod replay_buffer;
pub mod util;

mod base;
pub use base::{
    Env, EpochResult, ListenerResponse, Model, StepReply, TrainingListener, TrainingListeners,
};

mod policy;
pub use policy::{EpsilonGreedy, Greedy};

mod td_target;
pub use td_target::{TdAlgorithm, TdTargets};

mod trainer;
pub use trainer::{QLearning, QLearningConfig, QStepReturn};
