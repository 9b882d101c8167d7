//! Core traits and types.
mod env;
mod listener;
mod model;
mod step;
pub use env::Env;
pub use listener::{EpochResult, ListenerResponse, TrainingListener, TrainingListeners};
pub use model::Model;
pub use step::StepReply;
