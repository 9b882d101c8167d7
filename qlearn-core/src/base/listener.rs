//! Training progress notifications.

/// Reply of a [`TrainingListener`] callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListenerResponse {
    /// Keep training.
    Continue,

    /// Stop training at the next checked boundary.
    Stop,
}

/// Result of one completed training epoch.
#[derive(Clone, Debug)]
pub struct EpochResult {
    /// Index of the epoch, starting at 0.
    pub epoch_counter: usize,

    /// Environment steps taken by the emitting trainer or worker so far.
    pub step_counter: usize,

    /// Cumulative raw reward over the epoch.
    pub reward: f32,

    /// Environment steps in the epoch, warmup frames included.
    pub episode_length: usize,

    /// Latest model score.
    pub score: f32,
}

/// Receives training progress notifications.
///
/// Callbacks are invoked synchronously on the thread running the training
/// loop, in the order `on_new_epoch`, `on_epoch_training_result` per epoch.
/// Either callback may request a cooperative stop; the loop honors it at the
/// next checked boundary, never preemptively.
pub trait TrainingListener {
    /// Called before a new epoch starts.
    fn on_new_epoch(&mut self) -> ListenerResponse {
        ListenerResponse::Continue
    }

    /// Called when an epoch finished, with its result.
    #[allow(unused_variables)]
    fn on_epoch_training_result(&mut self, entry: &EpochResult) -> ListenerResponse {
        ListenerResponse::Continue
    }
}

/// An ordered set of listeners sharing one training loop.
#[derive(Default)]
pub struct TrainingListeners {
    listeners: Vec<Box<dyn TrainingListener + Send>>,
}

impl TrainingListeners {
    /// Constructs an empty set.
    pub fn new() -> Self {
        Self { listeners: vec![] }
    }

    /// Adds a listener.
    pub fn add(&mut self, listener: Box<dyn TrainingListener + Send>) {
        self.listeners.push(listener);
    }

    /// Notifies all listeners of a new epoch.
    ///
    /// Returns [`ListenerResponse::Stop`] if any listener requests a stop.
    /// All listeners are notified regardless.
    pub fn notify_new_epoch(&mut self) -> ListenerResponse {
        let mut response = ListenerResponse::Continue;
        for l in self.listeners.iter_mut() {
            if l.on_new_epoch() == ListenerResponse::Stop {
                response = ListenerResponse::Stop;
            }
        }
        response
    }

    /// Notifies all listeners of an epoch result.
    pub fn notify_epoch_training_result(&mut self, entry: &EpochResult) -> ListenerResponse {
        let mut response = ListenerResponse::Continue;
        for l in self.listeners.iter_mut() {
            if l.on_epoch_training_result(entry) == ListenerResponse::Stop {
                response = ListenerResponse::Stop;
            }
        }
        response
    }
}
