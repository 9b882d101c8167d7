//! Ring buffer of transitions.
use super::ReplayBufferConfig;
use rand::{rngs::StdRng, RngCore, SeedableRng};

/// One recorded interaction `(o_t, a_t, r_t, done_t, o_t+1)`.
///
/// The reward is already scaled by the configured reward factor when the
/// transition is built. Transitions are immutable once stored and owned by
/// the buffer.
#[derive(Clone, Debug)]
pub struct Transition<O> {
    /// Observation before the step.
    pub obs: O,

    /// Action taken.
    pub action: usize,

    /// Accumulated scaled reward.
    pub reward: f32,

    /// Flag denoting if the episode ended with this step.
    pub is_terminal: bool,

    /// Observation after the step.
    pub next_obs: O,
}

/// A bounded, insertion-ordered buffer of [`Transition`]s.
///
/// Once the capacity is reached, storing evicts the oldest entry, so the
/// buffer always holds the most recently stored transitions.
pub struct ReplayBuffer<O> {
    capacity: usize,
    i: usize,
    transitions: Vec<Transition<O>>,
    rng: StdRng,
}

impl<O: Clone> ReplayBuffer<O> {
    /// Builds a replay buffer from the given configuration.
    pub fn build(config: &ReplayBufferConfig) -> Self {
        Self {
            capacity: config.capacity,
            i: 0,
            transitions: Vec::with_capacity(config.capacity),
            rng: StdRng::seed_from_u64(config.seed),
        }
    }

    /// Stores a transition, evicting the oldest entry when full.
    pub fn store(&mut self, tr: Transition<O>) {
        if self.transitions.len() < self.capacity {
            self.transitions.push(tr);
        } else {
            self.transitions[self.i] = tr;
        }
        self.i = (self.i + 1) % self.capacity;
    }

    /// Samples up to `size` transitions, drawn with replacement.
    ///
    /// When fewer transitions are stored, all available ones are eligible
    /// and the batch is short.
    pub fn sample_batch(&mut self, size: usize) -> Vec<Transition<O>> {
        let n = size.min(self.transitions.len());
        (0..n)
            .map(|_| {
                let ix = (self.rng.next_u32() as usize) % self.transitions.len();
                self.transitions[ix].clone()
            })
            .collect()
    }

    /// The number of stored transitions.
    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    /// Returns `true` if nothing has been stored yet.
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transition(k: usize) -> Transition<usize> {
        Transition {
            obs: k,
            action: 0,
            reward: k as f32,
            is_terminal: false,
            next_obs: k + 1,
        }
    }

    fn buffer(capacity: usize) -> ReplayBuffer<usize> {
        ReplayBuffer::build(&ReplayBufferConfig::default().capacity(capacity))
    }

    #[test]
    fn holds_the_most_recent_transitions() {
        let capacity = 8;
        let mut buffer = buffer(capacity);
        for k in 0..30 {
            buffer.store(transition(k));
        }

        assert_eq!(buffer.len(), capacity);
        let mut stored: Vec<_> = buffer.transitions.iter().map(|tr| tr.obs).collect();
        stored.sort_unstable();
        assert_eq!(stored, (22..30).collect::<Vec<_>>());
    }

    #[test]
    fn sample_batch_is_bounded_by_len() {
        let mut buffer = buffer(100);
        for k in 0..5 {
            buffer.store(transition(k));
        }

        assert_eq!(buffer.sample_batch(3).len(), 3);
        assert_eq!(buffer.sample_batch(32).len(), 5);
        for tr in buffer.sample_batch(32) {
            assert!(tr.obs < 5);
        }
    }

    #[test]
    fn sampling_an_empty_buffer_yields_nothing() {
        let mut buffer = buffer(4);
        assert!(buffer.is_empty());
        assert!(buffer.sample_batch(8).is_empty());
    }
}
