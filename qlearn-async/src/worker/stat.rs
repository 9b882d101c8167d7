use std::time::Duration;

/// Stats of the rollout loop in each [`AsyncWorker`](crate::AsyncWorker).
#[derive(Clone, Debug)]
pub struct WorkerStat {
    /// The number of steps for interaction between agent and env.
    pub env_steps: usize,

    /// Duration of the rollout loop in the worker.
    pub duration: Duration,
}

/// Returns a formatted string of the set of [`WorkerStat`]s for reporting.
pub fn workers_stat_fmt(stats: &[WorkerStat]) -> String {
    let mut s = "worker id, steps, duration [sec], steps per sec\n".to_string();
    for (i, stat) in stats.iter().enumerate() {
        let n = stat.env_steps;
        let d = stat.duration.as_secs_f32();
        let p = (n as f32) / d;
        s += format!("{}, {}, {}, {}\n", i, n, d, p).as_str();
    }
    s
}
