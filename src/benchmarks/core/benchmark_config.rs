use std::time::Duration;

/// Configuration for how the runner drives iterations
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub cooldown_between_iterations: Duration,
    /// Upper bound on waiting for a unit of work before the run is aborted
    pub acquire_timeout: Duration,
    pub show_progress: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            cooldown_between_iterations: Duration::ZERO,
            acquire_timeout: Duration::from_secs(5),
            show_progress: true,
        }
    }
}

impl RunnerConfig {
    /// Quiet configuration for tests and embedding.
    pub fn quiet() -> Self {
        Self {
            show_progress: false,
            ..Self::default()
        }
    }
}
