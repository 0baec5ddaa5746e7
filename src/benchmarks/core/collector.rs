use std::time::{Duration, Instant};

use super::benchmark_result::Aggregate;
use crate::{BenchmarkError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectorState {
    Idle,
    Running,
}

/// Start/stop timer that accumulates one sample per bracketed section.
///
/// Samples are taken from [`Instant`], so they are monotonic and never negative.
#[derive(Debug, Default)]
pub struct MetricCollector {
    started_at: Option<Instant>,
    samples: Vec<Duration>,
}

impl MetricCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CollectorState {
        match self.started_at {
            Some(_) => CollectorState::Running,
            None => CollectorState::Idle,
        }
    }

    pub fn start(&mut self) -> Result<()> {
        if self.started_at.is_some() {
            return Err(self.state_error(CollectorState::Idle));
        }
        self.started_at = Some(Instant::now());
        Ok(())
    }

    /// Ends the timed section and returns the recorded sample.
    pub fn stop(&mut self) -> Result<Duration> {
        let Some(started_at) = self.started_at.take() else {
            return Err(self.state_error(CollectorState::Running));
        };
        let elapsed = started_at.elapsed();
        self.samples.push(elapsed);
        Ok(elapsed)
    }

    pub fn samples(&self) -> &[Duration] {
        &self.samples
    }

    pub fn last_sample(&self) -> Option<Duration> {
        self.samples.last().copied()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Appends the samples of another idle collector, keeping their order.
    pub fn absorb(&mut self, other: MetricCollector) -> Result<()> {
        self.ensure_idle()?;
        other.ensure_idle()?;
        self.samples.extend(other.samples);
        Ok(())
    }

    pub fn aggregate(&self) -> Result<Aggregate> {
        self.ensure_idle()?;
        Ok(Aggregate::from_samples(&self.samples))
    }

    fn ensure_idle(&self) -> Result<()> {
        match self.state() {
            CollectorState::Idle => Ok(()),
            CollectorState::Running => Err(self.state_error(CollectorState::Idle)),
        }
    }

    fn state_error(&self, expected: CollectorState) -> BenchmarkError {
        BenchmarkError::CollectorState {
            expected,
            actual: self.state(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_samples(samples: Vec<Duration>) -> Self {
        Self {
            started_at: None,
            samples,
        }
    }
}
