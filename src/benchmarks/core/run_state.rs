use std::fmt;

use serde::Serialize;

/// Which loop an iteration belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Warmup,
    Measured,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Warmup => write!(f, "warmup"),
            Phase::Measured => write!(f, "measured"),
        }
    }
}

/// Lifecycle of a single test definition run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    SettingUp,
    Warmup,
    Measuring,
    Reporting,
    Done,
    Aborted,
}

impl RunState {
    pub fn can_transition_to(self, next: RunState) -> bool {
        use RunState::*;
        matches!(
            (self, next),
            (NotStarted, SettingUp)
                | (SettingUp, Warmup)
                | (Warmup, Measuring)
                | (Measuring, Reporting)
                | (Reporting, Done)
                | (SettingUp | Warmup | Measuring, Aborted)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Done | RunState::Aborted)
    }
}

/// Tracks the run state of one benchmark and logs every transition.
#[derive(Debug)]
pub(crate) struct RunTracker<'a> {
    benchmark: &'a str,
    state: RunState,
}

impl<'a> RunTracker<'a> {
    pub(crate) fn new(benchmark: &'a str) -> Self {
        Self {
            benchmark,
            state: RunState::NotStarted,
        }
    }

    pub(crate) fn state(&self) -> RunState {
        self.state
    }

    pub(crate) fn advance(&mut self, next: RunState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid run transition {:?} -> {:?}",
            self.state,
            next
        );
        tracing::debug!(
            target: "update_pipeline_bench::benchmarks::runner",
            "{}: {:?} -> {:?}",
            self.benchmark,
            self.state,
            next
        );
        self.state = next;
    }
}
