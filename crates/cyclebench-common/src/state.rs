//! Run lifecycle state machine.
//!
//! A measurement run moves strictly forward:
//! UNINITIALIZED → READY → RUNNING → DONE
//!
//! There is no error-recovery state: configuration failures are fatal
//! before the run starts, and a finished driver is never re-armed.

use crate::error::{BenchError, BenchResult};
use std::fmt;

/// Lifecycle states for a measurement run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RunState {
    /// Constructed but not yet armed with a period and baseline.
    #[default]
    Uninitialized,
    /// Deadline seeded; ready to execute exactly one run.
    Ready,
    /// The cyclic loop is executing.
    Running,
    /// The run completed (or was cooperatively stopped).
    Done,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "UNINITIALIZED"),
            Self::Ready => write!(f, "READY"),
            Self::Running => write!(f, "RUNNING"),
            Self::Done => write!(f, "DONE"),
        }
    }
}

impl RunState {
    /// Check if a transition to `target` is valid from the current state.
    #[must_use]
    pub fn can_transition_to(&self, target: RunState) -> bool {
        use RunState::{Done, Ready, Running, Uninitialized};

        matches!(
            (self, target),
            (Uninitialized, Ready) | (Ready, Running) | (Running, Done)
        )
    }

    /// Returns true once the run has finished.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }
}

/// State machine wrapper enforcing the straight-line lifecycle.
#[derive(Debug, Clone, Default)]
pub struct StateMachine {
    current: RunState,
    previous: Option<RunState>,
}

impl StateMachine {
    /// Create a new state machine starting in UNINITIALIZED.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current state.
    #[must_use]
    pub fn state(&self) -> RunState {
        self.current
    }

    /// Get the previous state (if any transition occurred).
    #[must_use]
    pub fn previous_state(&self) -> Option<RunState> {
        self.previous
    }

    /// Attempt a state transition.
    pub fn transition(&mut self, target: RunState) -> BenchResult<()> {
        if self.current.can_transition_to(target) {
            self.previous = Some(self.current);
            self.current = target;
            Ok(())
        } else {
            Err(BenchError::State {
                from: self.current,
                to: target,
            })
        }
    }
}
