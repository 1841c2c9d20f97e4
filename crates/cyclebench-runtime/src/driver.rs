//! Cyclic executive driver.
//!
//! Runs a sampling callback on a strict time base. The next deadline is
//! always the previous deadline plus exactly one period, computed before
//! sleeping, and the sleep is an absolute wait on that deadline. Callback
//! duration and wakeup latency therefore shift individual samples but never
//! accumulate into drift.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, trace};

use cyclebench_common::error::{BenchError, BenchResult};
use cyclebench_common::state::{RunState, StateMachine};
use cyclebench_common::time::MonoTime;

use crate::clock::{MonotonicClock, WaitResult};

/// Shared cooperative stop signal.
///
/// The driver checks it once per iteration, at the cycle boundary before
/// advancing the deadline. A stop request therefore never lands mid-sample
/// and the statistics stay consistent.
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the run to end at the next cycle boundary.
    pub fn request_stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// True once a stop has been requested.
    #[must_use]
    pub fn stop_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    /// Number of cycles that completed, i.e. sampling callbacks that fired.
    pub completed: u64,
    /// Whether a stop request ended the run before the requested count.
    pub stopped: bool,
}

/// Drives a fixed-period sampling loop over a [`MonotonicClock`].
///
/// Lifecycle is strictly forward: construct, [`initialize`], [`run_cycles`]
/// once. A finished driver cannot be re-armed; build a new one for the next
/// run.
///
/// [`initialize`]: CycleDriver::initialize
/// [`run_cycles`]: CycleDriver::run_cycles
#[derive(Debug)]
pub struct CycleDriver<C: MonotonicClock> {
    clock: C,
    state: StateMachine,
    period_ns: u64,
    deadline: MonoTime,
    stop: StopFlag,
}

impl<C: MonotonicClock> CycleDriver<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            state: StateMachine::new(),
            period_ns: 0,
            deadline: MonoTime::ZERO,
            stop: StopFlag::new(),
        }
    }

    /// Replace the driver's stop flag with a shared one.
    pub fn set_stop_flag(&mut self, stop: StopFlag) {
        self.stop = stop;
    }

    #[must_use]
    pub fn state(&self) -> RunState {
        self.state.state()
    }

    #[must_use]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Arm the driver: validate the period, seed the deadline with the
    /// current monotonic time, and return that baseline reading.
    ///
    /// # Errors
    ///
    /// [`BenchError::Config`] for a zero period, [`BenchError::Clock`] if the
    /// clock cannot be read, [`BenchError::State`] if the driver was already
    /// armed.
    pub fn initialize(&mut self, period_ns: u64) -> BenchResult<MonoTime> {
        if period_ns == 0 {
            return Err(BenchError::Config("cycle period must be positive".to_string()));
        }
        let baseline = self.clock.now()?;
        self.state.transition(RunState::Ready)?;
        self.period_ns = period_ns;
        self.deadline = baseline;

        info!(period_ns, "cyclic driver armed");
        Ok(baseline)
    }

    /// Run up to `count` cycles, invoking `on_sample` with the cycle index
    /// and the post-wakeup clock reading after each deadline.
    ///
    /// Per iteration, in order: check the stop flag, advance the deadline by
    /// one period, sleep until the deadline, read the clock, invoke the
    /// callback. A callback error aborts the run immediately and leaves the
    /// driver in [`RunState::Running`].
    ///
    /// # Errors
    ///
    /// [`BenchError::State`] unless the driver is armed and unused; clock and
    /// callback errors are propagated as-is.
    pub fn run_cycles<F>(&mut self, count: u64, mut on_sample: F) -> BenchResult<RunOutcome>
    where
        F: FnMut(u64, MonoTime) -> BenchResult<()>,
    {
        self.state.transition(RunState::Running)?;
        debug!(count, period_ns = self.period_ns, "starting sampling loop");

        let mut outcome = RunOutcome {
            completed: 0,
            stopped: false,
        };

        for cycle in 0..count {
            if self.stop.stop_requested() {
                info!(completed = outcome.completed, "stop requested, ending run early");
                outcome.stopped = true;
                break;
            }

            self.deadline.advance(self.period_ns);
            self.wait_for_deadline()?;

            let now = self.clock.now()?;
            on_sample(cycle, now)?;
            outcome.completed += 1;

            trace!(cycle, "sample recorded");
        }

        self.state.transition(RunState::Done)?;
        Ok(outcome)
    }

    /// Block until the current deadline. An interrupted wait is retried
    /// against the same deadline; waking early would be counted as jitter.
    fn wait_for_deadline(&mut self) -> BenchResult<()> {
        loop {
            match self.clock.sleep_until(self.deadline)? {
                WaitResult::Elapsed => return Ok(()),
                WaitResult::Interrupted => {
                    debug!("wait interrupted by signal, re-waiting on same deadline");
                }
            }
        }
    }
}
