//! Run coordination.
//!
//! [`Runner`] owns one measurement end to end: it validates the run
//! parameters, pre-sizes the timestamp buffer, arms the driver, feeds every
//! sample into the jitter statistics, and finally hands the results to a
//! [`ReportSink`]. The statistics baseline is the same clock reading that
//! seeds the driver's deadline, so sample deltas and deadlines share one
//! time origin.

use tracing::{debug, info};

use cyclebench_common::config::RunConfig;
use cyclebench_common::error::{BenchError, BenchResult};
use cyclebench_common::state::RunState;
use cyclebench_common::stats::{JitterReport, JitterStats};

use crate::buffer::TimestampBuffer;
use crate::clock::MonotonicClock;
use crate::driver::{CycleDriver, RunOutcome, StopFlag};

/// Destination for a finished run's summary and raw samples.
pub trait ReportSink {
    /// Emit the jitter summary and the ordered per-cycle timestamps.
    ///
    /// `report` is `None` when the run produced no inter-sample comparison
    /// (zero or one completed cycle).
    fn emit(&mut self, report: Option<&JitterReport>, timestamps: &[f64]) -> BenchResult<()>;
}

/// Owns one measurement run from configuration to report.
#[derive(Debug)]
pub struct Runner<C: MonotonicClock> {
    driver: CycleDriver<C>,
    stats: Option<JitterStats>,
    timestamps: TimestampBuffer,
    period_ns: u64,
    cycles: u64,
}

impl<C: MonotonicClock> Runner<C> {
    /// Validate the run parameters and pre-size the timestamp buffer.
    ///
    /// # Errors
    ///
    /// [`BenchError::Config`] for invalid parameters,
    /// [`BenchError::Allocation`] if the buffer cannot be reserved.
    pub fn new(clock: C, config: &RunConfig) -> BenchResult<Self> {
        config.validate()?;
        let capacity = usize::try_from(config.cycles).map_err(|_| {
            BenchError::Config(format!(
                "cycle count {} exceeds addressable memory",
                config.cycles
            ))
        })?;
        let timestamps = TimestampBuffer::with_capacity(capacity)?;

        Ok(Self {
            driver: CycleDriver::new(clock),
            stats: None,
            timestamps,
            period_ns: config.period_ns(),
            cycles: config.cycles,
        })
    }

    /// Share a cooperative stop flag with the driver.
    pub fn set_stop_flag(&mut self, stop: StopFlag) {
        self.driver.set_stop_flag(stop);
    }

    /// Borrow the driver, and through it the clock.
    #[must_use]
    pub fn driver(&self) -> &CycleDriver<C> {
        &self.driver
    }

    /// Execute the sampling loop to completion or cooperative stop.
    ///
    /// # Errors
    ///
    /// Propagates driver, clock, and buffer errors. A failed run leaves the
    /// runner unfit for [`Runner::finish`]; there is no partial recovery.
    pub fn execute(&mut self) -> BenchResult<RunOutcome> {
        let baseline = self.driver.initialize(self.period_ns)?;
        let mut stats = JitterStats::new(self.period_ns, baseline);
        let timestamps = &mut self.timestamps;

        debug!(cycles = self.cycles, period_ns = self.period_ns, "executing run");

        let outcome = self.driver.run_cycles(self.cycles, |_, now| {
            let elapsed = stats.record_sample(now);
            timestamps.push(elapsed)
        })?;

        self.stats = Some(stats);

        info!(
            completed = outcome.completed,
            stopped = outcome.stopped,
            "run finished"
        );
        Ok(outcome)
    }

    /// Hand the summary and raw samples to `sink`, consuming the run.
    ///
    /// # Errors
    ///
    /// [`BenchError::State`] unless [`Runner::execute`] ran to a completed
    /// state first; sink errors are propagated.
    pub fn finish(self, sink: &mut dyn ReportSink) -> BenchResult<()> {
        if self.driver.state() != RunState::Done {
            return Err(BenchError::State {
                from: self.driver.state(),
                to: RunState::Done,
            });
        }
        let report = self.stats.as_ref().and_then(JitterStats::report);
        sink.emit(report.as_ref(), self.timestamps.as_slice())
    }
}
