//! Common utilities for acceptance tests.

use std::time::Duration;

use cyclebench_common::config::BenchConfig;
use cyclebench_common::error::BenchResult;
use cyclebench_common::stats::JitterReport;
use cyclebench_common::time::MonoTime;
use cyclebench_runtime::clock::ManualClock;
use cyclebench_runtime::driver::{RunOutcome, StopFlag};
use cyclebench_runtime::runner::{ReportSink, Runner};

/// Build a validated configuration for the given run parameters, with
/// real-time setup disabled so tests run unprivileged.
pub fn bench_config(period_ms: u64, cycles: u64) -> BenchConfig {
    let mut config = BenchConfig::default();
    config.run.period = Duration::from_millis(period_ms);
    config.run.cycles = cycles;
    config.realtime.enabled = false;
    config.validate().expect("test configuration must be valid");
    config
}

/// Sink that captures what the runner hands it.
#[derive(Default)]
pub struct CollectingSink {
    pub report: Option<JitterReport>,
    pub timestamps: Vec<f64>,
    pub emitted: bool,
}

impl ReportSink for CollectingSink {
    fn emit(&mut self, report: Option<&JitterReport>, timestamps: &[f64]) -> BenchResult<()> {
        self.report = report.copied();
        self.timestamps = timestamps.to_vec();
        self.emitted = true;
        Ok(())
    }
}

/// Everything observable from one finished synthetic run.
pub struct SynthRun {
    pub outcome: RunOutcome,
    pub report: Option<JitterReport>,
    pub timestamps: Vec<f64>,
    pub sleep_targets: Vec<MonoTime>,
}

/// Run the full chain (construct, execute, finish) over a scripted clock.
pub fn execute_run(clock: ManualClock, config: &BenchConfig, stop: Option<StopFlag>) -> SynthRun {
    let mut runner = Runner::new(clock, &config.run).expect("runner construction");
    if let Some(stop) = stop {
        runner.set_stop_flag(stop);
    }
    let outcome = runner.execute().expect("run execution");
    let sleep_targets = runner.driver().clock().sleep_targets().to_vec();

    let mut sink = CollectingSink::default();
    runner.finish(&mut sink).expect("report emission");
    assert!(sink.emitted, "finish must hand results to the sink");

    SynthRun {
        outcome,
        report: sink.report,
        timestamps: sink.timestamps,
        sleep_targets,
    }
}

/// True when the process can realistically elevate scheduling priority.
pub fn is_root() -> bool {
    // SAFETY: geteuid has no preconditions and no side effects.
    unsafe { libc::geteuid() == 0 }
}
