//! Deterministic acceptance runs over a scripted clock.
//!
//! Every expectation here is exact: the clock only moves when the script
//! says so, which pins down the jitter math, the deadline grid, and the
//! interruption and stop behavior without any tolerance bands.

use cyclebench_common::config::BenchConfig;
use cyclebench_common::time::MonoTime;
use cyclebench_runtime::clock::ManualClock;
use cyclebench_runtime::driver::StopFlag;

use super::common::{bench_config, execute_run};

const MS: u64 = 1_000_000;

#[test]
fn test_exact_clock_reports_zero_jitter() {
    let config = bench_config(1, 50);
    let start = MonoTime::new(1_234, 500_000_000);
    let run = execute_run(ManualClock::stepping(start, MS), &config, None);

    assert_eq!(run.outcome.completed, 50);
    assert!(!run.outcome.stopped);

    let report = run.report.expect("50 samples give 49 comparisons");
    assert_eq!(report.count, 49);
    assert_eq!(report.mean_error_ns, 0.0);
    assert_eq!(report.min_error_ns, 0);
    assert_eq!(report.max_error_ns, 0);
}

#[test]
fn test_ten_ms_five_cycle_contract() {
    // Full chain from TOML configuration to report.
    let config = BenchConfig::from_toml(
        r#"
        [run]
        period = "10ms"
        cycles = 5

        [realtime]
        enabled = false
        "#,
    )
    .expect("inline config parses");
    config.validate().expect("inline config is valid");

    let start = MonoTime::new(100, 0);
    let run = execute_run(ManualClock::stepping(start, 10 * MS), &config, None);

    assert_eq!(run.outcome.completed, 5);
    assert_eq!(run.timestamps.len(), 5);

    // Consecutive timestamps are 10 ms apart.
    for pair in run.timestamps.windows(2) {
        assert!((pair[1] - pair[0] - 0.01).abs() < 1e-9);
    }

    // Requested deadlines sit on the grid anchored at the baseline.
    let expected: Vec<MonoTime> = (1..=5).map(|k| start.advanced_by(k * 10 * MS)).collect();
    assert_eq!(run.sleep_targets, expected);

    let report = run.report.expect("five samples give four comparisons");
    assert_eq!(report.count, 4);
    assert_eq!(report.max_error_ns, 0);
}

#[test]
fn test_single_late_wakeup_sets_extremes() {
    // One wakeup lands half a period late and the next sample is back on
    // the grid, so one interval is 1.5 periods and the following one 0.5.
    let period = 10 * MS;
    let times = vec![
        MonoTime::ZERO,
        MonoTime::from_nanos(period),
        MonoTime::from_nanos(2 * period + period / 2),
        MonoTime::from_nanos(3 * period),
        MonoTime::from_nanos(4 * period),
    ];
    let config = bench_config(10, 4);
    let run = execute_run(ManualClock::scripted(times), &config, None);

    let report = run.report.expect("four samples give three comparisons");
    assert_eq!(report.count, 3);
    assert_eq!(report.max_error_ns, period / 2);
    assert_eq!(report.min_error_ns, 0);
    // Two disturbed intervals of p/2 each, one exact.
    let expected_mean = (period as f64) / 3.0;
    assert!((report.mean_error_ns - expected_mean).abs() < 1e-6);
}

#[test]
fn test_deadline_grid_has_no_drift_over_long_run() {
    let cycles = 100_000u64;
    let config = bench_config(1, cycles);
    let start = MonoTime::new(7, 999_999_999);
    let run = execute_run(ManualClock::stepping(start, MS), &config, None);

    assert_eq!(run.outcome.completed, cycles);
    assert_eq!(run.sleep_targets.len(), cycles as usize);
    // The last requested deadline is exactly baseline + n * period; any
    // accumulation error would show up here.
    assert_eq!(
        *run.sleep_targets.last().expect("non-empty"),
        start.advanced_by(cycles * MS)
    );

    let report = run.report.expect("long run has comparisons");
    assert_eq!(report.count, cycles - 1);
    assert_eq!(report.max_error_ns, 0);
}

#[test]
fn test_interrupted_waits_do_not_skew_results() {
    let config = bench_config(10, 4);
    let mut clock = ManualClock::stepping(MonoTime::ZERO, 10 * MS);
    clock.inject_interrupts(3);
    let run = execute_run(clock, &config, None);

    // Three extra waits, all retrying the first deadline.
    assert_eq!(run.sleep_targets.len(), 4 + 3);
    let first = MonoTime::from_nanos(10 * MS);
    assert_eq!(&run.sleep_targets[..4], &[first, first, first, first]);

    // The measurement itself is untouched.
    assert_eq!(run.outcome.completed, 4);
    let report = run.report.expect("comparisons recorded");
    assert_eq!(report.mean_error_ns, 0.0);
    assert_eq!(report.max_error_ns, 0);
}

#[test]
fn test_pre_run_stop_reports_empty_run() {
    let config = bench_config(10, 1_000);
    let stop = StopFlag::new();
    stop.request_stop();

    let run = execute_run(
        ManualClock::stepping(MonoTime::ZERO, 10 * MS),
        &config,
        Some(stop),
    );

    assert_eq!(run.outcome.completed, 0);
    assert!(run.outcome.stopped);
    assert!(run.report.is_none());
    assert!(run.timestamps.is_empty());
    assert!(run.sleep_targets.is_empty());
}
