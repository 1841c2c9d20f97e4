//! Wall-clock acceptance runs against the real monotonic clock.
//!
//! The unprivileged tests keep periods short and assert only structural
//! properties, since jitter on a loaded CI machine is unbounded. The
//! ignored tests exercise the privileged real-time path and are meant to
//! be run manually on an RT-configured machine:
//!
//! ```text
//! sudo -E cargo test --test acceptance_tests -- --ignored --nocapture
//! ```

use cyclebench_common::config::RealtimeConfig;
use cyclebench_runtime::clock::OsClock;
use cyclebench_runtime::realtime::{init_realtime, kernel_is_preempt_rt};
use cyclebench_runtime::runner::Runner;

use super::common::{bench_config, is_root, CollectingSink};

#[test]
fn test_short_wallclock_run_completes() {
    let config = bench_config(10, 5);
    let mut runner = Runner::new(OsClock::new(), &config.run).expect("runner construction");

    let outcome = runner.execute().expect("wall-clock run");
    assert_eq!(outcome.completed, 5);
    assert!(!outcome.stopped);

    let mut sink = CollectingSink::default();
    runner.finish(&mut sink).expect("report emission");

    assert_eq!(sink.timestamps.len(), 5);
    let report = sink.report.expect("five samples give four comparisons");
    assert_eq!(report.count, 4);

    // Structural sanity only; magnitudes depend on machine load.
    assert!(report.min_error_ns <= report.max_error_ns);
    assert!(report.mean_error_ns >= report.min_error_ns as f64);
    assert!(report.mean_error_ns <= report.max_error_ns as f64);
}

#[test]
fn test_wallclock_timestamps_are_monotonic() {
    let config = bench_config(5, 6);
    let mut runner = Runner::new(OsClock::new(), &config.run).expect("runner construction");
    runner.execute().expect("wall-clock run");

    let mut sink = CollectingSink::default();
    runner.finish(&mut sink).expect("report emission");

    for pair in sink.timestamps.windows(2) {
        assert!(pair[1] > pair[0], "timestamps must strictly increase");
    }
}

/// Full privileged run: locked memory, SCHED_RR, CPU pin.
#[test]
#[ignore = "requires root (CAP_SYS_NICE, CAP_IPC_LOCK); run on an RT machine"]
fn test_privileged_realtime_run() {
    if !is_root() {
        eprintln!("Skipping test: not running as root");
        return;
    }

    println!("PREEMPT_RT kernel: {}", kernel_is_preempt_rt());

    let rt_config = RealtimeConfig {
        strict: true,
        ..RealtimeConfig::default()
    };
    let status = init_realtime(&rt_config).expect("privileged real-time setup");
    println!("Real-time status: {status:?}");
    assert!(status.memory_locked);
    assert!(status.priority.is_some());

    let config = bench_config(1, 1_000);
    let mut runner = Runner::new(OsClock::new(), &config.run).expect("runner construction");
    let outcome = runner.execute().expect("privileged run");
    assert_eq!(outcome.completed, 1_000);

    let mut sink = CollectingSink::default();
    runner.finish(&mut sink).expect("report emission");
    let report = sink.report.expect("comparisons recorded");

    println!("Results ({} comparisons):", report.count);
    println!("  Mean: {:.2} us", report.mean_error_ns / 1_000.0);
    println!("  Min:  {:.2} us", report.min_error_ns as f64 / 1_000.0);
    println!("  Max:  {:.2} us", report.max_error_ns as f64 / 1_000.0);
}
