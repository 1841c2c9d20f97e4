//! cyclebench entry point.
//!
//! Parses arguments, resolves configuration, installs signal handlers,
//! runs the measurement on a dedicated real-time thread, and prints the
//! report from the main thread afterwards.

mod report;
mod signals;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use cyclebench_common::config::BenchConfig;
use cyclebench_runtime::clock::OsClock;
use cyclebench_runtime::driver::{RunOutcome, StopFlag};
use cyclebench_runtime::realtime::init_realtime;
use cyclebench_runtime::runner::Runner;

use crate::report::TextSink;

/// cyclebench command-line arguments.
#[derive(Parser, Debug)]
#[command(
    name = "cyclebench",
    about = "Cyclic executive scheduling-jitter benchmark for preemptible kernels",
    version,
    long_about = None
)]
struct Args {
    /// Nominal cycle period in whole milliseconds.
    period_ms: u64,

    /// Total number of sampling cycles.
    cycles: u64,

    /// Path to a configuration file (TOML).
    #[arg(long, short = 'c', value_name = "FILE")]
    config: Option<PathBuf>,

    /// Timestamp output file (overrides the config file).
    #[arg(long, short = 'o', value_name = "FILE")]
    output: Option<PathBuf>,

    /// Disable real-time setup (memory locking, scheduling class, affinity).
    #[arg(long)]
    no_realtime: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, short = 'l', default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level);

    info!(version = env!("CARGO_PKG_VERSION"), "starting cyclebench");

    let mut config = load_config(&args)?;

    // Positional arguments always override the [run] section.
    config.run.period = Duration::from_millis(args.period_ms);
    config.run.cycles = args.cycles;
    if let Some(path) = &args.output {
        config.output.timestamp_file = Some(path.clone());
    }
    if args.no_realtime {
        config.realtime.enabled = false;
    }
    config.validate().context("invalid configuration")?;

    info!(
        period = ?config.run.period,
        cycles = config.run.cycles,
        realtime = config.realtime.enabled,
        "configuration loaded"
    );

    let stop = StopFlag::new();
    signals::install(&stop).context("failed to install signal handlers")?;

    let (runner, outcome) = run_measurement(&config, stop)?;

    if outcome.stopped {
        warn!(completed = outcome.completed, "run stopped early by signal");
    }

    let mut sink = TextSink::new(config.output.timestamp_file.clone());
    runner.finish(&mut sink).context("failed to emit report")?;

    info!("cyclebench complete");
    Ok(())
}

/// Initialize logging with the specified log level.
fn init_logging(level: &str) {
    let filter = format!("cyclebench={level},cyclebench_runtime={level},cyclebench_common={level}");

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&filter)),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();
}

/// Load configuration from file or use defaults.
///
/// Resolution priority (first existing file wins):
/// 1. Command-line `--config` argument
/// 2. `CYCLEBENCH_CONFIG` environment variable
/// 3. `config/default.toml` (local development)
/// 4. Built-in defaults
fn load_config(args: &Args) -> Result<BenchConfig> {
    if let Some(config_path) = &args.config {
        info!(?config_path, "loading config from command-line argument");
        return BenchConfig::from_file(config_path)
            .with_context(|| format!("failed to load config from {}", config_path.display()));
    }

    if let Ok(env_path) = std::env::var("CYCLEBENCH_CONFIG") {
        let config_path = PathBuf::from(&env_path);
        if config_path.exists() {
            info!(?config_path, "loading config from CYCLEBENCH_CONFIG");
            return BenchConfig::from_file(&config_path).with_context(|| {
                format!("failed to load config from CYCLEBENCH_CONFIG={env_path}")
            });
        }
        warn!(
            path = %env_path,
            "CYCLEBENCH_CONFIG set but file does not exist, checking other locations"
        );
    }

    let local_path = PathBuf::from("config/default.toml");
    if local_path.exists() {
        info!(?local_path, "loading config from local path");
        return BenchConfig::from_file(&local_path)
            .with_context(|| format!("failed to load config from {}", local_path.display()));
    }

    info!("no config file found, using built-in defaults");
    Ok(BenchConfig::default())
}

/// Execute the sampling loop on a dedicated thread.
///
/// Real-time setup only affects the calling thread, so the whole chain
/// (setup, runner construction, execution) lives on one named thread whose
/// stack is sized to cover the configured pre-fault. The runner comes back
/// to the caller for reporting at normal priority.
fn run_measurement(config: &BenchConfig, stop: StopFlag) -> Result<(Runner<OsClock>, RunOutcome)> {
    const MIN_STACK: usize = 2 * 1024 * 1024;

    let realtime = config.realtime.clone();
    let run = config.run.clone();
    let stack_size = MIN_STACK.max(realtime.prefault_stack_size.saturating_add(1024 * 1024));

    let handle = std::thread::Builder::new()
        .name("cyclebench-rt".to_string())
        .stack_size(stack_size)
        .spawn(move || -> Result<(Runner<OsClock>, RunOutcome)> {
            let status = init_realtime(&realtime)?;
            if realtime.enabled && status.priority.is_none() {
                warn!("running without elevated priority; expect scheduler noise in the results");
            }

            let mut runner = Runner::new(OsClock::new(), &run)?;
            runner.set_stop_flag(stop);
            let outcome = runner.execute()?;
            Ok((runner, outcome))
        })
        .context("failed to spawn measurement thread")?;

    handle
        .join()
        .map_err(|_| anyhow::anyhow!("measurement thread panicked"))?
}
