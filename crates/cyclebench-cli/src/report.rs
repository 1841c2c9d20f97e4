//! Text report output.
//!
//! Renders the jitter summary in microseconds followed by the raw
//! per-cycle timestamps in seconds. The byte format is stable; downstream
//! plot scripts parse it line by line.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use tracing::{debug, warn};

use cyclebench_common::error::{BenchError, BenchResult};
use cyclebench_common::stats::JitterReport;
use cyclebench_runtime::runner::ReportSink;

const NANOS_PER_MICRO: f64 = 1_000.0;

/// Write the summary block and timestamp list to `out`.
///
/// Errors are in nanoseconds internally and printed as microseconds with
/// two decimals, zero-padded to match the historical format. Timestamps
/// print with five decimals, one per line.
pub fn write_report<W: Write>(
    out: &mut W,
    report: Option<&JitterReport>,
    timestamps: &[f64],
) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "# Statistics #")?;
    match report {
        Some(r) => {
            writeln!(
                out,
                "Average Error: {:05.2} us",
                r.mean_error_ns / NANOS_PER_MICRO
            )?;
            writeln!(
                out,
                "Min Error: {:05.2} us",
                r.min_error_ns as f64 / NANOS_PER_MICRO
            )?;
            writeln!(
                out,
                "Max Error: {:05.2} us",
                r.max_error_ns as f64 / NANOS_PER_MICRO
            )?;
        }
        None => {
            writeln!(out, "No intervals recorded")?;
        }
    }
    writeln!(out)?;
    writeln!(out, "# Timestamps #")?;
    for t in timestamps {
        writeln!(out, "{t:.5}")?;
    }
    Ok(())
}

/// Sink that prints the report to stdout and duplicates it to an optional
/// file.
///
/// Stdout always gets the report. A timestamp file that cannot be created
/// or written costs a warning, never the run's output.
pub struct TextSink {
    file: Option<PathBuf>,
}

impl TextSink {
    #[must_use]
    pub fn new(file: Option<PathBuf>) -> Self {
        Self { file }
    }
}

impl ReportSink for TextSink {
    fn emit(&mut self, report: Option<&JitterReport>, timestamps: &[f64]) -> BenchResult<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        write_report(&mut out, report, timestamps)
            .and_then(|()| out.flush())
            .map_err(|e| BenchError::Io(format!("writing report to stdout: {e}")))?;

        if let Some(path) = &self.file {
            match File::create(path) {
                Ok(file) => {
                    let mut writer = BufWriter::new(file);
                    match write_report(&mut writer, report, timestamps)
                        .and_then(|()| writer.flush())
                    {
                        Ok(()) => debug!(path = %path.display(), "timestamp file written"),
                        Err(e) => warn!(
                            path = %path.display(),
                            error = %e,
                            "failed writing timestamp file; stdout report is complete"
                        ),
                    }
                }
                Err(e) => warn!(
                    path = %path.display(),
                    error = %e,
                    "could not create timestamp file; stdout report is complete"
                ),
            }
        }
        Ok(())
    }
}
