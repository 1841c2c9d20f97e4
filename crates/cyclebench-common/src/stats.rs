//! Online jitter statistics.
//!
//! Single-pass mean/min/max of the deviation between the nominal period and
//! each observed inter-sample interval. O(1) time and memory per sample:
//! the error stream itself is never retained, only an exact integer sum
//! plus the running extremes.

use crate::time::MonoTime;

/// Incremental jitter accumulator for one measurement run.
///
/// The first sample after construction only anchors the baseline; every
/// later sample contributes one error value `|period - delta|` where
/// `delta` is the interval since the previous sample.
#[derive(Debug, Clone)]
pub struct JitterStats {
    /// Nominal period between samples in nanoseconds.
    period_ns: u64,
    /// Timestamp of the previously recorded sample.
    prev: MonoTime,
    /// One-shot flag: set once the first sample has anchored the baseline.
    baseline_established: bool,
    /// Number of samples that contributed an error value.
    count: u64,
    /// Exact sum of error magnitudes, for ratio-based mean computation.
    error_sum_ns: u64,
    /// Smallest observed error, seeded with the period so the first real
    /// comparison can only lower it.
    min_error_ns: u64,
    /// Largest observed error, seeded below any recordable value.
    max_error_ns: u64,
}

impl JitterStats {
    /// Create an accumulator for the given nominal period, anchored at
    /// `baseline` (the clock reading taken when the run was armed).
    #[must_use]
    pub fn new(period_ns: u64, baseline: MonoTime) -> Self {
        Self {
            period_ns,
            prev: baseline,
            baseline_established: false,
            count: 0,
            error_sum_ns: 0,
            min_error_ns: period_ns,
            max_error_ns: 0,
        }
    }

    /// Record one sample timestamp.
    ///
    /// The first call after construction establishes the baseline and
    /// updates no statistics; each later call folds `|period - delta|`
    /// into the running mean/min/max. Deltas are full seconds+nanoseconds
    /// subtraction, saturating at zero, so periods of one second or more
    /// are handled correctly.
    ///
    /// Returns the sample as real-valued seconds for the timestamp buffer.
    pub fn record_sample(&mut self, now: MonoTime) -> f64 {
        if !self.baseline_established {
            self.prev = now;
            self.baseline_established = true;
            return now.as_secs_f64();
        }

        let delta_ns = now.saturating_ns_since(self.prev);
        self.prev = now;

        let error = self.period_ns.abs_diff(delta_ns);
        self.error_sum_ns = self.error_sum_ns.saturating_add(error);
        self.count += 1;
        self.min_error_ns = self.min_error_ns.min(error);
        self.max_error_ns = self.max_error_ns.max(error);

        now.as_secs_f64()
    }

    /// Number of samples that contributed an error value.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Nominal period in nanoseconds.
    #[must_use]
    pub fn period_ns(&self) -> u64 {
        self.period_ns
    }

    /// Summary of the run so far.
    ///
    /// Returns `None` until at least one inter-sample comparison has been
    /// recorded (a single-sample run has no interval to measure).
    #[must_use]
    pub fn report(&self) -> Option<JitterReport> {
        if self.count == 0 {
            return None;
        }
        Some(JitterReport {
            mean_error_ns: self.error_sum_ns as f64 / self.count as f64,
            min_error_ns: self.min_error_ns,
            max_error_ns: self.max_error_ns,
            count: self.count,
        })
    }
}

/// Immutable jitter summary for reporting.
///
/// All magnitudes are nanoseconds; unit conversion for display belongs to
/// the consuming sink.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JitterReport {
    /// Mean error magnitude.
    pub mean_error_ns: f64,
    /// Smallest error magnitude.
    pub min_error_ns: u64,
    /// Largest error magnitude.
    pub max_error_ns: u64,
    /// Number of contributing samples.
    pub count: u64,
}
