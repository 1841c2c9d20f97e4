//! Monotonic time arithmetic.
//!
//! `MonoTime` is a seconds + nanoseconds fixed-point timestamp matching the
//! layout of a kernel `timespec`. It serves both as a sample timestamp and
//! as the driver's absolute deadline, so deadline advancement is exact
//! integer arithmetic with no floating-point rounding and no drift.

/// Nanoseconds in one second.
pub const NANOS_PER_SEC: u64 = 1_000_000_000;

/// A monotonic timestamp with explicit second and nanosecond components.
///
/// Invariant: the nanosecond component is always in `[0, NANOS_PER_SEC)`.
/// Addition carries overflow into the seconds field, which keeps the
/// derived `Ord` lexicographic comparison correct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct MonoTime {
    sec: i64,
    nsec: u32,
}

impl MonoTime {
    /// The zero timestamp.
    pub const ZERO: MonoTime = MonoTime { sec: 0, nsec: 0 };

    /// Build a timestamp from whole seconds and sub-second nanoseconds.
    ///
    /// `nsec` must already be normalized (callers converting from a kernel
    /// `timespec` get this for free).
    #[must_use]
    pub fn new(sec: i64, nsec: u32) -> Self {
        debug_assert!(u64::from(nsec) < NANOS_PER_SEC, "nsec {nsec} not normalized");
        Self { sec, nsec }
    }

    /// Build a timestamp from a total nanosecond count.
    #[must_use]
    pub fn from_nanos(ns: u64) -> Self {
        Self {
            sec: (ns / NANOS_PER_SEC) as i64,
            nsec: (ns % NANOS_PER_SEC) as u32,
        }
    }

    /// Whole-seconds component.
    #[must_use]
    pub fn sec(&self) -> i64 {
        self.sec
    }

    /// Sub-second nanoseconds component, in `[0, NANOS_PER_SEC)`.
    #[must_use]
    pub fn subsec_nanos(&self) -> u32 {
        self.nsec
    }

    /// Advance this timestamp by `ns` nanoseconds, carrying overflow of the
    /// nanosecond field into seconds.
    pub fn advance(&mut self, ns: u64) {
        let total = u64::from(self.nsec) + ns;
        self.sec += (total / NANOS_PER_SEC) as i64;
        self.nsec = (total % NANOS_PER_SEC) as u32;
    }

    /// Return a copy advanced by `ns` nanoseconds.
    #[must_use]
    pub fn advanced_by(mut self, ns: u64) -> Self {
        self.advance(ns);
        self
    }

    /// Nanoseconds elapsed since `earlier`, saturating at zero if `earlier`
    /// is actually later (a monotonic clock never produces that case, but a
    /// scripted one might).
    #[must_use]
    pub fn saturating_ns_since(&self, earlier: MonoTime) -> u64 {
        let secs = i128::from(self.sec) - i128::from(earlier.sec);
        let nanos =
            secs * i128::from(NANOS_PER_SEC) + i128::from(self.nsec) - i128::from(earlier.nsec);
        if nanos <= 0 {
            0
        } else {
            u64::try_from(nanos).unwrap_or(u64::MAX)
        }
    }

    /// The timestamp as real-valued seconds, the unit the report surface
    /// prints.
    #[must_use]
    pub fn as_secs_f64(&self) -> f64 {
        self.sec as f64 + f64::from(self.nsec) / NANOS_PER_SEC as f64
    }
}
