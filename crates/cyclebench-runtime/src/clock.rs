//! Monotonic clock capability.
//!
//! The cyclic driver is generic over [`MonotonicClock`] so the same timing
//! loop runs against the kernel clock in production and against a scripted
//! clock in tests. The trait deliberately exposes an *absolute* sleep: the
//! driver hands it a deadline on the clock's own timebase, which is what
//! keeps cycle boundaries drift-free.

use std::collections::VecDeque;

use cyclebench_common::error::{BenchError, BenchResult};
use cyclebench_common::time::MonoTime;

/// Outcome of an absolute-time wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitResult {
    /// The deadline was reached, or had already passed.
    Elapsed,
    /// A signal interrupted the wait before the deadline.
    Interrupted,
}

/// Monotonic clock with an absolute-deadline sleep primitive.
pub trait MonotonicClock {
    /// Read the current monotonic time.
    fn now(&mut self) -> BenchResult<MonoTime>;

    /// Block until `deadline` on the same timebase as [`MonotonicClock::now`].
    ///
    /// An early, signal-interrupted return is reported as
    /// [`WaitResult::Interrupted`]; the caller decides whether to re-wait.
    fn sleep_until(&mut self, deadline: MonoTime) -> BenchResult<WaitResult>;
}

/// Clock backed by the operating system's monotonic clock.
///
/// On Linux this reads `CLOCK_MONOTONIC` and sleeps with
/// `clock_nanosleep(TIMER_ABSTIME)`, so a late wakeup never pushes later
/// deadlines back. Other platforms fall back to [`std::time::Instant`] and a
/// relative sleep, which is good enough for functional testing but not for
/// jitter measurement.
#[derive(Debug)]
pub struct OsClock {
    #[cfg(not(target_os = "linux"))]
    origin: std::time::Instant,
}

impl OsClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "linux"))]
            origin: std::time::Instant::now(),
        }
    }
}

impl Default for OsClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_os = "linux")]
impl MonotonicClock for OsClock {
    fn now(&mut self) -> BenchResult<MonoTime> {
        let ts = nix::time::clock_gettime(nix::time::ClockId::CLOCK_MONOTONIC)
            .map_err(|e| BenchError::Clock(format!("clock_gettime failed: {e}")))?;
        Ok(MonoTime::new(i64::from(ts.tv_sec()), ts.tv_nsec() as u32))
    }

    fn sleep_until(&mut self, deadline: MonoTime) -> BenchResult<WaitResult> {
        use nix::time::{clock_nanosleep, ClockId, ClockNanosleepFlags};

        let target = nix::sys::time::TimeSpec::new(
            deadline.sec() as libc::time_t,
            deadline.subsec_nanos() as libc::c_long,
        );
        match clock_nanosleep(
            ClockId::CLOCK_MONOTONIC,
            ClockNanosleepFlags::TIMER_ABSTIME,
            &target,
        ) {
            Ok(_) => Ok(WaitResult::Elapsed),
            Err(nix::errno::Errno::EINTR) => Ok(WaitResult::Interrupted),
            Err(e) => Err(BenchError::Clock(format!("clock_nanosleep failed: {e}"))),
        }
    }
}

#[cfg(not(target_os = "linux"))]
impl MonotonicClock for OsClock {
    fn now(&mut self) -> BenchResult<MonoTime> {
        let elapsed = self.origin.elapsed();
        Ok(MonoTime::new(elapsed.as_secs() as i64, elapsed.subsec_nanos()))
    }

    fn sleep_until(&mut self, deadline: MonoTime) -> BenchResult<WaitResult> {
        let now = self.now()?;
        if deadline > now {
            let remaining = deadline.saturating_ns_since(now);
            std::thread::sleep(std::time::Duration::from_nanos(remaining));
        }
        Ok(WaitResult::Elapsed)
    }
}

/// Deterministic scripted clock for tests.
///
/// Time moves only when the script says so. `now()` returns either the next
/// scripted timestamp or the previous reading advanced by a fixed step, and
/// `sleep_until` records the requested deadline without blocking. Simulated
/// signal interruptions can be queued with [`ManualClock::inject_interrupts`].
#[derive(Debug)]
pub struct ManualClock {
    next: MonoTime,
    step_ns: u64,
    script: Option<VecDeque<MonoTime>>,
    sleep_targets: Vec<MonoTime>,
    pending_interrupts: u32,
}

impl ManualClock {
    /// Clock whose readings start at `start` and advance by `step_ns` on
    /// every `now()` call.
    #[must_use]
    pub fn stepping(start: MonoTime, step_ns: u64) -> Self {
        Self {
            next: start,
            step_ns,
            script: None,
            sleep_targets: Vec::new(),
            pending_interrupts: 0,
        }
    }

    /// Clock that returns exactly the given timestamps, in order.
    ///
    /// Reading past the end of the script is an error, so a test that
    /// consumes more samples than it planned for fails loudly.
    #[must_use]
    pub fn scripted<I>(times: I) -> Self
    where
        I: IntoIterator<Item = MonoTime>,
    {
        Self {
            next: MonoTime::ZERO,
            step_ns: 0,
            script: Some(times.into_iter().collect()),
            sleep_targets: Vec::new(),
            pending_interrupts: 0,
        }
    }

    /// Make the next `count` calls to `sleep_until` return
    /// [`WaitResult::Interrupted`].
    pub fn inject_interrupts(&mut self, count: u32) {
        self.pending_interrupts += count;
    }

    /// Every deadline passed to `sleep_until` so far, in call order.
    #[must_use]
    pub fn sleep_targets(&self) -> &[MonoTime] {
        &self.sleep_targets
    }
}

impl MonotonicClock for ManualClock {
    fn now(&mut self) -> BenchResult<MonoTime> {
        if let Some(script) = &mut self.script {
            return script
                .pop_front()
                .ok_or_else(|| BenchError::Clock("manual clock script exhausted".to_string()));
        }
        let reading = self.next;
        self.next.advance(self.step_ns);
        Ok(reading)
    }

    fn sleep_until(&mut self, deadline: MonoTime) -> BenchResult<WaitResult> {
        self.sleep_targets.push(deadline);
        if self.pending_interrupts > 0 {
            self.pending_interrupts -= 1;
            return Ok(WaitResult::Interrupted);
        }
        Ok(WaitResult::Elapsed)
    }
}
