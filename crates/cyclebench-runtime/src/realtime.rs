//! Real-time environment setup for the measurement thread.
//!
//! Prepares deterministic execution the way cyclic latency tools do: lock
//! memory so page faults cannot land inside the timed loop, pre-fault the
//! stack, switch to a fixed-priority scheduling class, and optionally pin
//! the thread to one CPU. Everything here must run on the thread that will
//! execute the sampling loop.
//!
//! Privilege failures (EPERM) downgrade to warnings unless the configuration
//! asks for strict mode, so the benchmark still runs unprivileged, just with
//! honest log output about what it could not set up.

use tracing::{debug, info, warn};

use cyclebench_common::config::{RealtimeConfig, SchedPolicy};
use cyclebench_common::error::{BenchError, BenchResult};

/// What actually took effect during real-time initialization.
#[derive(Debug, Clone, Default)]
pub struct RtStatus {
    /// Whether `mlockall` succeeded.
    pub memory_locked: bool,
    /// Stack bytes pre-faulted.
    pub stack_prefaulted: usize,
    /// Scheduling policy in effect, if one was applied.
    pub policy: Option<SchedPolicy>,
    /// Real-time priority in effect, if one was applied.
    pub priority: Option<u8>,
    /// CPU the thread ended up pinned to.
    pub pinned_cpu: Option<usize>,
    /// Whether the kernel advertises PREEMPT_RT.
    pub preempt_rt: bool,
}

/// Initialize the real-time environment on the calling thread.
///
/// With `config.enabled == false` this only probes the kernel and returns;
/// the run then executes at normal priority, which is useful for functional
/// testing and development machines.
///
/// # Errors
///
/// Non-permission failures are always errors. Permission failures become
/// errors only when `config.strict` is set.
pub fn init_realtime(config: &RealtimeConfig) -> BenchResult<RtStatus> {
    let mut status = RtStatus {
        preempt_rt: kernel_is_preempt_rt(),
        ..RtStatus::default()
    };

    if !config.enabled {
        info!("real-time setup disabled in configuration");
        return Ok(status);
    }

    if !status.preempt_rt {
        warn!("PREEMPT_RT kernel not detected; jitter figures will reflect a stock scheduler");
    }

    if config.lock_memory {
        status.memory_locked = lock_memory(config.strict)?;
    }

    status.stack_prefaulted = prefault_stack(config.prefault_stack_size);

    let (policy, priority) = set_scheduler(config.policy, config.priority, config.strict)?;
    status.policy = policy;
    status.priority = priority;

    if let Some(cpu) = config.cpu_affinity {
        status.pinned_cpu = pin_to_cpu(cpu, config.strict)?;
    }

    info!(
        memory_locked = status.memory_locked,
        stack_prefaulted = status.stack_prefaulted,
        policy = ?status.policy,
        priority = ?status.priority,
        pinned_cpu = ?status.pinned_cpu,
        preempt_rt = status.preempt_rt,
        "real-time initialization complete"
    );
    Ok(status)
}

/// True when the running kernel carries the PREEMPT_RT patch set.
///
/// Checks `/proc/sys/kernel/realtime` first (present and `1` on RT kernels),
/// then falls back to scanning `/proc/version`.
#[cfg(target_os = "linux")]
#[must_use]
pub fn kernel_is_preempt_rt() -> bool {
    if let Ok(flag) = std::fs::read_to_string("/proc/sys/kernel/realtime") {
        if flag.trim() == "1" {
            return true;
        }
    }
    std::fs::read_to_string("/proc/version")
        .map(|v| v.contains("PREEMPT_RT") || v.contains("PREEMPT RT"))
        .unwrap_or(false)
}

#[cfg(not(target_os = "linux"))]
#[must_use]
pub fn kernel_is_preempt_rt() -> bool {
    false
}

/// Lock current and future pages into RAM.
#[cfg(target_os = "linux")]
fn lock_memory(strict: bool) -> BenchResult<bool> {
    use nix::sys::mman::{mlockall, MlockAllFlags};

    debug!("locking memory with mlockall");

    match mlockall(MlockAllFlags::MCL_CURRENT | MlockAllFlags::MCL_FUTURE) {
        Ok(()) => {
            info!("memory locked (MCL_CURRENT | MCL_FUTURE)");
            Ok(true)
        }
        Err(nix::errno::Errno::EPERM) if !strict => {
            warn!("mlockall denied (needs CAP_IPC_LOCK); continuing without locked memory");
            Ok(false)
        }
        Err(e) => Err(BenchError::Config(format!("mlockall failed: {e}"))),
    }
}

#[cfg(not(target_os = "linux"))]
fn lock_memory(_strict: bool) -> BenchResult<bool> {
    warn!("memory locking not supported on this platform");
    Ok(false)
}

/// Touch `size` bytes of stack so the pages are resident before the timed
/// loop starts. Returns the number of bytes actually touched (rounded up to
/// a whole number of frames).
fn prefault_stack(size: usize) -> usize {
    if size == 0 {
        return 0;
    }
    debug!(size, "pre-faulting stack");
    let touched = touch_stack(size);
    debug!(touched, "stack pre-fault complete");
    touched
}

/// Recursively grow the stack one frame at a time, writing into each frame.
#[inline(never)]
fn touch_stack(remaining: usize) -> usize {
    const FRAME: usize = 16 * 1024;

    let mut frame = [0u8; FRAME];
    // SAFETY: both writes stay inside this function's own stack frame.
    unsafe {
        std::ptr::write_volatile(frame.as_mut_ptr(), 0xA5);
        std::ptr::write_volatile(frame.as_mut_ptr().add(FRAME - 1), 0x5A);
    }
    std::hint::black_box(&frame);

    if remaining <= FRAME {
        FRAME
    } else {
        FRAME + touch_stack(remaining - FRAME)
    }
}

/// Switch the calling thread to the requested scheduling class.
///
/// Returns the `(policy, priority)` pair that took effect; both `None` when
/// permission was denied in non-strict mode.
#[cfg(target_os = "linux")]
fn set_scheduler(
    policy: SchedPolicy,
    priority: u8,
    strict: bool,
) -> BenchResult<(Option<SchedPolicy>, Option<u8>)> {
    let native = match policy {
        SchedPolicy::Fifo => libc::SCHED_FIFO,
        SchedPolicy::Rr => libc::SCHED_RR,
        SchedPolicy::Other => {
            debug!("keeping SCHED_OTHER, no priority elevation");
            return Ok((Some(SchedPolicy::Other), None));
        }
    };

    debug!(?policy, priority, "setting scheduling class");

    let param = libc::sched_param {
        sched_priority: i32::from(priority),
    };
    // SAFETY: pid 0 targets the calling thread; the param struct outlives
    // the call and is only read.
    let rc = unsafe { libc::sched_setscheduler(0, native, &param) };
    if rc == -1 {
        let err = std::io::Error::last_os_error();
        if err.raw_os_error() == Some(libc::EPERM) && !strict {
            warn!("scheduler change denied (needs CAP_SYS_NICE); continuing at normal priority");
            return Ok((None, None));
        }
        return Err(BenchError::Config(format!("sched_setscheduler failed: {err}")));
    }

    info!(?policy, priority, "scheduling class set");
    Ok((Some(policy), Some(priority)))
}

#[cfg(not(target_os = "linux"))]
fn set_scheduler(
    _policy: SchedPolicy,
    _priority: u8,
    _strict: bool,
) -> BenchResult<(Option<SchedPolicy>, Option<u8>)> {
    warn!("real-time scheduling not supported on this platform");
    Ok((None, None))
}

/// Pin the calling thread to a single CPU.
#[cfg(target_os = "linux")]
fn pin_to_cpu(cpu: usize, strict: bool) -> BenchResult<Option<usize>> {
    use nix::sched::{sched_setaffinity, CpuSet};
    use nix::unistd::Pid;

    debug!(cpu, "pinning thread to CPU");

    let mut set = CpuSet::new();
    set.set(cpu)
        .map_err(|e| BenchError::Config(format!("CPU index {cpu} out of range: {e}")))?;

    match sched_setaffinity(Pid::from_raw(0), &set) {
        Ok(()) => {
            info!(cpu, "CPU affinity set");
            Ok(Some(cpu))
        }
        Err(nix::errno::Errno::EINVAL) if !strict => {
            warn!(cpu, "CPU not present on this machine; affinity left unchanged");
            Ok(None)
        }
        Err(e) => Err(BenchError::Config(format!("sched_setaffinity failed: {e}"))),
    }
}

#[cfg(not(target_os = "linux"))]
fn pin_to_cpu(_cpu: usize, _strict: bool) -> BenchResult<Option<usize>> {
    warn!("CPU affinity not supported on this platform");
    Ok(None)
}
