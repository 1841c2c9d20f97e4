//! Acceptance tests for cyclebench.
//!
//! These tests exercise the measurement chain end to end:
//! - Deterministic runs against a scripted clock (jitter math, deadline
//!   grid, interruption and stop handling)
//! - Short wall-clock runs against the real monotonic clock
//!
//! The privileged tests additionally require:
//! - Root (or CAP_SYS_NICE and CAP_IPC_LOCK)
//! - A PREEMPT_RT kernel for meaningful jitter figures

mod acceptance;
