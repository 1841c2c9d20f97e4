//! Integration tests for cyclebench acceptance testing.
//!
//! `synthetic_test` drives the full runner over a scripted clock, so every
//! timing expectation is exact. `wallclock_test` runs the real monotonic
//! clock: short unprivileged smoke runs plus ignored privileged runs for
//! RT-configured machines.

mod common;
mod synthetic_test;
mod wallclock_test;
