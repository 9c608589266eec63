//! Low-level process primitives for the supervisor.
//!
//! Spawning, liveness checking, and cross-platform termination. Policy
//! (grace periods, state tracking, escalation) lives in `toolbus-supervisor`;
//! this crate only talks to the OS.

pub mod check;
pub mod execute;
pub mod terminate;

pub use check::process_exists;
pub use execute::spawn_process;
pub use terminate::{force_kill, terminate_gracefully};
