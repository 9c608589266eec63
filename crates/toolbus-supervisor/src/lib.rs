//! Process supervision for the toolbus hub.
//!
//! The [`Supervisor`] owns the set of child processes for the lifetime of the
//! program and makes "is everything up" and "shut everything down" single
//! well-defined operations:
//!
//! - [`Supervisor::launch`] spawns a child from a [`LaunchSpec`] and tracks
//!   it immediately, so even a crash during startup is observed and cleanable.
//! - [`Supervisor::await_ready`] gates the `Ready` declaration on the
//!   readiness prober; a backend that never answers is left `Starting` and
//!   the caller decides whether that is fatal.
//! - [`Supervisor::shutdown_all`] terminates everything, gracefully first and
//!   forcefully after a short grace period, and is idempotent so it can be
//!   called from both a signal handler and the normal exit path.
//!
//! The supervised set is owned by the supervisor instance, not by process-wide
//! state, so multiple supervisors can coexist in tests.

mod record;
mod signals;
mod spec;
mod supervisor;

pub use record::{ProcessRecord, RecordState};
pub use signals::wait_for_shutdown_signal;
pub use spec::LaunchSpec;
pub use supervisor::Supervisor;
