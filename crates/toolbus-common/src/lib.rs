//! Shared types for the toolbus workspace.
//!
//! Everything that crosses a crate boundary lives here: the command/result
//! wire envelopes, the command namespace table, and the error types used
//! throughout the hub.

pub mod envelope;
pub mod errors;

pub use envelope::{CommandEnvelope, CommandStatus, Namespace, ResultEnvelope};
pub use errors::{Error, ProcessError, ProcessResult, Result};
