//! Error types for the toolbus hub.

use thiserror::Error;

/// Result type alias for hub operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for hub operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid input or configuration.
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// A network operation failed before a response was received.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The upstream generative provider answered, but not usefully.
    #[error("Provider error: {0}")]
    Provider(String),

    /// The listening port is already bound by another instance.
    #[error("Port {0} is already in use")]
    PortInUse(u16),

    /// Internal error (shouldn't happen in normal operation).
    #[error("Internal error: {0}")]
    Internal(String),

    /// I/O error (wraps std::io::Error).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Creates a Validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a Transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }
}

// ==============================================================================
// Process Management Errors
// ==============================================================================

/// Process-specific error types for the supervisor.
#[derive(Error, Debug, Clone)]
pub enum ProcessError {
    #[error("Process not found: {id}")]
    NotFound { id: String },

    #[error("Process spawn failed: {id} - {reason}")]
    SpawnFailed { id: String, reason: String },

    #[error("Process stop failed: {id} - {reason}")]
    StopFailed { id: String, reason: String },

    #[error("Process configuration error: {id} - {reason}")]
    Configuration { id: String, reason: String },
}

impl ProcessError {
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    pub fn spawn_failed(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SpawnFailed {
            id: id.into(),
            reason: reason.into(),
        }
    }

    pub fn stop_failed(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::StopFailed {
            id: id.into(),
            reason: reason.into(),
        }
    }

    pub fn configuration(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Configuration {
            id: id.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for process operations.
pub type ProcessResult<T> = std::result::Result<T, ProcessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = Error::validation("bad command");
        assert!(matches!(err, Error::Validation { .. }));
        assert!(err.to_string().contains("bad command"));
    }

    #[test]
    fn test_process_error_construction() {
        let error = ProcessError::spawn_failed("engine", "executable not found");
        assert!(matches!(error, ProcessError::SpawnFailed { .. }));
        assert!(format!("{}", error).contains("spawn failed"));

        let error = ProcessError::not_found("asset");
        assert_eq!(format!("{}", error), "Process not found: asset");
    }
}
