//! Error types for probe detection

use thiserror::Error;

/// Errors that can occur while enumerating probes
#[derive(Debug, Error)]
pub enum DetectError {
    /// Failed to enumerate attached probes
    #[error("failed to enumerate probes: {0}")]
    EnumerationFailed(String),

    /// Failed to start the enumeration command
    #[error("failed to launch {program}: {reason}")]
    LaunchFailed { program: String, reason: String },

    /// Enumeration command ran but reported failure
    #[error("{program} exited with {status}: {stderr}")]
    CommandFailed {
        program: String,
        status: String,
        stderr: String,
    },

    /// Serial port error
    #[error("serial port error: {0}")]
    SerialPort(#[from] serialport::Error),
}
