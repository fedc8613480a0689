//! Error types for registry access

use thiserror::Error;

/// Errors that can occur while querying the registry
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The registry query command could not be started
    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Waiting on the registry query command failed after it was started
    #[error("I/O error running {program}: {reason}")]
    IoError { program: String, reason: String },
}
