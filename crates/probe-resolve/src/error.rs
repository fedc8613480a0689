//! Error types for serial number resolution

use thiserror::Error;

/// Errors that fail a whole resolution batch
///
/// Per-port registry failures never show up here; they become warnings.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Connected probes could not be listed while a port was ambiguous
    #[error("unable to list connected probes: {0}")]
    Enumeration(#[from] probe_detect::DetectError),
}
