//! COM Port Serial Number Resolution
//!
//! Windows does not report which J-Link a COM port belongs to. This crate
//! works it out from the device registry and, when the registry holds
//! several stale candidates for one port, from the list of probes that are
//! connected right now.
//!
//! # Example
//!
//! ```rust,no_run
//! # async fn run() -> Result<(), probe_resolve::ResolveError> {
//! let ports = vec!["COM3".to_string(), "COM7".to_string()];
//! let resolution = probe_resolve::resolve_port_serial_numbers(&ports).await?;
//!
//! for (port, serial) in &resolution.resolved {
//!     println!("{} -> {}", port, serial);
//! }
//! for warning in &resolution.warnings {
//!     eprintln!("warning: {}", warning);
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod resolver;

pub use error::ResolveError;
pub use resolver::{
    resolve_port_serial_numbers, CorrelationResult, Resolution, SerialLookup,
    SerialNumberResolver,
};
