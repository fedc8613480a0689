//! J-Link Probe Detection Library
//!
//! This crate reports the serial numbers of the J-Link probes attached to
//! the host right now, either from USB serial port enumeration or from
//! `nrfjprog --ids`.
//!
//! # Example
//!
//! ```rust,no_run
//! use probe_detect::{ConnectedProbes, UsbProbeScanner};
//!
//! # async fn run() -> Result<(), probe_detect::DetectError> {
//! let scanner = UsbProbeScanner::new();
//! for serial in scanner.connected_serial_numbers().await? {
//!     println!("Found probe: {}", serial);
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod nrfjprog;
pub mod probe;
pub mod scanner;

pub use error::DetectError;
pub use nrfjprog::NrfjprogScanner;
pub use probe::{ConnectedProbes, ScannerKind};
pub use scanner::{ScannerConfig, UsbProbeScanner, SEGGER_VID};
