//! Windows Registry Correlation Library
//!
//! This crate maps a transient COM port name to the serial number of the
//! J-Link probe behind it by reading the Windows device registry through
//! the `reg` command. It includes:
//!
//! - **parse**: turns `reg query` output into structured records
//! - **query**: runs `reg query` behind a replaceable [`CommandRunner`]
//! - **correlate**: the two-phase lookup from port name to candidate serials
//!
//! # Example
//!
//! ```rust,no_run
//! use probe_registry::{KeyCorrelator, RegCommand};
//!
//! # async fn run() -> Result<(), probe_registry::RegistryError> {
//! let correlator = KeyCorrelator::new(RegCommand::new());
//! let candidates = correlator.find_jlink_ids("COM3").await?;
//!
//! for serial in candidates {
//!     println!("Candidate serial: {}", serial);
//! }
//! # Ok(())
//! # }
//! ```

pub mod correlate;
pub mod error;
pub mod parse;
pub mod query;

pub use correlate::{KeyCorrelator, USB_ENUM_ROOT};
pub use error::RegistryError;
pub use parse::{
    parse_jlink_id, parse_matching_keys, parse_parent_id_prefix, parse_results,
    parse_variable_line, RegistryRecord, RegistryValue,
};
pub use query::{query_args, CommandRunner, RegCommand, RegistryQuery};
