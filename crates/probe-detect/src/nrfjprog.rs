//! Probe enumeration through `nrfjprog --ids`
//!
//! `nrfjprog` talks to the probes through the J-Link driver and prints one
//! serial number per line for every probe it can open.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, trace};

use crate::error::DetectError;
use crate::probe::ConnectedProbes;

/// Default nrfjprog program name
pub const NRFJPROG_PROGRAM: &str = "nrfjprog";

/// Lists connected probes by running `nrfjprog --ids`
#[derive(Debug, Clone)]
pub struct NrfjprogScanner {
    program: String,
}

impl NrfjprogScanner {
    pub fn new() -> Self {
        Self::with_program(NRFJPROG_PROGRAM)
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for NrfjprogScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse `nrfjprog --ids` output, skipping lines that are not numbers
fn parse_ids(stdout: &str) -> Vec<u64> {
    stdout
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            match line.parse() {
                Ok(id) => Some(id),
                Err(_) => {
                    if !line.is_empty() {
                        trace!("Ignoring nrfjprog output line: {}", line);
                    }
                    None
                }
            }
        })
        .collect()
}

#[async_trait]
impl ConnectedProbes for NrfjprogScanner {
    async fn connected_serial_numbers(&self) -> Result<Vec<u64>, DetectError> {
        debug!("Running {} --ids", self.program);

        let output = Command::new(&self.program)
            .arg("--ids")
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| DetectError::LaunchFailed {
                program: self.program.clone(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(DetectError::CommandFailed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let ids = parse_ids(&String::from_utf8_lossy(&output.stdout));
        info!("Found {} connected probe(s)", ids.len());
        Ok(ids)
    }
}
