//! Registry queries through the `reg` command
//!
//! The registry is read by running `reg query` rather than through the
//! Win32 API. [`CommandRunner`] is the seam between building the query and
//! running a process, so tests can answer queries from memory.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, trace};

use crate::error::RegistryError;

/// Default program used to query the registry
pub const REG_PROGRAM: &str = "reg";

/// Runs a registry query command and returns its standard output
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run the command with `args` and return captured stdout as text
    async fn run(&self, args: &[String]) -> Result<String, RegistryError>;
}

#[async_trait]
impl<T: CommandRunner + ?Sized> CommandRunner for &T {
    async fn run(&self, args: &[String]) -> Result<String, RegistryError> {
        (**self).run(args).await
    }
}

/// Build the arguments for a recursive `REG_SZ` search below `key_path`
pub fn query_args(key_path: &str, query_string: &str) -> Vec<String> {
    vec![
        "query".to_string(),
        key_path.to_string(),
        "/f".to_string(),
        query_string.to_string(),
        "/s".to_string(),
        "/t".to_string(),
        "REG_SZ".to_string(),
    ]
}

/// Registry searches issued through a [`CommandRunner`]
#[derive(Debug, Clone)]
pub struct RegistryQuery<R> {
    runner: R,
}

impl<R: CommandRunner> RegistryQuery<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    /// Search every string value below `key_path` for `query_string`
    pub async fn query(&self, key_path: &str, query_string: &str) -> Result<String, RegistryError> {
        trace!("reg query {} /f {}", key_path, query_string);
        self.runner.run(&query_args(key_path, query_string)).await
    }
}

/// Runs the real `reg` executable
#[derive(Debug, Clone)]
pub struct RegCommand {
    program: String,
}

impl RegCommand {
    /// Use `reg` from the search path
    pub fn new() -> Self {
        Self::with_program(REG_PROGRAM)
    }

    /// Use a specific program, e.g. a full path to `reg.exe`
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Program that is spawned for each query
    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Default for RegCommand {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandRunner for RegCommand {
    async fn run(&self, args: &[String]) -> Result<String, RegistryError> {
        let child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| RegistryError::Launch {
                program: self.program.clone(),
                source,
            })?;

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| RegistryError::IoError {
                program: self.program.clone(),
                reason: e.to_string(),
            })?;

        // `reg query` exits with 1 when nothing matched
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
