//! Batch resolution of COM port names to serial numbers
//!
//! Every port is looked up in the registry concurrently. Ports with a
//! single candidate are resolved directly. Only if some port has several
//! candidates is the list of connected probes fetched, once for the whole
//! batch, and used to pick the candidate that is actually attached.

use std::collections::BTreeMap;

use async_trait::async_trait;
use futures::future::join_all;
use probe_detect::{ConnectedProbes, UsbProbeScanner};
use probe_registry::{CommandRunner, KeyCorrelator, RegCommand, RegistryError};
use tracing::{debug, warn};

use crate::error::ResolveError;

/// Finds candidate serial numbers for one port name
#[async_trait]
pub trait SerialLookup: Send + Sync {
    async fn find_jlink_ids(&self, com_name: &str) -> Result<Vec<String>, RegistryError>;
}

#[async_trait]
impl<R: CommandRunner> SerialLookup for KeyCorrelator<R> {
    async fn find_jlink_ids(&self, com_name: &str) -> Result<Vec<String>, RegistryError> {
        KeyCorrelator::find_jlink_ids(self, com_name).await
    }
}

#[async_trait]
impl<T: SerialLookup + ?Sized> SerialLookup for &T {
    async fn find_jlink_ids(&self, com_name: &str) -> Result<Vec<String>, RegistryError> {
        (**self).find_jlink_ids(com_name).await
    }
}

/// Registry candidates for one port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationResult {
    pub com_name: String,
    pub serial_numbers: Vec<String>,
}

impl CorrelationResult {
    fn is_ambiguous(&self) -> bool {
        self.serial_numbers.len() > 1
    }
}

/// Outcome of a resolution batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Resolution {
    /// Ports that map to exactly one serial number
    pub resolved: BTreeMap<String, String>,
    /// Advisory messages for ports that were skipped or needed a tie-break
    pub warnings: Vec<String>,
}

/// What disambiguation decided for one port
#[derive(Debug, Clone, PartialEq, Eq)]
enum Outcome {
    Resolved {
        serial: String,
        note: Option<String>,
    },
    Unresolved(String),
}

/// Resolves port names using a registry lookup and a connected-probe source
#[derive(Debug, Clone)]
pub struct SerialNumberResolver<L, P> {
    lookup: L,
    probes: P,
}

impl<L: SerialLookup, P: ConnectedProbes> SerialNumberResolver<L, P> {
    pub fn new(lookup: L, probes: P) -> Self {
        Self { lookup, probes }
    }

    /// Map each port in `com_names` to its serial number
    ///
    /// Ports that cannot be resolved uniquely are left out of the map and
    /// described in the warnings. The call only fails if connected probes
    /// were needed and could not be listed.
    pub async fn get_serial_number_map(
        &self,
        com_names: &[String],
    ) -> Result<Resolution, ResolveError> {
        let lookups: Vec<(&String, Result<CorrelationResult, RegistryError>)> =
            join_all(com_names.iter().map(|com_name| async move {
                let result = self
                    .lookup
                    .find_jlink_ids(com_name)
                    .await
                    .map(|serial_numbers| CorrelationResult {
                        com_name: com_name.clone(),
                        serial_numbers,
                    });
                (com_name, result)
            }))
            .await;

        let needs_connected = lookups
            .iter()
            .any(|(_, result)| result.as_ref().is_ok_and(CorrelationResult::is_ambiguous));

        let connected = if needs_connected {
            let connected = self.probes.connected_serial_numbers().await?;
            debug!("Connected probes: {:?}", connected);
            connected
        } else {
            Vec::new()
        };

        let mut resolution = Resolution::default();
        for (com_name, result) in lookups {
            let outcome = match result {
                Ok(correlation) => disambiguate(&correlation, &connected),
                Err(e) => Outcome::Unresolved(format!(
                    "Unable to read serial number for {com_name} from registry: {e}"
                )),
            };

            match outcome {
                Outcome::Resolved { serial, note } => {
                    if let Some(note) = note {
                        warn!("{}", note);
                        resolution.warnings.push(note);
                    }
                    resolution.resolved.insert(com_name.clone(), serial);
                }
                Outcome::Unresolved(message) => {
                    warn!("{}", message);
                    resolution.warnings.push(message);
                }
            }
        }

        Ok(resolution)
    }
}

/// Apply the candidate policy to one port
fn disambiguate(result: &CorrelationResult, connected: &[u64]) -> Outcome {
    let com_name = &result.com_name;

    match result.serial_numbers.as_slice() {
        [] => Outcome::Unresolved(format!(
            "Could not find serial number for {com_name} in registry."
        )),
        [serial] => Outcome::Resolved {
            serial: serial.clone(),
            note: None,
        },
        candidates => {
            let listed = candidates.join(", ");
            let matches: Vec<&String> = candidates
                .iter()
                .filter(|candidate| is_connected(candidate, connected))
                .collect();

            match matches.as_slice() {
                [chosen] => Outcome::Resolved {
                    serial: (*chosen).clone(),
                    note: Some(format!(
                        "Found serial numbers {listed} for {com_name} in registry. {chosen} is connected, so using that."
                    )),
                },
                [] => Outcome::Unresolved(format!(
                    "Found serial numbers {listed} for {com_name} in registry, but none of these are connected. Unable to identify serial number."
                )),
                several => {
                    let attached = several
                        .iter()
                        .map(|s| s.as_str())
                        .collect::<Vec<_>>()
                        .join(", ");
                    Outcome::Unresolved(format!(
                        "Found serial numbers {listed} for {com_name} in registry, and {attached} are all connected. Unable to identify serial number."
                    ))
                }
            }
        }
    }
}

/// Registry serials are zero padded, connected serials are plain integers
fn is_connected(candidate: &str, connected: &[u64]) -> bool {
    candidate
        .parse::<u64>()
        .is_ok_and(|serial| connected.contains(&serial))
}

/// Resolve `com_names` against the local registry and attached USB probes
pub async fn resolve_port_serial_numbers(com_names: &[String]) -> Result<Resolution, ResolveError> {
    let resolver = SerialNumberResolver::new(
        KeyCorrelator::new(RegCommand::new()),
        UsbProbeScanner::new(),
    );
    resolver.get_serial_number_map(com_names).await
}
