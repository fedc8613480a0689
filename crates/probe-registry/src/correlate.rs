//! Correlation of COM port names with J-Link serial numbers
//!
//! A J-Link exposes its UART as an interface of a composite USB device. The
//! interface key (`...\VID_1366&PID_1015&MI_00\7&2f8ac9e0&0&0000\Device Parameters`)
//! holds the `PortName`, and its instance id carries the parent's
//! `ParentIdPrefix`. The parent device key (`...\VID_1366&PID_1015\000123456789`)
//! holds that `ParentIdPrefix` and is named after the serial number.
//!
//! COM port numbers are recycled, so stale interface keys can map one port
//! to several parents. Every candidate is returned; picking one is left to
//! the caller.

use futures::future::try_join_all;
use tracing::debug;

use crate::error::RegistryError;
use crate::parse::{parse_jlink_id, parse_matching_keys, parse_parent_id_prefix};
use crate::query::{CommandRunner, RegistryQuery};

/// Registry subtree holding enumerated USB devices
pub const USB_ENUM_ROOT: &str = "HKEY_LOCAL_MACHINE\\SYSTEM\\CurrentControlSet\\Enum\\USB";

const PORT_NAME: &str = "PortName";
const PARENT_ID_PREFIX: &str = "ParentIdPrefix";

/// Two-phase registry lookup from port name to candidate serial numbers
#[derive(Debug, Clone)]
pub struct KeyCorrelator<R> {
    registry: RegistryQuery<R>,
    root: String,
}

impl<R: CommandRunner> KeyCorrelator<R> {
    /// Create a correlator searching [`USB_ENUM_ROOT`]
    pub fn new(runner: R) -> Self {
        Self::with_root(runner, USB_ENUM_ROOT)
    }

    /// Create a correlator searching a different subtree
    pub fn with_root(runner: R, root: impl Into<String>) -> Self {
        Self {
            registry: RegistryQuery::new(runner),
            root: root.into(),
        }
    }

    /// Registry subtree this correlator searches
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Find every serial number the registry associates with `com_name`
    pub async fn find_jlink_ids(&self, com_name: &str) -> Result<Vec<String>, RegistryError> {
        let prefixes = self.find_parent_id_prefixes(com_name).await?;
        debug!("{}: parent id prefixes {:?}", com_name, prefixes);

        let per_prefix = try_join_all(
            prefixes
                .iter()
                .map(|prefix| self.find_serials_for_prefix(prefix)),
        )
        .await?;

        let serials = dedup(per_prefix.into_iter().flatten());
        debug!("{}: candidate serial numbers {:?}", com_name, serials);
        Ok(serials)
    }

    async fn find_parent_id_prefixes(&self, com_name: &str) -> Result<Vec<String>, RegistryError> {
        let text = self.registry.query(&self.root, com_name).await?;
        let prefixes = parse_matching_keys(&text, PORT_NAME, com_name)
            .into_iter()
            .filter_map(|key| parse_parent_id_prefix(&key));
        Ok(dedup(prefixes))
    }

    async fn find_serials_for_prefix(&self, prefix: &str) -> Result<Vec<String>, RegistryError> {
        let text = self.registry.query(&self.root, prefix).await?;
        Ok(parse_matching_keys(&text, PARENT_ID_PREFIX, prefix)
            .iter()
            .filter_map(|key| parse_jlink_id(key))
            .collect())
    }
}

/// Remove duplicates, keeping the first occurrence
fn dedup(items: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}
