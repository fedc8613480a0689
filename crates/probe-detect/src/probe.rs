//! The connected-probe source used to break ties

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::DetectError;

/// Reports the serial numbers of probes attached right now
#[async_trait]
pub trait ConnectedProbes: Send + Sync {
    async fn connected_serial_numbers(&self) -> Result<Vec<u64>, DetectError>;
}

#[async_trait]
impl<T: ConnectedProbes + ?Sized> ConnectedProbes for &T {
    async fn connected_serial_numbers(&self) -> Result<Vec<u64>, DetectError> {
        (**self).connected_serial_numbers().await
    }
}

#[async_trait]
impl<T: ConnectedProbes + ?Sized> ConnectedProbes for Box<T> {
    async fn connected_serial_numbers(&self) -> Result<Vec<u64>, DetectError> {
        (**self).connected_serial_numbers().await
    }
}

/// Which connected-probe source to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScannerKind {
    /// USB serial port enumeration
    #[default]
    Usb,
    /// `nrfjprog --ids`
    Nrfjprog,
}

impl ScannerKind {
    pub fn name(&self) -> &'static str {
        match self {
            ScannerKind::Usb => "usb",
            ScannerKind::Nrfjprog => "nrfjprog",
        }
    }
}

impl std::str::FromStr for ScannerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "usb" => Ok(ScannerKind::Usb),
            "nrfjprog" => Ok(ScannerKind::Nrfjprog),
            other => Err(format!("unknown scanner: {other}")),
        }
    }
}
