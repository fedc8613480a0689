//! USB probe scanner
//!
//! This module finds attached J-Link probes through serial port enumeration.

use async_trait::async_trait;
use serialport::{available_ports, SerialPortType};
use tracing::{debug, info};

use crate::error::DetectError;
use crate::probe::ConnectedProbes;

/// SEGGER Microcontroller USB vendor ID
pub const SEGGER_VID: u16 = 0x1366;

/// USB details of one enumerated serial port
#[derive(Debug, Clone)]
pub struct ProbePort {
    /// Port name (e.g., COM3, /dev/ttyACM0)
    pub port: String,
    /// USB Vendor ID
    pub vid: u16,
    /// USB Product ID
    pub pid: u16,
    /// USB serial number (if reported)
    pub serial_number: Option<String>,
}

impl ProbePort {
    /// Create from serialport crate's port info, `None` for non-USB ports
    fn from_serialport(name: String, port_type: &SerialPortType) -> Option<Self> {
        match port_type {
            SerialPortType::UsbPort(usb) => Some(Self {
                port: name,
                vid: usb.vid,
                pid: usb.pid,
                serial_number: usb.serial_number.clone(),
            }),
            _ => None,
        }
    }

    /// Serial number as an integer, ignoring leading zeros
    fn numeric_serial(&self) -> Option<u64> {
        self.serial_number.as_deref()?.trim().parse().ok()
    }
}

/// USB probe scanner configuration
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    /// Vendor ID identifying probes
    pub vendor_id: u16,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            vendor_id: SEGGER_VID,
        }
    }
}

/// Finds probes among the host's USB serial ports
#[derive(Debug, Clone, Default)]
pub struct UsbProbeScanner {
    config: ScannerConfig,
}

impl UsbProbeScanner {
    /// Create a new scanner with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a scanner with custom configuration
    pub fn with_config(config: ScannerConfig) -> Self {
        Self { config }
    }

    /// Enumerate USB serial ports belonging to probes
    pub fn enumerate_ports(&self) -> Result<Vec<ProbePort>, DetectError> {
        let ports = available_ports()?;

        let result: Vec<_> = ports
            .into_iter()
            .filter_map(|p| ProbePort::from_serialport(p.port_name, &p.port_type))
            .filter(|p| p.vid == self.config.vendor_id)
            .collect();

        for port in &result {
            debug!(
                "  {} - {:04X}:{:04X} serial {}",
                port.port,
                port.vid,
                port.pid,
                port.serial_number.as_deref().unwrap_or("unknown")
            );
        }

        Ok(result)
    }
}

/// Distinct numeric serial numbers of `ports`, in enumeration order
///
/// A probe exposes one port per CDC interface, so the same serial number
/// usually shows up more than once.
fn serial_numbers(ports: &[ProbePort]) -> Vec<u64> {
    let mut serials = Vec::new();
    for serial in ports.iter().filter_map(ProbePort::numeric_serial) {
        if !serials.contains(&serial) {
            serials.push(serial);
        }
    }
    serials
}

#[async_trait]
impl ConnectedProbes for UsbProbeScanner {
    async fn connected_serial_numbers(&self) -> Result<Vec<u64>, DetectError> {
        let scanner = self.clone();
        let ports = tokio::task::spawn_blocking(move || scanner.enumerate_ports())
            .await
            .map_err(|e| DetectError::EnumerationFailed(e.to_string()))??;

        let serials = serial_numbers(&ports);
        info!("Found {} connected probe(s)", serials.len());
        Ok(serials)
    }
}
