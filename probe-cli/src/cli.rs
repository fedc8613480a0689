//! Command-line arguments

use clap::Parser;
use probe_detect::ScannerKind;

use crate::settings::Settings;

/// Print the J-Link serial number behind each COM port
#[derive(Debug, Parser)]
#[command(name = "probe-serial", version, about)]
pub struct Cli {
    /// COM port names to resolve (e.g. COM3 COM7)
    #[arg(required = true)]
    pub ports: Vec<String>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,

    /// Connected probe source: usb or nrfjprog
    #[arg(long)]
    pub scanner: Option<ScannerKind>,

    /// Registry subtree to search
    #[arg(long)]
    pub registry_root: Option<String>,

    /// Registry query program
    #[arg(long)]
    pub reg_program: Option<String>,

    /// nrfjprog program
    #[arg(long)]
    pub nrfjprog_program: Option<String>,

    /// USB vendor ID of probes, in hex (e.g. 1366)
    #[arg(long, value_parser = parse_hex_u16)]
    pub vendor_id: Option<u16>,

    /// Batch timeout in milliseconds, 0 disables it
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Write the effective settings back to the settings file
    #[arg(long)]
    pub save: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

fn parse_hex_u16(s: &str) -> Result<u16, String> {
    let digits = s.trim_start_matches("0x").trim_start_matches("0X");
    u16::from_str_radix(digits, 16).map_err(|e| format!("invalid vendor id {s}: {e}"))
}

impl Cli {
    /// Apply command-line overrides on top of saved settings
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(scanner) = self.scanner {
            settings.scanner = scanner;
        }
        if let Some(root) = &self.registry_root {
            settings.registry_root = root.clone();
        }
        if let Some(program) = &self.reg_program {
            settings.reg_program = program.clone();
        }
        if let Some(program) = &self.nrfjprog_program {
            settings.nrfjprog_program = program.clone();
        }
        if let Some(vendor_id) = self.vendor_id {
            settings.vendor_id = vendor_id;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            settings.timeout_ms = timeout_ms;
        }
    }
}
