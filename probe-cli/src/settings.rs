//! Application settings

use std::path::{Path, PathBuf};

use probe_detect::{ScannerKind, SEGGER_VID};
use probe_registry::query::REG_PROGRAM;
use probe_registry::USB_ENUM_ROOT;
use serde::{Deserialize, Serialize};

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Registry subtree searched for port and parent keys
    pub registry_root: String,
    /// Program used for registry queries
    pub reg_program: String,
    /// Source of the connected probe list
    pub scanner: ScannerKind,
    /// Program used when `scanner` is nrfjprog
    pub nrfjprog_program: String,
    /// USB vendor ID identifying probes when `scanner` is usb
    pub vendor_id: u16,
    /// Timeout for a whole resolution batch in milliseconds, 0 for none
    pub timeout_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            registry_root: USB_ENUM_ROOT.to_string(),
            reg_program: REG_PROGRAM.to_string(),
            scanner: ScannerKind::Usb,
            nrfjprog_program: probe_detect::nrfjprog::NRFJPROG_PROGRAM.to_string(),
            vendor_id: SEGGER_VID,
            timeout_ms: 10_000,
        }
    }
}

impl Settings {
    /// Get the XDG config directory for probe-serial
    /// Uses $XDG_CONFIG_HOME/probe-serial, falls back to ~/.config/probe-serial
    fn config_dir() -> Option<PathBuf> {
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_config);
            if path.is_absolute() {
                return Some(path.join("probe-serial"));
            }
        }

        dirs::home_dir().map(|h| h.join(".config").join("probe-serial"))
    }

    /// Get the settings file path
    pub fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("settings.json"))
    }

    /// Load settings from disk
    pub fn load() -> Self {
        Self::settings_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    /// Load settings from `path`, falling back to defaults
    pub fn load_from(path: &Path) -> Self {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default()
    }

    /// Save settings to disk
    pub fn save(&self) -> Result<PathBuf, String> {
        let path =
            Self::settings_path().ok_or_else(|| "Could not determine settings path".to_string())?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save settings to `path`, creating its directory
    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create settings directory: {}", e))?;
        }

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize settings: {}", e))?;

        std::fs::write(path, json).map_err(|e| format!("Failed to write settings: {}", e))?;

        Ok(())
    }
}
