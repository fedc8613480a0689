//! Integration tests for serial number resolution
//!
//! These tests verify end-to-end behavior of the resolver including:
//! - Single, missing and ambiguous registry candidates
//! - Lazy, at-most-once use of the connected-probe source
//! - Isolation of per-port registry failures
//! - Failure of the batch when connected probes cannot be listed

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use probe_detect::{ConnectedProbes, DetectError};
use probe_registry::{CommandRunner, KeyCorrelator, RegistryError};
use probe_resolve::{ResolveError, SerialLookup, SerialNumberResolver};

// ============================================================================
// Helper Functions
// ============================================================================

mod helpers {
    use super::*;

    /// Registry lookup answering from a fixed table
    #[derive(Default)]
    pub struct FakeLookup {
        pub candidates: HashMap<String, Vec<String>>,
        pub failing: Vec<String>,
    }

    impl FakeLookup {
        pub fn with(mut self, com_name: &str, serials: &[&str]) -> Self {
            self.candidates.insert(
                com_name.to_string(),
                serials.iter().map(|s| s.to_string()).collect(),
            );
            self
        }

        pub fn failing(mut self, com_name: &str) -> Self {
            self.failing.push(com_name.to_string());
            self
        }
    }

    #[async_trait]
    impl SerialLookup for FakeLookup {
        async fn find_jlink_ids(&self, com_name: &str) -> Result<Vec<String>, RegistryError> {
            if self.failing.iter().any(|c| c == com_name) {
                return Err(RegistryError::Launch {
                    program: "reg".into(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "program not found"),
                });
            }
            Ok(self.candidates.get(com_name).cloned().unwrap_or_default())
        }
    }

    /// Connected-probe source that counts how often it is asked
    pub struct FakeProbes {
        pub serials: Option<Vec<u64>>,
        pub calls: AtomicUsize,
    }

    impl FakeProbes {
        pub fn connected(serials: &[u64]) -> Self {
            Self {
                serials: Some(serials.to_vec()),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn broken() -> Self {
            Self {
                serials: None,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ConnectedProbes for FakeProbes {
        async fn connected_serial_numbers(&self) -> Result<Vec<u64>, DetectError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.serials
                .clone()
                .ok_or_else(|| DetectError::EnumerationFailed("driver not loaded".into()))
        }
    }

    pub fn ports(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }
}

use helpers::{ports, FakeLookup, FakeProbes};

// ============================================================================
// Candidate Policy Tests
// ============================================================================

#[tokio::test]
async fn empty_batch_resolves_empty() {
    let probes = FakeProbes::connected(&[]);
    let resolver = SerialNumberResolver::new(FakeLookup::default(), &probes);

    let resolution = resolver.get_serial_number_map(&[]).await.unwrap();

    assert!(resolution.resolved.is_empty());
    assert!(resolution.warnings.is_empty());
    assert_eq!(probes.call_count(), 0);
}

#[tokio::test]
async fn missing_port_warns() {
    let probes = FakeProbes::connected(&[]);
    let resolver = SerialNumberResolver::new(FakeLookup::default(), &probes);

    let resolution = resolver.get_serial_number_map(&ports(&["COM1"])).await.unwrap();

    assert!(resolution.resolved.is_empty());
    assert_eq!(resolution.warnings.len(), 1);
    assert!(resolution.warnings[0].contains("Could not find serial number for COM1"));
}

#[tokio::test]
async fn single_candidate_skips_connected_probes() {
    let lookup = FakeLookup::default().with("COM1", &["000123456789"]);
    let probes = FakeProbes::broken();
    let resolver = SerialNumberResolver::new(lookup, &probes);

    let resolution = resolver.get_serial_number_map(&ports(&["COM1"])).await.unwrap();

    assert_eq!(resolution.resolved.get("COM1").map(String::as_str), Some("000123456789"));
    assert!(resolution.warnings.is_empty());
    assert_eq!(probes.call_count(), 0);
}

#[tokio::test]
async fn ambiguous_candidate_uses_connected_probe() {
    let lookup = FakeLookup::default().with("COM1", &["000123456789", "000234567890"]);
    let probes = FakeProbes::connected(&[123_456_789]);
    let resolver = SerialNumberResolver::new(lookup, &probes);

    let resolution = resolver.get_serial_number_map(&ports(&["COM1"])).await.unwrap();

    assert_eq!(resolution.resolved.get("COM1").map(String::as_str), Some("000123456789"));
    assert_eq!(resolution.warnings.len(), 1);
    let warning = &resolution.warnings[0];
    assert!(warning.contains("000123456789, 000234567890"));
    assert!(warning.contains("000123456789 is connected"));
    assert_eq!(probes.call_count(), 1);
}

#[tokio::test]
async fn ambiguous_candidate_none_connected() {
    let lookup = FakeLookup::default().with("COM1", &["000123456789", "000234567890"]);
    let probes = FakeProbes::connected(&[345_678_901]);
    let resolver = SerialNumberResolver::new(lookup, &probes);

    let resolution = resolver.get_serial_number_map(&ports(&["COM1"])).await.unwrap();

    assert!(resolution.resolved.is_empty());
    assert_eq!(resolution.warnings.len(), 1);
    assert!(resolution.warnings[0].contains("none of these are connected"));
}

#[tokio::test]
async fn ambiguous_candidate_several_connected_is_unresolved() {
    let lookup = FakeLookup::default().with("COM1", &["000123456789", "000234567890"]);
    let probes = FakeProbes::connected(&[123_456_789, 234_567_890]);
    let resolver = SerialNumberResolver::new(lookup, &probes);

    let resolution = resolver.get_serial_number_map(&ports(&["COM1"])).await.unwrap();

    assert!(resolution.resolved.is_empty());
    assert_eq!(resolution.warnings.len(), 1);
    assert!(resolution.warnings[0].contains("are all connected"));
}

#[tokio::test]
async fn connected_probes_listed_once_per_batch() {
    let lookup = FakeLookup::default()
        .with("COM1", &["000123456789", "000234567890"])
        .with("COM2", &["000345678901", "000456789012"])
        .with("COM3", &["000567890123"]);
    let probes = FakeProbes::connected(&[234_567_890, 345_678_901]);
    let resolver = SerialNumberResolver::new(lookup, &probes);

    let resolution = resolver
        .get_serial_number_map(&ports(&["COM1", "COM2", "COM3"]))
        .await
        .unwrap();

    assert_eq!(probes.call_count(), 1);
    assert_eq!(resolution.resolved.len(), 3);
    assert_eq!(resolution.resolved["COM1"], "000234567890");
    assert_eq!(resolution.resolved["COM2"], "000345678901");
    assert_eq!(resolution.resolved["COM3"], "000567890123");
    assert_eq!(resolution.warnings.len(), 2);
}

// ============================================================================
// Failure Handling Tests
// ============================================================================

#[tokio::test]
async fn registry_failure_is_isolated() {
    let lookup = FakeLookup::default()
        .with("COM1", &["000123456789"])
        .failing("COM2")
        .with("COM3", &["000234567890"]);
    let probes = FakeProbes::connected(&[]);
    let resolver = SerialNumberResolver::new(lookup, &probes);

    let resolution = resolver
        .get_serial_number_map(&ports(&["COM1", "COM2", "COM3"]))
        .await
        .unwrap();

    assert_eq!(resolution.resolved.len(), 2);
    assert!(!resolution.resolved.contains_key("COM2"));
    assert_eq!(resolution.warnings.len(), 1);
    assert!(resolution.warnings[0]
        .starts_with("Unable to read serial number for COM2 from registry: "));
}

#[tokio::test]
async fn enumeration_failure_rejects_batch() {
    let lookup = FakeLookup::default()
        .with("COM1", &["000123456789"])
        .with("COM2", &["000123456789", "000234567890"]);
    let probes = FakeProbes::broken();
    let resolver = SerialNumberResolver::new(lookup, &probes);

    let result = resolver.get_serial_number_map(&ports(&["COM1", "COM2"])).await;

    assert!(matches!(result, Err(ResolveError::Enumeration(_))));
    assert_eq!(probes.call_count(), 1);
}

#[tokio::test]
async fn failed_lookup_does_not_trigger_enumeration() {
    let lookup = FakeLookup::default().failing("COM1").with("COM2", &["000123456789"]);
    let probes = FakeProbes::broken();
    let resolver = SerialNumberResolver::new(lookup, &probes);

    let resolution = resolver
        .get_serial_number_map(&ports(&["COM1", "COM2"]))
        .await
        .unwrap();

    assert_eq!(resolution.resolved.len(), 1);
    assert_eq!(probes.call_count(), 0);
}

// ============================================================================
// Registry Correlation Tests
// ============================================================================

mod registry {
    use super::*;

    const ROOT: &str = "HKEY_LOCAL_MACHINE\\SYSTEM\\CurrentControlSet\\Enum\\USB";

    /// `reg` stand-in returning canned output per searched string
    struct CannedReg(HashMap<&'static str, String>);

    #[async_trait]
    impl CommandRunner for CannedReg {
        async fn run(&self, args: &[String]) -> Result<String, RegistryError> {
            Ok(self.0.get(args[3].as_str()).cloned().unwrap_or_default())
        }
    }

    fn canned() -> CannedReg {
        let port_output = format!(
            "\r\n{ROOT}\\VID_1366&PID_1015&MI_00\\7&2f8ac9e0&0&0000\\Device Parameters\r\n    PortName    REG_SZ    COM3\r\n\r\n\
             {ROOT}\\VID_1366&PID_1015&MI_00\\7&3a9bd1f1&0&0000\\Device Parameters\r\n    PortName    REG_SZ    COM3\r\n\r\n\
             {ROOT}\\VID_1366&PID_1015&MI_00\\7&11111111&0&0000\\Device Parameters\r\n    PortName    REG_SZ    COM5\r\n\r\n\
             End of search: 2 match(es) found.\r\n"
        );
        let first = format!(
            "\r\n{ROOT}\\VID_1366&PID_1015\\000123456789\r\n    ParentIdPrefix    REG_SZ    7&2f8ac9e0&0\r\n\r\nEnd of search: 1 match(es) found.\r\n"
        );
        let second = format!(
            "\r\n{ROOT}\\VID_1366&PID_1015\\000234567890\r\n    ParentIdPrefix    REG_SZ    7&3a9bd1f1&0\r\n\r\nEnd of search: 1 match(es) found.\r\n"
        );
        let single = format!(
            "\r\n{ROOT}\\VID_1366&PID_1015\\000683000001\r\n    ParentIdPrefix    REG_SZ    7&11111111&0\r\n\r\nEnd of search: 1 match(es) found.\r\n"
        );

        let mut answers = HashMap::new();
        answers.insert("COM3", port_output.clone());
        answers.insert("COM5", port_output);
        answers.insert("7&2f8ac9e0&0", first);
        answers.insert("7&3a9bd1f1&0", second);
        answers.insert("7&11111111&0", single);
        CannedReg(answers)
    }

    #[tokio::test]
    async fn correlator_feeds_resolver() {
        let probes = FakeProbes::connected(&[234_567_890]);
        let resolver = SerialNumberResolver::new(KeyCorrelator::new(canned()), &probes);

        let resolution = resolver
            .get_serial_number_map(&ports(&["COM3", "COM5", "COM9"]))
            .await
            .unwrap();

        assert_eq!(resolution.resolved.len(), 2);
        assert_eq!(resolution.resolved["COM3"], "000234567890");
        assert_eq!(resolution.resolved["COM5"], "000683000001");
        assert_eq!(
            resolution.warnings,
            vec![
                "Found serial numbers 000123456789, 000234567890 for COM3 in registry. 000234567890 is connected, so using that.".to_string(),
                "Could not find serial number for COM9 in registry.".to_string(),
            ]
        );
        assert_eq!(probes.call_count(), 1);
    }
}

// ============================================================================
// Serialization Tests
// ============================================================================

#[cfg(feature = "serde")]
#[tokio::test]
async fn resolution_serializes_to_json() {
    let lookup = FakeLookup::default().with("COM1", &["000123456789"]);
    let resolver = SerialNumberResolver::new(lookup, FakeProbes::connected(&[]));

    let resolution = resolver
        .get_serial_number_map(&ports(&["COM1", "COM2"]))
        .await
        .unwrap();
    let json = serde_json::to_value(&resolution).unwrap();

    assert_eq!(json["resolved"]["COM1"], "000123456789");
    assert_eq!(json["warnings"][0], "Could not find serial number for COM2 in registry.");
}
