//! Parsing of `reg query` output
//!
//! `reg query /s` prints one block per matching key: the key path on its
//! own line, followed by `name    type    value` lines, with blocks
//! separated by a blank line. The output is not a guaranteed format, so
//! anything that does not look like a key or a `REG_SZ` value is skipped
//! rather than reported.

/// Root hives that a key path may start with
const ROOT_HIVES: &[&str] = &[
    "HKEY_LOCAL_MACHINE",
    "HKEY_CURRENT_USER",
    "HKEY_CLASSES_ROOT",
    "HKEY_USERS",
    "HKEY_CURRENT_CONFIG",
];

/// Value type accepted by the parser
const REG_SZ: &str = "REG_SZ";

/// Index of the device instance segment in a key under `Enum\USB`
///
/// `HKEY_LOCAL_MACHINE\SYSTEM\CurrentControlSet\Enum\USB\<hardware id>\<instance>`
const INSTANCE_SEGMENT: usize = 6;

/// A single string value of a registry key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryValue {
    pub name: String,
    pub value: String,
}

/// One key and its string values, as printed by `reg query`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryRecord {
    /// Full key path, starting with a root hive
    pub key: String,
    /// Parsed `REG_SZ` values, in output order
    pub values: Vec<RegistryValue>,
}

impl RegistryRecord {
    /// Check whether this key holds `name` with exactly `value`
    pub fn has_value(&self, name: &str, value: &str) -> bool {
        self.values
            .iter()
            .any(|entry| entry.name == name && entry.value == value)
    }
}

/// Parse a `name    REG_SZ    value` line
///
/// Returns `None` unless the line has exactly three whitespace separated
/// tokens and the middle one is `REG_SZ`.
pub fn parse_variable_line(line: &str) -> Option<RegistryValue> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    match tokens.as_slice() {
        [name, kind, value] if *kind == REG_SZ => Some(RegistryValue {
            name: (*name).to_string(),
            value: (*value).to_string(),
        }),
        _ => None,
    }
}

/// Parse raw `reg query` output into records
pub fn parse_results(text: &str) -> Vec<RegistryRecord> {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");

    normalized
        .split("\n\n")
        .filter_map(parse_block)
        .collect()
}

fn parse_block(block: &str) -> Option<RegistryRecord> {
    let mut lines = block.trim_matches('\n').lines();
    let key = lines.next()?.trim();

    if !is_root_key(key) {
        return None;
    }

    let rest: Vec<&str> = lines.collect();
    if rest.is_empty() {
        return None;
    }

    Some(RegistryRecord {
        key: key.to_string(),
        values: rest.into_iter().filter_map(parse_variable_line).collect(),
    })
}

fn is_root_key(line: &str) -> bool {
    line.split('\\')
        .next()
        .is_some_and(|hive| ROOT_HIVES.contains(&hive))
}

/// Keys of every record holding `name` with exactly `value`
pub fn parse_matching_keys(text: &str, name: &str, value: &str) -> Vec<String> {
    parse_results(text)
        .into_iter()
        .filter(|record| record.has_value(name, value))
        .map(|record| record.key)
        .collect()
}

fn instance_segment(key: &str) -> Option<&str> {
    key.split('\\').nth(INSTANCE_SEGMENT)
}

/// Extract the `ParentIdPrefix` from a `Device Parameters` key
///
/// The instance segment of a composite device interface looks like
/// `7&2f8ac9e0&0&0000`; the prefix is everything before the last `&`.
pub fn parse_parent_id_prefix(key: &str) -> Option<String> {
    let instance = instance_segment(key)?;
    match instance.rfind('&') {
        Some(pos) if pos > 0 => Some(instance[..pos].to_string()),
        _ => None,
    }
}

/// Extract the J-Link serial number from a parent device key
pub fn parse_jlink_id(key: &str) -> Option<String> {
    instance_segment(key).map(str::to_string)
}
