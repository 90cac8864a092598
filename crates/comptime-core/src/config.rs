use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;
use crate::injector::DEFAULT_PATTERN;
use crate::plugin::Loader;

/// What happens when an id is registered twice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DuplicatePolicy {
    /// Last write wins
    #[serde(rename = "overwrite")]
    Overwrite,
    /// The second registration fails
    #[serde(rename = "strict")]
    Strict,
}

impl Default for DuplicatePolicy {
    fn default() -> Self {
        DuplicatePolicy::Overwrite
    }
}

/// When the injector copies the registry into module text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnapshotMode {
    /// On every load request; later registrations are visible
    #[serde(rename = "load")]
    AtLoad,
    /// Once, when the host installs the plugin
    #[serde(rename = "setup")]
    AtSetup,
}

impl Default for SnapshotMode {
    fn default() -> Self {
        SnapshotMode::AtLoad
    }
}

/// Options for the registry and injector.
///
/// Meant to be embedded in a host's own configuration; this crate never
/// reads configuration files itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComptimeOptions {
    /// Regular expression selecting the virtual import path (default: `^\$COMPTIME$`)
    #[serde(default = "default_pattern")]
    pub pattern: String,

    /// Language hint for the synthesized module (default: ts)
    #[serde(default)]
    pub loader: Loader,

    /// When the registry is snapshotted (default: load)
    #[serde(default)]
    pub snapshot_mode: SnapshotMode,

    /// Duplicate id handling (default: overwrite)
    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,
}

fn default_pattern() -> String {
    DEFAULT_PATTERN.to_string()
}

impl Default for ComptimeOptions {
    fn default() -> Self {
        Self {
            pattern: default_pattern(),
            loader: Loader::Ts,
            snapshot_mode: SnapshotMode::AtLoad,
            duplicate_policy: DuplicatePolicy::Overwrite,
        }
    }
}

impl ComptimeOptions {
    /// Parse options from JSON
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let options: ComptimeOptions = serde_json::from_str(json)?;
        Ok(options)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = ComptimeOptions::default();
        assert_eq!(options.pattern, r"^\$COMPTIME$");
        assert_eq!(options.loader, Loader::Ts);
        assert_eq!(options.snapshot_mode, SnapshotMode::AtLoad);
        assert_eq!(options.duplicate_policy, DuplicatePolicy::Overwrite);
    }

    #[test]
    fn test_serialize_options() {
        let json = ComptimeOptions::default().to_json_pretty().unwrap();
        assert!(json.contains("snapshotMode"));
        assert!(json.contains("duplicatePolicy"));
    }

    #[test]
    fn test_deserialize_partial_options() {
        let json = r#"{
            "pattern": "^virtual:consts$",
            "duplicatePolicy": "strict"
        }"#;
        let options = ComptimeOptions::from_json_str(json).unwrap();

        assert_eq!(options.pattern, "^virtual:consts$");
        assert_eq!(options.duplicate_policy, DuplicatePolicy::Strict);
        assert_eq!(options.loader, Loader::Ts);
        assert_eq!(options.snapshot_mode, SnapshotMode::AtLoad);
    }

    #[test]
    fn test_deserialize_rejects_unknown_loader() {
        let result = ComptimeOptions::from_json_str(r#"{"loader": "wasm"}"#);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
