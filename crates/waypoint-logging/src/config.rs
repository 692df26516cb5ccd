//! Logging settings
//!
//! Every struct here deserializes with missing fields filled from its
//! `Default`, so a JSON file only has to mention what it changes.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directive used when `RUST_LOG` is unset, e.g. `"info"`
    pub level: String,

    /// Extra per-target directives, e.g. `waypoint_routing::sync => trace`
    pub targets: BTreeMap<String, String>,

    /// Console sink; `None` turns console output off
    pub console: Option<ConsoleConfig>,

    /// Rolling JSONL file sink
    pub file: Option<FileConfig>,

    /// Which fields JSON lines carry (console and file alike)
    pub json: JsonFields,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            targets: BTreeMap::new(),
            console: Some(ConsoleConfig::default()),
            file: None,
            json: JsonFields::default(),
        }
    }
}

impl LogConfig {
    /// Debug level, coloured human-readable console
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            console: Some(ConsoleConfig {
                format: ConsoleFormat::Pretty,
                ansi: true,
                capture: false,
            }),
            ..Self::default()
        }
    }

    /// Warnings only, written through the test harness so `cargo test`
    /// shows them next to the failing test
    pub fn testing() -> Self {
        Self {
            level: "warn".to_string(),
            console: Some(ConsoleConfig {
                format: ConsoleFormat::Pretty,
                ansi: false,
                capture: true,
            }),
            ..Self::default()
        }
    }

    /// Add a daily-rolling file sink under `directory`
    pub fn with_file(mut self, directory: impl Into<PathBuf>) -> Self {
        self.file = Some(FileConfig {
            directory: directory.into(),
            ..FileConfig::default()
        });
        self
    }

    /// Set the level for one target
    pub fn with_target(mut self, target: impl Into<String>, level: impl Into<String>) -> Self {
        self.targets.insert(target.into(), level.into());
        self
    }

    /// Parse settings from JSON
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// How console lines are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleFormat {
    /// One JSON object per line
    #[default]
    Json,
    /// Multi-line, human-readable
    Pretty,
}

/// Console sink settings
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub format: ConsoleFormat,
    /// Colour escape codes (pretty format only)
    pub ansi: bool,
    /// Route output through libtest's capture instead of raw stdout
    pub capture: bool,
}

/// File sink settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub directory: PathBuf,
    /// Log file names start with this
    pub prefix: String,
    pub rotation: RotationStrategy,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("logs"),
            prefix: "waypoint".to_string(),
            rotation: RotationStrategy::default(),
        }
    }
}

/// When the file sink starts a new file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationStrategy {
    #[default]
    Daily,
    Hourly,
    /// One `<prefix>.log`, truncated at startup
    Never,
}

/// Optional parts of each JSON line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonFields {
    /// Put event fields at the top level instead of under `fields`
    pub flatten: bool,
    /// Include the full list of entered spans
    pub span_list: bool,
    /// Include thread id and name
    pub thread: bool,
    /// Include source file and line
    pub source_location: bool,
}

impl Default for JsonFields {
    fn default() -> Self {
        Self {
            flatten: true,
            span_list: true,
            thread: false,
            source_location: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_logs_json_at_info() {
        let config = LogConfig::default();
        assert_eq!(config.level, "info");
        assert_eq!(config.console.unwrap().format, ConsoleFormat::Json);
        assert!(config.file.is_none());
        assert!(config.targets.is_empty());
    }

    #[test]
    fn test_presets() {
        let dev = LogConfig::development();
        assert_eq!(dev.level, "debug");
        let console = dev.console.unwrap();
        assert_eq!(console.format, ConsoleFormat::Pretty);
        assert!(console.ansi && !console.capture);

        let test = LogConfig::testing();
        assert_eq!(test.level, "warn");
        assert!(test.console.unwrap().capture);
    }

    #[test]
    fn test_with_file_and_target() {
        let config = LogConfig::default()
            .with_file("/tmp/waypoint-logs")
            .with_target("waypoint_routing::sync", "trace");

        let file = config.file.unwrap();
        assert_eq!(file.directory, PathBuf::from("/tmp/waypoint-logs"));
        assert_eq!(file.prefix, "waypoint");
        assert_eq!(file.rotation, RotationStrategy::Daily);
        assert_eq!(config.targets["waypoint_routing::sync"], "trace");
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let config = LogConfig::from_json(
            r#"{
                "level": "debug",
                "console": { "format": "pretty" },
                "file": { "directory": "logs", "rotation": "hourly" },
                "json": { "thread": true }
            }"#,
        )
        .unwrap();

        assert_eq!(config.level, "debug");
        let console = config.console.unwrap();
        assert_eq!(console.format, ConsoleFormat::Pretty);
        assert!(!console.capture);
        let file = config.file.unwrap();
        assert_eq!(file.rotation, RotationStrategy::Hourly);
        assert_eq!(file.prefix, "waypoint");
        assert!(config.json.thread);
        assert!(config.json.flatten);
    }

    #[test]
    fn test_null_console_disables_it() {
        let config = LogConfig::from_json(r#"{ "console": null }"#).unwrap();
        assert!(config.console.is_none());
        assert_eq!(config.level, "info");
    }
}
