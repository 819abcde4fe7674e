//! Configuration file loading and parsing

use crate::report::OutputFormat;
use anyhow::{Context, Result};
use mote_log_decoder::{MoteId, RecordClass};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration (loaded from config.toml)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub filter: FilterConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InputConfig {
    /// Capture files to decode
    #[serde(default)]
    pub files: Vec<PathBuf>,
    /// Directory to scan for capture files
    #[serde(default)]
    pub capture_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    /// Where report files land (default: next to each capture)
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FilterConfig {
    /// Only decode records from these motes
    pub motes: Option<Vec<MoteId>>,
    /// Only decode these record classes ("status", "info", "error", "critical")
    pub classes: Option<Vec<RecordClass>>,
    /// Stop each file after this many records
    pub max_records: Option<usize>,
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization() {
        let toml_content = r#"
            [input]
            files = ["capture1.bin"]
            capture_dir = "captures"

            [output]
            format = "jsonl"

            [filter]
            motes = [513, 514]
            classes = ["status", "error"]
            max_records = 1000
        "#;

        let config: AppConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.input.files.len(), 1);
        assert_eq!(config.input.capture_dir, Some(PathBuf::from("captures")));
        assert!(matches!(config.output.format, OutputFormat::Jsonl));
        assert_eq!(config.filter.motes, Some(vec![513, 514]));
        assert_eq!(
            config.filter.classes,
            Some(vec![RecordClass::Status, RecordClass::Error])
        );
        assert_eq!(config.filter.max_records, Some(1000));
    }

    #[test]
    fn test_minimal_config() {
        let config: AppConfig = toml::from_str("[input]\nfiles = []\n").unwrap();
        assert!(config.input.files.is_empty());
        assert!(config.filter.motes.is_none());
        assert!(matches!(config.output.format, OutputFormat::Txt));
    }
}
