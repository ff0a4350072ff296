//! Run configuration.
//!
//! Every field has a default, so a config file only needs the keys it
//! overrides:
//!
//! ```json
//! { "input": "exports/superstore.csv", "delimiter": ";" }
//! ```

use crate::error::{Result, ResultExt as _, StoreAuditError};
use crate::pipeline::loader::LoadOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_INPUT: &str = "data/Superstore Cleaned.csv";
pub const DEFAULT_OUTPUT: &str = "data/Superstore_Final_Cleaned.csv";
pub const DEFAULT_REPORT: &str = "data/validation_report.txt";
pub const DEFAULT_INFER_SCHEMA_LENGTH: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Source table
    pub input: PathBuf,

    /// Enhanced table destination
    pub output: PathBuf,

    /// Text report destination
    pub report: PathBuf,

    /// Single-byte ASCII field separator
    pub delimiter: char,

    /// Rows sampled for column type inference
    pub infer_schema_length: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT),
            output: PathBuf::from(DEFAULT_OUTPUT),
            report: PathBuf::from(DEFAULT_REPORT),
            delimiter: ',',
            infer_schema_length: DEFAULT_INFER_SCHEMA_LENGTH,
        }
    }
}

impl PipelineConfig {
    /// Load a config from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            StoreAuditError::Config(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_json(&content)
    }

    /// Parse a config from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.delimiter_byte()?;
        Ok(config)
    }

    /// Save the config as pretty JSON, creating parent directories
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = self.to_json()?;
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory {}", parent.display())
            })?;
        }
        std::fs::write(path, json).map_err(|e| {
            StoreAuditError::Config(format!(
                "Failed to write config file {}: {e}",
                path.display()
            ))
        })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// The delimiter as the byte the CSV reader expects.
    ///
    /// # Errors
    ///
    /// Returns [`StoreAuditError::Config`] for non-ASCII delimiters.
    pub fn delimiter_byte(&self) -> Result<u8> {
        if self.delimiter.is_ascii() {
            Ok(self.delimiter as u8)
        } else {
            Err(StoreAuditError::Config(format!(
                "Delimiter must be a single ASCII character, got {:?}",
                self.delimiter
            )))
        }
    }

    pub fn load_options(&self) -> Result<LoadOptions> {
        Ok(LoadOptions {
            delimiter: self.delimiter_byte()?,
            infer_schema_length: self.infer_schema_length,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() -> Result<()> {
        let config = PipelineConfig::from_json(r#"{ "input": "in.csv", "delimiter": ";" }"#)?;
        assert_eq!(config.input, PathBuf::from("in.csv"));
        assert_eq!(config.output, PathBuf::from(DEFAULT_OUTPUT));
        assert_eq!(config.report, PathBuf::from(DEFAULT_REPORT));
        assert_eq!(config.load_options()?.delimiter, b';');
        assert_eq!(config.infer_schema_length, DEFAULT_INFER_SCHEMA_LENGTH);
        Ok(())
    }

    #[test]
    fn test_non_ascii_delimiter_rejected() {
        let err = PipelineConfig::from_json(r#"{ "delimiter": "§" }"#)
            .expect_err("non-ASCII delimiter");
        assert!(matches!(err, StoreAuditError::Config(_)));
    }

    #[test]
    fn test_malformed_json_is_config_error() {
        let err = PipelineConfig::from_json("{ not json").expect_err("malformed JSON");
        assert!(err.to_string().starts_with("Configuration error"));
    }

    #[test]
    fn test_file_round_trip() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("conf").join("storeaudit.json");
        let config = PipelineConfig {
            delimiter: '\t',
            ..PipelineConfig::default()
        };

        config.to_file(&path)?;
        assert_eq!(PipelineConfig::from_file(&path)?, config);
        Ok(())
    }
}
