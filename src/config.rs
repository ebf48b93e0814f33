//! TOML settings file
//!
//! ```toml
//! # vv.toml
//! [viewer.window]
//! width = 1600
//! height = 1000
//!
//! [viewer.color_map]
//! table_size = 64
//! hue_range = [0.0, 0.66]
//!
//! [io]
//! header_bytes = 512
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use vv_io::DEFAULT_HEADER_BYTES;
use vv_visualization::ViewerConfig;

/// Root of a vv.toml file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub viewer: ViewerConfig,
    pub io: IoConfig,
}

/// Input handling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IoConfig {
    /// Bytes read from the start of each input for format detection
    pub header_bytes: usize,
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            header_bytes: DEFAULT_HEADER_BYTES,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse TOML configuration")?;
        anyhow::ensure!(config.io.header_bytes > 0, "io.header_bytes must be positive");
        anyhow::ensure!(
            config.viewer.color_map.table_size > 0,
            "viewer.color_map.table_size must be positive"
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml = r#"
            [viewer.window]
            width = 1600
            title = "Atlas"

            [viewer.color_map]
            table_size = 64

            [io]
            header_bytes = 512
        "#;

        let config = Config::from_str(toml).unwrap();
        assert_eq!(config.viewer.window.width, 1600);
        assert_eq!(config.viewer.window.height, 1024);
        assert_eq!(config.viewer.window.title, "Atlas");
        assert_eq!(config.viewer.color_map.table_size, 64);
        assert_eq!(config.viewer.color_map.hue_range, [0.0, 0.8]);
        assert_eq!(config.io.header_bytes, 512);
    }

    #[test]
    fn test_empty_config() {
        assert_eq!(Config::from_str("").unwrap(), Config::default());
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(Config::from_str("[io]\nheader_bytes = 0").is_err());
        assert!(Config::from_str("[viewer.window]\nwidth = \"wide\"").is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = Config::from_file(Path::new("/nonexistent/vv.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
