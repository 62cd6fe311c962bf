//! # Configuration
//!
//! TOML configuration shared by the HTTP server and the command-line tool.
//! Every section and key is optional; missing values fall back to the defaults
//! shown below.
//!
//! # Example TOML
//!
//! ```toml
//! [server]
//! address = "0.0.0.0:5001"
//! allowed_origins = ["http://localhost:3000"]
//! max_upload_bytes = 10485760
//!
//! [watermark]
//! marker = "Embedded with Markora"
//! max_detect_width = 5000
//! max_detect_height = 5000
//! scan_chunk_rows = 1000
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;

use crate::processing::steganography::{DetectorConfig, DEFAULT_MARKER};

/// Load a TOML configuration file and deserialize it into the specified type.
///
/// # Arguments
/// - `path`: Path to the TOML configuration file
///
/// # Returns
/// - `Ok(T)`: Successfully loaded and parsed configuration
/// - `Err`: File I/O or parsing error
///
/// # Example
/// ```ignore
/// let config: MarkoraConfig = load_config("config/markora.toml")?;
/// ```
pub fn load_config<T>(path: &str) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
{
    let content = fs::read_to_string(path)?;
    let config: T = toml::from_str(&content)?;
    Ok(config)
}

/// Complete service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkoraConfig {
    /// HTTP transport settings
    pub server: ServerSettings,
    /// Codec and marker settings
    pub watermark: WatermarkSettings,
}

impl MarkoraConfig {
    /// Load from `path`, or use the defaults when no path is given.
    pub fn load(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => load_config(path),
            None => Ok(Self::default()),
        }
    }
}

/// HTTP transport settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Listen address (e.g., "0.0.0.0:5001")
    pub address: String,
    /// Origins allowed by CORS; empty means any origin
    pub allowed_origins: Vec<String>,
    /// Largest accepted image upload in bytes
    pub max_upload_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            address: "0.0.0.0:5001".to_string(),
            allowed_origins: vec!["http://localhost:3000".to_string()],
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Watermark codec settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatermarkSettings {
    /// Marker appended to user text and required for a valid detection
    pub marker: String,
    /// Wider images are reported as unmarked without scanning
    pub max_detect_width: u32,
    /// Taller images are reported as unmarked without scanning
    pub max_detect_height: u32,
    /// Rows scanned between early-exit checks
    pub scan_chunk_rows: u32,
}

impl Default for WatermarkSettings {
    fn default() -> Self {
        Self {
            marker: DEFAULT_MARKER.to_string(),
            max_detect_width: 5000,
            max_detect_height: 5000,
            scan_chunk_rows: 1000,
        }
    }
}

impl WatermarkSettings {
    pub fn detector_config(&self) -> DetectorConfig {
        DetectorConfig {
            marker: self.marker.clone(),
            max_width: self.max_detect_width,
            max_height: self.max_detect_height,
            chunk_rows: self.scan_chunk_rows.max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_detector() {
        let settings = WatermarkSettings::default();
        assert_eq!(settings.detector_config(), DetectorConfig::default());
    }

    #[test]
    fn test_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[watermark]\nmarker = \"ACME\"\nscan_chunk_rows = 0\n\n[server]\nmax_upload_bytes = 1024"
        )
        .unwrap();

        let config = MarkoraConfig::load(file.path().to_str()).unwrap();

        assert_eq!(config.watermark.marker, "ACME");
        assert_eq!(config.watermark.max_detect_width, 5000);
        assert_eq!(config.watermark.detector_config().chunk_rows, 1);
        assert_eq!(config.server.max_upload_bytes, 1024);
        assert_eq!(config.server.address, "0.0.0.0:5001");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(MarkoraConfig::load(Some("/nonexistent/markora.toml")).is_err());
        assert_eq!(
            MarkoraConfig::load(None).unwrap().server.allowed_origins,
            vec!["http://localhost:3000".to_string()]
        );
    }
}
