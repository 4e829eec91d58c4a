//! Directory configuration
//!
//! Paths to the input tables and the organisation document, plus the
//! fallback coordinates used for practices without a location. Every key
//! is optional in the YAML form and falls back to the default.

use crate::practice::GeoPoint;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Directory configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    /// Practice table (CSV export of the practice spreadsheet)
    pub practices_path: PathBuf,
    /// Coordinates table
    pub coordinates_path: PathBuf,
    /// Organisation chart document
    pub org_document_path: PathBuf,
    /// Location used when a practice has no coordinates
    pub fallback_coordinates: GeoPoint,
    /// Refuse to save over a document changed by another writer
    pub check_conflicts: bool,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            practices_path: PathBuf::from("Coy Details.csv"),
            coordinates_path: PathBuf::from("Practice Coords.csv"),
            org_document_path: PathBuf::from("organization_structures.json"),
            fallback_coordinates: GeoPoint::DUBLIN,
            check_conflicts: true,
        }
    }
}

impl DirectoryConfig {
    pub fn from_yaml_str(text: &str) -> ConfigResult<Self> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        debug!("Reading configuration from {:?}", path);
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if !self.fallback_coordinates.is_valid() {
            return Err(ConfigError::Invalid(format!(
                "fallback coordinates out of range: {}, {}",
                self.fallback_coordinates.latitude, self.fallback_coordinates.longitude
            )));
        }
        if self.org_document_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "org_document_path must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
