//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading engine
//! configuration from YAML files.

use std::fs;
use std::path::Path;

use crate::error::{EngineError, EngineResult};

use super::types::{DevicesConfig, EngineConfig, EngineSettings, WorksitesConfig};

/// Loads and provides access to engine configuration.
///
/// # Directory Structure
///
/// ```text
/// config/default/
/// ├── engine.yaml     # Geofence, reconciliation, auto-close and payroll policy
/// ├── worksites.yaml  # Worksite registry
/// ├── devices.yaml    # Biometric devices and badge enrollments
/// └── roster.yaml     # Optional; seeds the in-memory roster for the server
/// ```
///
/// # Example
///
/// ```no_run
/// use attendance_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/default")?;
/// println!("{} worksites", loader.config().worksites().len());
/// # Ok::<(), attendance_engine::error::EngineError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: EngineConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// Returns an error if any of `engine.yaml`, `worksites.yaml` or
    /// `devices.yaml` is missing or contains invalid YAML.
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let settings = load_yaml::<EngineSettings>(&path.join("engine.yaml"))?;
        let worksites = load_yaml::<WorksitesConfig>(&path.join("worksites.yaml"))?;
        let devices = load_yaml::<DevicesConfig>(&path.join("devices.yaml"))?;

        let config = EngineConfig::new(settings, worksites.worksites, devices.devices);
        tracing::info!(
            path = %path.display(),
            worksites = config.worksites().len(),
            devices = config.devices().len(),
            "Loaded engine configuration"
        );

        Ok(Self { config })
    }

    /// Wraps an already-built configuration.
    pub fn from_config(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Returns the underlying configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the policy settings.
    pub fn settings(&self) -> &EngineSettings {
        self.config.settings()
    }
}

/// Loads and parses a YAML file.
pub(crate) fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
    let path_str = path.display().to_string();

    let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
        path: path_str.clone(),
    })?;

    serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
        path: path_str,
        message: e.to_string(),
    })
}
