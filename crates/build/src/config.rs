//! YAML configuration for shader generation
//!
//! ```yaml
//! version: gles300
//! properties:
//!   ENABLE_FOG: true
//!   FOG_DENSITY: 0.05
//! ```

use crate::generator::GlslVersion;
use crate::properties::PropertyContext;
use serde::{Deserialize, Serialize};

/// Error raised while loading a [`ShaderConfig`]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Yaml(#[from] serde_norway::Error),
}

/// Target dialect and default properties
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShaderConfig {
    /// Dialect the generator emits
    #[serde(default)]
    pub version: GlslVersion,
    /// Properties supplied to every program unless the caller overrides them
    #[serde(default)]
    pub properties: PropertyContext,
}

impl ShaderConfig {
    /// Parses a configuration from YAML content
    ///
    /// # Arguments
    /// * `yaml_content` - YAML string containing the configuration
    pub fn from_yaml(yaml_content: &str) -> Result<Self, ConfigError> {
        Ok(serde_norway::from_str(yaml_content)?)
    }

    /// Parses a configuration from a YAML file
    ///
    /// # Arguments
    /// * `path` - Path to the YAML configuration file
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }
}
