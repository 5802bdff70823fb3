use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;
use crate::params::ParameterSet;

/// Where a configured fur takes its material from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MaterialSourceConfig {
    /// The material the host registered for this fur.
    #[default]
    Asset,
    /// A new material built from the named shader at activation.
    Shader { name: String },
}

/// On-disk description of one fur.
///
/// ```yaml
/// params:
///   shell_count: 32
///   density: 250
/// lean: true
/// material:
///   kind: shader
///   name: shellfur/shell
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FurConfig {
    pub params: ParameterSet,
    /// Whether parameter edits are republished while active.
    pub auto_update: bool,
    /// Whether the fur leans against movement and settles under gravity.
    pub lean: bool,
    pub locomotion_speed: f32,
    pub material: MaterialSourceConfig,
}

impl Default for FurConfig {
    fn default() -> Self {
        Self {
            params: ParameterSet::default(),
            auto_update: true,
            lean: true,
            locomotion_speed: 1.0,
            material: MaterialSourceConfig::Asset,
        }
    }
}

impl FurConfig {
    /// Load from a `.yaml`, `.yml` or `.json` file. Parameters come back clamped.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let text = match ext.as_deref() {
            Some("yaml" | "yml" | "json") => std::fs::read_to_string(path)?,
            _ => return Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        };
        let config = if ext.as_deref() == Some("json") {
            Self::from_json_str(&text)?
        } else {
            Self::from_yaml_str(&text)?
        };
        tracing::info!(path = %path.display(), shells = config.params.shell_count, "loaded fur config");
        Ok(config)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        Ok(config.clamped())
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        Ok(config.clamped())
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    fn clamped(mut self) -> Self {
        self.params.clamp_in_place();
        self
    }
}
