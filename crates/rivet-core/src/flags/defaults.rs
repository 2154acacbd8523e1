use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::flags::error::FlagError;

/// Supported defaults file formats
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DefaultsFormat {
    /// JSON format (.json)
    Json,
    /// YAML format (.yaml, .yml) - requires "yaml-config" feature
    #[cfg(feature = "yaml-config")]
    Yaml,
    /// TOML format (.toml) - requires "toml-config" feature
    #[cfg(feature = "toml-config")]
    Toml,
}

impl DefaultsFormat {
    /// Get the file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            DefaultsFormat::Json => "json",
            #[cfg(feature = "yaml-config")]
            DefaultsFormat::Yaml => "yaml",
            #[cfg(feature = "toml-config")]
            DefaultsFormat::Toml => "toml",
        }
    }

    /// Determine format from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| match ext.to_lowercase().as_str() {
                "json" => Some(DefaultsFormat::Json),
                #[cfg(feature = "yaml-config")]
                "yaml" | "yml" => Some(DefaultsFormat::Yaml),
                #[cfg(feature = "toml-config")]
                "toml" => Some(DefaultsFormat::Toml),
                _ => None,
            })
    }
}

/// Flag name -> default value, read from a defaults file.
///
/// Nested tables are flattened with `.`, so `{"server": {"port": 80}}` sets
/// the default of `--server.port`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlagDefaults {
    values: BTreeMap<String, Value>,
}

impl FlagDefaults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read and parse a defaults file, choosing the format by extension
    pub fn load(path: &Path) -> Result<Self, FlagError> {
        let format = DefaultsFormat::from_path(path).ok_or_else(|| FlagError::UnsupportedFormat(path.to_path_buf()))?;
        let content = fs::read_to_string(path).map_err(|source| FlagError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Loading flag defaults from {}", path.display());
        Self::parse(&content, format)
    }

    /// Parse defaults from a string in the given format
    pub fn parse(content: &str, format: DefaultsFormat) -> Result<Self, FlagError> {
        let failed = |message: String| FlagError::Deserialization {
            format: format.extension().to_string(),
            message,
        };
        let table: BTreeMap<String, Value> = match format {
            DefaultsFormat::Json => serde_json::from_str(content).map_err(|e| failed(e.to_string()))?,
            #[cfg(feature = "yaml-config")]
            DefaultsFormat::Yaml => serde_yaml::from_str(content).map_err(|e| failed(e.to_string()))?,
            #[cfg(feature = "toml-config")]
            DefaultsFormat::Toml => toml::from_str(content).map_err(|e| failed(e.to_string()))?,
        };

        let mut defaults = Self::new();
        for (key, value) in table {
            defaults.flatten_into(key, value);
        }
        Ok(defaults)
    }

    fn flatten_into(&mut self, key: String, value: Value) {
        match value {
            Value::Object(table) => {
                for (child, value) in table {
                    self.flatten_into(format!("{}.{}", key, child), value);
                }
            }
            value => {
                self.values.insert(key, value);
            }
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    pub fn keys(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
