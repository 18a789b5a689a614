//! Editor configuration
//!
//! Persisted as RON. Every section has defaults, so a partial file is fine.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::materials::MaterialPalette;

/// One level of detail: tessellate with `tolerance`, show from `distance` on
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LodConfig {
    /// Chord tolerance passed to the kernel
    pub tolerance: f32,
    /// Camera distance at which this level becomes active
    pub distance: f32,
}

/// Undo history configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Maximum number of undo entries (`None` = unbounded)
    pub max_entries: Option<usize>,
}

/// Top-level editor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Levels of detail, coarsest first
    pub lod: Vec<LodConfig>,
    /// Undo history settings
    pub history: HistoryConfig,
    /// Material palette
    pub materials: MaterialPalette,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            lod: vec![
                LodConfig {
                    tolerance: 0.1,
                    distance: 50.0,
                },
                LodConfig {
                    tolerance: 0.01,
                    distance: 0.0,
                },
            ],
            history: HistoryConfig {
                max_entries: Some(100),
            },
            materials: MaterialPalette::default(),
        }
    }
}

/// Configuration errors
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// File could not be read or written
    #[error("IO error: {0}")]
    Io(String),
    /// Content is not valid RON
    #[error("Parse error: {0}")]
    Parse(String),
    /// Configuration could not be serialized
    #[error("Serialization error: {0}")]
    Serialize(String),
    /// Values are out of range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl EditorConfig {
    /// Parse from a RON string
    pub fn from_ron_str(content: &str) -> Result<Self, ConfigError> {
        let config: EditorConfig =
            ron::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to a pretty RON string
    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Load configuration from a file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_ron_str(&content)
    }

    /// Save configuration to a file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let content = self.to_ron_string()?;
        std::fs::write(path.as_ref(), content).map_err(|e| ConfigError::Io(e.to_string()))
    }

    /// Check LOD levels are usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lod.is_empty() {
            return Err(ConfigError::Invalid("at least one LOD level is required".into()));
        }
        for level in &self.lod {
            if level.tolerance <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "LOD tolerance must be positive, got {}",
                    level.tolerance
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = EditorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.lod.len(), 2);
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("editor.ron");

        let mut config = EditorConfig::default();
        config.history.max_entries = None;
        config.save(&path).unwrap();

        let loaded = EditorConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = EditorConfig::from_ron_str("(history: (max_entries: Some(3)))").unwrap();
        assert_eq!(config.history.max_entries, Some(3));
        assert_eq!(config.lod, EditorConfig::default().lod);
    }

    #[test]
    fn test_rejects_bad_tolerance() {
        let result = EditorConfig::from_ron_str("(lod: [(tolerance: 0.0, distance: 0.0)])");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = EditorConfig::load("/nonexistent/editor.ron");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
