//! # Configuration
//!
//! Configuration structures are plain serde types behind the [`Config`]
//! trait, which handles file I/O in either TOML or RON based on the file
//! extension. Scenes take a [`SceneConfig`] at construction; applications
//! that want file-driven settings load one with [`Config::load_from_file`].

use serde::{Deserialize, Serialize};

/// Trait for file-loadable configuration types.
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from a `.toml` or `.ron` file.
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::parse(path, &contents)
    }

    /// Parse configuration from an in-memory string; `path` selects the
    /// format by extension.
    fn parse(path: &str, contents: &str) -> Result<Self, ConfigError> {
        if path.ends_with(".toml") {
            toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_owned()))
        }
    }

    /// Save configuration to a `.toml` or `.ron` file.
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_owned()));
        };
        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Per-scene behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Prefix for engine-generated node ids (`<prefix>-<n>`).
    pub id_prefix: String,
    /// Re-fire `log`/`warn`/`error` records as events on the scene root so
    /// centralized observers can subscribe to them.
    pub log_events: bool,
}

impl SceneConfig {
    /// Create a configuration with the default settings.
    pub fn new() -> Self {
        Self {
            id_prefix: "node".to_owned(),
            log_events: true,
        }
    }

    /// Set the generated-id prefix.
    #[must_use]
    pub fn with_id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.id_prefix = prefix.into();
        self
    }

    /// Enable or disable log-record events on the scene root.
    #[must_use]
    pub fn with_log_events(mut self, enabled: bool) -> Self {
        self.log_events = enabled;
        self
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Config for SceneConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = SceneConfig::default();
        assert_eq!(config.id_prefix, "node");
        assert!(config.log_events);
    }

    #[test]
    fn parses_partial_toml() {
        let config = SceneConfig::parse("scene.toml", "id_prefix = \"obj\"\n").unwrap();
        assert_eq!(config.id_prefix, "obj");
        assert!(config.log_events, "unset fields keep their defaults");
    }

    #[test]
    fn parses_ron() {
        let config =
            SceneConfig::parse("scene.ron", "(id_prefix: \"n\", log_events: false)").unwrap();
        assert_eq!(config.id_prefix, "n");
        assert!(!config.log_events);
    }

    #[test]
    fn rejects_unknown_extension() {
        let result = SceneConfig::parse("scene.yaml", "");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn toml_round_trip() {
        let config = SceneConfig::new().with_id_prefix("obj").with_log_events(false);
        let text = toml::to_string_pretty(&config).unwrap();
        let back = SceneConfig::parse("scene.toml", &text).unwrap();
        assert_eq!(back.id_prefix, "obj");
        assert!(!back.log_events);
    }
}
