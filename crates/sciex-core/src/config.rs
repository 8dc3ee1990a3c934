//! SCIEX Configuration Management
//!
//! Handles configuration from environment variables and TOML files
//! with sensible defaults for development.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Upload storage
    pub upload: UploadConfig,

    /// NER model artifact
    pub model: ModelConfig,

    /// Context derivation
    pub context: ContextConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        self.apply_env(|key| std::env::var(key).ok())?;
        Ok(self)
    }

    /// Apply overrides from a key lookup; unset keys leave the current value alone
    fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server
        if let Some(host) = lookup("API_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("API_PORT") {
            self.server.port = parse_value("API_PORT", port)?;
        }
        if let Some(size) = lookup("MAX_BODY_SIZE") {
            self.server.max_body_size = parse_value("MAX_BODY_SIZE", size)?;
        }

        // Upload storage
        if let Some(dir) = lookup("UPLOAD_DIR") {
            self.upload.dir = PathBuf::from(dir);
        }

        // Model
        if let Some(path) = lookup("NER_MODEL_PATH") {
            self.model.path = PathBuf::from(path);
        }

        // Context
        if let Some(window) = lookup("CONTEXT_WINDOW") {
            self.context.window_size = parse_value("CONTEXT_WINDOW", window)?;
        }

        // Logging
        if let Some(level) = lookup("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("LOG_FORMAT") {
            self.logging.json_format = format.eq_ignore_ascii_case("json");
        }

        Ok(())
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value,
    })
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Maximum request body size in bytes
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            max_body_size: 10 * 1024 * 1024, // 10MB
        }
    }
}

/// Upload storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Directory holding in-flight uploads; created on startup
    pub dir: PathBuf,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("uploads"),
        }
    }
}

/// NER model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Path to the model artifact
    pub path: PathBuf,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("models/en_core_sci_lexicon.json"),
        }
    }
}

/// Context derivation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Chars taken on each side of an entity when no sentence encloses it
    pub window_size: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self { window_size: 100 }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,

    /// Include file/line in logs
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            include_location: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.context.window_size, 100);
        assert_eq!(config.upload.dir, PathBuf::from("uploads"));
        assert_eq!(
            config.model.path,
            PathBuf::from("models/en_core_sci_lexicon.json")
        );
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        config
            .apply_env(lookup_from(&[
                ("API_PORT", "9090"),
                ("UPLOAD_DIR", "/tmp/sciex"),
                ("CONTEXT_WINDOW", "40"),
                ("LOG_FORMAT", "JSON"),
            ]))
            .unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.upload.dir, PathBuf::from("/tmp/sciex"));
        assert_eq!(config.context.window_size, 40);
        assert!(config.logging.json_format);
        assert_eq!(config.server.host, "0.0.0.0");
    }

    #[test]
    fn test_invalid_env_value() {
        let mut config = AppConfig::default();
        let err = config
            .apply_env(lookup_from(&[("API_PORT", "eighty")]))
            .unwrap_err();

        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "API_PORT"));
    }

    #[test]
    fn test_from_file_partial() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[server]\nport = 5000\n\n[model]\npath = \"models/custom.json\"\n"
        )
        .unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.model.path, PathBuf::from("models/custom.json"));
        // Unspecified sections keep their defaults
        assert_eq!(config.context.window_size, 100);
        assert_eq!(config.server.max_body_size, 10 * 1024 * 1024);
    }

    #[test]
    fn test_from_file_missing() {
        let err = AppConfig::from_file("does/not/exist.toml").unwrap_err();
        assert!(matches!(err, ConfigError::FileReadError { .. }));
    }
}
