//! Configuration management for the credit scoring service

use crate::model::network::{Activation, ModelConfig};
use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub model: ModelSettings,
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,
    /// Bind port
    pub port: u16,
}

/// Model artifact configuration.
///
/// The two paths and the architecture are versioned as a matched triple;
/// changing one without the others fails at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelSettings {
    /// Path to the fitted transformer artifact
    pub transformer_path: PathBuf,
    /// Path to the weight state artifact
    pub weights_path: PathBuf,
    /// Network architecture the weights were trained for
    pub architecture: ModelConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            model: ModelSettings {
                transformer_path: PathBuf::from("models/german_credit_transformer.json"),
                weights_path: PathBuf::from("models/mlp_credit_scoring_weights_v1.3.0.json"),
                architecture: ModelConfig {
                    num_features: 26,
                    hidden_layers: vec![256, 128, 64, 64],
                    dropout_rate: 0.1,
                    use_batch_norm: true,
                    activation: Activation::ReLU,
                },
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.model.architecture.num_features, 26);
        assert_eq!(config.model.architecture.hidden_layers, vec![256, 128, 64, 64]);
        assert!(config.model.architecture.use_batch_norm);
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            [server]
            host = "0.0.0.0"
            port = 9090

            [model]
            transformer_path = "artifacts/transformer.json"
            weights_path = "artifacts/weights.json"

            [model.architecture]
            num_features = 25
            hidden_layers = [128, 64]
            dropout_rate = 0.2
            use_batch_norm = true
            activation = "relu"

            [logging]
            level = "debug"
            format = "json"
        "#;

        let config: AppConfig = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.model.architecture.hidden_layers, vec![128, 64]);
        assert_eq!(config.model.architecture.activation, Activation::ReLU);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_parsed_architecture_validates() {
        let config = AppConfig::default();
        assert!(config.model.architecture.validate().is_ok());
    }
}
