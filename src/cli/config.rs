//! Configuration management for smart-analyze
//!
//! Provides TOML-based configuration with defaults and validation.
//! Location: ~/.smart-analyze/config.toml

use crate::cli::Verbosity;
use crate::control::{ControlOverrides, RunConfig};
use crate::errors::{AnalyzeError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Complete configuration for smart-analyze
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Control parameter overrides applied to every run
    pub control: ControlOverrides,
    pub display: DisplayConfig,
}

/// Console display configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub default_verbosity: String,
    pub progress_bar: bool,
    pub color: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            default_verbosity: "normal".to_string(),
            progress_bar: true,
            color: true,
        }
    }
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(config_path) = path {
            Self::load_from_file(config_path)
        } else {
            Self::load_default()
        }
    }

    /// Load configuration from specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| AnalyzeError::ConfigError(format!("Failed to read config: {}", e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| AnalyzeError::ConfigError(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load default configuration from standard location or use built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Some(config_path) = Self::default_path() {
            if config_path.exists() {
                return Self::load_from_file(&config_path);
            }
        }

        Ok(Config::default())
    }

    /// Standard configuration file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".smart-analyze").join("config.toml"))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        self.display
            .default_verbosity
            .parse::<Verbosity>()
            .map_err(AnalyzeError::ConfigError)?;

        // Overrides must leave a usable run; the step itself comes from the caller
        RunConfig::transient(1.0)
            .with_overrides(Some(&self.control))
            .validate()
    }

    /// Default verbosity named in the display section
    pub fn verbosity(&self) -> Verbosity {
        self.display
            .default_verbosity
            .parse()
            .unwrap_or(Verbosity::Normal)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = self.to_toml()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AnalyzeError::ConfigError(format!("Failed to create config dir: {}", e))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| AnalyzeError::ConfigError(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Render as pretty TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| AnalyzeError::ConfigError(format!("Failed to serialize config: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::Algorithm;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.control.is_empty());
        assert!(config.display.progress_bar);
        assert_eq!(config.verbosity(), Verbosity::Normal);
    }

    #[test]
    fn test_config_validation_success() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_config_validation_verbosity() {
        let mut config = Config::default();
        config.display.default_verbosity = "invalid".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_overrides() {
        let mut config = Config::default();
        config.control.min_step = Some(-1.0);
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.control.algorithms = Some(Vec::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_partial_file() {
        let text = r#"
            [control]
            try_alternate_algorithms = true
            algorithms = [40, 10, 60]

            [display]
            default_verbosity = "verbose"
        "#;
        let config: Config = toml::from_str(text).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(
            config.control.algorithms,
            Some(vec![
                Algorithm::from_code(40).unwrap(),
                Algorithm::from_code(10).unwrap(),
                Algorithm::Bfgs,
            ])
        );
        assert_eq!(config.verbosity(), Verbosity::Verbose);
        assert!(config.display.color);
    }

    #[test]
    fn test_unknown_algorithm_code_rejected() {
        let text = "[control]\nalgorithms = [40, 99]\n";
        assert!(toml::from_str::<Config>(text).is_err());
    }
}
