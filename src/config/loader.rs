// src/config/loader.rs
//! Layered configuration loader
//!
//! Defaults, then each existing TOML file in path order, then environment
//! overrides of the form `ECGQ__TEMPLATE__CORRELATION_THRESHOLD=0.7`.

use crate::config::{constants::paths, AssessmentConfig};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Configuration loader
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config_paths: Vec<PathBuf>,
    env_overrides: bool,
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),
    #[error("Configuration parse error: {0}")]
    ParseError(String),
    #[error("Configuration validation errors: {}", .0.join("; "))]
    ValidationError(Vec<String>),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

impl ConfigLoader {
    /// Create a loader over the standard discovery paths
    pub fn new() -> Self {
        Self {
            config_paths: Self::discover_config_paths(),
            env_overrides: true,
        }
    }

    /// Create loader with custom paths
    pub fn with_paths(paths: Vec<PathBuf>) -> Self {
        Self {
            config_paths: paths,
            env_overrides: true,
        }
    }

    /// Ignore `ECGQ__*` environment variables
    pub fn without_env_overrides(mut self) -> Self {
        self.env_overrides = false;
        self
    }

    /// Paths consulted, lowest precedence first
    pub fn config_paths(&self) -> &[PathBuf] {
        &self.config_paths
    }

    /// Load, merge and validate the configuration
    pub fn load(&self) -> Result<AssessmentConfig, ConfigError> {
        let mut merged = toml::Value::try_from(AssessmentConfig::default())
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        for config_path in &self.config_paths {
            if !config_path.exists() {
                continue;
            }
            debug!(path = %config_path.display(), "merging configuration file");
            let file_config = Self::load_config_file(config_path)?;
            Self::merge_toml_values(&mut merged, file_config);
        }

        if self.env_overrides {
            Self::apply_environment_overrides(&mut merged, std::env::vars());
        }

        let config: AssessmentConfig = merged
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError(e.to_string()))?;

        config
            .validate_consistency()
            .map_err(ConfigError::ValidationError)?;

        info!(summary = ?config.get_summary(), "configuration loaded");
        Ok(config)
    }

    /// Parse and validate a single file without merging
    pub fn validate_config_file<P: AsRef<Path>>(&self, path: P) -> Result<AssessmentConfig, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)?;
        let config: AssessmentConfig = toml::from_str(&content)?;
        config
            .validate_consistency()
            .map_err(ConfigError::ValidationError)?;
        Ok(config)
    }

    /// Write a configuration to file
    pub fn export_config<P: AsRef<Path>>(config: &AssessmentConfig, path: P) -> Result<(), ConfigError> {
        let toml_content =
            toml::to_string_pretty(config).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, toml_content)?;
        Ok(())
    }

    fn load_config_file(path: &Path) -> Result<toml::Value, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: toml::Value = toml::from_str(&content)?;
        Ok(config)
    }

    fn merge_toml_values(base: &mut toml::Value, overlay: toml::Value) {
        match (base, overlay) {
            (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
                for (key, value) in overlay_table {
                    if let Some(base_value) = base_table.get_mut(&key) {
                        Self::merge_toml_values(base_value, value);
                    } else {
                        base_table.insert(key, value);
                    }
                }
            }
            (base_value, overlay_value) => {
                *base_value = overlay_value;
            }
        }
    }

    fn apply_environment_overrides(
        config: &mut toml::Value,
        vars: impl Iterator<Item = (String, String)>,
    ) {
        for (key, value) in vars {
            let Some(stripped) = key.strip_prefix(paths::ENV_PREFIX) else {
                continue;
            };
            let parts: Vec<String> = stripped
                .split(paths::ENV_SEPARATOR)
                .map(str::to_lowercase)
                .collect();

            debug!(variable = %key, "applying environment override");
            Self::set_nested_value(config, &parts, Self::parse_env_value(&value));
        }
    }

    fn parse_env_value(value: &str) -> toml::Value {
        if let Ok(int_val) = value.parse::<i64>() {
            toml::Value::Integer(int_val)
        } else if let Ok(float_val) = value.parse::<f64>() {
            toml::Value::Float(float_val)
        } else if let Ok(bool_val) = value.parse::<bool>() {
            toml::Value::Boolean(bool_val)
        } else {
            toml::Value::String(value.to_string())
        }
    }

    fn set_nested_value(config: &mut toml::Value, parts: &[String], value: toml::Value) {
        let Some((last, parents)) = parts.split_last() else {
            return;
        };

        let mut current = config;
        for part in parents {
            let toml::Value::Table(table) = current else {
                return;
            };
            current = table
                .entry(part.clone())
                .or_insert_with(|| toml::Value::Table(toml::value::Table::new()));
        }

        if let toml::Value::Table(table) = current {
            table.insert(last.clone(), value);
        }
    }

    fn discover_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(paths::SYSTEM_CONFIG_PATH)];

        if let Some(home_dir) = home_dir() {
            paths.push(home_dir.join(paths::USER_CONFIG_DIR).join("config.toml"));
        }

        paths.push(PathBuf::from(paths::DEFAULT_CONFIG_FILE));
        paths.push(PathBuf::from(paths::LOCAL_CONFIG_FILE));
        paths
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn home_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("USERPROFILE").map(PathBuf::from)
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var_os("HOME").map(PathBuf::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "{}", content).unwrap();
        temp_file
    }

    #[test]
    fn test_config_loader_creation() {
        let loader = ConfigLoader::new();
        assert!(!loader.config_paths().is_empty());
    }

    #[test]
    fn test_missing_files_fall_back_to_defaults() {
        let loader = ConfigLoader::with_paths(vec![PathBuf::from("/nonexistent/ecg.toml")])
            .without_env_overrides();
        let config = loader.load().unwrap();
        assert_eq!(config, AssessmentConfig::default());
    }

    #[test]
    fn test_later_files_override_earlier() {
        let base = write_config("[rule_based]\nsnr_threshold = 0.7\nanalysis_duration_s = 20.0\n");
        let overlay = write_config("[rule_based]\nsnr_threshold = 0.9\n");

        let loader = ConfigLoader::with_paths(vec![
            base.path().to_path_buf(),
            overlay.path().to_path_buf(),
        ])
        .without_env_overrides();
        let config = loader.load().unwrap();

        assert_eq!(config.rule_based.snr_threshold, 0.9);
        assert_eq!(config.rule_based.analysis_duration_s, 20.0);
        assert_eq!(config.template, crate::config::TemplateConfig::default());
    }

    #[test]
    fn test_invalid_config_validation() {
        let loader = ConfigLoader::new();
        let temp_file = write_config("[template]\nsampling_rate_hz = 20.0\n");

        match loader.validate_config_file(temp_file.path()) {
            Err(ConfigError::ValidationError(errors)) => {
                assert!(errors.iter().any(|e| e.contains("Nyquist")));
            }
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let temp_file = write_config("[rule_based\nsnr_threshold = ");
        let loader = ConfigLoader::with_paths(vec![temp_file.path().to_path_buf()])
            .without_env_overrides();

        assert!(matches!(loader.load(), Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_environment_override() {
        let mut merged = toml::Value::try_from(AssessmentConfig::default()).unwrap();
        let vars = vec![
            ("ECGQ__TEMPLATE__CORRELATION_THRESHOLD".to_string(), "0.8".to_string()),
            ("ECGQ__RULE_BASED__STATIONARITY_STRIDE_SAMPLES".to_string(), "5".to_string()),
            ("UNRELATED".to_string(), "1".to_string()),
        ];
        ConfigLoader::apply_environment_overrides(&mut merged, vars.into_iter());

        let config: AssessmentConfig = merged.try_into().unwrap();
        assert_eq!(config.template.correlation_threshold, 0.8);
        assert_eq!(config.rule_based.stationarity_stride_samples, 5);
    }

    #[test]
    fn test_config_export() {
        let temp_file = NamedTempFile::new().unwrap();
        ConfigLoader::export_config(&AssessmentConfig::default(), temp_file.path()).unwrap();

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert!(content.contains("[rule_based]"));
        assert!(content.contains("[template]"));

        let loader = ConfigLoader::new();
        assert!(loader.validate_config_file(temp_file.path()).is_ok());
    }
}
