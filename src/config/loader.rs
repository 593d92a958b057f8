//! Configuration Loader
//!
//! Environment-aware loading on top of the `config` crate. Handles directory
//! discovery, environment detection and source layering.

use super::error::{ConfigResult, ConfigurationError};
use super::RahatConfig;
use config::{Config, Environment, File};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

const CONFIG_FILE_STEM: &str = "rahat";
const ENV_PREFIX: &str = "RAHAT";

/// Loaded configuration plus where it came from
#[derive(Debug)]
pub struct ConfigManager {
    config: RahatConfig,
    environment: String,
    config_directory: PathBuf,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        Self::load_from_directory(None)
    }

    /// Load configuration from a specific directory
    pub fn load_from_directory(config_dir: Option<PathBuf>) -> ConfigResult<Arc<ConfigManager>> {
        let environment = Self::detect_environment();
        Self::load_from_directory_with_env(config_dir, &environment)
    }

    /// Load configuration from a specific directory with explicit environment
    /// This is useful for testing without modifying global environment variables
    pub fn load_from_directory_with_env(
        config_dir: Option<PathBuf>,
        environment: &str,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let config_directory = match config_dir {
            Some(dir) if dir.is_dir() => dir,
            Some(dir) => {
                return Err(ConfigurationError::config_directory_not_found(vec![dir]));
            }
            None => Self::default_config_directory(),
        };

        debug!(
            environment = environment,
            directory = %config_directory.display(),
            "Loading configuration"
        );

        let config = Self::load_and_merge_config(&config_directory, environment)?;
        config.validate()?;

        let manager = ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory,
        };

        debug!(
            config = %manager.debug_config(),
            "Configuration loaded successfully"
        );
        info!(
            environment = environment,
            default_timeout_ms = manager.config.dispatch.default_timeout_ms,
            meta_queue = %manager.config.meta_transactions.queue_name,
            "Configuration loaded"
        );

        Ok(Arc::new(manager))
    }

    /// Wrap an already-built configuration, e.g. one assembled in tests
    pub fn from_config(config: RahatConfig, environment: &str) -> ConfigResult<Arc<ConfigManager>> {
        config.validate()?;
        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory: Self::default_config_directory(),
        }))
    }

    pub fn config(&self) -> &RahatConfig {
        &self.config
    }

    /// Configuration as JSON with sensitive values masked
    pub fn debug_config(&self) -> serde_json::Value {
        Self::sanitize_config_for_logging(&self.config)
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn config_directory(&self) -> &Path {
        &self.config_directory
    }

    /// Current environment from `RAHAT_ENV`, then `APP_ENV`, defaulting to development
    pub fn detect_environment() -> String {
        env::var("RAHAT_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase()
    }

    fn default_config_directory() -> PathBuf {
        if let Ok(dir) = env::var("RAHAT_CONFIG_DIR") {
            return PathBuf::from(dir);
        }

        let local = PathBuf::from("config");
        if local.is_dir() {
            return local;
        }

        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config")
    }

    fn load_and_merge_config(config_directory: &Path, environment: &str) -> ConfigResult<RahatConfig> {
        let base_file = config_directory.join(format!("{CONFIG_FILE_STEM}.toml"));
        let env_file = config_directory.join(format!("{CONFIG_FILE_STEM}.{environment}.toml"));

        debug!(
            base = %base_file.display(),
            overrides = %env_file.display(),
            base_exists = base_file.exists(),
            overrides_exist = env_file.exists(),
            "Resolving configuration sources"
        );

        // Missing fields fall back to the serde defaults on each section
        let merged = Config::builder()
            .add_source(File::from(base_file).required(false))
            .add_source(File::from(env_file).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(merged.try_deserialize::<RahatConfig>()?)
    }

    fn sanitize_config_for_logging(config: &RahatConfig) -> serde_json::Value {
        let mut config_json = serde_json::to_value(config).unwrap_or(serde_json::Value::Null);
        let sensitive_patterns = ["password", "secret", "token", "credential", "url"];
        Self::sanitize_json_recursive(&mut config_json, &sensitive_patterns);
        config_json
    }

    fn sanitize_json_recursive(value: &mut serde_json::Value, sensitive_patterns: &[&str]) {
        match value {
            serde_json::Value::Object(map) => {
                for (key, val) in map.iter_mut() {
                    let key_lower = key.to_lowercase();
                    let is_sensitive = sensitive_patterns
                        .iter()
                        .any(|pattern| key_lower.contains(pattern));

                    if !is_sensitive {
                        Self::sanitize_json_recursive(val, sensitive_patterns);
                        continue;
                    }

                    *val = match val {
                        serde_json::Value::String(s) if s.is_empty() => {
                            serde_json::Value::String("[EMPTY]".to_string())
                        }
                        serde_json::Value::String(s) => {
                            let chars: Vec<char> = s.chars().collect();
                            let masked = if chars.len() > 4 {
                                let head: String = chars[..2].iter().collect();
                                let tail: String = chars[chars.len() - 2..].iter().collect();
                                format!("{head}***{tail}")
                            } else {
                                "***".to_string()
                            };
                            serde_json::Value::String(format!("[MASKED: {masked}]"))
                        }
                        _ => serde_json::Value::String("[MASKED]".to_string()),
                    };
                }
            }
            serde_json::Value::Array(items) => {
                for item in items.iter_mut() {
                    Self::sanitize_json_recursive(item, sensitive_patterns);
                }
            }
            _ => {}
        }
    }
}
