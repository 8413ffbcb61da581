//! Configuration data model for the envguard binary

use crate::coerce::{coerce, TargetKind, TypedValue};
use crate::env::Environment;
use crate::error::{EnvError, Result};
use crate::logging::{LogFormat, LogLevel};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Binary configuration, layered defaults → `ENVGUARD_*` variables → CLI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// `.env` file to load
    #[serde(default = "default_env_file")]
    pub env_file: PathBuf,

    /// Overwrite variables that are already set
    #[serde(default)]
    pub overload: bool,

    /// Keys that must be present and non-empty
    #[serde(default)]
    pub required_keys: Vec<String>,

    /// Keys masked on display
    #[serde(default)]
    pub sensitive_keys: Vec<String>,

    /// Strip trailing `# comments` from values
    #[serde(default = "default_inline_comments")]
    pub inline_comments: bool,

    /// Enable colored terminal output
    #[serde(default = "default_enable_color")]
    pub enable_color: bool,

    /// Minimum level logged
    #[serde(default = "default_log_level")]
    pub log_level: LogLevel,

    /// Log output format
    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            env_file: default_env_file(),
            overload: false,
            required_keys: Vec::new(),
            sensitive_keys: Vec::new(),
            inline_comments: default_inline_comments(),
            enable_color: default_enable_color(),
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration and return the first problem
    pub fn validate(&self) -> Result<()> {
        if self.env_file.as_os_str().is_empty() {
            return Err(EnvError::config("Env file path cannot be empty"));
        }

        for key in self.required_keys.iter().chain(self.sensitive_keys.iter()) {
            validate_key_name(key)?;
        }

        Ok(())
    }

    /// Merge `ENVGUARD_*` variables from `env` into this configuration.
    ///
    /// Values go through the same coercion rules as application variables;
    /// empty values are ignored.
    pub fn merge_from_env(&mut self, env: &dyn Environment) -> Result<()> {
        if let Some(file) = read_var(env, "ENVGUARD_FILE", TargetKind::String)? {
            self.env_file = PathBuf::from(file.to_string());
        }

        if let Some(TypedValue::Bool(overload)) = read_var(env, "ENVGUARD_OVERLOAD", TargetKind::Bool)? {
            self.overload = overload;
        }

        if let Some(TypedValue::StringList(keys)) = read_var(env, "ENVGUARD_REQUIRED", TargetKind::StringList)? {
            self.required_keys = clean_key_list(keys);
        }

        if let Some(TypedValue::StringList(keys)) = read_var(env, "ENVGUARD_MASK", TargetKind::StringList)? {
            self.sensitive_keys = clean_key_list(keys);
        }

        if let Some(TypedValue::Bool(enable_color)) = read_var(env, "ENVGUARD_COLOR", TargetKind::Bool)? {
            self.enable_color = enable_color;
        }

        if let Some(level) = read_var(env, "ENVGUARD_LOG_LEVEL", TargetKind::String)? {
            self.log_level = level.to_string().parse()?;
        }

        if let Some(format) = read_var(env, "ENVGUARD_LOG_FORMAT", TargetKind::String)? {
            self.log_format = format.to_string().parse()?;
        }

        Ok(())
    }
}

fn read_var(env: &dyn Environment, name: &str, kind: TargetKind) -> Result<Option<TypedValue>> {
    match env.get(name) {
        Some(raw) if !raw.is_empty() => coerce(&raw, kind)
            .map(Some)
            .map_err(|e| EnvError::config(format!("Invalid {} value '{}': {}", name, raw, e))),
        _ => Ok(None),
    }
}

fn clean_key_list(keys: Vec<String>) -> Vec<String> {
    keys.into_iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .collect()
}

fn validate_key_name(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(EnvError::config("Key name cannot be empty"));
    }
    if key.contains('=') || key.chars().any(char::is_whitespace) {
        return Err(EnvError::config(format!("Invalid key name: '{}'", key)));
    }
    Ok(())
}

// Default value functions for serde
fn default_env_file() -> PathBuf {
    PathBuf::from(crate::defaults::DEFAULT_ENV_FILE)
}

fn default_inline_comments() -> bool {
    crate::defaults::DEFAULT_INLINE_COMMENTS
}

fn default_enable_color() -> bool {
    crate::defaults::DEFAULT_ENABLE_COLOR
}

fn default_log_level() -> LogLevel {
    LogLevel::Warn
}

fn default_log_format() -> LogFormat {
    LogFormat::Console
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MemoryEnv;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert_eq!(config.env_file, PathBuf::from(".env"));
        assert!(config.inline_comments);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_key_names() {
        let mut config = Config::default();
        config.required_keys = vec!["BAD KEY".to_string()];
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.sensitive_keys = vec!["A=B".to_string()];
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.env_file = PathBuf::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_merge_from_env() {
        let env: MemoryEnv = [
            ("ENVGUARD_FILE", "config/.env.prod"),
            ("ENVGUARD_OVERLOAD", "true"),
            ("ENVGUARD_REQUIRED", "APP_NAME, APP_PORT,,"),
            ("ENVGUARD_MASK", "DB_PASSWORD"),
            ("ENVGUARD_COLOR", "0"),
            ("ENVGUARD_LOG_LEVEL", "debug"),
            ("ENVGUARD_LOG_FORMAT", "json"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.merge_from_env(&env).unwrap();

        assert_eq!(config.env_file, PathBuf::from("config/.env.prod"));
        assert!(config.overload);
        assert_eq!(config.required_keys, vec!["APP_NAME", "APP_PORT"]);
        assert_eq!(config.sensitive_keys, vec!["DB_PASSWORD"]);
        assert!(!config.enable_color);
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_merge_rejects_malformed_values() {
        let env: MemoryEnv = [("ENVGUARD_COLOR", "sometimes")].into_iter().collect();
        let err = Config::default().merge_from_env(&env).unwrap_err();
        assert_eq!(err.category(), "CONFIG");
        assert!(err.to_string().contains("ENVGUARD_COLOR"));
    }

    #[test]
    fn test_empty_env_values_are_ignored() {
        let env: MemoryEnv = [("ENVGUARD_FILE", "")].into_iter().collect();
        let mut config = Config::default();
        config.merge_from_env(&env).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_serde_defaults() {
        let config: Config = serde_json::from_str(r#"{"overload": true}"#).unwrap();
        assert!(config.overload);
        assert_eq!(config.env_file, PathBuf::from(".env"));
        assert_eq!(config.log_level, LogLevel::Warn);
    }
}
