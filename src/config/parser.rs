//! Configuration parsing from CLI arguments and environment variables

use crate::{
    cli::Cli,
    env::{Environment, ProcessEnv},
    error::{EnvError, Result},
    logging::{LogFormat, LogLevel},
    models::Config,
};

/// Configuration parser that combines CLI arguments with environment variables
pub struct ConfigParser {
    cli: Cli,
}

impl ConfigParser {
    /// Create a new configuration parser with CLI arguments
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Parse and build the complete configuration from the process environment
    pub fn parse(&self) -> Result<Config> {
        self.parse_with(&ProcessEnv::new())
    }

    /// Parse against an explicit environment
    pub fn parse_with(&self, env: &dyn Environment) -> Result<Config> {
        let mut config = Config::default();

        config.merge_from_env(env)?;
        self.apply_cli_overrides(&mut config)?;
        config.validate()?;

        Ok(config)
    }

    /// Apply CLI argument overrides to configuration
    fn apply_cli_overrides(&self, config: &mut Config) -> Result<()> {
        if let Some(ref file) = self.cli.file {
            config.env_file = file.clone();
        }

        if self.cli.overload {
            config.overload = true;
        }

        // Keys from the command line extend those from ENVGUARD_REQUIRED/ENVGUARD_MASK
        for key in &self.cli.required {
            if !config.required_keys.contains(key) {
                config.required_keys.push(key.clone());
            }
        }
        for key in &self.cli.mask {
            if !config.sensitive_keys.contains(key) {
                config.sensitive_keys.push(key.clone());
            }
        }

        if self.cli.no_inline_comments {
            config.inline_comments = false;
        }

        if let Some(use_color) = self.cli.use_colors() {
            config.enable_color = use_color;
        }

        if self.cli.debug {
            config.log_level = LogLevel::Debug;
        }

        if let Some(ref format) = self.cli.log_format {
            config.log_format = format
                .parse::<LogFormat>()
                .map_err(|e| EnvError::config(format!("--log-format: {}", e)))?;
        }

        Ok(())
    }
}

/// Convenience function to load complete configuration from CLI arguments
pub fn load_config(cli: Cli) -> Result<Config> {
    ConfigParser::new(cli).parse()
}

/// Display configuration summary for debug purposes
pub fn display_config_summary(config: &Config) -> String {
    let mut summary = Vec::new();

    summary.push(format!("Env File: {}", config.env_file.display()));
    summary.push(format!("Overload: {}", config.overload));
    summary.push(format!("Required Keys: {}", config.required_keys.join(", ")));
    summary.push(format!("Sensitive Keys: {}", config.sensitive_keys.len()));
    summary.push(format!("Inline Comments: {}", config.inline_comments));
    summary.push(format!("Color Output: {}", config.enable_color));
    summary.push(format!("Log Level: {}", config.log_level.as_str()));

    summary.join("\n")
}
