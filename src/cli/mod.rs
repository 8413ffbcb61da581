//! Command-line interface for the envguard binary

use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// envguard - load a .env file, check required keys and display values with
/// sensitive ones masked
#[derive(Parser, Debug, Clone)]
#[command(name = "envguard")]
#[command(about, long_about = None)]
#[command(disable_version_flag = true)]
pub struct Cli {
    /// Path of the .env file to load (defaults to ENVGUARD_FILE or .env)
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Overwrite variables that are already set
    #[arg(long)]
    pub overload: bool,

    /// Key that must be present with a non-empty value (repeatable)
    #[arg(short = 'r', long = "require", value_name = "KEY", action = ArgAction::Append)]
    pub required: Vec<String>,

    /// Key whose value is masked on display (repeatable)
    #[arg(short = 'm', long = "mask", value_name = "KEY", action = ArgAction::Append)]
    pub mask: Vec<String>,

    /// Print one key coerced to --type instead of the full listing
    #[arg(long, value_name = "KEY", conflicts_with = "resolve")]
    pub get: Option<String>,

    /// Target type for --get (int, bool, float, string, string-list, int-list, map)
    #[arg(long = "type", value_name = "KIND", requires = "get")]
    pub kind: Option<String>,

    /// Value printed by --get when the key is unset or empty
    #[arg(long, value_name = "VALUE", requires = "get")]
    pub default: Option<String>,

    /// Print the value of KEY with its ${NAME} placeholders expanded
    #[arg(long, value_name = "KEY")]
    pub resolve: Option<String>,

    /// Keep '#' text at the end of values instead of treating it as a comment
    #[arg(long)]
    pub no_inline_comments: bool,

    /// Force colored output
    #[arg(long)]
    pub color: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Log output format (console, json, compact)
    #[arg(long, value_name = "FORMAT")]
    pub log_format: Option<String>,

    /// Print version information
    #[arg(short = 'V', long)]
    pub version: bool,
}

impl Cli {
    /// Validate CLI arguments for conflicts and requirements
    pub fn validate(&self) -> Result<(), String> {
        if self.color && self.no_color {
            return Err("Cannot specify both --color and --no-color".to_string());
        }

        for key in self.required.iter().chain(self.mask.iter()) {
            if key.trim().is_empty() {
                return Err("Key names passed to --require/--mask cannot be empty".to_string());
            }
        }

        if let Some(kind) = &self.kind {
            if kind.trim().is_empty() {
                return Err("--type cannot be empty".to_string());
            }
        }

        Ok(())
    }

    /// Check if colors should be enabled
    pub fn use_colors(&self) -> Option<bool> {
        if self.color {
            Some(true)
        } else if self.no_color {
            Some(false)
        } else {
            None
        }
    }
}

/// Check if the terminal supports color output
pub fn supports_color() -> bool {
    if let Ok(term) = std::env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    #[cfg(target_os = "windows")]
    {
        if std::env::var("ANSICON").is_ok() || std::env::var("ConEmuANSI").is_ok() {
            return true;
        }
    }

    #[cfg(unix)]
    {
        true
    }
    #[cfg(not(unix))]
    {
        false
    }
}
