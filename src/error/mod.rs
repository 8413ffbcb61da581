//! Error handling for envguard

use thiserror::Error;

/// Errors produced while loading, reading, interpolating or displaying
/// environment values
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EnvError {
    /// The line source could not be opened
    #[error("I/O error: {0}")]
    Io(String),

    /// Reading the line source failed part way through
    #[error("Read error: {0}")]
    Read(String),

    /// A present value could not be converted to the requested type
    #[error("invalid value expected {expected} type: '{value}'")]
    TypeMismatch { expected: &'static str, value: String },

    /// The requested target type is not one the coercion engine knows
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    /// A map value was not a JSON object
    #[error("unable to convert json into map: {0}")]
    JsonDecode(String),

    /// A `${KEY}` placeholder referenced a key with no value
    #[error("unable to find env variable key named ${{{0}}}")]
    UnresolvedPlaceholder(String),

    /// A string expected to carry placeholders had none
    #[error("value for key '{key}' doesn't match placeholder syntax ${{some-value}}: {value}")]
    NoPlaceholder { key: String, value: String },

    /// A key named for masking has no current value
    #[error("Key not found in environment: {0}")]
    KeyNotFound(String),

    /// A required key is absent
    #[error("Missing required environment variable: {0}")]
    MissingRequiredKey(String),

    /// A required key is present but empty
    #[error("Missing required value for key: {0}")]
    EmptyRequiredValue(String),

    /// Invalid configuration of the envguard binary itself
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl EnvError {
    /// Create a new I/O error for a source that could not be opened
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io(message.into())
    }

    /// Create a new mid-stream read error
    pub fn read<S: Into<String>>(message: S) -> Self {
        Self::Read(message.into())
    }

    /// Create a new type mismatch error
    pub fn type_mismatch<S: Into<String>>(expected: &'static str, value: S) -> Self {
        Self::TypeMismatch {
            expected,
            value: value.into(),
        }
    }

    /// Create a new unsupported type error
    pub fn unsupported_type<S: Into<String>>(type_name: S) -> Self {
        Self::UnsupportedType(type_name.into())
    }

    /// Create a new JSON decode error
    pub fn json_decode<S: Into<String>>(message: S) -> Self {
        Self::JsonDecode(message.into())
    }

    /// Create a new unresolved placeholder error
    pub fn unresolved_placeholder<S: Into<String>>(key: S) -> Self {
        Self::UnresolvedPlaceholder(key.into())
    }

    /// Create a new missing placeholder error
    pub fn no_placeholder<K: Into<String>, V: Into<String>>(key: K, value: V) -> Self {
        Self::NoPlaceholder {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Create a new key-not-found error
    pub fn key_not_found<S: Into<String>>(key: S) -> Self {
        Self::KeyNotFound(key.into())
    }

    /// Create a new missing required key error
    pub fn missing_required_key<S: Into<String>>(key: S) -> Self {
        Self::MissingRequiredKey(key.into())
    }

    /// Create a new empty required value error
    pub fn empty_required_value<S: Into<String>>(key: S) -> Self {
        Self::EmptyRequiredValue(key.into())
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Get error category for logging and reporting
    pub fn category(&self) -> &'static str {
        match self {
            Self::Io(_) => "IO",
            Self::Read(_) => "READ",
            Self::TypeMismatch { .. } => "TYPE",
            Self::UnsupportedType(_) => "UNSUPPORTED",
            Self::JsonDecode(_) => "JSON",
            Self::UnresolvedPlaceholder(_) | Self::NoPlaceholder { .. } => "PLACEHOLDER",
            Self::KeyNotFound(_) => "MASKING",
            Self::MissingRequiredKey(_) | Self::EmptyRequiredValue(_) => "VALIDATION",
            Self::Config(_) => "CONFIG",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Whether the error is a fail-fast condition the process boundary
    /// should abort on rather than propagate
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::TypeMismatch { .. }
            | Self::UnsupportedType(_)
            | Self::JsonDecode(_)
            | Self::UnresolvedPlaceholder(_)
            | Self::NoPlaceholder { .. }
            | Self::KeyNotFound(_)
            | Self::MissingRequiredKey(_)
            | Self::EmptyRequiredValue(_) => true,
            Self::Io(_) | Self::Read(_) | Self::Config(_) | Self::Internal(_) => false,
        }
    }

    /// Get user-friendly error message with suggestions
    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::Io(_) | Self::Read(_) => {
                format!("{}\n\nSuggestion: Check that the .env file exists, is readable and is UTF-8 encoded.", self)
            }
            Self::TypeMismatch { .. } | Self::UnsupportedType(_) | Self::JsonDecode(_) => {
                format!("{}\n\nSuggestion: Fix the value in your .env file or unset it to fall back to the default.", self)
            }
            Self::UnresolvedPlaceholder(_) | Self::NoPlaceholder { .. } => {
                format!("{}\n\nSuggestion: Define every ${{NAME}} referenced by the value before resolving it.", self)
            }
            Self::KeyNotFound(_) | Self::MissingRequiredKey(_) | Self::EmptyRequiredValue(_) => {
                format!("{}\n\nSuggestion: Add the key with a non-empty value to your .env file or environment.", self)
            }
            Self::Config(_) => {
                format!("{}\n\nSuggestion: Check your ENVGUARD_* variables or command line arguments.", self)
            }
            Self::Internal(_) => {
                format!("{}\n\nThis is likely a bug. Please report this issue with the error details.", self)
            }
        }
    }

    /// Get exit code for this error type
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 1,
            Self::MissingRequiredKey(_) | Self::EmptyRequiredValue(_) | Self::KeyNotFound(_) => 2,
            Self::TypeMismatch { .. } | Self::UnsupportedType(_) | Self::JsonDecode(_) => 3,
            Self::UnresolvedPlaceholder(_) | Self::NoPlaceholder { .. } => 4,
            Self::Io(_) | Self::Read(_) => 5,
            Self::Internal(_) => 99,
        }
    }

    /// Format error for console display with color coding
    pub fn format_for_console(&self, use_color: bool) -> String {
        let category = self.category();
        let message = self.to_string();

        if use_color {
            use colored::Colorize;
            match self {
                Self::MissingRequiredKey(_) | Self::EmptyRequiredValue(_) | Self::KeyNotFound(_) => {
                    format!("[{}] {}", category.red().bold(), message.red())
                }
                Self::TypeMismatch { .. } | Self::UnsupportedType(_) | Self::JsonDecode(_) => {
                    format!("[{}] {}", category.yellow().bold(), message.yellow())
                }
                Self::UnresolvedPlaceholder(_) | Self::NoPlaceholder { .. } => {
                    format!("[{}] {}", category.magenta().bold(), message.magenta())
                }
                Self::Io(_) | Self::Read(_) | Self::Config(_) => {
                    format!("[{}] {}", category.cyan().bold(), message.cyan())
                }
                Self::Internal(_) => {
                    format!("[{}] {}", category.bright_red().bold(), message.bright_red())
                }
            }
        } else {
            format!("[{}] {}", category, message)
        }
    }
}

// Standard library error conversions
impl From<std::io::Error> for EnvError {
    fn from(error: std::io::Error) -> Self {
        Self::io(error.to_string())
    }
}

impl From<serde_json::Error> for EnvError {
    fn from(error: serde_json::Error) -> Self {
        Self::json_decode(error.to_string())
    }
}

impl From<anyhow::Error> for EnvError {
    /// Recovers an `EnvError` carried inside the chain. Otherwise the full
    /// context chain becomes the message, classed as I/O when the root cause
    /// is an I/O error.
    fn from(error: anyhow::Error) -> Self {
        match error.downcast::<EnvError>() {
            Ok(env_error) => env_error,
            Err(error) if error.root_cause().is::<std::io::Error>() => {
                Self::io(format!("{:#}", error))
            }
            Err(error) => Self::internal(format!("{:#}", error)),
        }
    }
}

/// Custom Result type for envguard
pub type Result<T> = std::result::Result<T, EnvError>;

/// Boundary adapter that turns a fatal error into process termination.
///
/// Library code never aborts on its own; binaries call `or_abort` on the
/// results they want to fail fast on during startup.
pub trait OrAbort<T> {
    /// Return the value, or report the error and exit with its exit code
    fn or_abort(self) -> T;

    /// Same as [`OrAbort::or_abort`], reporting through `reporter`
    fn or_abort_with(self, reporter: &ErrorReporter) -> T;
}

impl<T> OrAbort<T> for Result<T> {
    fn or_abort(self) -> T {
        self.or_abort_with(&ErrorReporter::default())
    }

    fn or_abort_with(self, reporter: &ErrorReporter) -> T {
        match self {
            Ok(value) => value,
            Err(error) => {
                reporter.report_error(&error);
                std::process::exit(error.exit_code());
            }
        }
    }
}

/// Error reporter for structured error logging and user feedback
pub struct ErrorReporter {
    pub use_color: bool,
    pub verbose: bool,
}

impl ErrorReporter {
    /// Create a new error reporter
    pub fn new(use_color: bool, verbose: bool) -> Self {
        Self { use_color, verbose }
    }

    /// Report an error to the user
    pub fn report_error(&self, error: &EnvError) {
        eprintln!("{}", error.format_for_console(self.use_color));

        if self.verbose {
            eprintln!();
            eprintln!("{}", error.user_friendly_message());
        }
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let missing = EnvError::missing_required_key("APP_NAME");
        assert_eq!(missing.category(), "VALIDATION");
        assert!(missing.is_fatal());
        assert_eq!(missing.exit_code(), 2);

        let io = EnvError::io("unable to open .env file");
        assert_eq!(io.category(), "IO");
        assert!(!io.is_fatal());
        assert_eq!(io.exit_code(), 5);
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            EnvError::missing_required_key("Prod_Engine").to_string(),
            "Missing required environment variable: Prod_Engine"
        );
        assert_eq!(
            EnvError::empty_required_value("DB_PATH").to_string(),
            "Missing required value for key: DB_PATH"
        );
        assert_eq!(
            EnvError::unresolved_placeholder("MISSING").to_string(),
            "unable to find env variable key named ${MISSING}"
        );
        assert_eq!(
            EnvError::type_mismatch("Integer", "abc").to_string(),
            "invalid value expected Integer type: 'abc'"
        );
    }

    #[test]
    fn test_fatal_classification() {
        let fatal = [
            EnvError::type_mismatch("Boolean", "maybe"),
            EnvError::unsupported_type("uuid"),
            EnvError::json_decode("eof"),
            EnvError::unresolved_placeholder("X"),
            EnvError::no_placeholder("X", "plain"),
            EnvError::key_not_found("X"),
            EnvError::missing_required_key("X"),
            EnvError::empty_required_value("X"),
        ];
        for error in &fatal {
            assert!(error.is_fatal(), "{} should be fatal", error);
        }

        let recoverable = [
            EnvError::io("x"),
            EnvError::read("x"),
            EnvError::config("x"),
            EnvError::internal("x"),
        ];
        for error in &recoverable {
            assert!(!error.is_fatal(), "{} should not be fatal", error);
        }
    }

    #[test]
    fn test_user_friendly_messages() {
        let message = EnvError::missing_required_key("APP_PORT").user_friendly_message();
        assert!(message.contains("APP_PORT"));
        assert!(message.contains("Suggestion:"));
    }

    #[test]
    fn test_error_conversions() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let env_error: EnvError = io_error.into();
        assert_eq!(env_error.category(), "IO");

        let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let env_error: EnvError = json_error.into();
        assert_eq!(env_error.category(), "JSON");

        let env_error: EnvError = anyhow::anyhow!("boom").into();
        assert_eq!(env_error.category(), "INTERNAL");
    }

    #[test]
    fn test_anyhow_chain_conversion() {
        use anyhow::Context;

        let wrapped: anyhow::Result<()> =
            Err(EnvError::key_not_found("API_KEY")).context("while rendering");
        let env_error: EnvError = wrapped.unwrap_err().into();
        assert_eq!(env_error, EnvError::key_not_found("API_KEY"));
        assert_eq!(env_error.exit_code(), 2);

        let io_failure: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "pipe closed",
        ));
        let env_error: EnvError = io_failure.context("failed to write output").unwrap_err().into();
        assert_eq!(env_error.category(), "IO");
        assert_eq!(env_error.exit_code(), 5);
        assert!(env_error.to_string().contains("failed to write output: pipe closed"));
    }

    #[test]
    fn test_console_formatting() {
        let error = EnvError::key_not_found("API_KEY");
        let plain = error.format_for_console(false);
        let colored = error.format_for_console(true);

        assert_eq!(plain, "[MASKING] Key not found in environment: API_KEY");
        assert!(colored.contains("MASKING"));
        assert!(colored.contains("API_KEY"));
    }

    #[test]
    fn test_error_reporter_default() {
        let reporter = ErrorReporter::default();
        assert!(reporter.use_color);
        assert!(!reporter.verbose);
    }
}
