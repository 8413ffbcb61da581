//! envguard
//!
//! Loads `KEY=value` pairs from a `.env` file into an environment, enforces
//! required keys, reads values back as typed data, expands `${NAME}`
//! placeholders and renders the loaded set with sensitive values masked.

pub mod cli;
pub mod coerce;
pub mod config;
pub mod env;
pub mod error;
pub mod guard;
pub mod logging;
pub mod models;
pub mod parser;
pub mod placeholder;
pub mod registry;
pub mod source;

// Re-export commonly used types
pub use coerce::{coerce, JsonMap, TargetKind, TypedValue};
pub use env::{Environment, MemoryEnv, ProcessEnv};
pub use error::{EnvError, ErrorReporter, OrAbort, Result};
pub use guard::{EnvGuard, LoadReport};
pub use models::Config;
pub use parser::{LineParser, ParseOptions, RawEntry};
pub use placeholder::PlaceholderResolver;
pub use registry::{mask_value, MaskingRegistry, Renderer, SensitiveEntry};
pub use source::{FileSource, LineSource, StrSource};

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");

/// Default configuration values
pub mod defaults {
    pub const DEFAULT_ENV_FILE: &str = ".env";
    pub const DEFAULT_INLINE_COMMENTS: bool = true;
    pub const DEFAULT_ENABLE_COLOR: bool = true;

    /// Character substituted for hidden characters of a masked value
    pub const MASK_CHAR: char = '*';
    /// Characters left visible at each end of a masked string
    pub const MASK_VISIBLE_EDGE: usize = 2;
    /// Display of a masked non-string scalar
    pub const MASK_SCALAR: &str = "***";
    /// Display of a masked list or map
    pub const MASK_COMPOSITE: &str = "******";
}
