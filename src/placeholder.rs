//! `${NAME}` placeholder interpolation

use crate::env::Environment;
use crate::error::{EnvError, Result};
use regex::Regex;
use std::sync::LazyLock;

/// `${IDENTIFIER}` with an alphanumeric/underscore identifier
pub const PLACEHOLDER_PATTERN: &str = r"\$\{([A-Za-z0-9_]+)\}";

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(PLACEHOLDER_PATTERN).expect("placeholder pattern is valid"));

/// Expands `${NAME}` references against an [`Environment`].
///
/// Resolution is all-or-nothing: the first reference with no value aborts the
/// whole expansion, and a template with no reference at all is rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderResolver;

impl PlaceholderResolver {
    pub fn new() -> Self {
        Self
    }

    /// Whether `template` holds at least one placeholder
    pub fn has_placeholders(&self, template: &str) -> bool {
        PLACEHOLDER.is_match(template)
    }

    /// Names referenced by `template`, left to right, duplicates kept
    pub fn references(&self, template: &str) -> Vec<String> {
        PLACEHOLDER
            .captures_iter(template)
            .map(|caps| caps[1].to_string())
            .collect()
    }

    /// Replace every placeholder in `template`.
    ///
    /// `label` names the value in a [`EnvError::NoPlaceholder`] error. An
    /// identifier that is set to the empty string resolves to "".
    pub fn resolve(&self, label: &str, template: &str, env: &dyn Environment) -> Result<String> {
        if !PLACEHOLDER.is_match(template) {
            return Err(EnvError::no_placeholder(label, template));
        }

        let mut result = String::with_capacity(template.len());
        let mut begin = 0;
        for caps in PLACEHOLDER.captures_iter(template) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let value = env
                .get(name.as_str())
                .ok_or_else(|| EnvError::unresolved_placeholder(name.as_str()))?;

            result.push_str(&template[begin..whole.start()]);
            result.push_str(&value);
            begin = whole.end();
        }
        result.push_str(&template[begin..]);

        Ok(result)
    }
}
