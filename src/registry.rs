//! Masking registry
//!
//! Tracks every key this crate has loaded or set, together with the value it
//! recorded and whether the value is sensitive. Display goes through the
//! registry only, so variables that reached the environment some other way
//! are never shown. The value shown is always the one the environment holds
//! now.

use crate::coerce::TypedValue;
use crate::defaults::{MASK_CHAR, MASK_COMPOSITE, MASK_SCALAR, MASK_VISIBLE_EDGE};
use crate::env::Environment;
use colored::Colorize;
use std::collections::BTreeMap;

/// Registry record for one key
#[derive(Debug, Clone, PartialEq)]
pub struct SensitiveEntry {
    pub value: TypedValue,
    pub masked: bool,
}

impl SensitiveEntry {
    /// Text shown for this entry, masked when flagged
    pub fn display_value(&self) -> String {
        if !self.masked {
            return self.value.to_string();
        }
        match &self.value {
            TypedValue::String(s) => mask_value(s),
            other if other.kind().is_composite() => MASK_COMPOSITE.to_string(),
            _ => MASK_SCALAR.to_string(),
        }
    }
}

/// Keys known to have been loaded or set, with their masking flags
#[derive(Debug, Clone, Default)]
pub struct MaskingRegistry {
    entries: BTreeMap<String, SensitiveEntry>,
}

impl MaskingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a committed value. Replaces any previous record for `key`.
    pub fn record<V: Into<TypedValue>>(&mut self, key: &str, value: V, masked: bool) {
        self.entries.insert(
            key.to_string(),
            SensitiveEntry {
                value: value.into(),
                masked,
            },
        );
    }

    /// Record a value as sensitive
    pub fn mark<V: Into<TypedValue>>(&mut self, key: &str, value: V) {
        self.record(key, value, true);
    }

    pub fn get(&self, key: &str) -> Option<&SensitiveEntry> {
        self.entries.get(key)
    }

    pub fn value_of(&self, key: &str) -> Option<&TypedValue> {
        self.entries.get(key).map(|e| &e.value)
    }

    pub fn is_masked(&self, key: &str) -> bool {
        self.entries.get(key).is_some_and(|e| e.masked)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Registered entries still present in `env`, in key order, carrying
    /// the current environment value.
    ///
    /// The recorded typed value is kept only while its string form matches
    /// the environment; a value changed elsewhere shows as a plain string.
    /// Entries no longer in the environment are left out.
    pub fn displayable<'a>(
        &'a self,
        env: &'a dyn Environment,
    ) -> impl Iterator<Item = (&'a str, SensitiveEntry)> + 'a {
        self.entries.iter().filter_map(move |(key, entry)| {
            let current = env.get(key)?;
            let value = if entry.value.to_string() == current {
                entry.value.clone()
            } else {
                TypedValue::String(current)
            };
            Some((
                key.as_str(),
                SensitiveEntry {
                    value,
                    masked: entry.masked,
                },
            ))
        })
    }

    /// `key = value` lines for every displayable entry
    pub fn render_lines(&self, env: &dyn Environment) -> Vec<String> {
        Renderer::plain().lines(self, env)
    }
}

/// Formats registry entries for display
#[derive(Debug, Clone, Copy, Default)]
pub struct Renderer {
    use_color: bool,
}

impl Renderer {
    pub fn new(use_color: bool) -> Self {
        Self { use_color }
    }

    pub fn plain() -> Self {
        Self::new(false)
    }

    pub fn format_line(&self, key: &str, entry: &SensitiveEntry) -> String {
        let value = entry.display_value();
        if !self.use_color {
            return format!("{} = {}", key, value);
        }

        let value = if entry.masked {
            value.yellow().to_string()
        } else {
            value.normal().to_string()
        };
        format!("{} = {}", key.cyan().bold(), value)
    }

    pub fn lines(&self, registry: &MaskingRegistry, env: &dyn Environment) -> Vec<String> {
        registry
            .displayable(env)
            .map(|(key, entry)| self.format_line(key, &entry))
            .collect()
    }
}

/// Redact a sensitive string.
///
/// Up to four characters become all `*`; longer values keep two characters
/// at each end. Lengths are counted in characters.
pub fn mask_value(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    let len = chars.len();
    if len <= MASK_VISIBLE_EDGE * 2 {
        return MASK_CHAR.to_string().repeat(len);
    }

    let head: String = chars[..MASK_VISIBLE_EDGE].iter().collect();
    let tail: String = chars[len - MASK_VISIBLE_EDGE..].iter().collect();
    format!(
        "{}{}{}",
        head,
        MASK_CHAR.to_string().repeat(len - MASK_VISIBLE_EDGE * 2),
        tail
    )
}
