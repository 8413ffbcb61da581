//! Environment loading, precedence and typed access
//!
//! [`EnvGuard`] owns an [`Environment`] backend and the [`MaskingRegistry`].
//! Every operation goes through it, so tests can run against a
//! [`MemoryEnv`](crate::env::MemoryEnv) instead of the process environment.
//!
//! # Concurrency
//!
//! `EnvGuard` does no internal locking. Mutating operations take `&mut self`;
//! to share one guard between threads wrap it in a single `Mutex` that covers
//! load, overload, set, reset and render together. Two guards over
//! [`ProcessEnv`] still share the process environment.

use crate::coerce::{coerce, JsonMap, TargetKind, TypedValue};
use crate::env::{Environment, ProcessEnv};
use crate::error::{EnvError, Result};
use crate::logging::Logger;
use crate::parser::{LineParser, ParseOptions, RawEntry};
use crate::placeholder::PlaceholderResolver;
use crate::registry::{MaskingRegistry, Renderer};
use crate::source::{FileSource, LineSource};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Outcome of a load pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// Entries written into the environment
    pub loaded: usize,
    /// Entries left alone because the key already had a value
    pub skipped_existing: usize,
    /// Physical lines that carried no entry
    pub lines_skipped: usize,
}

/// Loader, accessor and display context over one environment backend
#[derive(Debug)]
pub struct EnvGuard<E: Environment = ProcessEnv> {
    env: E,
    registry: MaskingRegistry,
    parser: LineParser,
    resolver: PlaceholderResolver,
    logger: Option<Logger>,
}

impl EnvGuard<ProcessEnv> {
    /// Guard over the real process environment
    pub fn process() -> Self {
        Self::new(ProcessEnv::new())
    }
}

impl Default for EnvGuard<ProcessEnv> {
    fn default() -> Self {
        Self::process()
    }
}

impl<E: Environment> EnvGuard<E> {
    pub fn new(env: E) -> Self {
        Self {
            env,
            registry: MaskingRegistry::new(),
            parser: LineParser::default(),
            resolver: PlaceholderResolver::new(),
            logger: None,
        }
    }

    pub fn with_parse_options(mut self, options: ParseOptions) -> Self {
        self.parser = LineParser::new(options);
        self
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn env(&self) -> &E {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut E {
        &mut self.env
    }

    pub fn registry(&self) -> &MaskingRegistry {
        &self.registry
    }

    pub fn into_env(self) -> E {
        self.env
    }

    /// Read the whole source before anything is committed.
    ///
    /// Entries the backend cannot store are dropped here and counted with
    /// the skipped lines, so a load never stops half-way through.
    fn read_entries(&self, source: &dyn LineSource) -> Result<(Vec<RawEntry>, usize)> {
        let mut entries = self.parser.entries(source)?;
        let mut parsed = Vec::new();
        let mut rejected = 0;
        for item in entries.by_ref() {
            let entry = item?;
            if self.env.accepts(&entry.key, &entry.value) {
                parsed.push(entry);
                continue;
            }
            rejected += 1;
            if let Some(logger) = &self.logger {
                logger
                    .debug("skipped entry the environment cannot store")
                    .field("source", source.name())
                    .field("key", entry.key.as_str())
                    .field("line", entry.line)
                    .log();
            }
        }
        Ok((parsed, entries.skipped_lines() + rejected))
    }

    fn log_load(&self, operation: &str, source: &dyn LineSource, report: &LoadReport) {
        if let Some(logger) = &self.logger {
            logger
                .debug(&format!("{} completed", operation))
                .field("source", source.name())
                .field("loaded", report.loaded)
                .field("skipped_existing", report.skipped_existing)
                .field("lines_skipped", report.lines_skipped)
                .log();
        }
    }

    /// Commit one entry unless the key already holds a non-empty value
    fn commit_if_unset(&mut self, key: &str, value: &str, report: &mut LoadReport) -> Result<()> {
        if self.env.has_value(key) {
            report.skipped_existing += 1;
            if let Some(logger) = &self.logger {
                logger.trace("kept existing value").field("key", key).log();
            }
            return Ok(());
        }
        self.env.set(key, value)?;
        self.registry.record(key, value, false);
        report.loaded += 1;
        Ok(())
    }

    /// Load `source`, keeping any value already present in the environment.
    ///
    /// Nothing is committed when the source fails to open or read.
    pub fn load(&mut self, source: &dyn LineSource) -> Result<LoadReport> {
        let (entries, lines_skipped) = self.read_entries(source)?;
        let mut report = LoadReport {
            lines_skipped,
            ..LoadReport::default()
        };

        for entry in &entries {
            self.commit_if_unset(&entry.key, &entry.value, &mut report)?;
        }

        self.log_load("load", source, &report);
        Ok(report)
    }

    /// Load `source`, overwriting every key it names.
    ///
    /// The registry is cleared first, so masking flags must be declared again
    /// after an overload.
    pub fn overload(&mut self, source: &dyn LineSource) -> Result<LoadReport> {
        let (entries, lines_skipped) = self.read_entries(source)?;
        let mut report = LoadReport {
            lines_skipped,
            ..LoadReport::default()
        };

        self.registry.clear();
        for entry in &entries {
            self.env.set(&entry.key, &entry.value)?;
            self.registry.record(&entry.key, entry.value.as_str(), false);
            report.loaded += 1;
        }

        self.log_load("overload", source, &report);
        Ok(report)
    }

    /// Parse `source`, require every key in `required_keys` to be present and
    /// non-empty in it, then commit with [`load`](Self::load) precedence.
    ///
    /// Keys are checked in the given order and the first failure is returned
    /// as a fatal [`EnvError::MissingRequiredKey`] or
    /// [`EnvError::EmptyRequiredValue`]. Nothing is committed on failure.
    pub fn load_with_validation<S: AsRef<str>>(
        &mut self,
        source: &dyn LineSource,
        required_keys: &[S],
    ) -> Result<LoadReport> {
        let (entries, lines_skipped) = self.read_entries(source)?;

        let mut parsed: BTreeMap<String, String> = BTreeMap::new();
        for entry in entries {
            parsed.insert(entry.key, entry.value);
        }

        for key in required_keys {
            let key = key.as_ref();
            let check = match parsed.get(key) {
                None => Err(EnvError::missing_required_key(key)),
                Some(value) if value.is_empty() => Err(EnvError::empty_required_value(key)),
                Some(_) => Ok(()),
            };
            if let Err(error) = check {
                if let Some(logger) = &self.logger {
                    logger
                        .error("validation failed")
                        .field("source", source.name())
                        .field("key", key)
                        .error_info(&error)
                        .log();
                }
                return Err(error);
            }
        }

        let mut report = LoadReport {
            lines_skipped,
            ..LoadReport::default()
        };
        for (key, value) in &parsed {
            self.commit_if_unset(key, value, &mut report)?;
        }

        self.log_load("validated load", source, &report);
        Ok(report)
    }

    /// [`load`](Self::load) a file by path
    pub fn load_file<P: AsRef<Path>>(&mut self, path: P) -> Result<LoadReport> {
        self.load(&FileSource::new(path))
    }

    /// [`overload`](Self::overload) a file by path
    pub fn overload_file<P: AsRef<Path>>(&mut self, path: P) -> Result<LoadReport> {
        self.overload(&FileSource::new(path))
    }

    /// [`load_with_validation`](Self::load_with_validation) a file by path
    pub fn load_file_with_validation<P: AsRef<Path>, S: AsRef<str>>(
        &mut self,
        path: P,
        required_keys: &[S],
    ) -> Result<LoadReport> {
        self.load_with_validation(&FileSource::new(path), required_keys)
    }

    /// Fail with [`EnvError::MissingRequiredKey`] unless `key` has a
    /// non-empty value
    pub fn required(&self, key: &str) -> Result<()> {
        if self.env.has_value(key) {
            Ok(())
        } else {
            Err(EnvError::missing_required_key(key))
        }
    }

    /// Set `key` to the string form of `value` and record the typed value.
    /// A key already marked sensitive stays masked.
    pub fn set<V: Into<TypedValue>>(&mut self, key: &str, value: V) -> Result<()> {
        let value = value.into();
        self.env.set(key, &value.to_string())?;
        let masked = self.registry.is_masked(key);
        self.registry.record(key, value, masked);
        Ok(())
    }

    /// Remove every variable from the environment and clear the registry.
    /// Stops at the first removal that fails and leaves the registry as it
    /// was.
    pub fn reset(&mut self) -> Result<()> {
        let removed = match self.env.clear() {
            Ok(removed) => removed,
            Err(error) => {
                if let Some(logger) = &self.logger {
                    logger.error("environment reset failed").error_info(&error).log();
                }
                return Err(error);
            }
        };
        self.registry.clear();

        if let Some(logger) = &self.logger {
            logger.debug("environment reset").field("removed", removed).log();
        }
        Ok(())
    }

    /// Flag `keys` as sensitive.
    ///
    /// Every key must have a current value; otherwise the first one without
    /// is reported as a fatal [`EnvError::KeyNotFound`] and nothing is marked.
    pub fn mark_sensitive<S: AsRef<str>>(&mut self, keys: &[S]) -> Result<()> {
        let mut current = Vec::with_capacity(keys.len());
        for key in keys {
            let key = key.as_ref();
            match self.env.get(key).filter(|v| !v.is_empty()) {
                Some(value) => current.push((key, value)),
                None => return Err(EnvError::key_not_found(key)),
            }
        }

        for (key, value) in current {
            let recorded = match self.registry.value_of(key) {
                Some(typed) if typed.to_string() == value => typed.clone(),
                _ => TypedValue::String(value),
            };
            self.registry.mark(key, recorded);
        }
        Ok(())
    }

    /// Value of `key` coerced to the kind of `default`.
    ///
    /// An absent or empty variable yields `default` unchanged. A present value
    /// that fails to coerce is an error, never a silent fallback.
    pub fn get(&self, key: &str, default: TypedValue) -> Result<TypedValue> {
        match self.env.get(key) {
            Some(raw) if !raw.is_empty() => coerce(&raw, default.kind()),
            _ => Ok(default),
        }
    }

    fn get_as<T>(
        &self,
        key: &str,
        default: TypedValue,
        extract: impl FnOnce(TypedValue) -> Option<T>,
    ) -> Result<T> {
        let kind = default.kind();
        let value = self.get(key, default)?;
        extract(value).ok_or_else(|| {
            EnvError::internal(format!("coercion of {} did not produce {}", key, kind))
        })
    }

    pub fn get_int(&self, key: &str, default: i64) -> Result<i64> {
        self.get_as(key, TypedValue::Int(default), |v| v.as_int())
    }

    pub fn get_string(&self, key: &str, default: &str) -> Result<String> {
        self.get_as(key, TypedValue::from(default), |v| match v {
            TypedValue::String(s) => Some(s),
            _ => None,
        })
    }

    pub fn get_bool(&self, key: &str, default: bool) -> Result<bool> {
        self.get_as(key, TypedValue::Bool(default), |v| v.as_bool())
    }

    pub fn get_float(&self, key: &str, default: f64) -> Result<f64> {
        self.get_as(key, TypedValue::Float(default), |v| v.as_float())
    }

    pub fn get_string_list(&self, key: &str, default: Vec<String>) -> Result<Vec<String>> {
        self.get_as(key, TypedValue::StringList(default), TypedValue::into_string_list)
    }

    pub fn get_int_list(&self, key: &str, default: Vec<i64>) -> Result<Vec<i64>> {
        self.get_as(key, TypedValue::IntList(default), TypedValue::into_int_list)
    }

    pub fn get_map(&self, key: &str, default: JsonMap) -> Result<JsonMap> {
        self.get_as(key, TypedValue::Map(default), TypedValue::into_map)
    }

    /// Coerce `key` to a kind chosen at runtime; absent or empty is `None`
    pub fn get_kind(&self, key: &str, kind: TargetKind) -> Result<Option<TypedValue>> {
        match self.env.get(key) {
            Some(raw) if !raw.is_empty() => coerce(&raw, kind).map(Some),
            _ => Ok(None),
        }
    }

    /// Expand the `${NAME}` placeholders held in the value of `key`
    pub fn resolve_placeholder(&self, key: &str) -> Result<String> {
        let value = self.env.get(key).unwrap_or_default();
        self.resolver.resolve(key, &value, &self.env)
    }

    /// Expand the `${NAME}` placeholders in an arbitrary string
    pub fn resolve_template(&self, template: &str) -> Result<String> {
        self.resolver.resolve("template", template, &self.env)
    }

    /// Display lines for every registered key still in the environment
    pub fn render_lines(&self) -> Vec<String> {
        self.registry.render_lines(&self.env)
    }

    /// Display lines using `renderer`
    pub fn render_with(&self, renderer: &Renderer) -> Vec<String> {
        renderer.lines(&self.registry, &self.env)
    }

    /// Print [`render_lines`](Self::render_lines) to stdout
    pub fn render(&self) {
        for line in self.render_lines() {
            println!("{}", line);
        }
    }
}
