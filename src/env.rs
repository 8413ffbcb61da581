//! Environment backends
//!
//! [`ProcessEnv`] reads and writes the real process environment.
//! [`MemoryEnv`] keeps variables in a map so tests and dry runs never touch
//! shared process state.

use crate::error::{EnvError, Result};
use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};

/// Key/value store the loader writes into and accessors read from
pub trait Environment {
    /// Current value of `key`, if any
    fn get(&self, key: &str) -> Option<String>;

    /// Set `key` to `value`, replacing any previous value
    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`
    fn remove(&mut self, key: &str) -> Result<()>;

    /// Every variable currently present
    fn vars(&self) -> Vec<(String, String)>;

    /// Whether `set(key, value)` can store the pair
    fn accepts(&self, _key: &str, _value: &str) -> bool {
        true
    }

    /// Remove every variable, stopping at the first failed removal.
    /// Returns the number removed.
    fn clear(&mut self) -> Result<usize> {
        let vars = self.vars();
        for (key, _) in &vars {
            self.remove(key)?;
        }
        Ok(vars.len())
    }

    /// Whether `key` has a non-empty value
    fn has_value(&self, key: &str) -> bool {
        self.get(key).is_some_and(|v| !v.is_empty())
    }
}

/// The process environment.
///
/// Every method mutates or reads global process state with no locking;
/// callers sharing it across threads must serialise access themselves.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl ProcessEnv {
    pub fn new() -> Self {
        Self
    }

    /// Names of every process variable, including names or values that are
    /// not valid UTF-8
    pub fn var_names(&self) -> Vec<OsString> {
        std::env::vars_os().map(|(name, _)| name).collect()
    }

    /// Remove a variable by its raw OS name
    pub fn remove_os(&mut self, name: &OsStr) -> Result<()> {
        let raw = name.as_encoded_bytes();
        if raw.is_empty() || raw.contains(&b'=') || raw.contains(&0) {
            return Err(EnvError::io(format!(
                "unable to unset env variable {:?}",
                name.to_string_lossy()
            )));
        }
        std::env::remove_var(name);
        Ok(())
    }
}

fn valid_key(key: &str) -> bool {
    !(key.is_empty() || key.contains('=') || key.contains('\0'))
}

fn check_key(key: &str) -> Result<()> {
    if !valid_key(key) {
        return Err(EnvError::io(format!("invalid environment variable name: {:?}", key)));
    }
    Ok(())
}

impl Environment for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        if check_key(key).is_err() {
            return None;
        }
        std::env::var(key).ok()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        check_key(key)?;
        if value.contains('\0') {
            return Err(EnvError::io(format!("value for {} contains a NUL byte", key)));
        }
        std::env::set_var(key, value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        check_key(key).map_err(|_| EnvError::io(format!("unable to unset env variable {:?}", key)))?;
        std::env::remove_var(key);
        Ok(())
    }

    /// UTF-8 variables only; [`clear`](Environment::clear) still removes
    /// the rest
    fn vars(&self) -> Vec<(String, String)> {
        std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect()
    }

    fn accepts(&self, key: &str, value: &str) -> bool {
        valid_key(key) && !value.contains('\0')
    }

    fn clear(&mut self) -> Result<usize> {
        let names = self.var_names();
        for name in &names {
            self.remove_os(name)?;
        }
        Ok(names.len())
    }
}

/// An isolated in-memory environment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryEnv {
    vars: BTreeMap<String, String>,
}

impl MemoryEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MemoryEnv {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl Environment for MemoryEnv {
    fn get(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.vars.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.vars.remove(key);
        Ok(())
    }

    fn vars(&self) -> Vec<(String, String)> {
        self.vars
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_env_round_trip() {
        let mut env = MemoryEnv::new();
        assert!(env.is_empty());

        env.set("APP_NAME", "demo-app").unwrap();
        assert_eq!(env.get("APP_NAME").as_deref(), Some("demo-app"));
        assert!(env.has_value("APP_NAME"));

        env.set("EMPTY", "").unwrap();
        assert!(!env.has_value("EMPTY"));
        assert_eq!(env.len(), 2);

        env.remove("APP_NAME").unwrap();
        assert_eq!(env.get("APP_NAME"), None);
        assert_eq!(env.vars(), vec![("EMPTY".to_string(), String::new())]);
    }

    #[test]
    fn test_memory_env_from_iter() {
        let env: MemoryEnv = [("B", "2"), ("A", "1")].into_iter().collect();
        assert_eq!(
            env.vars(),
            vec![("A".to_string(), "1".to_string()), ("B".to_string(), "2".to_string())]
        );
    }

    #[test]
    fn test_process_env_rejects_invalid_names() {
        let mut env = ProcessEnv::new();
        assert!(matches!(env.set("", "x"), Err(EnvError::Io(_))));
        assert!(matches!(env.set("A=B", "x"), Err(EnvError::Io(_))));
        assert!(matches!(env.remove("BAD=KEY"), Err(EnvError::Io(_))));
        assert_eq!(env.get("A=B"), None);
        assert!(matches!(env.set("NUL_VALUE", "x\0y"), Err(EnvError::Io(_))));
    }

    #[test]
    fn test_accepts_matches_set() {
        let env = ProcessEnv::new();
        assert!(env.accepts("APP_NAME", "demo"));
        assert!(env.accepts("APP_NAME", ""));
        assert!(!env.accepts("", "x"));
        assert!(!env.accepts("A=B", "x"));
        assert!(!env.accepts("A\0B", "x"));
        assert!(!env.accepts("APP_NAME", "x\0y"));

        assert!(MemoryEnv::new().accepts("A=B", "x\0y"));
    }

    #[test]
    fn test_memory_env_clear() {
        let mut env: MemoryEnv = [("A", "1"), ("B", "2")].into_iter().collect();
        assert_eq!(env.clear().unwrap(), 2);
        assert!(env.is_empty());
        assert_eq!(env.clear().unwrap(), 0);
    }

    #[test]
    fn test_process_env_set_and_remove() {
        let mut env = ProcessEnv::new();
        let key = "ENVGUARD_UNIT_PROCESS_ENV_KEY";

        env.set(key, "value").unwrap();
        assert_eq!(env.get(key).as_deref(), Some("value"));
        assert!(env.vars().iter().any(|(k, v)| k == key && v == "value"));

        env.remove(key).unwrap();
        assert_eq!(env.get(key), None);
    }
}
