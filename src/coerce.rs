//! Type coercion of raw environment strings
//!
//! The caller picks a [`TargetKind`] (usually through the kind of a
//! [`TypedValue`] default) and [`coerce`] converts a non-empty raw string to
//! it. Conversion never falls back to a default: a malformed value is an
//! error. The one deliberately lossy rule is [`TargetKind::IntList`], which
//! drops segments that are not integers.

use crate::error::{EnvError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// JSON object value used for [`TargetKind::Map`]
pub type JsonMap = Map<String, Value>;

/// Type a raw string is coerced into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetKind {
    Int,
    Bool,
    Float,
    String,
    StringList,
    IntList,
    Map,
}

impl TargetKind {
    pub const ALL: [TargetKind; 7] = [
        TargetKind::Int,
        TargetKind::Bool,
        TargetKind::Float,
        TargetKind::String,
        TargetKind::StringList,
        TargetKind::IntList,
        TargetKind::Map,
    ];

    /// Canonical lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Int => "int",
            TargetKind::Bool => "bool",
            TargetKind::Float => "float",
            TargetKind::String => "string",
            TargetKind::StringList => "string-list",
            TargetKind::IntList => "int-list",
            TargetKind::Map => "map",
        }
    }

    /// Name used in type mismatch messages
    pub fn expected_name(&self) -> &'static str {
        match self {
            TargetKind::Int => "Integer",
            TargetKind::Bool => "Boolean",
            TargetKind::Float => "Float64",
            TargetKind::String => "String",
            TargetKind::StringList => "StringList",
            TargetKind::IntList => "IntegerList",
            TargetKind::Map => "Map",
        }
    }

    /// Whether values of this kind are collections
    pub fn is_composite(&self) -> bool {
        matches!(self, TargetKind::StringList | TargetKind::IntList | TargetKind::Map)
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetKind {
    type Err = EnvError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "int" | "integer" | "i64" => Ok(TargetKind::Int),
            "bool" | "boolean" => Ok(TargetKind::Bool),
            "float" | "float64" | "f64" => Ok(TargetKind::Float),
            "string" | "str" => Ok(TargetKind::String),
            "string-list" | "strings" | "[]string" => Ok(TargetKind::StringList),
            "int-list" | "ints" | "[]int" => Ok(TargetKind::IntList),
            "map" | "json" => Ok(TargetKind::Map),
            _ => Err(EnvError::unsupported_type(s)),
        }
    }
}

/// A coerced value, or a caller-supplied default of a given kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "kebab-case")]
pub enum TypedValue {
    Int(i64),
    Bool(bool),
    Float(f64),
    String(String),
    StringList(Vec<String>),
    IntList(Vec<i64>),
    Map(JsonMap),
}

impl TypedValue {
    /// Kind that selects the coercion rule when this value is a default
    pub fn kind(&self) -> TargetKind {
        match self {
            TypedValue::Int(_) => TargetKind::Int,
            TypedValue::Bool(_) => TargetKind::Bool,
            TypedValue::Float(_) => TargetKind::Float,
            TypedValue::String(_) => TargetKind::String,
            TypedValue::StringList(_) => TargetKind::StringList,
            TypedValue::IntList(_) => TargetKind::IntList,
            TypedValue::Map(_) => TargetKind::Map,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            TypedValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            TypedValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            TypedValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            TypedValue::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_string_list(self) -> Option<Vec<String>> {
        match self {
            TypedValue::StringList(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_int_list(self) -> Option<Vec<i64>> {
        match self {
            TypedValue::IntList(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_map(self) -> Option<JsonMap> {
        match self {
            TypedValue::Map(v) => Some(v),
            _ => None,
        }
    }
}

/// Environment-string form: lists are comma-joined, maps are compact JSON
impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedValue::Int(v) => write!(f, "{}", v),
            TypedValue::Bool(v) => write!(f, "{}", v),
            TypedValue::Float(v) => write!(f, "{}", v),
            TypedValue::String(v) => f.write_str(v),
            TypedValue::StringList(v) => f.write_str(&v.join(",")),
            TypedValue::IntList(v) => {
                let parts: Vec<String> = v.iter().map(i64::to_string).collect();
                f.write_str(&parts.join(","))
            }
            TypedValue::Map(v) => write!(f, "{}", Value::Object(v.clone())),
        }
    }
}

impl From<i64> for TypedValue {
    fn from(v: i64) -> Self {
        TypedValue::Int(v)
    }
}

impl From<i32> for TypedValue {
    fn from(v: i32) -> Self {
        TypedValue::Int(v.into())
    }
}

impl From<bool> for TypedValue {
    fn from(v: bool) -> Self {
        TypedValue::Bool(v)
    }
}

impl From<f64> for TypedValue {
    fn from(v: f64) -> Self {
        TypedValue::Float(v)
    }
}

impl From<String> for TypedValue {
    fn from(v: String) -> Self {
        TypedValue::String(v)
    }
}

impl From<&str> for TypedValue {
    fn from(v: &str) -> Self {
        TypedValue::String(v.to_string())
    }
}

impl From<Vec<String>> for TypedValue {
    fn from(v: Vec<String>) -> Self {
        TypedValue::StringList(v)
    }
}

impl From<Vec<&str>> for TypedValue {
    fn from(v: Vec<&str>) -> Self {
        TypedValue::StringList(v.into_iter().map(String::from).collect())
    }
}

impl From<Vec<i64>> for TypedValue {
    fn from(v: Vec<i64>) -> Self {
        TypedValue::IntList(v)
    }
}

impl From<JsonMap> for TypedValue {
    fn from(v: JsonMap) -> Self {
        TypedValue::Map(v)
    }
}

/// Convert `raw` into `kind`.
///
/// The empty-string default fallback lives one level up in the accessors;
/// this always attempts a conversion.
pub fn coerce(raw: &str, kind: TargetKind) -> Result<TypedValue> {
    match kind {
        TargetKind::Int => parse_int(raw)
            .map(TypedValue::Int)
            .ok_or_else(|| EnvError::type_mismatch(kind.expected_name(), raw)),
        TargetKind::Bool => parse_bool(raw)
            .map(TypedValue::Bool)
            .ok_or_else(|| EnvError::type_mismatch(kind.expected_name(), raw)),
        TargetKind::Float => raw
            .parse::<f64>()
            .map(TypedValue::Float)
            .map_err(|_| EnvError::type_mismatch(kind.expected_name(), raw)),
        TargetKind::String => Ok(TypedValue::String(raw.to_string())),
        TargetKind::StringList => Ok(TypedValue::StringList(
            raw.split(',').map(String::from).collect(),
        )),
        TargetKind::IntList => Ok(TypedValue::IntList(
            raw.split(',').filter_map(parse_int).collect(),
        )),
        TargetKind::Map => serde_json::from_str::<JsonMap>(raw)
            .map(TypedValue::Map)
            .map_err(|e| EnvError::json_decode(e.to_string())),
    }
}

/// Coerce `raw` into the kind of `default`
pub fn coerce_like(raw: &str, default: &TypedValue) -> Result<TypedValue> {
    coerce(raw, default.kind())
}

/// Base-10 integer over the whole string, optional sign
fn parse_int(raw: &str) -> Option<i64> {
    raw.parse::<i64>().ok()
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_int() {
        assert_eq!(coerce("8080", TargetKind::Int).unwrap(), TypedValue::Int(8080));
        assert_eq!(coerce("-42", TargetKind::Int).unwrap(), TypedValue::Int(-42));
        assert_eq!(coerce("+7", TargetKind::Int).unwrap(), TypedValue::Int(7));

        for bad in ["abc", "12abc", " 12", "1.5", "0x10"] {
            let err = coerce(bad, TargetKind::Int).unwrap_err();
            assert_eq!(err, EnvError::type_mismatch("Integer", bad));
        }
    }

    #[test]
    fn test_bool_literals() {
        for truthy in ["1", "t", "T", "TRUE", "true", "True"] {
            assert_eq!(coerce(truthy, TargetKind::Bool).unwrap(), TypedValue::Bool(true));
        }
        for falsy in ["0", "f", "F", "FALSE", "false", "False"] {
            assert_eq!(coerce(falsy, TargetKind::Bool).unwrap(), TypedValue::Bool(false));
        }
        for bad in ["yes", "no", "tRuE", "2", "on"] {
            assert!(matches!(
                coerce(bad, TargetKind::Bool),
                Err(EnvError::TypeMismatch { expected: "Boolean", .. })
            ));
        }
    }

    #[test]
    fn test_float() {
        assert_eq!(coerce("2.5", TargetKind::Float).unwrap(), TypedValue::Float(2.5));
        assert_eq!(coerce("1e3", TargetKind::Float).unwrap(), TypedValue::Float(1000.0));
        assert!(matches!(
            coerce("pi", TargetKind::Float),
            Err(EnvError::TypeMismatch { expected: "Float64", .. })
        ));
    }

    #[test]
    fn test_string_is_identity() {
        assert_eq!(
            coerce(" spaced, value ", TargetKind::String).unwrap(),
            TypedValue::String(" spaced, value ".to_string())
        );
    }

    #[test]
    fn test_string_list_keeps_empty_segments() {
        assert_eq!(
            coerce("a,,b,", TargetKind::StringList).unwrap(),
            TypedValue::StringList(vec!["a".into(), "".into(), "b".into(), "".into()])
        );
        assert_eq!(
            coerce("single", TargetKind::StringList).unwrap(),
            TypedValue::StringList(vec!["single".into()])
        );
    }

    #[test]
    fn test_int_list_drops_bad_segments() {
        assert_eq!(
            coerce("1,2,x,4", TargetKind::IntList).unwrap(),
            TypedValue::IntList(vec![1, 2, 4])
        );
        assert_eq!(
            coerce("x,y", TargetKind::IntList).unwrap(),
            TypedValue::IntList(vec![])
        );
        // segments are not trimmed
        assert_eq!(
            coerce("1, 2,3", TargetKind::IntList).unwrap(),
            TypedValue::IntList(vec![1, 3])
        );
    }

    #[test]
    fn test_map() {
        let value = coerce(r#"{"region":"eu","replicas":3}"#, TargetKind::Map).unwrap();
        let map = value.into_map().unwrap();
        assert_eq!(map["region"], Value::String("eu".into()));
        assert_eq!(map["replicas"], Value::from(3));

        assert!(matches!(coerce("{not json", TargetKind::Map), Err(EnvError::JsonDecode(_))));
        assert!(matches!(coerce("[1,2]", TargetKind::Map), Err(EnvError::JsonDecode(_))));
    }

    #[test]
    fn test_kind_from_default() {
        assert_eq!(coerce_like("8080", &TypedValue::Int(0)).unwrap(), TypedValue::Int(8080));
        assert!(coerce_like("abc", &TypedValue::Int(0)).is_err());
        assert_eq!(TypedValue::from(vec!["a"]).kind(), TargetKind::StringList);
        assert_eq!(TypedValue::from(JsonMap::new()).kind(), TargetKind::Map);
    }

    #[test]
    fn test_kind_names() {
        for kind in TargetKind::ALL {
            assert_eq!(kind.as_str().parse::<TargetKind>().unwrap(), kind);
        }
        assert_eq!("Float64".parse::<TargetKind>().unwrap(), TargetKind::Float);
        assert_eq!(
            "uuid".parse::<TargetKind>().unwrap_err(),
            EnvError::unsupported_type("uuid")
        );
    }

    #[test]
    fn test_display_is_env_string() {
        assert_eq!(TypedValue::Int(5).to_string(), "5");
        assert_eq!(TypedValue::from(vec!["a", "b"]).to_string(), "a,b");
        assert_eq!(TypedValue::IntList(vec![1, 2]).to_string(), "1,2");

        let mut map = JsonMap::new();
        map.insert("k".into(), Value::from(1));
        assert_eq!(TypedValue::Map(map).to_string(), r#"{"k":1}"#);
    }

    proptest! {
        #[test]
        fn prop_any_i64_round_trips(n in any::<i64>()) {
            prop_assert_eq!(coerce(&n.to_string(), TargetKind::Int).unwrap(), TypedValue::Int(n));
        }

        #[test]
        fn prop_string_list_segment_count(parts in proptest::collection::vec("[a-z ]{0,5}", 1..8)) {
            let raw = parts.join(",");
            let list = coerce(&raw, TargetKind::StringList).unwrap().into_string_list().unwrap();
            prop_assert_eq!(list, parts);
        }

        #[test]
        fn prop_int_list_keeps_order_of_valid_segments(
            segments in proptest::collection::vec(prop_oneof![
                any::<i32>().prop_map(|n| n.to_string()),
                "[a-z]{1,4}",
            ], 0..10)
        ) {
            let expected: Vec<i64> = segments.iter().filter_map(|s| s.parse().ok()).collect();
            let raw = segments.join(",");
            let list = coerce(&raw, TargetKind::IntList).unwrap().into_int_list().unwrap();
            prop_assert_eq!(list, expected);
        }
    }
}
