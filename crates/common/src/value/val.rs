use std::fmt::Display;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValConversionError {
    #[error("Number {0} cannot be represented in JSON")]
    UnrepresentableNumber(f64),
}

/// The universal response value: the currency for arguments, variables, and
/// resolved results.
///
/// Once constructed, a value never changes its tag; conversions to native
/// types are tag-checked and fail on mismatch.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum Val {
    Null,
    Bool(bool),
    Int(i32),
    Float(f64),
    String(String),
    /// An enum value carried as its string tag.
    Enum(String),
    /// An opaque byte sequence, Base64-encoded on the wire.
    Id(Bytes),
    List(Vec<Val>),
    /// Ordered key-to-value mapping with unique keys.
    Map(IndexMap<String, Val>),
    /// Opaque passthrough for custom scalar representations.
    Scalar(serde_json::Value),
}

impl Val {
    pub fn get(&self, key: &str) -> Option<&Val> {
        match self {
            Val::Map(map) => map.get(key),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Val::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Val::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Val::Float(f) => Some(*f),
            Val::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Val::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// A short tag name used in conversion error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Val::Null => "Null",
            Val::Bool(_) => "Boolean",
            Val::Int(_) => "Int",
            Val::Float(_) => "Float",
            Val::String(_) => "String",
            Val::Enum(_) => "Enum",
            Val::Id(_) => "ID",
            Val::List(_) => "List",
            Val::Map(_) => "Object",
            Val::Scalar(_) => "Scalar",
        }
    }
}

impl Display for Val {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Val::Null => write!(f, "null"),
            Val::Bool(b) => write!(f, "{b}"),
            Val::Int(i) => write!(f, "{i}"),
            Val::Float(n) => write!(f, "{n}"),
            Val::String(s) => write!(f, "\"{s}\""),
            Val::Enum(e) => write!(f, "{e}"),
            Val::Id(bytes) => write!(f, "\"{}\"", BASE64.encode(bytes)),
            Val::List(l) => {
                write!(f, "[")?;
                for (i, v) in l.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
            Val::Map(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
            Val::Scalar(v) => write!(f, "{v}"),
        }
    }
}

impl TryFrom<&Val> for serde_json::Value {
    type Error = ValConversionError;

    fn try_from(value: &Val) -> Result<Self, Self::Error> {
        match value {
            Val::Null => Ok(serde_json::Value::Null),
            Val::Bool(b) => Ok(serde_json::Value::Bool(*b)),
            Val::Int(i) => Ok(serde_json::Value::Number((*i).into())),
            Val::Float(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .ok_or(ValConversionError::UnrepresentableNumber(*n)),
            Val::String(s) => Ok(serde_json::Value::String(s.clone())),
            Val::Enum(e) => Ok(serde_json::Value::String(e.clone())),
            Val::Id(bytes) => Ok(serde_json::Value::String(BASE64.encode(bytes))),
            Val::List(l) => Ok(serde_json::Value::Array(
                l.iter().map(|v| v.try_into()).collect::<Result<_, _>>()?,
            )),
            // serde_json is built with `preserve_order`, so map insertion
            // order survives into the JSON object
            Val::Map(map) => Ok(serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| Ok((k.clone(), v.try_into()?)))
                    .collect::<Result<_, _>>()?,
            )),
            Val::Scalar(v) => Ok(v.clone()),
        }
    }
}

impl From<serde_json::Value> for Val {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Val::Null,
            serde_json::Value::Bool(b) => Val::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) if i32::try_from(i).is_ok() => Val::Int(i as i32),
                _ => match n.as_f64() {
                    Some(f) => Val::Float(f),
                    None => Val::Scalar(serde_json::Value::Number(n)),
                },
            },
            serde_json::Value::String(s) => Val::String(s),
            serde_json::Value::Array(l) => Val::List(l.into_iter().map(|v| v.into()).collect()),
            serde_json::Value::Object(o) => {
                Val::Map(o.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn json_round_trip_preserves_tags() {
        let val = Val::Map(IndexMap::from([
            ("b".to_string(), Val::Bool(true)),
            ("i".to_string(), Val::Int(42)),
            ("f".to_string(), Val::Float(1.5)),
            ("s".to_string(), Val::String("hello".to_string())),
            (
                "l".to_string(),
                Val::List(vec![Val::Null, Val::Int(1), Val::Int(2)]),
            ),
        ]));

        let json: serde_json::Value = (&val).try_into().unwrap();
        let back: Val = json.into();

        assert_eq!(val, back);
    }

    #[test]
    fn map_order_survives_json_conversion() {
        let val = Val::Map(IndexMap::from([
            ("zebra".to_string(), Val::Int(1)),
            ("apple".to_string(), Val::Int(2)),
            ("mango".to_string(), Val::Int(3)),
        ]));

        let json: serde_json::Value = (&val).try_into().unwrap();
        let keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();

        assert_eq!(keys, vec!["zebra", "apple", "mango"]);
    }

    #[test]
    fn id_encodes_as_base64() {
        let val = Val::Id(Bytes::from_static(b"node:42"));
        let json: serde_json::Value = (&val).try_into().unwrap();

        assert_eq!(json, serde_json::Value::String("bm9kZTo0Mg==".to_string()));
    }

    #[test]
    fn non_finite_float_is_rejected() {
        let val = Val::Float(f64::NAN);
        assert!(serde_json::Value::try_from(&val).is_err());
    }

    #[test]
    fn large_integers_become_floats() {
        let json = serde_json::json!(1_000_000_000_000_i64);
        assert_eq!(Val::from(json), Val::Float(1_000_000_000_000.0));

        let json = serde_json::json!(7);
        assert_eq!(Val::from(json), Val::Int(7));
    }

    #[test]
    fn get_is_tag_checked() {
        let map = Val::Map(IndexMap::from([("x".to_string(), Val::Int(1))]));
        assert_eq!(map.get("x"), Some(&Val::Int(1)));
        assert_eq!(map.get("y"), None);
        assert_eq!(Val::Int(1).get("x"), None);
    }
}
