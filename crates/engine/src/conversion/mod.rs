//! Tag-checked conversions between [`Val`] and native Rust types, used by
//! resolvers to consume arguments and produce results.

use std::sync::Arc;

use bytes::Bytes;
use common::value::Val;
use indexmap::IndexMap;
use thiserror::Error;

use crate::execution::resolver::{ObjectResolver, ResolvedValue};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversionError {
    #[error("Argument '{0}' was not provided")]
    Missing(String),

    #[error("Expected {expected}, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },
}

/// A native type that can be read out of a [`Val`]. Conversions never
/// reinterpret: a mismatched tag is an error, not a cast.
pub trait FromVal: Sized {
    fn from_val(value: &Val) -> Result<Self, ConversionError>;

    /// Called when the argument is absent altogether. Only nullable wrappers
    /// treat that as a value.
    fn from_missing(name: &str) -> Result<Self, ConversionError> {
        Err(ConversionError::Missing(name.to_string()))
    }
}

/// Extracts a required argument, failing if it is absent or mistyped.
pub fn require<T: FromVal>(
    name: &str,
    arguments: &IndexMap<String, Val>,
) -> Result<T, ConversionError> {
    match arguments.get(name) {
        Some(value) => T::from_val(value),
        None => T::from_missing(name),
    }
}

/// Extracts an optional argument: the value (or its default) plus a flag
/// telling whether a usable value was present.
pub fn find<T: FromVal + Default>(name: &str, arguments: &IndexMap<String, Val>) -> (T, bool) {
    match require::<T>(name, arguments) {
        Ok(value) => (value, true),
        Err(_) => (T::default(), false),
    }
}

fn mismatch<T>(expected: &'static str, actual: &Val) -> Result<T, ConversionError> {
    Err(ConversionError::TypeMismatch {
        expected,
        actual: actual.type_name(),
    })
}

impl FromVal for bool {
    fn from_val(value: &Val) -> Result<Self, ConversionError> {
        match value {
            Val::Bool(b) => Ok(*b),
            other => mismatch("Boolean", other),
        }
    }
}

impl FromVal for i32 {
    fn from_val(value: &Val) -> Result<Self, ConversionError> {
        match value {
            Val::Int(i) => Ok(*i),
            other => mismatch("Int", other),
        }
    }
}

impl FromVal for f64 {
    fn from_val(value: &Val) -> Result<Self, ConversionError> {
        match value {
            Val::Float(f) => Ok(*f),
            // integers widen to Float
            Val::Int(i) => Ok(*i as f64),
            other => mismatch("Float", other),
        }
    }
}

impl FromVal for String {
    fn from_val(value: &Val) -> Result<Self, ConversionError> {
        match value {
            Val::String(s) => Ok(s.clone()),
            Val::Enum(e) => Ok(e.clone()),
            other => mismatch("String", other),
        }
    }
}

impl FromVal for Bytes {
    fn from_val(value: &Val) -> Result<Self, ConversionError> {
        match value {
            Val::Id(bytes) => Ok(bytes.clone()),
            other => mismatch("ID", other),
        }
    }
}

impl FromVal for Val {
    fn from_val(value: &Val) -> Result<Self, ConversionError> {
        Ok(value.clone())
    }
}

impl<T: FromVal> FromVal for Option<T> {
    fn from_val(value: &Val) -> Result<Self, ConversionError> {
        match value {
            Val::Null => Ok(None),
            other => T::from_val(other).map(Some),
        }
    }

    fn from_missing(_name: &str) -> Result<Self, ConversionError> {
        Ok(None)
    }
}

impl<T: FromVal> FromVal for Vec<T> {
    fn from_val(value: &Val) -> Result<Self, ConversionError> {
        match value {
            Val::List(items) => items.iter().map(T::from_val).collect(),
            other => mismatch("List", other),
        }
    }
}

/// Lifts a native value into a [`ResolvedValue`], preserving the three-way
/// distinction between a null list, a null element, and an empty list through
/// nested `Option`s.
pub trait IntoResolved {
    fn into_resolved(self) -> ResolvedValue;
}

impl IntoResolved for ResolvedValue {
    fn into_resolved(self) -> ResolvedValue {
        self
    }
}

impl IntoResolved for Val {
    fn into_resolved(self) -> ResolvedValue {
        match self {
            Val::Null => ResolvedValue::Null,
            other => ResolvedValue::Value(other),
        }
    }
}

impl IntoResolved for bool {
    fn into_resolved(self) -> ResolvedValue {
        ResolvedValue::Value(Val::Bool(self))
    }
}

impl IntoResolved for i32 {
    fn into_resolved(self) -> ResolvedValue {
        ResolvedValue::Value(Val::Int(self))
    }
}

impl IntoResolved for f64 {
    fn into_resolved(self) -> ResolvedValue {
        ResolvedValue::Value(Val::Float(self))
    }
}

impl IntoResolved for String {
    fn into_resolved(self) -> ResolvedValue {
        ResolvedValue::Value(Val::String(self))
    }
}

impl IntoResolved for &str {
    fn into_resolved(self) -> ResolvedValue {
        ResolvedValue::Value(Val::String(self.to_string()))
    }
}

impl IntoResolved for Bytes {
    fn into_resolved(self) -> ResolvedValue {
        ResolvedValue::Value(Val::Id(self))
    }
}

impl IntoResolved for Arc<dyn ObjectResolver> {
    fn into_resolved(self) -> ResolvedValue {
        ResolvedValue::Object(self)
    }
}

impl<T: IntoResolved> IntoResolved for Option<T> {
    fn into_resolved(self) -> ResolvedValue {
        match self {
            Some(value) => value.into_resolved(),
            None => ResolvedValue::Null,
        }
    }
}

impl<T: IntoResolved> IntoResolved for Vec<T> {
    fn into_resolved(self) -> ResolvedValue {
        ResolvedValue::List(self.into_iter().map(IntoResolved::into_resolved).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn arguments() -> IndexMap<String, Val> {
        IndexMap::from([
            ("flag".to_string(), Val::Bool(true)),
            ("count".to_string(), Val::Int(3)),
            ("ratio".to_string(), Val::Float(0.5)),
            ("label".to_string(), Val::String("hi".to_string())),
            ("maybe".to_string(), Val::Null),
        ])
    }

    #[test]
    fn require_reads_matching_tags() {
        let args = arguments();
        assert_eq!(require::<bool>("flag", &args), Ok(true));
        assert_eq!(require::<i32>("count", &args), Ok(3));
        assert_eq!(require::<f64>("ratio", &args), Ok(0.5));
        assert_eq!(require::<String>("label", &args), Ok("hi".to_string()));
    }

    #[test]
    fn require_rejects_mismatched_tags() {
        let args = arguments();
        assert_eq!(
            require::<bool>("count", &args),
            Err(ConversionError::TypeMismatch {
                expected: "Boolean",
                actual: "Int"
            })
        );
    }

    #[test]
    fn int_widens_to_float_but_not_the_reverse() {
        let args = arguments();
        assert_eq!(require::<f64>("count", &args), Ok(3.0));
        assert!(require::<i32>("ratio", &args).is_err());
    }

    #[test]
    fn missing_required_argument_is_an_error() {
        let args = arguments();
        assert_eq!(
            require::<bool>("absent", &args),
            Err(ConversionError::Missing("absent".to_string()))
        );
    }

    #[test]
    fn nullable_wrapper_absorbs_null_and_absence() {
        let args = arguments();
        assert_eq!(require::<Option<i32>>("maybe", &args), Ok(None));
        assert_eq!(require::<Option<i32>>("absent", &args), Ok(None));
        assert_eq!(require::<Option<i32>>("count", &args), Ok(Some(3)));
    }

    #[test]
    fn find_reports_presence() {
        let args = arguments();
        assert_eq!(find::<i32>("count", &args), (3, true));
        assert_eq!(find::<i32>("absent", &args), (0, false));
        // mismatched tag counts as absent, not a panic
        assert_eq!(find::<i32>("label", &args), (0, false));
    }

    #[test]
    fn nested_options_keep_three_way_null_distinction() {
        let null_list: Option<Vec<Option<i32>>> = None;
        assert!(matches!(null_list.into_resolved(), ResolvedValue::Null));

        let empty: Option<Vec<Option<i32>>> = Some(vec![]);
        assert!(matches!(empty.into_resolved(), ResolvedValue::List(items) if items.is_empty()));

        let with_hole: Option<Vec<Option<i32>>> = Some(vec![Some(1), None]);
        match with_hole.into_resolved() {
            ResolvedValue::List(items) => {
                assert!(matches!(items[0], ResolvedValue::Value(Val::Int(1))));
                assert!(matches!(items[1], ResolvedValue::Null));
            }
            other => panic!("expected list, got {other:?}"),
        }
    }
}
