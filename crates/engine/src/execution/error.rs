use std::fmt::Display;

use thiserror::Error;

use crate::ast::Pos;
use crate::conversion::ConversionError;

/// One step of a response path, mirroring the `path` entries of a GraphQL
/// error: field response keys and list indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

impl Display for PathSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathSegment::Field(name) => write!(f, "{name}"),
            PathSegment::Index(index) => write!(f, "{index}"),
        }
    }
}

/// A field-level failure recorded during execution, located by source
/// position and response path. Recoverable errors travel alongside partial
/// data rather than aborting the request.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionError {
    pub message: String,
    pub pos: Pos,
    pub path: Vec<PathSegment>,
}

impl ExecutionError {
    pub fn new(message: impl Into<String>, pos: Pos, path: Vec<PathSegment>) -> Self {
        ExecutionError {
            message: message.into(),
            pos,
            path,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "message": self.message,
            "locations": [{ "line": self.pos.line, "column": self.pos.column }],
            "path": self.path.iter().map(|segment| match segment {
                PathSegment::Field(name) => serde_json::json!(name),
                PathSegment::Index(index) => serde_json::json!(index),
            }).collect::<Vec<_>>(),
        })
    }
}

/// What a resolver (or the machinery around it) can fail with. Converted to
/// an [`ExecutionError`] at the field boundary where position and path are
/// known.
#[derive(Error, Debug)]
pub enum FieldError {
    #[error("{0}")]
    Message(String),

    #[error("Field '{0}' is not defined for type '{1}'")]
    UnknownField(String, String),

    #[error("Variable '${0}' is not bound and has no usable default")]
    UnboundVariable(String),

    #[error("Malformed value for argument '{0}': {1}")]
    MalformedArgument(String, String),

    #[error("Resolver for '{0}' returned a shape incompatible with its declared type")]
    IncompatibleShape(String),

    #[error(transparent)]
    Conversion(#[from] ConversionError),
}

impl FieldError {
    pub fn new(message: impl Into<String>) -> Self {
        FieldError::Message(message.into())
    }
}
