use std::collections::HashMap;

use common::value::Val;
use indexmap::IndexMap;

use crate::ast::OperationDefinitionExt;
use crate::ast::query::{OperationDefinition, Type, Value, VariableDefinition};

use super::error::FieldError;

/// The variable environment of one request: the operation's declarations
/// plus the values bound by the caller.
pub struct Variables<'d> {
    definitions: HashMap<&'d str, &'d VariableDefinition>,
    bindings: IndexMap<String, Val>,
}

impl<'d> Variables<'d> {
    pub(crate) fn new(operation: &'d OperationDefinition, bindings: IndexMap<String, Val>) -> Self {
        Variables {
            definitions: operation
                .variable_definitions()
                .iter()
                .map(|definition| (definition.name.as_str(), definition))
                .collect(),
            bindings,
        }
    }

    /// Resolution order: bound value, then declared default, then null if the
    /// declared type permits it.
    pub fn resolve(&self, name: &str) -> Result<Val, FieldError> {
        if let Some(value) = self.bindings.get(name) {
            return Ok(value.clone());
        }
        let Some(definition) = self.definitions.get(name) else {
            return Err(FieldError::UnboundVariable(name.to_string()));
        };
        if let Some(default) = &definition.default_value {
            return const_value_to_val(default);
        }
        match definition.var_type {
            Type::NonNullType(_) => Err(FieldError::UnboundVariable(name.to_string())),
            _ => Ok(Val::Null),
        }
    }
}

/// Converts a constant literal (a variable default) to a [`Val`]. The result
/// is still subject to per-argument coercion when it is used.
fn const_value_to_val(value: &Value) -> Result<Val, FieldError> {
    Ok(match value {
        Value::Variable(name) => {
            return Err(FieldError::new(format!(
                "Variable '${name}' cannot appear inside a default value"
            )));
        }
        Value::Int(n) => match n.as_i64() {
            Some(i) => match i32::try_from(i) {
                Ok(i) => Val::Int(i),
                Err(_) => Val::Float(i as f64),
            },
            None => Val::Null,
        },
        Value::Float(f) => Val::Float(*f),
        Value::String(s) => Val::String(s.clone()),
        Value::Boolean(b) => Val::Bool(*b),
        Value::Null => Val::Null,
        Value::Enum(e) => Val::Enum(e.clone()),
        Value::List(items) => Val::List(
            items
                .iter()
                .map(const_value_to_val)
                .collect::<Result<_, _>>()?,
        ),
        Value::Object(map) => Val::Map(
            map.iter()
                .map(|(k, v)| Ok::<_, FieldError>((k.clone(), const_value_to_val(v)?)))
                .collect::<Result<_, _>>()?,
        ),
    })
}
