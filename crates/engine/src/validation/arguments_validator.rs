//! Input value checking: arguments, input objects, enum and scalar literals,
//! and variable usages.

use std::collections::HashSet;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::ast::query::{Type, Value};
use crate::ast::schema::InputValue;
use crate::ast::{Pos, TypeDefinitionExt, value_tag};
use crate::schema::index::TypeKind;

use super::selection_set_validator::SelectionSetValidator;
use super::validation_error::ValidationError;

impl<'a, 'd> SelectionSetValidator<'a, 'd> {
    /// Checks a provided argument list against its definitions: unknown
    /// names, missing required arguments, and the shape of each value.
    pub(super) fn validate_arguments(
        &mut self,
        provided: &'d [(String, Value)],
        definitions: &[InputValue],
        pos: Pos,
        owner: &str,
    ) {
        let mut seen = HashSet::new();
        for (name, _) in provided {
            if !seen.insert(name.as_str()) {
                self.errors.push(ValidationError::DuplicateArgument(
                    name.clone(),
                    owner.to_string(),
                    pos,
                ));
                continue;
            }
            if !definitions.iter().any(|def| &def.name == name) {
                self.errors.push(ValidationError::UnknownArgument(
                    name.clone(),
                    owner.to_string(),
                    pos,
                ));
            }
        }

        for definition in definitions {
            match provided.iter().find(|(name, _)| name == &definition.name) {
                Some((_, value)) => {
                    let has_non_null_default = has_non_null_default(&definition.default_value);
                    self.validate_input_value(
                        has_non_null_default,
                        value,
                        &definition.value_type,
                        pos,
                    );
                }
                None => {
                    if matches!(definition.value_type, Type::NonNullType(_))
                        && definition.default_value.is_none()
                    {
                        self.errors.push(ValidationError::RequiredArgumentNotFound(
                            definition.name.clone(),
                            pos,
                        ));
                    }
                }
            }
        }
    }

    /// Structural check of one literal against an expected type. Peels one
    /// modifier per recursion step. `has_non_null_default` lets an explicit
    /// null stand in for a non-null location that would fall back to a
    /// non-null default anyway.
    pub(super) fn validate_input_value(
        &mut self,
        has_non_null_default: bool,
        value: &'d Value,
        expected: &Type,
        pos: Pos,
    ) {
        match value {
            Value::Variable(name) => {
                self.validate_variable_usage(name, expected, has_non_null_default, pos);
            }
            Value::Null => {
                if matches!(expected, Type::NonNullType(_)) && !has_non_null_default {
                    self.errors.push(ValidationError::NullForNonNullType(
                        expected.to_string(),
                        pos,
                    ));
                }
            }
            _ => match expected {
                Type::NonNullType(inner) => {
                    self.validate_input_value(has_non_null_default, value, inner, pos);
                }
                Type::ListType(inner) => match value {
                    Value::List(items) => {
                        for item in items {
                            self.validate_input_value(false, item, inner, pos);
                        }
                    }
                    // a single value coerces to a one-element list
                    _ => self.validate_input_value(false, value, inner, pos),
                },
                Type::NamedType(name) => self.validate_named_value(value, name, pos),
            },
        }
    }

    fn validate_named_value(&mut self, value: &'d Value, type_name: &str, pos: Pos) {
        match self.index.kind(type_name) {
            None => {
                self.errors
                    .push(ValidationError::UnknownType(type_name.to_string(), pos));
            }
            Some(TypeKind::Object | TypeKind::Interface | TypeKind::Union) => {
                self.errors
                    .push(ValidationError::NotInputType(type_name.to_string(), pos));
            }
            Some(TypeKind::Enum) => match value {
                Value::Enum(token) => {
                    if !self.index.enum_value_exists(type_name, token) {
                        self.errors.push(ValidationError::InvalidEnumValue(
                            token.clone(),
                            type_name.to_string(),
                            pos,
                        ));
                    }
                }
                _ => self.push_shape_error(type_name, value, pos),
            },
            Some(TypeKind::InputObject) => match value {
                Value::Object(map) => {
                    let Some(definition) = self.schema.get_type_definition(type_name) else {
                        return;
                    };
                    for (key, field_value) in map {
                        match definition.input_field_by_name(key) {
                            Some(input_field) => {
                                let has_default = has_non_null_default(&input_field.default_value);
                                self.validate_input_value(
                                    has_default,
                                    field_value,
                                    &input_field.value_type,
                                    pos,
                                );
                            }
                            None => self.errors.push(ValidationError::UnknownInputField(
                                key.clone(),
                                type_name.to_string(),
                                pos,
                            )),
                        }
                    }
                    for input_field in definition.input_fields() {
                        if matches!(input_field.value_type, Type::NonNullType(_))
                            && input_field.default_value.is_none()
                            && !map.contains_key(&input_field.name)
                        {
                            self.errors.push(ValidationError::MissingRequiredInputField(
                                type_name.to_string(),
                                input_field.name.clone(),
                                pos,
                            ));
                        }
                    }
                }
                _ => self.push_shape_error(type_name, value, pos),
            },
            Some(TypeKind::Scalar) => self.validate_scalar_literal(value, type_name, pos),
        }
    }

    fn validate_scalar_literal(&mut self, value: &'d Value, type_name: &str, pos: Pos) {
        let matches_scalar = match type_name {
            "Int" => matches!(value, Value::Int(_)),
            // integer literals widen to Float
            "Float" => matches!(value, Value::Int(_) | Value::Float(_)),
            "String" => matches!(value, Value::String(_)),
            "Boolean" => matches!(value, Value::Boolean(_)),
            "ID" => match value {
                Value::String(s) => {
                    if BASE64.decode(s).is_err() {
                        self.errors.push(ValidationError::MalformedIdValue(pos));
                    }
                    return;
                }
                _ => false,
            },
            // custom scalars accept any literal shape
            _ => true,
        };
        if !matches_scalar {
            self.push_shape_error(type_name, value, pos);
        }
    }

    fn validate_variable_usage(
        &mut self,
        name: &str,
        expected: &Type,
        location_has_non_null_default: bool,
        pos: Pos,
    ) {
        // Fragment definitions are validated without an operation in scope;
        // their variable usages are checked again when spread from one.
        let Some(operation) = self.operation.as_deref_mut() else {
            return;
        };
        let Some(state) = operation.variable_mut(name) else {
            self.errors
                .push(ValidationError::UndeclaredVariable(name.to_string(), pos));
            return;
        };
        state.referenced = true;

        let compatible = variable_type_compatible(
            state.has_non_null_default || location_has_non_null_default,
            &state.definition.var_type,
            expected,
        );
        let declared = state.definition.var_type.to_string();
        if !compatible {
            self.errors.push(ValidationError::IncompatibleVariableType(
                name.to_string(),
                declared,
                expected.to_string(),
                pos,
            ));
        }
    }

    fn push_shape_error(&mut self, expected: &str, value: &Value, pos: Pos) {
        self.errors.push(ValidationError::InvalidValueShape {
            expected_type: expected.to_string(),
            actual: value_tag(value),
            pos,
        });
    }
}

fn has_non_null_default(default: &Option<Value>) -> bool {
    matches!(default, Some(value) if !matches!(value, Value::Null))
}

/// Whether a variable declared as `var_type` may flow into a location
/// expecting `expected`. A nullable variable can feed a non-null location
/// only when a non-null default covers the unbound case.
fn variable_type_compatible(has_non_null_default: bool, var_type: &Type, expected: &Type) -> bool {
    match (var_type, expected) {
        (Type::NonNullType(v), Type::NonNullType(e)) => variable_type_compatible(false, v, e),
        (_, Type::NonNullType(e)) => {
            has_non_null_default && variable_type_compatible(false, var_type, e)
        }
        (Type::NonNullType(v), _) => variable_type_compatible(false, v, expected),
        (Type::ListType(v), Type::ListType(e)) => variable_type_compatible(false, v, e),
        (Type::NamedType(v), Type::NamedType(e)) => v == e,
        _ => false,
    }
}
