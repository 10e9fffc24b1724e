use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_recursion::async_recursion;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use common::value::Val;
use futures::future::{BoxFuture, join_all};
use indexmap::IndexMap;

use crate::ast::query::{
    Directive, Field, FragmentDefinition, Selection, SelectionSet, Type, TypeCondition, Value,
};
use crate::ast::schema::{Field as FieldDefinition, InputValue, TypeDefinition};
use crate::ast::{Pos, TypeDefinitionExt, value_tag};
use crate::schema::{Schema, underlying_type};

use super::error::{ExecutionError, FieldError, PathSegment};
use super::resolver::{ObjectResolver, ResolvedValue, ResolverParams};
use super::variables::Variables;

pub(crate) struct Completed<T> {
    pub value: T,
    pub errors: Vec<ExecutionError>,
}

impl<T> Completed<T> {
    fn new(value: T) -> Self {
        Completed {
            value,
            errors: vec![],
        }
    }
}

/// Drives one operation to completion: collects fields per selection scope,
/// invokes resolvers, and completes their results against the schema types.
///
/// Sibling fields resolve concurrently, but results are folded in document
/// order, so the response shape and error list are deterministic regardless
/// of completion order.
pub(crate) struct Executor<'d> {
    schema: &'d Schema,
    fragments: HashMap<&'d str, &'d FragmentDefinition>,
    variables: Variables<'d>,
    request_id: u64,
    // Serializes resolver prologues: argument materialization and the
    // creation of each resolver future happen one field at a time. Only the
    // awaits overlap.
    prologue_lock: Mutex<()>,
}

impl<'d> Executor<'d> {
    pub fn new(
        schema: &'d Schema,
        fragments: HashMap<&'d str, &'d FragmentDefinition>,
        variables: Variables<'d>,
        request_id: u64,
    ) -> Self {
        Executor {
            schema,
            fragments,
            variables,
            request_id,
            prologue_lock: Mutex::new(()),
        }
    }

    pub async fn resolve_operation(
        &self,
        root: &Arc<dyn ObjectResolver>,
        selection_set: &'d SelectionSet,
    ) -> (Val, Vec<ExecutionError>) {
        match self.resolve_selection_sets(root, &[selection_set], &[]).await {
            Ok(completed) => (Val::Map(completed.value), completed.errors),
            Err(errors) => (Val::Null, errors),
        }
    }

    #[async_recursion]
    async fn resolve_selection_sets(
        &self,
        object: &Arc<dyn ObjectResolver>,
        selection_sets: &[&'d SelectionSet],
        path: &[PathSegment],
    ) -> Result<Completed<IndexMap<String, Val>>, Vec<ExecutionError>> {
        let type_names = object.type_names();
        let concrete_type = type_names.first().copied().unwrap_or("");

        let mut collected: IndexMap<&'d str, Vec<&'d Field>> = IndexMap::new();
        if let Err(error) = self.collect_fields(&type_names, selection_sets, &mut collected) {
            let pos = selection_sets.first().map(|s| s.span.0).unwrap_or_default();
            return Err(vec![ExecutionError::new(error.to_string(), pos, path.to_vec())]);
        }

        object.begin_selection_set().await;

        let mut keys: Vec<(String, &'d Type)> = Vec::with_capacity(collected.len());
        let mut futures: Vec<BoxFuture<'_, Result<Completed<Val>, Vec<ExecutionError>>>> =
            Vec::with_capacity(collected.len());

        for (response_key, fields) in &collected {
            let field = fields[0];
            let mut field_path = path.to_vec();
            field_path.push(PathSegment::Field(response_key.to_string()));

            let schema = self.schema;
            if field.name == "__typename" {
                let value = Val::String(concrete_type.to_string());
                keys.push((
                    response_key.to_string(),
                    &schema.typename_field_definition.field_type,
                ));
                futures.push(Box::pin(async move { Ok(Completed::new(value)) }));
                continue;
            }

            let Some(field_definition) = self.lookup_field(concrete_type, &field.name) else {
                object.end_selection_set().await;
                return Err(vec![ExecutionError::new(
                    FieldError::UnknownField(field.name.clone(), concrete_type.to_string())
                        .to_string(),
                    field.position,
                    field_path,
                )]);
            };

            let sub_sets: Vec<&'d SelectionSet> = fields
                .iter()
                .map(|f| &f.selection_set)
                .filter(|s| !s.items.is_empty())
                .collect();

            keys.push((response_key.to_string(), &field_definition.field_type));

            let object = Arc::clone(object);
            let pos = field.position;
            futures.push(Box::pin(async move {
                let resolver_future = {
                    let _guard = self
                        .prologue_lock
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner);
                    self.materialize_arguments(&field.arguments, &field_definition.arguments)
                        .map(|arguments| {
                            object.resolve_field(
                                &field.name,
                                ResolverParams {
                                    request_id: self.request_id,
                                    arguments,
                                    selection_sets: &sub_sets,
                                    fragments: &self.fragments,
                                    variables: &self.variables,
                                },
                            )
                        })
                };

                let resolved = match resolver_future {
                    Ok(future) => future.await,
                    Err(error) => Err(error),
                };

                match resolved {
                    Ok(value) => {
                        self.complete_value(
                            &field_definition.field_type,
                            value,
                            &sub_sets,
                            &field_path,
                            pos,
                        )
                        .await
                    }
                    Err(error) => Err(vec![ExecutionError::new(
                        error.to_string(),
                        pos,
                        field_path,
                    )]),
                }
            }));
        }

        let outcomes = join_all(futures).await;
        object.end_selection_set().await;

        let mut map = IndexMap::with_capacity(outcomes.len());
        let mut errors = vec![];
        let mut non_null_failed = false;
        for ((response_key, field_type), outcome) in keys.into_iter().zip(outcomes) {
            match outcome {
                Ok(completed) => {
                    map.insert(response_key, completed.value);
                    errors.extend(completed.errors);
                }
                Err(field_errors) => {
                    errors.extend(field_errors);
                    // a failed non-null field poisons the whole object, but
                    // the remaining siblings' errors are still reported
                    if matches!(field_type, Type::NonNullType(_)) {
                        non_null_failed = true;
                    } else {
                        map.insert(response_key, Val::Null);
                    }
                }
            }
        }
        if non_null_failed {
            return Err(errors);
        }

        Ok(Completed { value: map, errors })
    }

    /// Completes one resolved value against its declared type, peeling one
    /// modifier per step. List elements complete concurrently and are folded
    /// back in index order.
    #[async_recursion]
    async fn complete_value(
        &self,
        ty: &'d Type,
        resolved: ResolvedValue,
        selection_sets: &[&'d SelectionSet],
        path: &[PathSegment],
        pos: Pos,
    ) -> Result<Completed<Val>, Vec<ExecutionError>> {
        match ty {
            Type::NonNullType(inner) => {
                let completed = self
                    .complete_value(inner.as_ref(), resolved, selection_sets, path, pos)
                    .await?;
                if matches!(completed.value, Val::Null) {
                    let mut errors = completed.errors;
                    errors.push(ExecutionError::new(
                        format!("Non-null value of type '{ty}' resolved to null"),
                        pos,
                        path.to_vec(),
                    ));
                    Err(errors)
                } else {
                    Ok(completed)
                }
            }
            Type::ListType(inner) => {
                let inner = inner.as_ref();
                match resolved {
                    ResolvedValue::Null => Ok(Completed::new(Val::Null)),
                    ResolvedValue::Value(value) => Ok(Completed::new(value)),
                    ResolvedValue::List(elements) => {
                        let element_futures: Vec<_> = elements
                            .into_iter()
                            .enumerate()
                            .map(|(index, element)| {
                                let mut element_path = path.to_vec();
                                element_path.push(PathSegment::Index(index));
                                async move {
                                    self.complete_value(
                                        inner,
                                        element,
                                        selection_sets,
                                        &element_path,
                                        pos,
                                    )
                                    .await
                                }
                            })
                            .collect();
                        let outcomes = join_all(element_futures).await;

                        let mut values = Vec::with_capacity(outcomes.len());
                        let mut errors = vec![];
                        for outcome in outcomes {
                            match outcome {
                                Ok(completed) => {
                                    values.push(completed.value);
                                    errors.extend(completed.errors);
                                }
                                Err(element_errors) => {
                                    errors.extend(element_errors);
                                    if matches!(inner, Type::NonNullType(_)) {
                                        return Err(errors);
                                    }
                                    values.push(Val::Null);
                                }
                            }
                        }
                        Ok(Completed {
                            value: Val::List(values),
                            errors,
                        })
                    }
                    ResolvedValue::Object(_) => Err(vec![ExecutionError::new(
                        FieldError::IncompatibleShape(ty.to_string()).to_string(),
                        pos,
                        path.to_vec(),
                    )]),
                }
            }
            Type::NamedType(name) => match resolved {
                ResolvedValue::Null => Ok(Completed::new(Val::Null)),
                ResolvedValue::Value(value) => Ok(Completed::new(value)),
                ResolvedValue::Object(object) => {
                    if selection_sets.is_empty() {
                        return Err(vec![ExecutionError::new(
                            FieldError::IncompatibleShape(name.clone()).to_string(),
                            pos,
                            path.to_vec(),
                        )]);
                    }
                    let completed = self
                        .resolve_selection_sets(&object, selection_sets, path)
                        .await?;
                    Ok(Completed {
                        value: Val::Map(completed.value),
                        errors: completed.errors,
                    })
                }
                ResolvedValue::List(_) => Err(vec![ExecutionError::new(
                    FieldError::IncompatibleShape(name.clone()).to_string(),
                    pos,
                    path.to_vec(),
                )]),
            },
        }
    }

    /// Groups selections by response key in first-occurrence order, expanding
    /// fragments whose condition matches one of the object's type names and
    /// dropping nodes excluded by `@skip`/`@include`.
    fn collect_fields(
        &self,
        type_names: &[&str],
        selection_sets: &[&'d SelectionSet],
        out: &mut IndexMap<&'d str, Vec<&'d Field>>,
    ) -> Result<(), FieldError> {
        for selection_set in selection_sets {
            for item in &selection_set.items {
                match item {
                    Selection::Field(field) => {
                        if self.include_node(&field.directives)? {
                            let key = field.alias.as_deref().unwrap_or(&field.name);
                            out.entry(key).or_default().push(field);
                        }
                    }
                    Selection::FragmentSpread(spread) => {
                        if self.include_node(&spread.directives)?
                            && let Some(fragment) =
                                self.fragments.get(spread.fragment_name.as_str())
                        {
                            let TypeCondition::On(condition) = &fragment.type_condition;
                            if type_names.contains(&condition.as_str()) {
                                self.collect_fields(
                                    type_names,
                                    &[&fragment.selection_set],
                                    out,
                                )?;
                            }
                        }
                    }
                    Selection::InlineFragment(inline) => {
                        if self.include_node(&inline.directives)? {
                            let applies = match &inline.type_condition {
                                Some(TypeCondition::On(condition)) => {
                                    type_names.contains(&condition.as_str())
                                }
                                None => true,
                            };
                            if applies {
                                self.collect_fields(type_names, &[&inline.selection_set], out)?;
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn include_node(&self, directives: &[Directive]) -> Result<bool, FieldError> {
        // @skip wins when both directives are present
        if let Some(skip) = directives.iter().find(|d| d.name == "skip")
            && self.directive_condition(skip)?
        {
            return Ok(false);
        }
        if let Some(include) = directives.iter().find(|d| d.name == "include")
            && !self.directive_condition(include)?
        {
            return Ok(false);
        }
        Ok(true)
    }

    fn directive_condition(&self, directive: &Directive) -> Result<bool, FieldError> {
        let condition = directive
            .arguments
            .iter()
            .find(|(name, _)| name == "if")
            .map(|(_, value)| value);
        match condition {
            Some(Value::Boolean(b)) => Ok(*b),
            Some(Value::Variable(name)) => match self.variables.resolve(name)? {
                Val::Bool(b) => Ok(b),
                other => Err(FieldError::MalformedArgument(
                    "if".to_string(),
                    format!("expected Boolean, got {}", other.type_name()),
                )),
            },
            Some(other) => Err(FieldError::MalformedArgument(
                "if".to_string(),
                format!("expected Boolean, got {}", value_tag(other)),
            )),
            None => Err(FieldError::MalformedArgument(
                "if".to_string(),
                "no condition provided".to_string(),
            )),
        }
    }

    fn lookup_field(&self, type_name: &str, field_name: &str) -> Option<&'d FieldDefinition> {
        let schema = self.schema;
        if field_name == "__typename" {
            return Some(&schema.typename_field_definition);
        }
        if Some(type_name) == schema.query_type_name() {
            if field_name == "__schema" {
                return Some(&schema.schema_field_definition);
            }
            if field_name == "__type" {
                return Some(&schema.type_field_definition);
            }
        }
        schema
            .get_type_definition(type_name)?
            .field_by_name(field_name)
    }

    /// Builds the argument map a resolver sees: defaults applied, variables
    /// substituted, literals coerced to [`Val`]. Absent nullable arguments
    /// stay absent rather than becoming explicit nulls.
    fn materialize_arguments(
        &self,
        provided: &'d [(String, Value)],
        definitions: &[InputValue],
    ) -> Result<IndexMap<String, Val>, FieldError> {
        let mut arguments = IndexMap::new();
        for definition in definitions {
            let supplied = provided
                .iter()
                .find(|(name, _)| name == &definition.name)
                .map(|(_, value)| value);
            let value = match supplied {
                Some(value) => Some(self.resolve_literal(value, Some(&definition.value_type))?),
                None => definition
                    .default_value
                    .as_ref()
                    .map(|default| self.resolve_literal(default, Some(&definition.value_type)))
                    .transpose()?,
            };
            if let Some(value) = value {
                arguments.insert(definition.name.clone(), value);
            }
        }
        Ok(arguments)
    }

    fn resolve_literal(&self, value: &Value, expected: Option<&Type>) -> Result<Val, FieldError> {
        let type_name = expected.map(|ty| underlying_type(ty).as_str());
        Ok(match value {
            Value::Variable(name) => {
                let resolved = self.variables.resolve(name)?;
                self.coerce_variable_value(resolved, type_name)?
            }
            Value::Int(n) => match n.as_i64().and_then(|i| i32::try_from(i).ok()) {
                Some(i) => Val::Int(i),
                None => {
                    return Err(FieldError::new("Int literal out of 32-bit range"));
                }
            },
            Value::Float(f) => Val::Float(*f),
            Value::String(s) => {
                if type_name == Some("ID") {
                    Val::Id(Bytes::from(decode_id(s)?))
                } else {
                    Val::String(s.clone())
                }
            }
            Value::Boolean(b) => Val::Bool(*b),
            Value::Null => Val::Null,
            Value::Enum(e) => Val::Enum(e.clone()),
            Value::List(items) => {
                let element_type = expected.and_then(list_element_type);
                Val::List(
                    items
                        .iter()
                        .map(|item| self.resolve_literal(item, element_type))
                        .collect::<Result<_, _>>()?,
                )
            }
            Value::Object(map) => {
                let definition = type_name.and_then(|name| self.schema.get_type_definition(name));
                Val::Map(
                    map.iter()
                        .map(|(key, field_value)| {
                            let field_type = definition
                                .and_then(|d| d.input_field_by_name(key))
                                .map(|f| &f.value_type);
                            Ok((key.clone(), self.resolve_literal(field_value, field_type)?))
                        })
                        .collect::<Result<_, FieldError>>()?,
                )
            }
        })
    }

    /// Variable bindings arrive as plain JSON-shaped values; strings bound to
    /// ID and enum positions are re-tagged here.
    fn coerce_variable_value(
        &self,
        value: Val,
        type_name: Option<&str>,
    ) -> Result<Val, FieldError> {
        match (value, type_name) {
            (Val::String(s), Some("ID")) => Ok(Val::Id(Bytes::from(decode_id(&s)?))),
            (Val::String(s), Some(name)) => {
                if let Some(TypeDefinition::Enum(_)) = self.schema.get_type_definition(name) {
                    Ok(Val::Enum(s))
                } else {
                    Ok(Val::String(s))
                }
            }
            (value, _) => Ok(value),
        }
    }
}

fn decode_id(encoded: &str) -> Result<Vec<u8>, FieldError> {
    BASE64
        .decode(encoded)
        .map_err(|e| FieldError::new(format!("ID value is not valid Base64: {e}")))
}

fn list_element_type(ty: &Type) -> Option<&Type> {
    match ty {
        Type::NonNullType(inner) => list_element_type(inner),
        Type::ListType(inner) => Some(inner),
        Type::NamedType(_) => None,
    }
}
