use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use crate::ast::query::{FragmentDefinition, OperationDefinition, Type, VariableDefinition};
use crate::ast::schema::DirectiveLocation;
use crate::ast::{OperationDefinitionExt, OperationKind};
use crate::schema::index::SchemaIndex;
use crate::schema::{Schema, underlying_type};

use super::selection_set_validator::SelectionSetValidator;
use super::validation_error::ValidationError;

/// Per-operation validation state: the declared variables with their usage
/// tracking. Built fresh for every operation so runs stay independent.
pub(super) struct OperationContext<'d> {
    variables: IndexMap<&'d str, VariableState<'d>>,
}

pub(super) struct VariableState<'d> {
    pub definition: &'d VariableDefinition,
    pub has_non_null_default: bool,
    pub referenced: bool,
}

impl<'d> OperationContext<'d> {
    pub fn variable_mut(&mut self, name: &str) -> Option<&mut VariableState<'d>> {
        self.variables.get_mut(name)
    }
}

pub(super) struct OperationValidator<'a, 'd> {
    schema: &'a Schema,
    index: &'a SchemaIndex<'a>,
    fragments: &'a HashMap<&'d str, &'d FragmentDefinition>,
}

impl<'a, 'd> OperationValidator<'a, 'd> {
    pub fn new(
        schema: &'a Schema,
        index: &'a SchemaIndex<'a>,
        fragments: &'a HashMap<&'d str, &'d FragmentDefinition>,
    ) -> Self {
        OperationValidator {
            schema,
            index,
            fragments,
        }
    }

    pub fn validate(
        &self,
        operation: &'d OperationDefinition,
        errors: &mut Vec<ValidationError>,
        referenced_fragments: &mut HashSet<String>,
    ) {
        let kind = operation.kind();

        let mut context = OperationContext {
            variables: IndexMap::new(),
        };
        for definition in operation.variable_definitions() {
            self.validate_variable_definition(definition, &mut context, errors, referenced_fragments);
        }

        let location = match kind {
            OperationKind::Query => DirectiveLocation::Query,
            OperationKind::Mutation => DirectiveLocation::Mutation,
            OperationKind::Subscription => DirectiveLocation::Subscription,
        };
        {
            let mut validator = SelectionSetValidator::new(
                self.schema,
                self.index,
                self.fragments,
                Some(&mut context),
                errors,
                referenced_fragments,
            );
            validator.validate_directives(operation.directives(), location);
        }

        let root_type_name = match kind {
            OperationKind::Query => self.schema.query_type_name(),
            OperationKind::Mutation => self.schema.mutation_type_name(),
            OperationKind::Subscription => self.schema.subscription_type_name(),
        };
        let Some(root_type_name) = root_type_name else {
            errors.push(ValidationError::OperationRootNotDefined(
                kind.name(),
                operation.position(),
            ));
            return;
        };

        let root_field_count = {
            let mut validator = SelectionSetValidator::new(
                self.schema,
                self.index,
                self.fragments,
                Some(&mut context),
                errors,
                referenced_fragments,
            );
            validator.validate(operation.selection_set(), root_type_name)
        };

        if kind == OperationKind::Subscription && root_field_count > 1 {
            errors.push(ValidationError::SubscriptionWithMultipleRootFields(
                operation.position(),
            ));
        }

        for state in context.variables.values() {
            if !state.referenced {
                errors.push(ValidationError::UnusedVariable(
                    state.definition.name.clone(),
                    state.definition.position,
                ));
            }
        }
    }

    fn validate_variable_definition(
        &self,
        definition: &'d VariableDefinition,
        context: &mut OperationContext<'d>,
        errors: &mut Vec<ValidationError>,
        referenced_fragments: &mut HashSet<String>,
    ) {
        if context.variables.contains_key(definition.name.as_str()) {
            errors.push(ValidationError::DuplicateVariable(
                definition.name.clone(),
                definition.position,
            ));
            return;
        }

        let declared_type_valid = self.validate_declared_type(&definition.var_type, definition, errors);

        let has_non_null_default = matches!(
            &definition.default_value,
            Some(value) if !matches!(value, crate::ast::query::Value::Null)
        );

        // Default literals are checked against the declared type. Variable
        // references are not allowed inside them, so no operation context is
        // threaded through.
        if declared_type_valid && let Some(default) = &definition.default_value {
            let mut validator = SelectionSetValidator::new(
                self.schema,
                self.index,
                self.fragments,
                None,
                errors,
                referenced_fragments,
            );
            validator.validate_input_value(
                has_non_null_default,
                default,
                &definition.var_type,
                definition.position,
            );
        }

        context.variables.insert(
            &definition.name,
            VariableState {
                definition,
                has_non_null_default,
                referenced: false,
            },
        );
    }

    fn validate_declared_type(
        &self,
        declared: &Type,
        definition: &VariableDefinition,
        errors: &mut Vec<ValidationError>,
    ) -> bool {
        let name = underlying_type(declared);
        if self.schema.get_type_definition(name).is_none() {
            errors.push(ValidationError::UnknownType(
                name.clone(),
                definition.position,
            ));
            return false;
        }
        if !self.index.is_input_type(name) {
            errors.push(ValidationError::NotInputType(
                name.clone(),
                definition.position,
            ));
            return false;
        }
        true
    }
}
