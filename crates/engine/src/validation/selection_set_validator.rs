use std::collections::{HashMap, HashSet};

use crate::ast::query::{
    Directive, Field, FragmentDefinition, FragmentSpread, InlineFragment, Selection,
    SelectionSet, TypeCondition,
};
use crate::ast::schema::DirectiveLocation;
use crate::ast::TypeDefinitionExt;
use crate::schema::index::{SchemaIndex, TypeKind};
use crate::schema::{Schema, underlying_type};

use super::operation_validator::OperationContext;
use super::validation_error::ValidationError;

/// Walks one selection tree, accumulating errors. Created per operation or
/// fragment definition; fragment spreads are expanded in place with the
/// scoped type switched to the fragment's condition.
pub(super) struct SelectionSetValidator<'a, 'd> {
    pub(super) schema: &'a Schema,
    pub(super) index: &'a SchemaIndex<'a>,
    fragments: &'a HashMap<&'d str, &'d FragmentDefinition>,
    pub(super) operation: Option<&'a mut OperationContext<'d>>,
    pub(super) errors: &'a mut Vec<ValidationError>,
    referenced_fragments: &'a mut HashSet<String>,
    active_fragments: Vec<&'d str>,
}

/// Response keys already claimed in one selection scope, with enough of each
/// field's identity to decide whether a later occurrence can merge with it.
#[derive(Default)]
struct FieldScope {
    signatures: HashMap<String, FieldSignature>,
}

struct FieldSignature {
    return_type: String,
    /// Set when the scoped type is a concrete object type. Two fields
    /// scoped to different concrete types can never apply to the same value,
    /// so they only need matching return types to coexist.
    object_scope: Option<String>,
    field_name: String,
    arguments: Vec<(String, String)>,
}

impl FieldSignature {
    fn can_merge_with(&self, other: &FieldSignature) -> bool {
        if self.return_type != other.return_type {
            return false;
        }
        match (&self.object_scope, &other.object_scope) {
            (Some(a), Some(b)) if a != b => true,
            _ => self.field_name == other.field_name && self.arguments == other.arguments,
        }
    }
}

impl<'a, 'd> SelectionSetValidator<'a, 'd> {
    pub fn new(
        schema: &'a Schema,
        index: &'a SchemaIndex<'a>,
        fragments: &'a HashMap<&'d str, &'d FragmentDefinition>,
        operation: Option<&'a mut OperationContext<'d>>,
        errors: &'a mut Vec<ValidationError>,
        referenced_fragments: &'a mut HashSet<String>,
    ) -> Self {
        SelectionSetValidator {
            schema,
            index,
            fragments,
            operation,
            errors,
            referenced_fragments,
            active_fragments: vec![],
        }
    }

    /// Returns the number of fields selected at the top level of the set,
    /// counting through fragment expansion. Subscriptions use the count to
    /// enforce their single-root-field rule.
    pub fn validate(&mut self, selection_set: &'d SelectionSet, scoped_type: &str) -> usize {
        let mut scope = FieldScope::default();
        self.validate_selection_set(selection_set, scoped_type, &mut scope)
    }

    fn validate_selection_set(
        &mut self,
        selection_set: &'d SelectionSet,
        scoped_type: &str,
        scope: &mut FieldScope,
    ) -> usize {
        let mut field_count = 0;
        for item in &selection_set.items {
            match item {
                Selection::Field(field) => {
                    self.validate_field(field, scoped_type, scope);
                    field_count += 1;
                }
                Selection::FragmentSpread(spread) => {
                    field_count += self.validate_fragment_spread(spread, scoped_type, scope);
                }
                Selection::InlineFragment(inline) => {
                    field_count += self.validate_inline_fragment(inline, scoped_type, scope);
                }
            }
        }
        field_count
    }

    fn validate_field(&mut self, field: &'d Field, scoped_type: &str, scope: &mut FieldScope) {
        self.validate_directives(&field.directives, DirectiveLocation::Field);

        let Some(field_definition) = self.lookup_field(scoped_type, &field.name) else {
            self.errors.push(ValidationError::InvalidField(
                field.name.clone(),
                scoped_type.to_string(),
                field.position,
            ));
            // No definition to check against, so every provided argument is
            // unknown. The sub-selection is not descended into.
            for (name, _) in &field.arguments {
                self.errors.push(ValidationError::UnknownArgument(
                    name.clone(),
                    field.name.clone(),
                    field.position,
                ));
            }
            return;
        };

        self.validate_arguments(
            &field.arguments,
            &field_definition.arguments,
            field.position,
            &field.name,
        );

        let response_key = field.alias.as_deref().unwrap_or(&field.name);
        let mut arguments: Vec<(String, String)> = field
            .arguments
            .iter()
            .map(|(name, value)| (name.clone(), value.to_string()))
            .collect();
        arguments.sort();
        let signature = FieldSignature {
            return_type: field_definition.field_type.to_string(),
            object_scope: (self.index.kind(scoped_type) == Some(TypeKind::Object))
                .then(|| scoped_type.to_string()),
            field_name: field.name.clone(),
            arguments,
        };
        match scope.signatures.get(response_key) {
            Some(existing) if !existing.can_merge_with(&signature) => {
                self.errors.push(ValidationError::ConflictingFields(
                    response_key.to_string(),
                    field.position,
                ));
            }
            Some(_) => {}
            None => {
                scope.signatures.insert(response_key.to_string(), signature);
            }
        }

        let return_type_name = underlying_type(&field_definition.field_type);
        match self.index.kind(return_type_name) {
            None => {
                self.errors.push(ValidationError::UnknownType(
                    return_type_name.clone(),
                    field.position,
                ));
            }
            Some(TypeKind::Scalar | TypeKind::Enum | TypeKind::InputObject) => {
                if !field.selection_set.items.is_empty() {
                    self.errors.push(ValidationError::LeafWithSubSelection(
                        field.name.clone(),
                        field.position,
                    ));
                }
            }
            Some(_) => {
                let mut sub_scope = FieldScope::default();
                let sub_field_count =
                    self.validate_selection_set(&field.selection_set, return_type_name, &mut sub_scope);
                // counted after expansion, so a sub-selection whose fragments
                // all fail to apply is as empty as no sub-selection at all
                if sub_field_count == 0 {
                    self.errors.push(ValidationError::MissingSubSelection(
                        field.name.clone(),
                        return_type_name.clone(),
                        field.position,
                    ));
                }
            }
        }
    }

    fn validate_fragment_spread(
        &mut self,
        spread: &'d FragmentSpread,
        scoped_type: &str,
        scope: &mut FieldScope,
    ) -> usize {
        self.validate_directives(&spread.directives, DirectiveLocation::FragmentSpread);

        let Some(fragment) = self.fragments.get(spread.fragment_name.as_str()).copied() else {
            self.errors.push(ValidationError::FragmentDefinitionNotFound(
                spread.fragment_name.clone(),
                spread.position,
            ));
            return 0;
        };

        self.referenced_fragments.insert(fragment.name.clone());

        if self.active_fragments.contains(&fragment.name.as_str()) {
            // cycle; reported once by the dedicated cycle pass
            return 0;
        }

        let TypeCondition::On(condition) = &fragment.type_condition;
        if !self.index.is_composite(condition) {
            // unknown or non-composite condition, reported at the definition
            return 0;
        }
        if !self.index.fragment_condition_possible(scoped_type, condition) {
            self.errors.push(ValidationError::ImpossibleFragmentSpread(
                condition.clone(),
                scoped_type.to_string(),
                spread.position,
            ));
            return 0;
        }

        self.active_fragments.push(&fragment.name);
        let field_count = self.validate_selection_set(&fragment.selection_set, condition, scope);
        self.active_fragments.pop();
        field_count
    }

    fn validate_inline_fragment(
        &mut self,
        inline: &'d InlineFragment,
        scoped_type: &str,
        scope: &mut FieldScope,
    ) -> usize {
        self.validate_directives(&inline.directives, DirectiveLocation::InlineFragment);

        let condition = match &inline.type_condition {
            Some(TypeCondition::On(name)) => {
                if self.schema.get_type_definition(name).is_none() {
                    self.errors
                        .push(ValidationError::UnknownType(name.clone(), inline.position));
                    return 0;
                }
                if !self.index.is_composite(name) {
                    self.errors.push(ValidationError::FragmentOnNonCompositeType(
                        name.clone(),
                        inline.position,
                    ));
                    return 0;
                }
                if !self.index.fragment_condition_possible(scoped_type, name) {
                    self.errors.push(ValidationError::ImpossibleFragmentSpread(
                        name.clone(),
                        scoped_type.to_string(),
                        inline.position,
                    ));
                    return 0;
                }
                name.as_str()
            }
            None => scoped_type,
        };

        self.validate_selection_set(&inline.selection_set, condition, scope)
    }

    pub(super) fn validate_directives(
        &mut self,
        directives: &'d [Directive],
        location: DirectiveLocation,
    ) {
        let mut seen = HashSet::new();
        for directive in directives {
            if !seen.insert(directive.name.as_str()) {
                self.errors.push(ValidationError::DuplicateDirective(
                    directive.name.clone(),
                    directive.position,
                ));
            }
            let Some(definition) = self.index.directive(&directive.name) else {
                self.errors.push(ValidationError::UnknownDirective(
                    directive.name.clone(),
                    directive.position,
                ));
                continue;
            };
            if !definition.locations.contains(&location) {
                self.errors.push(ValidationError::MisplacedDirective(
                    directive.name.clone(),
                    directive.position,
                ));
            }
            self.validate_arguments(
                &directive.arguments,
                &definition.arguments,
                directive.position,
                &format!("@{}", directive.name),
            );
        }
    }

    fn lookup_field(&self, scoped_type: &str, name: &str) -> Option<&'a crate::ast::schema::Field> {
        if name == "__typename" {
            return Some(&self.schema.typename_field_definition);
        }
        if Some(scoped_type) == self.schema.query_type_name() {
            if name == "__schema" {
                return Some(&self.schema.schema_field_definition);
            }
            if name == "__type" {
                return Some(&self.schema.type_field_definition);
            }
        }
        self.schema
            .get_type_definition(scoped_type)?
            .field_by_name(name)
    }
}
