use std::collections::{HashMap, HashSet};

use tracing::instrument;

use crate::ast::query::{
    Definition, Document, FragmentDefinition, Selection, SelectionSet, TypeCondition,
};
use crate::ast::OperationDefinitionExt;
use crate::schema::Schema;
use crate::schema::index::SchemaIndex;

use super::operation_validator::OperationValidator;
use super::selection_set_validator::SelectionSetValidator;
use super::validation_error::ValidationError;

/// Validates an executable document against a schema.
///
/// Carries no per-document state, so a single validator can check any number
/// of documents and repeated runs over the same document produce identical
/// results.
pub struct DocumentValidator<'s> {
    schema: &'s Schema,
    index: SchemaIndex<'s>,
}

impl<'s> DocumentValidator<'s> {
    pub fn new(schema: &'s Schema) -> Self {
        DocumentValidator {
            schema,
            index: SchemaIndex::build(schema),
        }
    }

    /// Walks the document and returns every violation found, in document
    /// order. An empty result means the document is safe to execute.
    #[instrument(name = "DocumentValidator::validate", skip_all)]
    pub fn validate(&self, document: &Document) -> Vec<ValidationError> {
        let mut errors = vec![];

        // First occurrence wins; later definitions with the same name are
        // reported but not visited.
        let mut fragments: HashMap<&str, &FragmentDefinition> = HashMap::new();
        for definition in &document.definitions {
            if let Definition::Fragment(fragment) = definition {
                if fragments.contains_key(fragment.name.as_str()) {
                    errors.push(ValidationError::DuplicateFragmentName(
                        fragment.name.clone(),
                        fragment.position,
                    ));
                } else {
                    fragments.insert(&fragment.name, fragment);
                }
            }
        }

        let operations: Vec<_> = document
            .definitions
            .iter()
            .filter_map(|definition| match definition {
                Definition::Operation(operation) => Some(operation),
                Definition::Fragment(_) => None,
            })
            .collect();

        let mut seen_operation_names = HashSet::new();
        for operation in &operations {
            match operation.name() {
                Some(name) => {
                    if !seen_operation_names.insert(name) {
                        errors.push(ValidationError::DuplicateOperationName(
                            name.to_string(),
                            operation.position(),
                        ));
                    }
                }
                None if operations.len() > 1 => {
                    errors.push(ValidationError::AnonymousOperationNotAlone(
                        operation.position(),
                    ));
                }
                None => {}
            }
        }

        self.detect_fragment_cycles(document, &fragments, &mut errors);

        let mut referenced_fragments = HashSet::new();
        for definition in &document.definitions {
            match definition {
                Definition::Operation(operation) => {
                    OperationValidator::new(self.schema, &self.index, &fragments).validate(
                        operation,
                        &mut errors,
                        &mut referenced_fragments,
                    );
                }
                Definition::Fragment(fragment) => {
                    // Duplicates were reported above; only the surviving
                    // definition is visited.
                    if fragments
                        .get(fragment.name.as_str())
                        .is_some_and(|f| std::ptr::eq(*f, fragment))
                    {
                        self.validate_fragment_definition(
                            fragment,
                            &fragments,
                            &mut errors,
                            &mut referenced_fragments,
                        );
                    }
                }
            }
        }

        for definition in &document.definitions {
            if let Definition::Fragment(fragment) = definition
                && fragments
                    .get(fragment.name.as_str())
                    .is_some_and(|f| std::ptr::eq(*f, fragment))
                && !referenced_fragments.contains(fragment.name.as_str())
            {
                errors.push(ValidationError::UnusedFragment(
                    fragment.name.clone(),
                    fragment.position,
                ));
            }
        }

        errors
    }

    fn validate_fragment_definition<'d>(
        &self,
        fragment: &'d FragmentDefinition,
        fragments: &HashMap<&'d str, &'d FragmentDefinition>,
        errors: &mut Vec<ValidationError>,
        referenced_fragments: &mut HashSet<String>,
    ) {
        let TypeCondition::On(condition) = &fragment.type_condition;

        let mut validator = SelectionSetValidator::new(
            self.schema,
            &self.index,
            fragments,
            None,
            errors,
            referenced_fragments,
        );
        validator.validate_directives(
            &fragment.directives,
            crate::ast::schema::DirectiveLocation::FragmentDefinition,
        );

        if self.schema.get_type_definition(condition).is_none() {
            errors.push(ValidationError::UnknownType(
                condition.clone(),
                fragment.position,
            ));
            return;
        }
        if !self.index.is_composite(condition) {
            errors.push(ValidationError::FragmentOnNonCompositeType(
                condition.clone(),
                fragment.position,
            ));
            return;
        }

        let mut validator = SelectionSetValidator::new(
            self.schema,
            &self.index,
            fragments,
            None,
            errors,
            referenced_fragments,
        );
        validator.validate(&fragment.selection_set, condition);
    }

    /// A dedicated pass over the fragment spread graph so that each cycle is
    /// reported once, at the spread that closes it. Regular traversal cuts
    /// spreads to active fragments silently.
    fn detect_fragment_cycles<'d>(
        &self,
        document: &'d Document,
        fragments: &HashMap<&'d str, &'d FragmentDefinition>,
        errors: &mut Vec<ValidationError>,
    ) {
        let mut visited = HashSet::new();
        let mut stack = vec![];

        for definition in &document.definitions {
            if let Definition::Fragment(fragment) = definition
                && fragments
                    .get(fragment.name.as_str())
                    .is_some_and(|f| std::ptr::eq(*f, fragment))
                && !visited.contains(fragment.name.as_str())
            {
                Self::visit_for_cycles(fragment, fragments, &mut visited, &mut stack, errors);
            }
        }
    }

    fn visit_for_cycles<'d>(
        fragment: &'d FragmentDefinition,
        fragments: &HashMap<&'d str, &'d FragmentDefinition>,
        visited: &mut HashSet<&'d str>,
        stack: &mut Vec<&'d str>,
        errors: &mut Vec<ValidationError>,
    ) {
        visited.insert(&fragment.name);
        stack.push(&fragment.name);

        let mut spreads = vec![];
        collect_spreads(&fragment.selection_set, &mut spreads);

        for (name, pos) in spreads {
            if stack.contains(&name) {
                errors.push(ValidationError::CyclicFragmentSpread(name.to_string(), pos));
            } else if !visited.contains(name)
                && let Some(target) = fragments.get(name)
            {
                Self::visit_for_cycles(target, fragments, visited, stack, errors);
            }
        }

        stack.pop();
    }
}

fn collect_spreads<'d>(
    selection_set: &'d SelectionSet,
    out: &mut Vec<(&'d str, crate::ast::Pos)>,
) {
    for item in &selection_set.items {
        match item {
            Selection::Field(field) => collect_spreads(&field.selection_set, out),
            Selection::FragmentSpread(spread) => {
                out.push((&spread.fragment_name, spread.position));
            }
            Selection::InlineFragment(inline) => collect_spreads(&inline.selection_set, out),
        }
    }
}
