//! A pre-computed lookup structure over a schema, built once per validation
//! run.

use std::collections::{HashMap, HashSet};

use crate::ast::schema::{DirectiveDefinition, TypeDefinition};

use super::Schema;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TypeKind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
}

pub(crate) struct SchemaIndex<'s> {
    type_kinds: HashMap<&'s str, TypeKind>,
    /// For each composite type, the set of concrete object types it can
    /// resolve to. Objects map to themselves, interfaces to their
    /// implementors, unions to their members.
    matching_types: HashMap<&'s str, HashSet<&'s str>>,
    enum_values: HashMap<&'s str, HashSet<&'s str>>,
    directives: HashMap<&'s str, &'s DirectiveDefinition>,
}

impl<'s> SchemaIndex<'s> {
    pub fn build(schema: &'s Schema) -> Self {
        let mut type_kinds = HashMap::new();
        let mut matching_types: HashMap<&str, HashSet<&str>> = HashMap::new();
        let mut enum_values = HashMap::new();

        for td in schema.type_definitions() {
            match td {
                TypeDefinition::Scalar(s) => {
                    type_kinds.insert(s.name.as_str(), TypeKind::Scalar);
                }
                TypeDefinition::Object(o) => {
                    type_kinds.insert(o.name.as_str(), TypeKind::Object);
                    matching_types
                        .entry(o.name.as_str())
                        .or_default()
                        .insert(o.name.as_str());
                    for interface in &o.implements_interfaces {
                        matching_types
                            .entry(interface.as_str())
                            .or_default()
                            .insert(o.name.as_str());
                    }
                }
                TypeDefinition::Interface(i) => {
                    type_kinds.insert(i.name.as_str(), TypeKind::Interface);
                    matching_types.entry(i.name.as_str()).or_default();
                }
                TypeDefinition::Union(u) => {
                    type_kinds.insert(u.name.as_str(), TypeKind::Union);
                    let members = matching_types.entry(u.name.as_str()).or_default();
                    for member in &u.types {
                        members.insert(member.as_str());
                    }
                }
                TypeDefinition::Enum(e) => {
                    type_kinds.insert(e.name.as_str(), TypeKind::Enum);
                    enum_values.insert(
                        e.name.as_str(),
                        e.values.iter().map(|v| v.name.as_str()).collect(),
                    );
                }
                TypeDefinition::InputObject(io) => {
                    type_kinds.insert(io.name.as_str(), TypeKind::InputObject);
                }
            }
        }

        let directives = schema
            .directive_definitions()
            .map(|dd| (dd.name.as_str(), dd))
            .collect();

        SchemaIndex {
            type_kinds,
            matching_types,
            enum_values,
            directives,
        }
    }

    pub fn kind(&self, type_name: &str) -> Option<TypeKind> {
        self.type_kinds.get(type_name).copied()
    }

    pub fn is_composite(&self, type_name: &str) -> bool {
        matches!(
            self.kind(type_name),
            Some(TypeKind::Object | TypeKind::Interface | TypeKind::Union)
        )
    }

    pub fn is_input_type(&self, type_name: &str) -> bool {
        matches!(
            self.kind(type_name),
            Some(TypeKind::Scalar | TypeKind::Enum | TypeKind::InputObject)
        )
    }

    /// Whether a fragment conditioned on `condition` can ever match a value
    /// of `scoped_type`: the concrete-type sets of the two must intersect.
    pub fn fragment_condition_possible(&self, scoped_type: &str, condition: &str) -> bool {
        if scoped_type == condition {
            return true;
        }
        match (
            self.matching_types.get(scoped_type),
            self.matching_types.get(condition),
        ) {
            (Some(scoped), Some(condition)) => !scoped.is_disjoint(condition),
            _ => false,
        }
    }

    pub fn enum_value_exists(&self, enum_name: &str, value: &str) -> bool {
        self.enum_values
            .get(enum_name)
            .is_some_and(|values| values.contains(value))
    }

    pub fn directive(&self, name: &str) -> Option<&'s DirectiveDefinition> {
        self.directives.get(name).copied()
    }
}
