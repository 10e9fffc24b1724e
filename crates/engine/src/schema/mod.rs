//! The schema model: an ordered catalog of type and directive definitions
//! plus the names of the root operation types.

mod introspection;
pub(crate) mod index;

use indexmap::IndexMap;

use crate::ast::schema::{
    Definition, DirectiveDefinition, DirectiveLocation, Document, Field, InputValue,
    TypeDefinition,
};
use crate::ast::query::Type;
use crate::ast::{Pos, TypeDefinitionExt};

pub const QUERY_ROOT_TYPENAME: &str = "Query";
pub const MUTATION_ROOT_TYPENAME: &str = "Mutation";
pub const SUBSCRIPTION_ROOT_TYPENAME: &str = "Subscription";

pub const BUILTIN_SCALARS: [&str; 5] = ["Int", "Float", "String", "Boolean", "ID"];

/// A complete schema. Constructed either programmatically through the `add_*`
/// methods or from a parsed type-system document.
///
/// Built-in scalars, the `@skip`/`@include`/`@deprecated` directives, and the
/// introspection types are seeded by [`Schema::new`] and are always present.
pub struct Schema {
    type_definitions: IndexMap<String, TypeDefinition>,
    directive_definitions: IndexMap<String, DirectiveDefinition>,
    query_type_name: Option<String>,
    mutation_type_name: Option<String>,
    subscription_type_name: Option<String>,
    // Meta-fields do not live on any type definition; the engine synthesizes
    // them during validation and execution.
    pub(crate) typename_field_definition: Field,
    pub(crate) schema_field_definition: Field,
    pub(crate) type_field_definition: Field,
}

impl Schema {
    pub fn new() -> Self {
        let mut type_definitions = IndexMap::new();

        for name in BUILTIN_SCALARS {
            let scalar = TypeDefinition::Scalar(crate::ast::schema::ScalarType {
                position: Pos::default(),
                description: None,
                name: name.to_string(),
                directives: vec![],
            });
            type_definitions.insert(name.to_string(), scalar);
        }

        for td in introspection::type_definitions() {
            type_definitions.insert(td.name().to_string(), td);
        }

        let mut directive_definitions = IndexMap::new();
        for dd in builtin_directives() {
            directive_definitions.insert(dd.name.clone(), dd);
        }

        Schema {
            type_definitions,
            directive_definitions,
            query_type_name: None,
            mutation_type_name: None,
            subscription_type_name: None,
            typename_field_definition: create_field(
                "__typename",
                non_null(named_type("String")),
                vec![],
            ),
            schema_field_definition: create_field(
                "__schema",
                non_null(named_type("__Schema")),
                vec![],
            ),
            type_field_definition: create_field(
                "__type",
                named_type("__Type"),
                vec![create_input_value("name", non_null(named_type("String")))],
            ),
        }
    }

    /// Builds a schema from a parsed SDL document. The root operation types
    /// come from an explicit `schema { ... }` definition when present, and
    /// fall back to the conventional `Query`/`Mutation`/`Subscription` names.
    pub fn from_type_system_document(document: &Document) -> Self {
        let mut schema = Schema::new();
        let mut roots: Option<(Option<String>, Option<String>, Option<String>)> = None;

        for definition in &document.definitions {
            match definition {
                Definition::TypeDefinition(td) => schema.add_type(td.clone()),
                Definition::DirectiveDefinition(dd) => schema.add_directive(dd.clone()),
                Definition::SchemaDefinition(sd) => {
                    roots = Some((sd.query.clone(), sd.mutation.clone(), sd.subscription.clone()));
                }
                Definition::TypeExtension(_) => {}
            }
        }

        let (query, mutation, subscription) = roots.unwrap_or((None, None, None));
        schema.query_type_name = query.or_else(|| {
            schema
                .type_definitions
                .contains_key(QUERY_ROOT_TYPENAME)
                .then(|| QUERY_ROOT_TYPENAME.to_string())
        });
        schema.mutation_type_name = mutation.or_else(|| {
            schema
                .type_definitions
                .contains_key(MUTATION_ROOT_TYPENAME)
                .then(|| MUTATION_ROOT_TYPENAME.to_string())
        });
        schema.subscription_type_name = subscription.or_else(|| {
            schema
                .type_definitions
                .contains_key(SUBSCRIPTION_ROOT_TYPENAME)
                .then(|| SUBSCRIPTION_ROOT_TYPENAME.to_string())
        });

        schema
    }

    pub fn add_type(&mut self, type_definition: TypeDefinition) {
        self.type_definitions
            .insert(type_definition.name().to_string(), type_definition);
    }

    pub fn add_query_type(&mut self, type_definition: TypeDefinition) {
        self.query_type_name = Some(type_definition.name().to_string());
        self.add_type(type_definition);
    }

    pub fn add_mutation_type(&mut self, type_definition: TypeDefinition) {
        self.mutation_type_name = Some(type_definition.name().to_string());
        self.add_type(type_definition);
    }

    pub fn add_subscription_type(&mut self, type_definition: TypeDefinition) {
        self.subscription_type_name = Some(type_definition.name().to_string());
        self.add_type(type_definition);
    }

    pub fn add_directive(&mut self, directive_definition: DirectiveDefinition) {
        self.directive_definitions
            .insert(directive_definition.name.clone(), directive_definition);
    }

    pub fn get_type_definition(&self, name: &str) -> Option<&TypeDefinition> {
        self.type_definitions.get(name)
    }

    pub fn type_definitions(&self) -> impl Iterator<Item = &TypeDefinition> {
        self.type_definitions.values()
    }

    pub fn directive_definition(&self, name: &str) -> Option<&DirectiveDefinition> {
        self.directive_definitions.get(name)
    }

    pub fn directive_definitions(&self) -> impl Iterator<Item = &DirectiveDefinition> {
        self.directive_definitions.values()
    }

    pub fn query_type_name(&self) -> Option<&str> {
        self.query_type_name.as_deref()
    }

    pub fn mutation_type_name(&self) -> Option<&str> {
        self.mutation_type_name.as_deref()
    }

    pub fn subscription_type_name(&self) -> Option<&str> {
        self.subscription_type_name.as_deref()
    }
}

impl Default for Schema {
    fn default() -> Self {
        Schema::new()
    }
}

pub fn named_type(name: &str) -> Type {
    Type::NamedType(name.to_string())
}

pub fn list_of(inner: Type) -> Type {
    Type::ListType(Box::new(inner))
}

pub fn non_null(inner: Type) -> Type {
    Type::NonNullType(Box::new(inner))
}

/// Strips list and non-null wrappers down to the named type.
pub fn underlying_type(ty: &Type) -> &String {
    match ty {
        Type::NamedType(name) => name,
        Type::ListType(inner) | Type::NonNullType(inner) => underlying_type(inner),
    }
}

pub(crate) fn create_field(name: &str, field_type: Type, arguments: Vec<InputValue>) -> Field {
    Field {
        position: Pos::default(),
        description: None,
        name: name.to_string(),
        arguments,
        field_type,
        directives: vec![],
    }
}

pub(crate) fn create_input_value(name: &str, value_type: Type) -> InputValue {
    InputValue {
        position: Pos::default(),
        description: None,
        name: name.to_string(),
        value_type,
        default_value: None,
        directives: vec![],
    }
}

fn builtin_directives() -> Vec<DirectiveDefinition> {
    let executable = vec![
        DirectiveLocation::Field,
        DirectiveLocation::FragmentSpread,
        DirectiveLocation::InlineFragment,
    ];

    vec![
        DirectiveDefinition {
            position: Pos::default(),
            description: None,
            name: "skip".to_string(),
            arguments: vec![create_input_value("if", non_null(named_type("Boolean")))],
            repeatable: false,
            locations: executable.clone(),
        },
        DirectiveDefinition {
            position: Pos::default(),
            description: None,
            name: "include".to_string(),
            arguments: vec![create_input_value("if", non_null(named_type("Boolean")))],
            repeatable: false,
            locations: executable,
        },
        DirectiveDefinition {
            position: Pos::default(),
            description: None,
            name: "deprecated".to_string(),
            arguments: vec![create_input_value("reason", named_type("String"))],
            repeatable: false,
            locations: vec![
                DirectiveLocation::FieldDefinition,
                DirectiveLocation::EnumValue,
            ],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(sdl: &str) -> Document {
        graphql_parser::parse_schema::<String>(sdl)
            .unwrap()
            .into_static()
    }

    #[test]
    fn builtins_are_seeded() {
        let schema = Schema::new();

        for scalar in BUILTIN_SCALARS {
            assert!(schema.get_type_definition(scalar).is_some());
        }
        assert!(schema.get_type_definition("__Schema").is_some());
        assert!(schema.get_type_definition("__Type").is_some());
        assert!(schema.directive_definition("skip").is_some());
        assert!(schema.directive_definition("include").is_some());
        assert!(schema.directive_definition("deprecated").is_some());
    }

    #[test]
    fn roots_default_to_conventional_names() {
        let schema = Schema::from_type_system_document(&parse(
            "type Query { hello: String } type Mutation { touch: Int }",
        ));

        assert_eq!(schema.query_type_name(), Some("Query"));
        assert_eq!(schema.mutation_type_name(), Some("Mutation"));
        assert_eq!(schema.subscription_type_name(), None);
    }

    #[test]
    fn explicit_schema_definition_overrides_defaults() {
        let schema = Schema::from_type_system_document(&parse(
            "schema { query: Root } type Root { hello: String }",
        ));

        assert_eq!(schema.query_type_name(), Some("Root"));
    }

    #[test]
    fn underlying_type_unwraps_modifiers() {
        let ty = non_null(list_of(non_null(named_type("Droid"))));
        assert_eq!(underlying_type(&ty), "Droid");
    }
}
