//! Owned aliases over the `graphql_parser` AST.
//!
//! The parser is generic over its text representation; everything in the
//! engine works with the `'static, String` instantiation so documents and
//! schemas can outlive the source text they were parsed from (see
//! `Document::into_static`).

pub use graphql_parser::Pos;

pub mod query {
    pub use graphql_parser::query::ParseError;

    pub type Definition = graphql_parser::query::Definition<'static, String>;
    pub type Directive = graphql_parser::query::Directive<'static, String>;
    pub type Document = graphql_parser::query::Document<'static, String>;
    pub type Field = graphql_parser::query::Field<'static, String>;
    pub type FragmentDefinition = graphql_parser::query::FragmentDefinition<'static, String>;
    pub type FragmentSpread = graphql_parser::query::FragmentSpread<'static, String>;
    pub type InlineFragment = graphql_parser::query::InlineFragment<'static, String>;
    pub type Mutation = graphql_parser::query::Mutation<'static, String>;
    pub type OperationDefinition = graphql_parser::query::OperationDefinition<'static, String>;
    pub type Query = graphql_parser::query::Query<'static, String>;
    pub type Selection = graphql_parser::query::Selection<'static, String>;
    pub type SelectionSet = graphql_parser::query::SelectionSet<'static, String>;
    pub type Subscription = graphql_parser::query::Subscription<'static, String>;
    pub type Type = graphql_parser::query::Type<'static, String>;
    pub type TypeCondition = graphql_parser::query::TypeCondition<'static, String>;
    pub type Value = graphql_parser::query::Value<'static, String>;
    pub type VariableDefinition = graphql_parser::query::VariableDefinition<'static, String>;

    pub use graphql_parser::query::Number;
}

pub mod schema {
    pub use graphql_parser::schema::ParseError;

    pub type Definition = graphql_parser::schema::Definition<'static, String>;
    pub type DirectiveDefinition = graphql_parser::schema::DirectiveDefinition<'static, String>;
    pub type Document = graphql_parser::schema::Document<'static, String>;
    pub type EnumType = graphql_parser::schema::EnumType<'static, String>;
    pub type EnumValue = graphql_parser::schema::EnumValue<'static, String>;
    pub type Field = graphql_parser::schema::Field<'static, String>;
    pub type InputObjectType = graphql_parser::schema::InputObjectType<'static, String>;
    pub type InputValue = graphql_parser::schema::InputValue<'static, String>;
    pub type InterfaceType = graphql_parser::schema::InterfaceType<'static, String>;
    pub type ObjectType = graphql_parser::schema::ObjectType<'static, String>;
    pub type ScalarType = graphql_parser::schema::ScalarType<'static, String>;
    pub type SchemaDefinition = graphql_parser::schema::SchemaDefinition<'static, String>;
    pub type TypeDefinition = graphql_parser::schema::TypeDefinition<'static, String>;
    pub type UnionType = graphql_parser::schema::UnionType<'static, String>;

    pub use graphql_parser::schema::DirectiveLocation;
}

use crate::ast::query::{
    Directive, OperationDefinition, SelectionSet, Value, VariableDefinition,
};

/// The three operation kinds, with a shorthand selection set counting as a
/// query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Query,
    Mutation,
    Subscription,
}

impl OperationKind {
    pub fn name(&self) -> &'static str {
        match self {
            OperationKind::Query => "query",
            OperationKind::Mutation => "mutation",
            OperationKind::Subscription => "subscription",
        }
    }
}

/// Accessors that are uniform across the four `OperationDefinition` variants.
pub trait OperationDefinitionExt {
    fn kind(&self) -> OperationKind;
    fn name(&self) -> Option<&str>;
    fn position(&self) -> Pos;
    fn selection_set(&self) -> &SelectionSet;
    fn variable_definitions(&self) -> &[VariableDefinition];
    fn directives(&self) -> &[Directive];
}

impl OperationDefinitionExt for OperationDefinition {
    fn kind(&self) -> OperationKind {
        match self {
            OperationDefinition::SelectionSet(_) | OperationDefinition::Query(_) => {
                OperationKind::Query
            }
            OperationDefinition::Mutation(_) => OperationKind::Mutation,
            OperationDefinition::Subscription(_) => OperationKind::Subscription,
        }
    }

    fn name(&self) -> Option<&str> {
        match self {
            OperationDefinition::SelectionSet(_) => None,
            OperationDefinition::Query(q) => q.name.as_deref(),
            OperationDefinition::Mutation(m) => m.name.as_deref(),
            OperationDefinition::Subscription(s) => s.name.as_deref(),
        }
    }

    fn position(&self) -> Pos {
        match self {
            OperationDefinition::SelectionSet(s) => s.span.0,
            OperationDefinition::Query(q) => q.position,
            OperationDefinition::Mutation(m) => m.position,
            OperationDefinition::Subscription(s) => s.position,
        }
    }

    fn selection_set(&self) -> &SelectionSet {
        match self {
            OperationDefinition::SelectionSet(s) => s,
            OperationDefinition::Query(q) => &q.selection_set,
            OperationDefinition::Mutation(m) => &m.selection_set,
            OperationDefinition::Subscription(s) => &s.selection_set,
        }
    }

    fn variable_definitions(&self) -> &[VariableDefinition] {
        match self {
            OperationDefinition::SelectionSet(_) => &[],
            OperationDefinition::Query(q) => &q.variable_definitions,
            OperationDefinition::Mutation(m) => &m.variable_definitions,
            OperationDefinition::Subscription(s) => &s.variable_definitions,
        }
    }

    fn directives(&self) -> &[Directive] {
        match self {
            OperationDefinition::SelectionSet(_) => &[],
            OperationDefinition::Query(q) => &q.directives,
            OperationDefinition::Mutation(m) => &m.directives,
            OperationDefinition::Subscription(s) => &s.directives,
        }
    }
}

/// Accessors that are uniform across the `TypeDefinition` variants.
pub trait TypeDefinitionExt {
    fn name(&self) -> &str;
    fn position(&self) -> Pos;
    /// Output fields for object and interface types.
    fn field_by_name(&self, name: &str) -> Option<&schema::Field>;
    /// Input fields for input object types.
    fn input_field_by_name(&self, name: &str) -> Option<&schema::InputValue>;
    fn input_fields(&self) -> &[schema::InputValue];
}

impl TypeDefinitionExt for schema::TypeDefinition {
    fn name(&self) -> &str {
        use graphql_parser::schema::TypeDefinition::*;
        match self {
            Scalar(s) => &s.name,
            Object(o) => &o.name,
            Interface(i) => &i.name,
            Union(u) => &u.name,
            Enum(e) => &e.name,
            InputObject(io) => &io.name,
        }
    }

    fn position(&self) -> Pos {
        use graphql_parser::schema::TypeDefinition::*;
        match self {
            Scalar(s) => s.position,
            Object(o) => o.position,
            Interface(i) => i.position,
            Union(u) => u.position,
            Enum(e) => e.position,
            InputObject(io) => io.position,
        }
    }

    fn field_by_name(&self, name: &str) -> Option<&schema::Field> {
        use graphql_parser::schema::TypeDefinition::*;
        match self {
            Object(o) => o.fields.iter().find(|f| f.name == name),
            Interface(i) => i.fields.iter().find(|f| f.name == name),
            _ => None,
        }
    }

    fn input_field_by_name(&self, name: &str) -> Option<&schema::InputValue> {
        match self {
            graphql_parser::schema::TypeDefinition::InputObject(io) => {
                io.fields.iter().find(|f| f.name == name)
            }
            _ => None,
        }
    }

    fn input_fields(&self) -> &[schema::InputValue] {
        match self {
            graphql_parser::schema::TypeDefinition::InputObject(io) => &io.fields,
            _ => &[],
        }
    }
}

/// A short tag name for a literal, used in mismatch diagnostics.
pub fn value_tag(value: &Value) -> &'static str {
    match value {
        Value::Variable(_) => "Variable",
        Value::Int(_) => "Int",
        Value::Float(_) => "Float",
        Value::String(_) => "String",
        Value::Boolean(_) => "Boolean",
        Value::Null => "Null",
        Value::Enum(_) => "Enum",
        Value::List(_) => "List",
        Value::Object(_) => "Object",
    }
}
