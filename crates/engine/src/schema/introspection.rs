//! Type definitions backing the `__schema` and `__type` meta-fields.

use crate::ast::Pos;
use crate::ast::query::Value;
use crate::ast::schema::{EnumType, EnumValue, Field, InputValue, ObjectType, TypeDefinition};

use super::{create_field, create_input_value, list_of, named_type, non_null};

pub(super) fn type_definitions() -> Vec<TypeDefinition> {
    vec![
        object(
            "__Schema",
            vec![
                create_field("types", non_null(list_of(non_null(named_type("__Type")))), vec![]),
                create_field("queryType", non_null(named_type("__Type")), vec![]),
                create_field("mutationType", named_type("__Type"), vec![]),
                create_field("subscriptionType", named_type("__Type"), vec![]),
                create_field(
                    "directives",
                    non_null(list_of(non_null(named_type("__Directive")))),
                    vec![],
                ),
            ],
        ),
        object(
            "__Type",
            vec![
                create_field("kind", non_null(named_type("__TypeKind")), vec![]),
                create_field("name", named_type("String"), vec![]),
                create_field("description", named_type("String"), vec![]),
                create_field(
                    "fields",
                    list_of(non_null(named_type("__Field"))),
                    vec![include_deprecated_argument()],
                ),
                create_field("interfaces", list_of(non_null(named_type("__Type"))), vec![]),
                create_field("possibleTypes", list_of(non_null(named_type("__Type"))), vec![]),
                create_field(
                    "enumValues",
                    list_of(non_null(named_type("__EnumValue"))),
                    vec![include_deprecated_argument()],
                ),
                create_field("inputFields", list_of(non_null(named_type("__InputValue"))), vec![]),
                create_field("ofType", named_type("__Type"), vec![]),
            ],
        ),
        object(
            "__Field",
            vec![
                create_field("name", non_null(named_type("String")), vec![]),
                create_field("description", named_type("String"), vec![]),
                create_field(
                    "args",
                    non_null(list_of(non_null(named_type("__InputValue")))),
                    vec![],
                ),
                create_field("type", non_null(named_type("__Type")), vec![]),
                create_field("isDeprecated", non_null(named_type("Boolean")), vec![]),
                create_field("deprecationReason", named_type("String"), vec![]),
            ],
        ),
        object(
            "__InputValue",
            vec![
                create_field("name", non_null(named_type("String")), vec![]),
                create_field("description", named_type("String"), vec![]),
                create_field("type", non_null(named_type("__Type")), vec![]),
                create_field("defaultValue", named_type("String"), vec![]),
            ],
        ),
        object(
            "__EnumValue",
            vec![
                create_field("name", non_null(named_type("String")), vec![]),
                create_field("description", named_type("String"), vec![]),
                create_field("isDeprecated", non_null(named_type("Boolean")), vec![]),
                create_field("deprecationReason", named_type("String"), vec![]),
            ],
        ),
        object(
            "__Directive",
            vec![
                create_field("name", non_null(named_type("String")), vec![]),
                create_field("description", named_type("String"), vec![]),
                create_field(
                    "locations",
                    non_null(list_of(non_null(named_type("__DirectiveLocation")))),
                    vec![],
                ),
                create_field(
                    "args",
                    non_null(list_of(non_null(named_type("__InputValue")))),
                    vec![],
                ),
            ],
        ),
        enum_type(
            "__TypeKind",
            &[
                "SCALAR",
                "OBJECT",
                "INTERFACE",
                "UNION",
                "ENUM",
                "INPUT_OBJECT",
                "LIST",
                "NON_NULL",
            ],
        ),
        enum_type(
            "__DirectiveLocation",
            &[
                "QUERY",
                "MUTATION",
                "SUBSCRIPTION",
                "FIELD",
                "FRAGMENT_DEFINITION",
                "FRAGMENT_SPREAD",
                "INLINE_FRAGMENT",
                "VARIABLE_DEFINITION",
                "SCHEMA",
                "SCALAR",
                "OBJECT",
                "FIELD_DEFINITION",
                "ARGUMENT_DEFINITION",
                "INTERFACE",
                "UNION",
                "ENUM",
                "ENUM_VALUE",
                "INPUT_OBJECT",
                "INPUT_FIELD_DEFINITION",
            ],
        ),
    ]
}

fn include_deprecated_argument() -> InputValue {
    InputValue {
        default_value: Some(Value::Boolean(false)),
        ..create_input_value("includeDeprecated", named_type("Boolean"))
    }
}

fn object(name: &str, fields: Vec<Field>) -> TypeDefinition {
    TypeDefinition::Object(ObjectType {
        position: Pos::default(),
        description: None,
        name: name.to_string(),
        implements_interfaces: vec![],
        directives: vec![],
        fields,
    })
}

fn enum_type(name: &str, values: &[&str]) -> TypeDefinition {
    TypeDefinition::Enum(EnumType {
        position: Pos::default(),
        description: None,
        name: name.to_string(),
        directives: vec![],
        values: values
            .iter()
            .map(|v| EnumValue {
                position: Pos::default(),
                description: None,
                name: v.to_string(),
                directives: vec![],
            })
            .collect(),
    })
}
