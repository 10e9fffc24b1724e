use thiserror::Error;

use crate::ast::Pos;

/// A single diagnostic produced by document validation. Validation collects
/// every error it finds rather than stopping at the first.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Duplicate fragment name '{0}'")]
    DuplicateFragmentName(String, Pos),

    #[error("Duplicate operation name '{0}'")]
    DuplicateOperationName(String, Pos),

    #[error("An anonymous operation must be the only operation in the document")]
    AnonymousOperationNotAlone(Pos),

    #[error("Fragment '{0}' is not defined")]
    FragmentDefinitionNotFound(String, Pos),

    #[error("Fragment '{0}' cannot spread within itself")]
    CyclicFragmentSpread(String, Pos),

    #[error("Fragment '{0}' is defined but never used")]
    UnusedFragment(String, Pos),

    #[error("Fragment cannot condition on non-composite type '{0}'")]
    FragmentOnNonCompositeType(String, Pos),

    #[error("Fragment on type '{0}' can never match type '{1}'")]
    ImpossibleFragmentSpread(String, String, Pos),

    #[error("Field '{0}' is not valid for type '{1}'")]
    InvalidField(String, String, Pos),

    #[error("Field '{0}' of composite type '{1}' must have a selection of subfields")]
    MissingSubSelection(String, String, Pos),

    #[error("Field '{0}' is of a leaf type and cannot have a sub-selection")]
    LeafWithSubSelection(String, Pos),

    #[error("Fields named '{0}' cannot be merged: differing arguments, field names, or types")]
    ConflictingFields(String, Pos),

    #[error("Unknown argument '{0}' on '{1}'")]
    UnknownArgument(String, String, Pos),

    #[error("Duplicate argument '{0}' on '{1}'")]
    DuplicateArgument(String, String, Pos),

    #[error("Required argument '{0}' was not provided")]
    RequiredArgumentNotFound(String, Pos),

    #[error("Expected a value of type '{expected_type}', found {actual}")]
    InvalidValueShape {
        expected_type: String,
        actual: &'static str,
        pos: Pos,
    },

    #[error("Unknown type '{0}'")]
    UnknownType(String, Pos),

    #[error("Type '{0}' is not a valid input type")]
    NotInputType(String, Pos),

    #[error("Null supplied for non-null type '{0}'")]
    NullForNonNullType(String, Pos),

    #[error("Value '{0}' is not a member of enum '{1}'")]
    InvalidEnumValue(String, String, Pos),

    #[error("ID value is not valid Base64")]
    MalformedIdValue(Pos),

    #[error("Field '{0}' is not defined on input object '{1}'")]
    UnknownInputField(String, String, Pos),

    #[error("Required field '{1}' of input object '{0}' was not provided")]
    MissingRequiredInputField(String, String, Pos),

    #[error("Duplicate variable '${0}'")]
    DuplicateVariable(String, Pos),

    #[error("Variable '${0}' is not declared by the operation")]
    UndeclaredVariable(String, Pos),

    #[error("Variable '${0}' is declared but never used")]
    UnusedVariable(String, Pos),

    #[error("Variable '${0}' of type '{1}' cannot be used where '{2}' is expected")]
    IncompatibleVariableType(String, String, String, Pos),

    #[error("Unknown directive '@{0}'")]
    UnknownDirective(String, Pos),

    #[error("Directive '@{0}' is not allowed at this location")]
    MisplacedDirective(String, Pos),

    #[error("Directive '@{0}' may be applied at most once per location")]
    DuplicateDirective(String, Pos),

    #[error("A subscription operation must select exactly one root field")]
    SubscriptionWithMultipleRootFields(Pos),

    #[error("Schema does not define a root {0} type")]
    OperationRootNotDefined(&'static str, Pos),

    #[error("Document does not contain any operation")]
    NoOperationFound,

    #[error("Must provide operation name if query contains multiple operations")]
    MultipleOperationsNoOperationName,

    #[error("Operation name '{0}' does not match any operation in the document")]
    MultipleOperationsUnmatchedOperationName(String),
}

impl ValidationError {
    pub fn position(&self) -> Pos {
        use ValidationError::*;
        match self {
            DuplicateFragmentName(_, pos)
            | DuplicateOperationName(_, pos)
            | AnonymousOperationNotAlone(pos)
            | FragmentDefinitionNotFound(_, pos)
            | CyclicFragmentSpread(_, pos)
            | UnusedFragment(_, pos)
            | FragmentOnNonCompositeType(_, pos)
            | ImpossibleFragmentSpread(_, _, pos)
            | InvalidField(_, _, pos)
            | MissingSubSelection(_, _, pos)
            | LeafWithSubSelection(_, pos)
            | ConflictingFields(_, pos)
            | UnknownArgument(_, _, pos)
            | DuplicateArgument(_, _, pos)
            | RequiredArgumentNotFound(_, pos)
            | InvalidValueShape { pos, .. }
            | UnknownType(_, pos)
            | NotInputType(_, pos)
            | NullForNonNullType(_, pos)
            | InvalidEnumValue(_, _, pos)
            | MalformedIdValue(pos)
            | UnknownInputField(_, _, pos)
            | MissingRequiredInputField(_, _, pos)
            | DuplicateVariable(_, pos)
            | UndeclaredVariable(_, pos)
            | UnusedVariable(_, pos)
            | IncompatibleVariableType(_, _, _, pos)
            | UnknownDirective(_, pos)
            | MisplacedDirective(_, pos)
            | DuplicateDirective(_, pos)
            | SubscriptionWithMultipleRootFields(pos)
            | OperationRootNotDefined(_, pos) => *pos,
            NoOperationFound
            | MultipleOperationsNoOperationName
            | MultipleOperationsUnmatchedOperationName(_) => Pos::default(),
        }
    }
}
