use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::value::Val;
use indexmap::IndexMap;

use crate::ast::query::{FragmentDefinition, SelectionSet};

use super::error::FieldError;
use super::variables::Variables;

/// Everything a resolver may need to produce one field.
///
/// Arguments arrive fully materialized: defaults applied, variables
/// substituted, and coerced to [`Val`]. The raw selection sets and fragment
/// table are available for resolvers that want to look ahead at what will be
/// requested of the value they return.
pub struct ResolverParams<'a> {
    /// Identifies the enclosing request; every field of one request sees the
    /// same value.
    pub request_id: u64,
    pub arguments: IndexMap<String, Val>,
    /// One entry per occurrence of this response key; duplicate keys merge
    /// into a single resolver call but keep their separate sub-selections.
    pub selection_sets: &'a [&'a SelectionSet],
    pub fragments: &'a HashMap<&'a str, &'a FragmentDefinition>,
    pub variables: &'a Variables<'a>,
}

/// What a resolver hands back for one field. The engine completes it against
/// the field's declared type: scalars pass through, objects recurse, lists
/// fan out element by element.
pub enum ResolvedValue {
    Null,
    Value(Val),
    List(Vec<ResolvedValue>),
    Object(Arc<dyn ObjectResolver>),
}

impl std::fmt::Debug for ResolvedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolvedValue::Null => write!(f, "Null"),
            ResolvedValue::Value(val) => write!(f, "Value({val})"),
            ResolvedValue::List(items) => f.debug_tuple("List").field(items).finish(),
            ResolvedValue::Object(resolver) => {
                write!(f, "Object({})", resolver.type_names().join(" | "))
            }
        }
    }
}

/// The host-side contract: one implementor per composite value the schema can
/// produce. The engine drives these concurrently, so implementations must be
/// shareable across tasks.
#[async_trait]
pub trait ObjectResolver: Send + Sync {
    /// The type names this value answers to, most specific first. The first
    /// entry must be the concrete object type; the rest are the interfaces
    /// and unions it satisfies, used for fragment condition dispatch.
    fn type_names(&self) -> Vec<&str>;

    async fn resolve_field(
        &self,
        field_name: &str,
        params: ResolverParams<'_>,
    ) -> Result<ResolvedValue, FieldError>;

    /// Called before the first field of a selection set against this value
    /// is resolved, and after the last completes. Hooks for batching or
    /// per-object bookkeeping; the defaults do nothing.
    async fn begin_selection_set(&self) {}

    async fn end_selection_set(&self) {}
}
