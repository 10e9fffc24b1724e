use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use common::value::Val;
use indexmap::IndexMap;
use thiserror::Error;
use tracing::instrument;

use crate::ast::OperationDefinitionExt;
use crate::ast::query::{Definition, Document, OperationDefinition};
use crate::ast::OperationKind;
use crate::execution::executor::Executor;
use crate::execution::{ObjectResolver, Variables};
use crate::query_response::QueryResponse;
use crate::schema::Schema;
use crate::validation::{DocumentValidator, ValidationError};

#[derive(Error, Debug)]
pub enum RequestError {
    #[error("Document validation failed with {} error(s)", .0.len())]
    Validation(Vec<ValidationError>),

    #[error("No {0} root resolver is registered")]
    UndefinedRoot(&'static str),
}

/// The engine's front door: a schema paired with the root resolvers. One
/// instance serves any number of concurrent `resolve` calls; each call gets
/// a fresh request id.
pub struct Request {
    schema: Arc<Schema>,
    query_root: Arc<dyn ObjectResolver>,
    mutation_root: Option<Arc<dyn ObjectResolver>>,
    subscription_root: Option<Arc<dyn ObjectResolver>>,
    request_counter: AtomicU64,
}

impl Request {
    pub fn new(schema: Arc<Schema>, query_root: Arc<dyn ObjectResolver>) -> Self {
        Request {
            schema,
            query_root,
            mutation_root: None,
            subscription_root: None,
            request_counter: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn with_mutation_root(mut self, root: Arc<dyn ObjectResolver>) -> Self {
        self.mutation_root = Some(root);
        self
    }

    #[must_use]
    pub fn with_subscription_root(mut self, root: Arc<dyn ObjectResolver>) -> Self {
        self.subscription_root = Some(root);
        self
    }

    /// Validates and executes one operation of `document`. A document that
    /// fails validation is never executed; execution itself returns partial
    /// data with field errors attached.
    #[instrument(skip_all, fields(request_id, operation_name))]
    pub async fn resolve(
        &self,
        document: &Document,
        operation_name: Option<&str>,
        variables: IndexMap<String, Val>,
    ) -> Result<QueryResponse, RequestError> {
        let validation_errors = DocumentValidator::new(&self.schema).validate(document);
        if !validation_errors.is_empty() {
            tracing::warn!(
                error_count = validation_errors.len(),
                "Rejecting invalid document"
            );
            return Err(RequestError::Validation(validation_errors));
        }

        let operation = select_operation(document, operation_name)
            .map_err(|error| RequestError::Validation(vec![error]))?;
        tracing::Span::current().record("operation_name", operation.name().unwrap_or(""));

        let root = match operation.kind() {
            OperationKind::Query => &self.query_root,
            OperationKind::Mutation => self
                .mutation_root
                .as_ref()
                .ok_or(RequestError::UndefinedRoot("mutation"))?,
            OperationKind::Subscription => self
                .subscription_root
                .as_ref()
                .ok_or(RequestError::UndefinedRoot("subscription"))?,
        };

        let request_id = self.request_counter.fetch_add(1, Ordering::Relaxed);
        tracing::Span::current().record("request_id", request_id);

        let fragments = document
            .definitions
            .iter()
            .filter_map(|definition| match definition {
                Definition::Fragment(fragment) => Some((fragment.name.as_str(), fragment)),
                Definition::Operation(_) => None,
            })
            .collect();

        let executor = Executor::new(
            &self.schema,
            fragments,
            Variables::new(operation, variables),
            request_id,
        );
        let (data, errors) = executor
            .resolve_operation(root, operation.selection_set())
            .await;
        if !errors.is_empty() {
            tracing::debug!(error_count = errors.len(), "Resolved with field errors");
        }

        Ok(QueryResponse { data, errors })
    }
}

fn select_operation<'d>(
    document: &'d Document,
    operation_name: Option<&str>,
) -> Result<&'d OperationDefinition, ValidationError> {
    let operations: Vec<&OperationDefinition> = document
        .definitions
        .iter()
        .filter_map(|definition| match definition {
            Definition::Operation(operation) => Some(operation),
            Definition::Fragment(_) => None,
        })
        .collect();

    match operation_name {
        Some(name) => operations
            .iter()
            .find(|operation| operation.name() == Some(name))
            .copied()
            .ok_or_else(|| {
                ValidationError::MultipleOperationsUnmatchedOperationName(name.to_string())
            }),
        None => match operations.as_slice() {
            [] => Err(ValidationError::NoOperationFound),
            [operation] => Ok(operation),
            _ => Err(ValidationError::MultipleOperationsNoOperationName),
        },
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use async_trait::async_trait;
    use bytes::Bytes;
    use pretty_assertions::assert_eq;

    use crate::conversion::{IntoResolved, require};
    use crate::execution::{FieldError, PathSegment, ResolvedValue, ResolverParams};

    use super::*;

    const SDL: &str = r#"
        interface Character { name: String! }
        type Droid implements Character {
            name: String!
            primaryFunction: String
            friend: Character
            fails: String!
        }
        type Human implements Character {
            name: String!
            homePlanet: String
        }
        type Query {
            hero: Character
            droid: Droid
            version: String!
            counted: Int
            slow: String!
            fast: String!
            fails: String!
            nullList: [Int]
            emptyList: [Int]
            holeyList: [Int]
            add(a: Int!, b: Int!): Int!
            greet(name: String = "world"): String!
            node(id: ID!): Character
        }
        type Mutation { touch: Int! }
    "#;

    #[derive(Default)]
    struct RootResolver {
        counted_calls: AtomicUsize,
        droid_calls: AtomicUsize,
        droid_selection_sets: AtomicUsize,
        last_request_id: AtomicU64,
    }

    #[async_trait]
    impl ObjectResolver for RootResolver {
        fn type_names(&self) -> Vec<&str> {
            vec!["Query"]
        }

        async fn resolve_field(
            &self,
            field_name: &str,
            params: ResolverParams<'_>,
        ) -> Result<ResolvedValue, FieldError> {
            self.last_request_id
                .store(params.request_id, Ordering::SeqCst);
            match field_name {
                "hero" => Ok(droid("R2-D2")),
                "droid" => {
                    self.droid_calls.fetch_add(1, Ordering::SeqCst);
                    self.droid_selection_sets
                        .store(params.selection_sets.len(), Ordering::SeqCst);
                    Ok(droid("C-3PO"))
                }
                "version" => Ok("1.0".into_resolved()),
                "counted" => {
                    self.counted_calls.fetch_add(1, Ordering::SeqCst);
                    Ok(1.into_resolved())
                }
                "slow" => {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok("slow".into_resolved())
                }
                "fast" => Ok("fast".into_resolved()),
                "fails" => Err(FieldError::new("boom")),
                "nullList" => Ok(None::<Vec<Option<i32>>>.into_resolved()),
                "emptyList" => Ok(Some(Vec::<Option<i32>>::new()).into_resolved()),
                "holeyList" => Ok(Some(vec![Some(1), None, Some(3)]).into_resolved()),
                "add" => {
                    let a: i32 = require("a", &params.arguments)?;
                    let b: i32 = require("b", &params.arguments)?;
                    Ok((a + b).into_resolved())
                }
                "greet" => {
                    let name: String = require("name", &params.arguments)?;
                    Ok(format!("hello {name}").into_resolved())
                }
                "node" => {
                    let id: Bytes = require("id", &params.arguments)?;
                    Ok(droid(&String::from_utf8_lossy(&id)))
                }
                other => Err(FieldError::UnknownField(
                    other.to_string(),
                    "Query".to_string(),
                )),
            }
        }
    }

    struct DroidResolver {
        name: String,
    }

    #[async_trait]
    impl ObjectResolver for DroidResolver {
        fn type_names(&self) -> Vec<&str> {
            vec!["Droid", "Character"]
        }

        async fn resolve_field(
            &self,
            field_name: &str,
            _params: ResolverParams<'_>,
        ) -> Result<ResolvedValue, FieldError> {
            match field_name {
                "name" => Ok(self.name.as_str().into_resolved()),
                "primaryFunction" => Ok("astromech".into_resolved()),
                "friend" => Ok(ResolvedValue::Object(Arc::new(HumanResolver))),
                "fails" => Err(FieldError::new("boom")),
                other => Err(FieldError::UnknownField(
                    other.to_string(),
                    "Droid".to_string(),
                )),
            }
        }
    }

    struct HumanResolver;

    #[async_trait]
    impl ObjectResolver for HumanResolver {
        fn type_names(&self) -> Vec<&str> {
            vec!["Human", "Character"]
        }

        async fn resolve_field(
            &self,
            field_name: &str,
            _params: ResolverParams<'_>,
        ) -> Result<ResolvedValue, FieldError> {
            match field_name {
                "name" => Ok("Leia".into_resolved()),
                "homePlanet" => Ok("Alderaan".into_resolved()),
                other => Err(FieldError::UnknownField(
                    other.to_string(),
                    "Human".to_string(),
                )),
            }
        }
    }

    #[derive(Default)]
    struct MutationResolver {
        touches: AtomicUsize,
    }

    #[async_trait]
    impl ObjectResolver for MutationResolver {
        fn type_names(&self) -> Vec<&str> {
            vec!["Mutation"]
        }

        async fn resolve_field(
            &self,
            field_name: &str,
            _params: ResolverParams<'_>,
        ) -> Result<ResolvedValue, FieldError> {
            match field_name {
                "touch" => {
                    let count = self.touches.fetch_add(1, Ordering::SeqCst) + 1;
                    Ok((count as i32).into_resolved())
                }
                other => Err(FieldError::UnknownField(
                    other.to_string(),
                    "Mutation".to_string(),
                )),
            }
        }
    }

    fn droid(name: &str) -> ResolvedValue {
        ResolvedValue::Object(Arc::new(DroidResolver {
            name: name.to_string(),
        }))
    }

    fn schema() -> Arc<Schema> {
        let document = graphql_parser::parse_schema::<String>(SDL)
            .unwrap()
            .into_static();
        Arc::new(Schema::from_type_system_document(&document))
    }

    fn request() -> (Request, Arc<RootResolver>) {
        let root = Arc::new(RootResolver::default());
        (Request::new(schema(), root.clone()), root)
    }

    fn parse(query: &str) -> Document {
        graphql_parser::parse_query::<String>(query)
            .unwrap()
            .into_static()
    }

    async fn run(query: &str) -> QueryResponse {
        let (request, _) = request();
        request
            .resolve(&parse(query), None, IndexMap::new())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn fields_come_back_in_document_order_regardless_of_timing() {
        let response = run("{ slow fast }").await;

        assert_eq!(response.errors, vec![]);
        let json = response.to_json().unwrap();
        let keys: Vec<_> = json["data"].as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["slow", "fast"]);
        assert_eq!(json["data"]["slow"], "slow");
        assert_eq!(json["data"]["fast"], "fast");
    }

    #[tokio::test]
    async fn skipped_field_is_never_invoked() {
        let (request, root) = request();
        let response = request
            .resolve(
                &parse("{ version counted @skip(if: true) }"),
                None,
                IndexMap::new(),
            )
            .await
            .unwrap();

        assert_eq!(response.data.get("version"), Some(&Val::String("1.0".to_string())));
        assert_eq!(response.data.get("counted"), None);
        assert_eq!(root.counted_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn skip_wins_over_include() {
        let (request, root) = request();
        let response = request
            .resolve(
                &parse("{ version counted @skip(if: true) @include(if: true) }"),
                None,
                IndexMap::new(),
            )
            .await
            .unwrap();

        assert_eq!(response.data.get("counted"), None);
        assert_eq!(root.counted_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn invalid_document_is_never_executed() {
        let (request, root) = request();
        let error = request
            .resolve(&parse("{ bogus counted }"), None, IndexMap::new())
            .await
            .unwrap_err();

        assert!(matches!(error, RequestError::Validation(errors) if !errors.is_empty()));
        assert_eq!(root.counted_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn resolver_error_nulls_the_nearest_nullable_ancestor() {
        let response = run("{ droid { name fails } }").await;

        assert_eq!(response.data.get("droid"), Some(&Val::Null));
        assert_eq!(response.errors.len(), 1);
        assert_eq!(response.errors[0].message, "boom");
        assert_eq!(
            response.errors[0].path,
            vec![
                PathSegment::Field("droid".to_string()),
                PathSegment::Field("fails".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn failed_non_null_root_field_nulls_the_whole_data() {
        let response = run("{ version fails }").await;

        assert_eq!(response.data, Val::Null);
        assert_eq!(response.errors.len(), 1);
        assert_eq!(
            response.errors[0].path,
            vec![PathSegment::Field("fails".to_string())]
        );

        let json = response.to_json().unwrap();
        assert_eq!(json["data"], serde_json::Value::Null);
        assert_eq!(json["errors"][0]["message"], "boom");
        assert_eq!(json["errors"][0]["path"][0], "fails");
    }

    #[tokio::test]
    async fn every_sibling_error_survives_non_null_propagation() {
        let response = run("{ fails other: fails }").await;

        assert_eq!(response.data, Val::Null);
        assert_eq!(response.errors.len(), 2);
        assert_eq!(
            response.errors[0].path,
            vec![PathSegment::Field("fails".to_string())]
        );
        assert_eq!(
            response.errors[1].path,
            vec![PathSegment::Field("other".to_string())]
        );
    }

    #[tokio::test]
    async fn null_list_empty_list_and_null_element_stay_distinct() {
        let response = run("{ nullList emptyList holeyList }").await;
        let json = response.to_json().unwrap();

        assert_eq!(json["data"]["nullList"], serde_json::Value::Null);
        assert_eq!(json["data"]["emptyList"], serde_json::json!([]));
        assert_eq!(json["data"]["holeyList"], serde_json::json!([1, null, 3]));
    }

    #[tokio::test]
    async fn fragments_dispatch_on_concrete_type() {
        let response = run(
            "{ hero { __typename name ... on Droid { primaryFunction } ... on Human { homePlanet } } }",
        )
        .await;

        assert_eq!(response.errors, vec![]);
        let hero = response.data.get("hero").unwrap();
        assert_eq!(hero.get("__typename"), Some(&Val::String("Droid".to_string())));
        assert_eq!(hero.get("name"), Some(&Val::String("R2-D2".to_string())));
        assert_eq!(
            hero.get("primaryFunction"),
            Some(&Val::String("astromech".to_string()))
        );
        assert_eq!(hero.get("homePlanet"), None);
    }

    #[tokio::test]
    async fn named_fragments_expand_at_execution() {
        let response = run(
            "{ hero { name ...droidFields } } fragment droidFields on Droid { primaryFunction }",
        )
        .await;

        assert_eq!(response.errors, vec![]);
        let hero = response.data.get("hero").unwrap();
        assert_eq!(
            hero.get("primaryFunction"),
            Some(&Val::String("astromech".to_string()))
        );
    }

    #[tokio::test]
    async fn interface_fields_traverse_nested_objects() {
        let response =
            run("{ droid { friend { name ... on Human { homePlanet } } } }").await;

        assert_eq!(response.errors, vec![]);
        let friend = response.data.get("droid").unwrap().get("friend").unwrap();
        assert_eq!(friend.get("name"), Some(&Val::String("Leia".to_string())));
        assert_eq!(
            friend.get("homePlanet"),
            Some(&Val::String("Alderaan".to_string()))
        );
    }

    #[tokio::test]
    async fn variable_defaults_feed_include() {
        let (request, _) = request();
        let document =
            parse("query q($flag: Boolean = false) { version extra: version @include(if: $flag) }");

        let response = request
            .resolve(&document, None, IndexMap::new())
            .await
            .unwrap();
        assert_eq!(response.data.get("extra"), None);

        let bindings = IndexMap::from([("flag".to_string(), Val::Bool(true))]);
        let response = request.resolve(&document, None, bindings).await.unwrap();
        assert_eq!(response.data.get("extra"), Some(&Val::String("1.0".to_string())));
    }

    #[tokio::test]
    async fn arguments_are_materialized_with_variables_and_defaults() {
        let (request, _) = request();

        let bindings = IndexMap::from([("b".to_string(), Val::Int(2))]);
        let response = request
            .resolve(&parse("query q($b: Int!) { add(a: 1, b: $b) }"), None, bindings)
            .await
            .unwrap();
        assert_eq!(response.data.get("add"), Some(&Val::Int(3)));

        let response = run("{ greet }").await;
        assert_eq!(
            response.data.get("greet"),
            Some(&Val::String("hello world".to_string()))
        );

        let response = run(r#"{ greet(name: "there") }"#).await;
        assert_eq!(
            response.data.get("greet"),
            Some(&Val::String("hello there".to_string()))
        );
    }

    #[tokio::test]
    async fn id_arguments_arrive_as_decoded_bytes() {
        let response = run(r#"{ node(id: "bm9kZTo0Mg==") { name } }"#).await;

        assert_eq!(response.errors, vec![]);
        assert_eq!(
            response.data.get("node").unwrap().get("name"),
            Some(&Val::String("node:42".to_string()))
        );
    }

    #[tokio::test]
    async fn duplicate_response_keys_share_one_resolver_call() {
        let (request, root) = request();
        let response = request
            .resolve(
                &parse("{ droid { name } droid { primaryFunction } }"),
                None,
                IndexMap::new(),
            )
            .await
            .unwrap();

        assert_eq!(root.droid_calls.load(Ordering::SeqCst), 1);
        // the single call still sees both merged sub-selections
        assert_eq!(root.droid_selection_sets.load(Ordering::SeqCst), 2);
        let droid = response.data.get("droid").unwrap();
        assert_eq!(droid.get("name"), Some(&Val::String("C-3PO".to_string())));
        assert_eq!(
            droid.get("primaryFunction"),
            Some(&Val::String("astromech".to_string()))
        );
    }

    #[tokio::test]
    async fn operation_selection_follows_the_request_name() {
        let (request, _) = request();
        let document = parse("query a { version } query b { fast }");

        let error = request
            .resolve(&document, None, IndexMap::new())
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            RequestError::Validation(errors)
                if errors == vec![ValidationError::MultipleOperationsNoOperationName]
        ));

        let response = request
            .resolve(&document, Some("a"), IndexMap::new())
            .await
            .unwrap();
        assert!(response.data.get("version").is_some());
        assert!(response.data.get("fast").is_none());

        let error = request
            .resolve(&document, Some("c"), IndexMap::new())
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            RequestError::Validation(errors)
                if matches!(&errors[0], ValidationError::MultipleOperationsUnmatchedOperationName(n) if n == "c")
        ));
    }

    #[tokio::test]
    async fn mutations_use_their_own_root() {
        let (request, _) = request();
        let mutation_root = Arc::new(MutationResolver::default());
        let request = request.with_mutation_root(mutation_root.clone());

        let response = request
            .resolve(&parse("mutation { touch }"), None, IndexMap::new())
            .await
            .unwrap();

        assert_eq!(response.data.get("touch"), Some(&Val::Int(1)));
        assert_eq!(mutation_root.touches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn each_request_gets_a_fresh_id() {
        let (request, root) = request();
        let document = parse("{ version }");

        request
            .resolve(&document, None, IndexMap::new())
            .await
            .unwrap();
        let first = root.last_request_id.load(Ordering::SeqCst);

        request
            .resolve(&document, None, IndexMap::new())
            .await
            .unwrap();
        let second = root.last_request_id.load(Ordering::SeqCst);

        assert_ne!(first, second);
    }
}
