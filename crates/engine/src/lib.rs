//! A schema-driven GraphQL execution engine: document validation against a
//! schema model, followed by concurrent, resolver-backed field resolution.
//!
//! Parsing is delegated to `graphql_parser`; this crate owns everything
//! between a parsed document and a response: the [`schema::Schema`] model,
//! the collect-all-errors validator, the [`execution::ObjectResolver`]
//! contract, and the [`Request`] front door that ties them together.

pub mod ast;
pub mod conversion;
pub mod execution;
pub mod schema;
pub mod validation;

mod query_response;
mod request;

pub use query_response::QueryResponse;
pub use request::{Request, RequestError};
