pub mod error;
pub mod resolver;
pub mod variables;

pub(crate) mod executor;

pub use error::{ExecutionError, FieldError, PathSegment};
pub use resolver::{ObjectResolver, ResolvedValue, ResolverParams};
pub use variables::Variables;
