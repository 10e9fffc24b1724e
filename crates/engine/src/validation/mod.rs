mod arguments_validator;
mod document_validator;
mod operation_validator;
mod selection_set_validator;
pub mod validation_error;

pub use document_validator::DocumentValidator;
pub use validation_error::ValidationError;
