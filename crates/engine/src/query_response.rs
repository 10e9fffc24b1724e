use common::value::{Val, ValConversionError};

use crate::execution::ExecutionError;

/// The outcome of executing one operation: the data tree plus any
/// field-level errors recovered along the way.
#[derive(Debug)]
pub struct QueryResponse {
    pub data: Val,
    pub errors: Vec<ExecutionError>,
}

impl QueryResponse {
    /// Renders the standard GraphQL response envelope. The `errors` key is
    /// omitted when the execution was clean.
    pub fn to_json(&self) -> Result<serde_json::Value, ValConversionError> {
        let mut response = serde_json::Map::new();
        response.insert("data".to_string(), (&self.data).try_into()?);
        if !self.errors.is_empty() {
            response.insert(
                "errors".to_string(),
                serde_json::Value::Array(self.errors.iter().map(ExecutionError::to_json).collect()),
            );
        }
        Ok(serde_json::Value::Object(response))
    }
}
