use serde::Serialize;
use serde_json::{json, Value as JsonValue};

/// Body of a one-shot GraphQL query POSTed to `/graphql`.
#[derive(Debug, Clone, Serialize)]
pub struct QueryRequest {
    /// Always serialized as `null`.
    #[serde(rename = "operationName")]
    pub operation_name: Option<String>,
    /// The GraphQL query or mutation.
    pub query: String,
    /// Query variables; an empty object when the caller passed none.
    pub variables: JsonValue,
}

impl QueryRequest {
    /// Build a request body for the given query and optional variables.
    pub fn new(query: impl Into<String>, variables: Option<JsonValue>) -> Self {
        Self {
            operation_name: None,
            query: query.into(),
            variables: variables.unwrap_or_else(|| json!({})),
        }
    }
}
