//! Operation documents posted to the query endpoint.
//!
//! `parse` turns the text into a `Document`; `classify` decides whether a raw body
//! needs an identity; `project` shapes resolver output to the client's selection.
pub mod classify;
pub mod document;
pub mod parser;
pub mod project;

use serde::Deserialize;
use serde_json::{Map, Value};

pub use classify::{RouteClass, classify};
pub use document::{Field, OperationKind};
pub use parser::parse;
pub use project::project;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ParseError {
    message: String,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Request body of `POST /api/v1/query`.
#[derive(Debug, Clone, Deserialize)]
pub struct OperationRequest {
    pub query: String,
    #[serde(rename = "operationName", default)]
    pub operation_name: Option<String>,
    #[serde(default)]
    pub variables: Option<Map<String, Value>>,
}
