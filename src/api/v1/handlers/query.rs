/*
 * Responsibility
 * - POST /api/v1/query
 * - body を OperationRequest として読み、operation を選んで root field ごとに resolve
 * - field 単位の失敗は `errors` に積み、HTTP は 200 のまま返す
 * - identity は gate が入れた IdentityContext をそのまま使う (token は再検証しない)
 */
use axum::{Json, body::Bytes, extract::State};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::api::v1::extractors::Identity;
use crate::api::v1::resolvers;
use crate::error::{AppError, ErrorEntry};
use crate::operation::{OperationRequest, parse, project};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ExecutionResponse {
    pub data: Map<String, Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ErrorEntry>,
}

pub async fn execute(
    State(state): State<AppState>,
    Identity(identity): Identity,
    body: Bytes,
) -> Result<Json<ExecutionResponse>, AppError> {
    let request: OperationRequest = serde_json::from_slice(&body)
        .map_err(|e| AppError::bad_request(format!("invalid request body: {e}")))?;

    let document = parse(&request.query).map_err(|e| AppError::bad_request(e.to_string()))?;
    let operation = document
        .select(request.operation_name.as_deref())
        .map_err(|e| AppError::bad_request(e.to_string()))?;
    let variables = operation.variables(request.variables.as_ref());

    debug!(
        kind = operation.kind.type_name(),
        name = operation.name.as_deref().unwrap_or("<anonymous>"),
        fields = operation.selection.len(),
        authenticated = identity.is_authenticated(),
        "executing operation"
    );

    let mut data = Map::new();
    let mut errors = Vec::new();

    for field in &operation.selection {
        let key = field.response_key().to_string();
        match resolvers::resolve(&state, &identity, operation.kind, field, &variables).await {
            Ok(value) => {
                data.insert(key, project(value, &field.selection));
            }
            Err(resolvers::FieldError(message)) => {
                errors.push(ErrorEntry::at(message, key.clone()));
                data.insert(key, Value::Null);
            }
        }
    }

    Ok(Json(ExecutionResponse { data, errors }))
}
