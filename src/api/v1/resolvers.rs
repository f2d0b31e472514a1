//! Root-field resolvers for the query endpoint.
//!
//! Each root field maps to one service call. Arguments are taken from the parsed
//! field (variables already substituted) and deserialised into the DTOs; the result
//! is serialised back to JSON for projection.
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::api::v1::dto::accounts::{AuthPayloadResponse, LoginInput, RegisterInput};
use crate::api::v1::dto::expenses::{
    ExpenseResponse, ExpenseSummaryResponse, ExpensesArgs, NewExpenseInput, SummaryArgs,
    UpdateExpenseInput,
};
use crate::api::v1::extractors::IdentityContext;
use crate::operation::{Field, OperationKind};
use crate::services::ServiceError;
use crate::state::AppState;

/// Error attached to a single root field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError(pub String);

impl From<ServiceError> for FieldError {
    fn from(e: ServiceError) -> Self {
        Self(e.to_string())
    }
}

#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct IdArgs {
    id: String,
}

#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct InputArgs<T> {
    input: T,
}

#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct NoArgs {}

fn args<T: DeserializeOwned>(field: &Field, variables: &Map<String, Value>) -> Result<T, FieldError> {
    serde_json::from_value(field.argument_object(variables))
        .map_err(|e| FieldError(format!("invalid arguments for \"{}\": {e}", field.name)))
}

fn to_value<T: Serialize>(value: T) -> Result<Value, FieldError> {
    serde_json::to_value(value).map_err(|e| {
        tracing::error!(error = %e, "failed to serialise resolver output");
        FieldError::from(ServiceError::Internal)
    })
}

pub async fn resolve(
    state: &AppState,
    identity: &IdentityContext,
    kind: OperationKind,
    field: &Field,
    variables: &Map<String, Value>,
) -> Result<Value, FieldError> {
    if field.name == "__typename" {
        return Ok(Value::String(kind.type_name().to_string()));
    }

    match (kind, field.name.as_str()) {
        (OperationKind::Query, "hello") => {
            args::<NoArgs>(field, variables)?;
            Ok(Value::String("Hello, World!".to_string()))
        }
        (OperationKind::Query, "getExpenses") => {
            let filter: ExpensesArgs = args(field, variables)?;
            let rows = state.expenses.list(identity, filter.into()).await?;
            to_value(rows.into_iter().map(ExpenseResponse::from).collect::<Vec<_>>())
        }
        (OperationKind::Query, "getExpenseByID") => {
            let IdArgs { id } = args(field, variables)?;
            let row = state.expenses.get(identity, &id).await?;
            to_value(ExpenseResponse::from(row))
        }
        (OperationKind::Query, "expenseSummary") => {
            let range: SummaryArgs = args(field, variables)?;
            let summary = state
                .expenses
                .summary(identity, range.start_date, range.end_date)
                .await?;
            to_value(ExpenseSummaryResponse::from(summary))
        }
        (OperationKind::Mutation, "addExpense") => {
            let InputArgs::<NewExpenseInput> { input } = args(field, variables)?;
            let row = state.expenses.add(identity, input.into()).await?;
            to_value(ExpenseResponse::from(row))
        }
        (OperationKind::Mutation, "updateExpense") => {
            let InputArgs::<UpdateExpenseInput> { input } = args(field, variables)?;
            let (id, patch) = input.into_parts();
            let row = state.expenses.update(identity, &id, patch).await?;
            to_value(ExpenseResponse::from(row))
        }
        (OperationKind::Mutation, "deleteExpense") => {
            let IdArgs { id } = args(field, variables)?;
            Ok(Value::Bool(state.expenses.delete(identity, &id).await?))
        }
        (OperationKind::Mutation, "register") => {
            let InputArgs::<RegisterInput> { input } = args(field, variables)?;
            let payload = state
                .accounts
                .register(&input.name, &input.email, &input.password)
                .await?;
            to_value(AuthPayloadResponse::from(payload))
        }
        (OperationKind::Mutation, "login") => {
            let InputArgs::<LoginInput> { input } = args(field, variables)?;
            let payload = state.accounts.login(&input.email, &input.password).await?;
            to_value(AuthPayloadResponse::from(payload))
        }
        (kind, name) => Err(FieldError(format!(
            "Cannot query field \"{name}\" on type \"{}\".",
            kind.type_name()
        ))),
    }
}
