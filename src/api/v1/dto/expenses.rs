/*
 * Responsibility
 * - Expense の argument / response DTO (camelCase on the wire)
 * - validation は service 側 (ExpenseService) で行う
 */
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::repos::expense_repo::{
    CategoryTotalRow, ExpenseFilter, ExpensePatch, ExpenseRow, NewExpense,
};
use crate::services::expense::ExpenseSummary;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewExpenseInput {
    pub amount: f64,
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    pub date: NaiveDate,
}

impl From<NewExpenseInput> for NewExpense {
    fn from(input: NewExpenseInput) -> Self {
        Self {
            amount: input.amount,
            category: input.category,
            description: input.description,
            date: input.date,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateExpenseInput {
    pub id: String,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub category: Option<String>,
    // null and absent both mean "leave as is"
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

impl UpdateExpenseInput {
    pub fn into_parts(self) -> (String, ExpensePatch) {
        (
            self.id,
            ExpensePatch {
                amount: self.amount,
                category: self.category,
                description: self.description,
                date: self.date,
            },
        )
    }
}

// "" reads as "no date filter"
fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw.trim().parse().map(Some).map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ExpensesArgs {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub category: Option<String>,
}

impl From<ExpensesArgs> for ExpenseFilter {
    fn from(args: ExpensesArgs) -> Self {
        Self {
            date: args.date,
            category: args.category,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SummaryArgs {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseResponse {
    pub id: String,
    pub amount: f64,
    pub category: String,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub user_id: String,
}

impl From<ExpenseRow> for ExpenseResponse {
    fn from(row: ExpenseRow) -> Self {
        Self {
            id: row.id,
            amount: row.amount,
            category: row.category,
            description: row.description,
            date: row.date,
            user_id: row.user_id,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotalResponse {
    pub category: String,
    pub total: f64,
    pub count: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseSummaryResponse {
    pub total_amount: f64,
    pub total_count: i64,
    pub by_category: Vec<CategoryTotalResponse>,
}

impl From<ExpenseSummary> for ExpenseSummaryResponse {
    fn from(summary: ExpenseSummary) -> Self {
        Self {
            total_amount: summary.total_amount,
            total_count: summary.total_count,
            by_category: summary
                .by_category
                .into_iter()
                .map(|CategoryTotalRow { category, total, count }| CategoryTotalResponse {
                    category,
                    total,
                    count,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn expense_serializes_camel_case_with_plain_date() {
        let row = ExpenseRow {
            id: "e-1".into(),
            user_id: "u-1".into(),
            amount: 9.5,
            category: "food".into(),
            description: None,
            date: NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
        };

        assert_eq!(
            serde_json::to_value(ExpenseResponse::from(row)).unwrap(),
            json!({
                "id": "e-1",
                "amount": 9.5,
                "category": "food",
                "description": null,
                "date": "2024-02-29",
                "userId": "u-1"
            })
        );
    }

    #[test]
    fn update_input_accepts_partial_fields() {
        let input: UpdateExpenseInput =
            serde_json::from_value(json!({ "id": "e-1", "amount": 4, "description": null }))
                .unwrap();
        let (id, patch) = input.into_parts();

        assert_eq!(id, "e-1");
        assert_eq!(patch.amount, Some(4.0));
        assert!(patch.category.is_none());
        assert!(patch.description.is_none());
    }

    #[test]
    fn empty_date_filter_means_any_date() {
        let args: ExpensesArgs =
            serde_json::from_value(json!({ "date": "", "category": "" })).unwrap();
        assert!(args.date.is_none());

        let args: ExpensesArgs = serde_json::from_value(json!({ "date": null })).unwrap();
        assert!(args.date.is_none());

        let args: ExpensesArgs = serde_json::from_value(json!({ "date": "2024-06-01" })).unwrap();
        assert_eq!(args.date, NaiveDate::from_ymd_opt(2024, 6, 1));

        assert!(serde_json::from_value::<ExpensesArgs>(json!({ "date": "June" })).is_err());
    }

    #[test]
    fn bad_dates_and_unknown_fields_are_rejected() {
        assert!(
            serde_json::from_value::<SummaryArgs>(
                json!({ "startDate": "2024-13-01", "endDate": "2024-12-31" })
            )
            .is_err()
        );
        assert!(
            serde_json::from_value::<NewExpenseInput>(
                json!({ "amount": 1, "category": "x", "date": "2024-01-01", "userId": "someone" })
            )
            .is_err()
        );
    }
}
