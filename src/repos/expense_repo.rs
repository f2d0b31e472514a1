/*
 * Responsibility
 * - Expense CRUD scoped by owner
 * - Single-row reads/writes match `id AND user_id` in one statement, so a foreign row and a
 *   missing row are indistinguishable to the caller
 * - Per-category aggregation over a date range
 */
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{FromRow, PgPool};

use crate::repos::error::{RepoError, RepoResult};

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct ExpenseRow {
    pub id: String,
    pub user_id: String,
    pub amount: f64,
    pub category: String,
    pub description: Option<String>,
    pub date: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct NewExpense {
    pub amount: f64,
    pub category: String,
    pub description: Option<String>,
    pub date: NaiveDate,
}

/// Partial update; `None` leaves the column as is.
#[derive(Debug, Clone, Default)]
pub struct ExpensePatch {
    pub amount: Option<f64>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default)]
pub struct ExpenseFilter {
    pub date: Option<NaiveDate>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct CategoryTotalRow {
    pub category: String,
    pub total: f64,
    pub count: i64,
}

#[async_trait]
pub trait ExpenseStore: Send + Sync {
    async fn create(&self, id: &str, owner_id: &str, new: NewExpense) -> RepoResult<ExpenseRow>;

    async fn get(&self, id: &str, owner_id: &str) -> RepoResult<Option<ExpenseRow>>;

    async fn list(&self, owner_id: &str, filter: &ExpenseFilter) -> RepoResult<Vec<ExpenseRow>>;

    async fn update(
        &self,
        id: &str,
        owner_id: &str,
        patch: ExpensePatch,
    ) -> RepoResult<Option<ExpenseRow>>;

    async fn delete(&self, id: &str, owner_id: &str) -> RepoResult<bool>;

    /// Totals per category for `start..=end`, ordered by category.
    async fn summarize(
        &self,
        owner_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepoResult<Vec<CategoryTotalRow>>;
}

#[derive(Clone, Debug)]
pub struct PgExpenseStore {
    pool: PgPool,
}

impl PgExpenseStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ExpenseStore for PgExpenseStore {
    async fn create(&self, id: &str, owner_id: &str, new: NewExpense) -> RepoResult<ExpenseRow> {
        let row = sqlx::query_as::<_, ExpenseRow>(
            r#"
            INSERT INTO expenses (id, user_id, amount, category, description, date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, amount, category, description, date
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(new.amount)
        .bind(&new.category)
        .bind(&new.description)
        .bind(new.date)
        .fetch_one(&self.pool)
        .await
        .map_err(RepoError::from_sqlx)?;

        Ok(row)
    }

    async fn get(&self, id: &str, owner_id: &str) -> RepoResult<Option<ExpenseRow>> {
        let row = sqlx::query_as::<_, ExpenseRow>(
            r#"
            SELECT id, user_id, amount, category, description, date
            FROM expenses
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn list(&self, owner_id: &str, filter: &ExpenseFilter) -> RepoResult<Vec<ExpenseRow>> {
        // NULL filters match everything
        let rows = sqlx::query_as::<_, ExpenseRow>(
            r#"
            SELECT id, user_id, amount, category, description, date
            FROM expenses
            WHERE user_id = $1
                AND ($2::date IS NULL OR date = $2)
                AND ($3::text IS NULL OR category = $3)
            ORDER BY date DESC, created_at DESC
            "#,
        )
        .bind(owner_id)
        .bind(filter.date)
        .bind(&filter.category)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn update(
        &self,
        id: &str,
        owner_id: &str,
        patch: ExpensePatch,
    ) -> RepoResult<Option<ExpenseRow>> {
        let row = sqlx::query_as::<_, ExpenseRow>(
            r#"
            UPDATE expenses
            SET
                amount = COALESCE($3, amount),
                category = COALESCE($4, category),
                description = COALESCE($5, description),
                date = COALESCE($6, date)
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, amount, category, description, date
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(patch.amount)
        .bind(&patch.category)
        .bind(&patch.description)
        .bind(patch.date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn delete(&self, id: &str, owner_id: &str) -> RepoResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM expenses
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn summarize(
        &self,
        owner_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepoResult<Vec<CategoryTotalRow>> {
        let rows = sqlx::query_as::<_, CategoryTotalRow>(
            r#"
            SELECT
                category,
                SUM(amount)::float8 AS total,
                COUNT(*) AS count
            FROM expenses
            WHERE user_id = $1 AND date BETWEEN $2 AND $3
            GROUP BY category
            ORDER BY category
            "#,
        )
        .bind(owner_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
