/*
 * Responsibility
 * - Expense operations on behalf of an identity
 * - The owner id always comes from IdentityContext; nothing here re-checks tokens
 */
use std::sync::Arc;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::api::v1::extractors::IdentityContext;
use crate::repos::expense_repo::{
    CategoryTotalRow, ExpenseFilter, ExpensePatch, ExpenseRow, ExpenseStore, NewExpense,
};
use crate::services::ServiceError;

#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseSummary {
    pub total_amount: f64,
    pub total_count: i64,
    pub by_category: Vec<CategoryTotalRow>,
}

#[derive(Clone)]
pub struct ExpenseService {
    store: Arc<dyn ExpenseStore>,
}

impl std::fmt::Debug for ExpenseService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpenseService").finish_non_exhaustive()
    }
}

fn validate_amount(amount: f64) -> Result<(), ServiceError> {
    if !amount.is_finite() {
        return Err(ServiceError::invalid("amount must be a finite number"));
    }
    Ok(())
}

fn validate_category(category: &str) -> Result<(), ServiceError> {
    if category.trim().is_empty() {
        return Err(ServiceError::invalid("category cannot be empty"));
    }
    Ok(())
}

impl ExpenseService {
    pub fn new(store: Arc<dyn ExpenseStore>) -> Self {
        Self { store }
    }

    pub async fn add(
        &self,
        identity: &IdentityContext,
        new: NewExpense,
    ) -> Result<ExpenseRow, ServiceError> {
        validate_amount(new.amount)?;
        validate_category(&new.category)?;

        let id = Uuid::new_v4().to_string();
        Ok(self.store.create(&id, identity.owner_id(), new).await?)
    }

    pub async fn get(
        &self,
        identity: &IdentityContext,
        id: &str,
    ) -> Result<ExpenseRow, ServiceError> {
        self.store
            .get(id, identity.owner_id())
            .await?
            .ok_or(ServiceError::ExpenseNotFound)
    }

    pub async fn list(
        &self,
        identity: &IdentityContext,
        filter: ExpenseFilter,
    ) -> Result<Vec<ExpenseRow>, ServiceError> {
        // an empty category filter means "any"
        let filter = ExpenseFilter {
            category: filter.category.filter(|c| !c.is_empty()),
            ..filter
        };
        Ok(self.store.list(identity.owner_id(), &filter).await?)
    }

    pub async fn update(
        &self,
        identity: &IdentityContext,
        id: &str,
        patch: ExpensePatch,
    ) -> Result<ExpenseRow, ServiceError> {
        if let Some(amount) = patch.amount {
            validate_amount(amount)?;
        }
        if let Some(category) = &patch.category {
            validate_category(category)?;
        }

        self.store
            .update(id, identity.owner_id(), patch)
            .await?
            .ok_or(ServiceError::ExpenseNotFound)
    }

    pub async fn delete(&self, identity: &IdentityContext, id: &str) -> Result<bool, ServiceError> {
        if self.store.delete(id, identity.owner_id()).await? {
            Ok(true)
        } else {
            Err(ServiceError::ExpenseNotFound)
        }
    }

    pub async fn summary(
        &self,
        identity: &IdentityContext,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<ExpenseSummary, ServiceError> {
        if start > end {
            return Err(ServiceError::invalid("startDate must not be after endDate"));
        }

        let by_category = self.store.summarize(identity.owner_id(), start, end).await?;
        let total_amount = by_category.iter().map(|c| c.total).sum();
        let total_count = by_category.iter().map(|c| c.count).sum();

        Ok(ExpenseSummary {
            total_amount,
            total_count,
            by_category,
        })
    }
}
