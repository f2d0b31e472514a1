//! In-process stores.
//!
//! Used when no DATABASE_URL is configured and by tests. Same contracts as the Postgres
//! stores: owner-scoped single-row access and email uniqueness.
use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;

use crate::repos::error::{RepoError, RepoResult};
use crate::repos::expense_repo::{
    CategoryTotalRow, ExpenseFilter, ExpensePatch, ExpenseRow, ExpenseStore, NewExpense,
};
use crate::repos::user_repo::{NewUser, UserRow, UserStore};

#[derive(Debug, Default)]
pub struct MemoryUserStore {
    // keyed by email
    users: RwLock<HashMap<String, UserRow>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<UserRow>> {
        Ok(self.users.read().await.get(email).cloned())
    }

    async fn create(&self, user: NewUser) -> RepoResult<UserRow> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.email) {
            return Err(RepoError::Conflict);
        }

        let row = UserRow {
            id: user.id,
            name: user.name,
            email: user.email.clone(),
            password_hash: user.password_hash,
        };
        users.insert(user.email, row.clone());
        Ok(row)
    }
}

#[derive(Debug, Default)]
pub struct MemoryExpenseStore {
    inner: RwLock<ExpenseTable>,
}

#[derive(Debug, Default)]
struct ExpenseTable {
    next_seq: u64,
    // id -> (insertion sequence, row)
    rows: HashMap<String, (u64, ExpenseRow)>,
}

impl MemoryExpenseStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn owned<'a>(table: &'a ExpenseTable, id: &str, owner_id: &str) -> Option<&'a ExpenseRow> {
    table
        .rows
        .get(id)
        .map(|(_, row)| row)
        .filter(|row| row.user_id == owner_id)
}

#[async_trait]
impl ExpenseStore for MemoryExpenseStore {
    async fn create(&self, id: &str, owner_id: &str, new: NewExpense) -> RepoResult<ExpenseRow> {
        let mut table = self.inner.write().await;
        if table.rows.contains_key(id) {
            return Err(RepoError::Conflict);
        }

        let row = ExpenseRow {
            id: id.to_string(),
            user_id: owner_id.to_string(),
            amount: new.amount,
            category: new.category,
            description: new.description,
            date: new.date,
        };
        let seq = table.next_seq;
        table.next_seq += 1;
        table.rows.insert(row.id.clone(), (seq, row.clone()));
        Ok(row)
    }

    async fn get(&self, id: &str, owner_id: &str) -> RepoResult<Option<ExpenseRow>> {
        let table = self.inner.read().await;
        Ok(owned(&table, id, owner_id).cloned())
    }

    async fn list(&self, owner_id: &str, filter: &ExpenseFilter) -> RepoResult<Vec<ExpenseRow>> {
        let table = self.inner.read().await;
        let mut rows: Vec<(u64, ExpenseRow)> = table
            .rows
            .values()
            .filter(|(_, row)| row.user_id == owner_id)
            .filter(|(_, row)| filter.date.is_none_or(|d| row.date == d))
            .filter(|(_, row)| {
                filter
                    .category
                    .as_deref()
                    .is_none_or(|c| row.category == c)
            })
            .cloned()
            .collect();

        // newest date first, then newest insert first
        rows.sort_by(|(sa, a), (sb, b)| b.date.cmp(&a.date).then(sb.cmp(sa)));
        Ok(rows.into_iter().map(|(_, row)| row).collect())
    }

    async fn update(
        &self,
        id: &str,
        owner_id: &str,
        patch: ExpensePatch,
    ) -> RepoResult<Option<ExpenseRow>> {
        let mut table = self.inner.write().await;
        let Some((_, row)) = table
            .rows
            .get_mut(id)
            .filter(|(_, row)| row.user_id == owner_id)
        else {
            return Ok(None);
        };

        if let Some(amount) = patch.amount {
            row.amount = amount;
        }
        if let Some(category) = patch.category {
            row.category = category;
        }
        if let Some(description) = patch.description {
            row.description = Some(description);
        }
        if let Some(date) = patch.date {
            row.date = date;
        }

        Ok(Some(row.clone()))
    }

    async fn delete(&self, id: &str, owner_id: &str) -> RepoResult<bool> {
        let mut table = self.inner.write().await;
        if owned(&table, id, owner_id).is_none() {
            return Ok(false);
        }
        Ok(table.rows.remove(id).is_some())
    }

    async fn summarize(
        &self,
        owner_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepoResult<Vec<CategoryTotalRow>> {
        let table = self.inner.read().await;
        let mut by_category: BTreeMap<&str, (f64, i64)> = BTreeMap::new();

        for (_, row) in table.rows.values() {
            if row.user_id != owner_id || row.date < start || row.date > end {
                continue;
            }
            let entry = by_category.entry(row.category.as_str()).or_default();
            entry.0 += row.amount;
            entry.1 += 1;
        }

        Ok(by_category
            .into_iter()
            .map(|(category, (total, count))| CategoryTotalRow {
                category: category.to_string(),
                total,
                count,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn expense(amount: f64, category: &str, date: NaiveDate) -> NewExpense {
        NewExpense {
            amount,
            category: category.to_string(),
            description: None,
            date,
        }
    }

    #[tokio::test]
    async fn duplicate_email_conflicts_and_keeps_first_record() {
        let store = MemoryUserStore::new();
        let first = NewUser {
            id: "u-1".into(),
            name: "A".into(),
            email: "a@x.com".into(),
            password_hash: "hash-1".into(),
        };
        store.create(first).await.unwrap();

        let second = NewUser {
            id: "u-2".into(),
            name: "B".into(),
            email: "a@x.com".into(),
            password_hash: "hash-2".into(),
        };
        assert!(matches!(store.create(second).await, Err(RepoError::Conflict)));

        let kept = store.find_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(kept.id, "u-1");
        assert_eq!(kept.password_hash, "hash-1");
    }

    #[tokio::test]
    async fn single_row_access_is_owner_scoped() {
        let store = MemoryExpenseStore::new();
        store
            .create("e-1", "alice", expense(10.0, "food", day(1)))
            .await
            .unwrap();

        assert!(store.get("e-1", "bob").await.unwrap().is_none());
        assert!(store.get("e-1", "").await.unwrap().is_none());
        assert!(
            store
                .update("e-1", "bob", ExpensePatch { amount: Some(1.0), ..Default::default() })
                .await
                .unwrap()
                .is_none()
        );
        assert!(!store.delete("e-1", "bob").await.unwrap());

        let row = store.get("e-1", "alice").await.unwrap().unwrap();
        assert_eq!(row.amount, 10.0);
    }

    #[tokio::test]
    async fn list_filters_and_orders_newest_first() {
        let store = MemoryExpenseStore::new();
        store.create("e-1", "alice", expense(1.0, "food", day(1))).await.unwrap();
        store.create("e-2", "alice", expense(2.0, "rent", day(3))).await.unwrap();
        store.create("e-3", "alice", expense(3.0, "food", day(3))).await.unwrap();
        store.create("e-4", "bob", expense(4.0, "food", day(3))).await.unwrap();

        let all = store.list("alice", &ExpenseFilter::default()).await.unwrap();
        let ids: Vec<_> = all.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["e-3", "e-2", "e-1"]);

        let food_on_3rd = store
            .list(
                "alice",
                &ExpenseFilter {
                    date: Some(day(3)),
                    category: Some("food".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(food_on_3rd.len(), 1);
        assert_eq!(food_on_3rd[0].id, "e-3");
    }

    #[tokio::test]
    async fn summarize_groups_by_category_within_inclusive_range() {
        let store = MemoryExpenseStore::new();
        store.create("e-1", "alice", expense(1.5, "food", day(1))).await.unwrap();
        store.create("e-2", "alice", expense(2.5, "food", day(5))).await.unwrap();
        store.create("e-3", "alice", expense(100.0, "rent", day(5))).await.unwrap();
        store.create("e-4", "alice", expense(9.0, "food", day(6))).await.unwrap();
        store.create("e-5", "bob", expense(7.0, "food", day(2))).await.unwrap();

        let totals = store.summarize("alice", day(1), day(5)).await.unwrap();
        assert_eq!(
            totals,
            vec![
                CategoryTotalRow { category: "food".into(), total: 4.0, count: 2 },
                CategoryTotalRow { category: "rent".into(), total: 100.0, count: 1 },
            ]
        );
    }
}
