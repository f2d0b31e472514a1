/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - accounts / expenses: business services over the stores
 *   - tokens: TokenService shared by the gate and account flows
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;

use crate::repos::{ExpenseStore, UserStore};
use crate::services::auth::{AccountService, CredentialHasher, TokenService};
use crate::services::expense::ExpenseService;

#[derive(Clone, Debug)]
pub struct AppState {
    pub accounts: AccountService,
    pub expenses: ExpenseService,
    pub tokens: Arc<TokenService>,
    // upper bound for the gate's body read
    pub body_limit: usize,
}

impl AppState {
    pub fn new(
        users: Arc<dyn UserStore>,
        expenses: Arc<dyn ExpenseStore>,
        hasher: CredentialHasher,
        tokens: Arc<TokenService>,
        body_limit: usize,
    ) -> Self {
        Self {
            accounts: AccountService::new(users, hasher, tokens.clone()),
            expenses: ExpenseService::new(expenses),
            tokens,
            body_limit,
        }
    }
}

#[cfg(test)]
impl AppState {
    /// In-memory stores, cheap hashing, fixed secret.
    pub fn for_tests() -> Self {
        use crate::repos::{MemoryExpenseStore, MemoryUserStore};
        use crate::services::auth::credential::cheap_hasher;

        Self::new(
            Arc::new(MemoryUserStore::new()),
            Arc::new(MemoryExpenseStore::new()),
            cheap_hasher(),
            Arc::new(TokenService::new(b"state-test-secret", 3600)),
            1024 * 1024,
        )
    }
}
