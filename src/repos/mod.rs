pub mod error;
pub mod expense_repo;
pub mod memory;
pub mod user_repo;

pub use error::RepoError;
pub use expense_repo::{ExpenseStore, PgExpenseStore};
pub use memory::{MemoryExpenseStore, MemoryUserStore};
pub use user_repo::{PgUserStore, UserStore};
