pub mod accounts;
pub mod expenses;
