pub mod auth;
pub mod error;
pub mod expense;

pub use error::ServiceError;
