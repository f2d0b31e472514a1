pub mod account;
pub mod credential;
pub mod token;

pub use account::{AccountService, AuthPayload};
pub use credential::CredentialHasher;
pub use token::TokenService;
