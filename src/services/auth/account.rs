use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::OnceCell;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::repos::RepoError;
use crate::repos::user_repo::{NewUser, UserRow, UserStore};
use crate::services::ServiceError;
use crate::services::auth::credential::CredentialHasher;
use crate::services::auth::token::TokenService;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl From<UserRow> for UserProfile {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
        }
    }
}

/// Result of a successful register/login: the bearer token for later requests.
#[derive(Debug, Clone)]
pub struct AuthPayload {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserProfile,
}

/// Registration and login on top of the user store.
///
/// Argon2 work runs on the blocking pool so request tasks are not stalled.
#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserStore>,
    hasher: CredentialHasher,
    tokens: Arc<TokenService>,
    // checked against for unknown emails
    dummy_phc: Arc<OnceCell<String>>,
}

impl std::fmt::Debug for AccountService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountService")
            .field("hasher", &self.hasher)
            .field("tokens", &self.tokens)
            .finish()
    }
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserStore>,
        hasher: CredentialHasher,
        tokens: Arc<TokenService>,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
            dummy_phc: Arc::new(OnceCell::new()),
        }
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthPayload, ServiceError> {
        let name = name.trim();
        let email = email.trim();
        if name.is_empty() {
            return Err(ServiceError::invalid("name is required"));
        }
        if email.is_empty() {
            return Err(ServiceError::invalid("email is required"));
        }
        if password.is_empty() {
            return Err(ServiceError::invalid("password is required"));
        }

        if self.users.find_by_email(email).await?.is_some() {
            debug!("registration rejected: email already registered");
            return Err(ServiceError::UserExists);
        }

        let password_hash = self.hash_blocking(password.to_string()).await?;

        let new_user = NewUser {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            email: email.to_string(),
            password_hash,
        };

        // a concurrent registration can still win the race; the store reports it as Conflict
        let row = match self.users.create(new_user).await {
            Ok(row) => row,
            Err(RepoError::Conflict) => return Err(ServiceError::UserExists),
            Err(e) => return Err(e.into()),
        };

        info!(user_id = %row.id, "user registered");
        self.payload_for(row)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthPayload, ServiceError> {
        let Some(user) = self.users.find_by_email(email.trim()).await? else {
            let dummy = self.dummy_hash().await?;
            self.verify_blocking(password.to_string(), dummy).await?;
            debug!("login rejected: unknown email");
            return Err(ServiceError::InvalidCredentials);
        };

        if !self
            .verify_blocking(password.to_string(), user.password_hash.clone())
            .await?
        {
            debug!(user_id = %user.id, "login rejected: password mismatch");
            return Err(ServiceError::InvalidCredentials);
        }

        info!(user_id = %user.id, "user logged in");
        self.payload_for(user)
    }

    fn payload_for(&self, user: UserRow) -> Result<AuthPayload, ServiceError> {
        let issued = self
            .tokens
            .issue(&user.id)
            .map_err(|_| ServiceError::Internal)?;

        Ok(AuthPayload {
            token: issued.token,
            expires_at: issued.expires_at,
            user: user.into(),
        })
    }

    async fn dummy_hash(&self) -> Result<String, ServiceError> {
        self.dummy_phc
            .get_or_try_init(|| self.hash_blocking(Uuid::new_v4().to_string()))
            .await
            .cloned()
    }

    async fn hash_blocking(&self, password: String) -> Result<String, ServiceError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| {
                error!(error = %e, "hashing task failed");
                ServiceError::Internal
            })?
            .map_err(|e| {
                error!(error = %e, "password hashing failed");
                ServiceError::Internal
            })
    }

    async fn verify_blocking(&self, password: String, hashed: String) -> Result<bool, ServiceError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hashed))
            .await
            .map_err(|e| {
                error!(error = %e, "verification task failed");
                ServiceError::Internal
            })
    }
}
