/*
 * Responsibility
 * - register / login の input と AuthPayload response
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::services::auth::AuthPayload;
use crate::services::auth::account::UserProfile;

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl From<UserProfile> for UserResponse {
    fn from(user: UserProfile) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthPayloadResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserResponse,
}

impl From<AuthPayload> for AuthPayloadResponse {
    fn from(payload: AuthPayload) -> Self {
        Self {
            token: payload.token,
            expires_at: payload.expires_at,
            user: payload.user.into(),
        }
    }
}
