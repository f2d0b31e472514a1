use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

/// Internal verification outcomes.
///
/// Callers must not surface the variant: every case is reported to clients as one
/// "invalid or expired token" outcome.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("signature mismatch")]
    BadSignature,
    #[error("token expired")]
    Expired,
    #[error("missing or non-string subject claim")]
    MissingSubject,
}

// ten years; keeps `now + ttl` far from chrono's range limits
const MAX_TTL_SECONDS: i64 = 10 * 365 * 24 * 60 * 60;

#[derive(Debug, Error)]
#[error("failed to sign identity token")]
pub struct SigningError;

#[derive(Debug, Serialize)]
struct IdentityClaims<'a> {
    sub: &'a str,
    iat: i64,
    exp: i64,
}

// `sub` is kept loose so a wrongly-typed claim is distinguishable from a bad signature.
#[derive(Debug, Deserialize)]
struct PresentedClaims {
    #[serde(default)]
    sub: Option<serde_json::Value>,
    exp: i64,
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// HS256 identity-token issuer and verifier.
///
/// Stateless: nothing about issued tokens is stored, so a token stays valid until its `exp`.
/// The secret is fixed at construction; rotating it invalidates every outstanding token.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("TokenService")
            .field("ttl_seconds", &self.ttl.num_seconds())
            .finish()
    }
}

impl TokenService {
    pub fn new(secret: &[u8], ttl_seconds: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // expiry is checked against the caller-supplied instant in `verify_at`
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.validate_aud = false;

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl: Duration::seconds(
                i64::try_from(ttl_seconds)
                    .unwrap_or(MAX_TTL_SECONDS)
                    .min(MAX_TTL_SECONDS),
            ),
        }
    }

    pub fn ttl_seconds(&self) -> i64 {
        self.ttl.num_seconds()
    }

    pub fn issue(&self, subject_id: &str) -> Result<IssuedToken, SigningError> {
        self.issue_at(subject_id, Utc::now())
    }

    pub fn issue_at(
        &self,
        subject_id: &str,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, SigningError> {
        let expires_at = now + self.ttl;
        let claims = IdentityClaims {
            sub: subject_id,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let header = Header::new(Algorithm::HS256);
        let token = jsonwebtoken::encode(&header, &claims, &self.encoding_key).map_err(|e| {
            error!(error = %e, "failed to sign identity token");
            SigningError
        })?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Verify signature, structure, expiry and subject; returns the subject id.
    pub fn verify(&self, token: &str) -> Result<String, TokenError> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<String, TokenError> {
        let data =
            jsonwebtoken::decode::<PresentedClaims>(token, &self.decoding_key, &self.validation)
                .map_err(|e| match e.kind() {
                    ErrorKind::InvalidSignature => TokenError::BadSignature,
                    ErrorKind::ExpiredSignature => TokenError::Expired,
                    _ => TokenError::Malformed,
                })?;

        if data.claims.exp <= now.timestamp() {
            return Err(TokenError::Expired);
        }

        match data.claims.sub {
            Some(serde_json::Value::String(sub)) => Ok(sub),
            _ => Err(TokenError::MissingSubject),
        }
    }
}
