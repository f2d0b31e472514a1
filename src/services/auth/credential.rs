//! Password hashing (argon2id, PHC string output).
//!
//! The salt is generated per call and embedded in the PHC string, so
//! verification needs only the stored hash and the candidate password.
use argon2::password_hash::SaltString;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use thiserror::Error;

use crate::config::HashingConfig;

const SALT_BYTES: usize = 16;

#[derive(Debug, Error)]
pub enum HashingError {
    #[error("invalid argon2 parameters: {0}")]
    Params(String),
    #[error("salt generation failed: {0}")]
    Salt(String),
    #[error("password hashing failed: {0}")]
    Hash(String),
}

#[derive(Clone)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
}

impl std::fmt::Debug for CredentialHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialHasher")
            .field("params", self.argon2.params())
            .finish()
    }
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }
}

impl CredentialHasher {
    pub fn from_config(config: &HashingConfig) -> Result<Self, HashingError> {
        let defaults = Params::default();
        Self::with_params(
            config.memory_kib.unwrap_or(defaults.m_cost()),
            config.iterations.unwrap_or(defaults.t_cost()),
            config.parallelism.unwrap_or(defaults.p_cost()),
        )
    }

    pub fn with_params(
        memory_kib: u32,
        iterations: u32,
        parallelism: u32,
    ) -> Result<Self, HashingError> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| HashingError::Params(e.to_string()))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    pub fn hash(&self, password: &str) -> Result<String, HashingError> {
        let mut salt_bytes = [0u8; SALT_BYTES];
        getrandom::fill(&mut salt_bytes).map_err(|e| HashingError::Salt(e.to_string()))?;
        let salt =
            SaltString::encode_b64(&salt_bytes).map_err(|e| HashingError::Salt(e.to_string()))?;

        let phc = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| HashingError::Hash(e.to_string()))?;

        Ok(phc.to_string())
    }

    /// Never fails: a malformed hash simply does not verify.
    ///
    /// The comparison is done by the password-hash crate's verifier (constant time over the
    /// digest), not by comparing strings here.
    pub fn verify(&self, password: &str, hashed: &str) -> bool {
        match PasswordHash::new(hashed) {
            Ok(parsed) => self
                .argon2
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
pub(crate) fn cheap_hasher() -> CredentialHasher {
    CredentialHasher::with_params(1024, 1, 1).expect("valid test params")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_accepts_the_same_password() {
        let hasher = cheap_hasher();
        let hashed = hasher.hash("secret").unwrap();

        assert!(hashed.starts_with("$argon2id$"));
        assert!(hasher.verify("secret", &hashed));
    }

    #[test]
    fn hashing_twice_yields_distinct_outputs_that_both_verify() {
        let hasher = cheap_hasher();
        let a = hasher.hash("secret").unwrap();
        let b = hasher.hash("secret").unwrap();

        assert_ne!(a, b);
        assert!(hasher.verify("secret", &a));
        assert!(hasher.verify("secret", &b));
    }

    #[test]
    fn wrong_password_is_rejected() {
        let hasher = cheap_hasher();
        let hashed = hasher.hash("secret").unwrap();

        assert!(!hasher.verify("Secret", &hashed));
        assert!(!hasher.verify("", &hashed));
    }

    #[test]
    fn malformed_hash_returns_false() {
        let hasher = cheap_hasher();

        assert!(!hasher.verify("secret", ""));
        assert!(!hasher.verify("secret", "not-a-phc-string"));
        assert!(!hasher.verify("secret", "$2a$10$abcdefghijklmnopqrstuv"));
    }

    #[test]
    fn verification_reads_params_from_the_hash() {
        // a hash produced with other costs still verifies
        let stored = cheap_hasher().hash("secret").unwrap();
        let other = CredentialHasher::with_params(2048, 2, 1).unwrap();

        assert!(other.verify("secret", &stored));
    }

    #[test]
    fn invalid_params_are_reported() {
        let err = CredentialHasher::with_params(1, 1, 1).unwrap_err();
        assert!(matches!(err, HashingError::Params(_)));
    }
}
