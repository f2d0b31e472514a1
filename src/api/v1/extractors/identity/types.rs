/*
 * Responsibility
 * - The identity value handlers see: either a verified subject id or nobody
 *
 * Notes
 * - Token verification lives in the gate middleware; this type is only the contract
 * - One instance per request; never shared or persisted
 */

/// Identity attached to a single request.
///
/// Populated by the access gate after a successful token check, or synthesized as
/// anonymous for exempt operations (register/login).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityContext {
    subject: Option<String>,
}

impl IdentityContext {
    pub fn anonymous() -> Self {
        Self { subject: None }
    }

    pub fn authenticated(subject: impl Into<String>) -> Self {
        Self {
            subject: Some(subject.into()),
        }
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.subject.is_some()
    }

    /// Owner id used to scope data access.
    ///
    /// Anonymous callers map to the empty string, which owns no rows. Owner-scoped
    /// operations are only safe because they are reachable through the gated path.
    pub fn owner_id(&self) -> &str {
        self.subject.as_deref().unwrap_or("")
    }
}
