use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::IdentityContext;

/// Extractor handing the request's IdentityContext to a handler.
///
/// Handlers trust whatever the gate stored. A request that never passed the gate
/// reads as anonymous; no token is re-checked here.
#[derive(Debug, Clone)]
pub struct Identity(pub IdentityContext);

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Identity(
            parts
                .extensions
                .get::<IdentityContext>()
                .cloned()
                .unwrap_or_else(IdentityContext::anonymous),
        ))
    }
}
