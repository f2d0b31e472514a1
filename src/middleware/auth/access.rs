//! Request classification and bearer-token gate for the query endpoint.
//!
//! Flow per request:
//! 1. Buffer the body (bounded by `AppState::body_limit`) and classify it.
//! 2. Exempt (register/login mutation): attach an anonymous `IdentityContext`.
//! 3. Guarded: `Authorization: Bearer <token>` → `TokenService::verify` → subject id.
//!    Any failure answers 401 and the handler never runs.
//! 4. Rebuild the request from the buffered bytes so the handler reads the same body.

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderMap, Request, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use crate::api::v1::extractors::IdentityContext;
use crate::error::envelope;
use crate::operation::{RouteClass, classify};
use crate::services::auth::TokenService;
use crate::state::AppState;

const BEARER_PREFIX: &str = "Bearer ";

/// Apply the gate to every route of `router`.
///
/// ```ignore
/// let query = Router::new().route("/query", post(execute));
/// let query = middleware::auth::apply(query, state);
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // from_fn cannot take State in axum 0.8; pass it explicitly
    router.route_layer(middleware::from_fn_with_state(state, access_middleware))
}

/// Why a guarded request was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    MissingAuthHeader,
    InvalidOrExpiredToken,
    MissingSubjectClaim,
}

impl AuthRejection {
    pub fn message(&self) -> &'static str {
        match self {
            Self::MissingAuthHeader => "Missing or invalid Authorization header",
            Self::InvalidOrExpiredToken => "Invalid or expired token",
            Self::MissingSubjectClaim => "Missing user ID in token",
        }
    }

    fn reason(&self) -> &'static str {
        match self {
            Self::MissingAuthHeader => "missing_auth_header",
            Self::InvalidOrExpiredToken => "invalid_or_expired_token",
            Self::MissingSubjectClaim => "missing_subject_claim",
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        envelope(StatusCode::UNAUTHORIZED, self.message())
    }
}

/// Resolve the caller's identity from request headers.
pub fn authorize(
    headers: &HeaderMap,
    tokens: &TokenService,
) -> Result<IdentityContext, AuthRejection> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix(BEARER_PREFIX))
        .ok_or(AuthRejection::MissingAuthHeader)?;

    // causes stay internal; the client sees one message for all of them
    let subject = tokens.verify(token).map_err(|cause| {
        debug!(%cause, "token verification failed");
        AuthRejection::InvalidOrExpiredToken
    })?;

    if subject.trim().is_empty() {
        return Err(AuthRejection::MissingSubjectClaim);
    }

    Ok(IdentityContext::authenticated(subject))
}

async fn access_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let (parts, body) = req.into_parts();

    let bytes = match axum::body::to_bytes(body, state.body_limit).await {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(error = %err, "failed to buffer request body");
            return envelope(StatusCode::PAYLOAD_TOO_LARGE, "request body too large");
        }
    };

    let class = classify(&bytes);

    let identity = match class {
        RouteClass::Exempt => {
            debug!("exempt operation; skipping bearer check");
            IdentityContext::anonymous()
        }
        RouteClass::Guarded => match authorize(&parts.headers, &state.tokens) {
            Ok(identity) => identity,
            Err(rejection) => {
                warn!(reason = rejection.reason(), "request rejected");
                return rejection.into_response();
            }
        },
    };

    let mut req = Request::from_parts(parts, Body::from(bytes));
    req.extensions_mut().insert(identity);

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::{Extension, routing::post};
    use chrono::{Duration, Utc};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::api::v1::extractors::Identity;

    #[derive(Clone, Default)]
    struct Spy(Arc<AtomicUsize>);

    impl Spy {
        fn calls(&self) -> usize {
            self.0.load(Ordering::SeqCst)
        }
    }

    // echoes the owner id and the body it received
    async fn spy_handler(
        Extension(spy): Extension<Spy>,
        Identity(identity): Identity,
        body: String,
    ) -> String {
        spy.0.fetch_add(1, Ordering::SeqCst);
        format!("{}|{}", identity.owner_id(), body)
    }

    fn gated_app(state: AppState, spy: Spy) -> Router {
        let router = Router::new().route("/query", post(spy_handler));
        apply(router, state.clone())
            .layer(Extension(spy))
            .with_state(state)
    }

    fn request(body: &Value, auth: Option<&str>) -> Request<Body> {
        let mut builder = Request::post("/query").header(header::CONTENT_TYPE, "application/json");
        if let Some(value) = auth {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn read(res: Response) -> (StatusCode, String) {
        let status = res.status();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn guarded_body() -> Value {
        json!({ "query": "{ getExpenses { id } }" })
    }

    fn error_message(body: &str) -> String {
        let v: Value = serde_json::from_str(body).unwrap();
        v["errors"][0]["message"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn missing_header_is_rejected_without_calling_handler() {
        let spy = Spy::default();
        let app = gated_app(AppState::for_tests(), spy.clone());

        let (status, body) = read(app.oneshot(request(&guarded_body(), None)).await.unwrap()).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(error_message(&body), "Missing or invalid Authorization header");
        assert_eq!(spy.calls(), 0);
    }

    #[tokio::test]
    async fn wrong_scheme_is_treated_as_missing_header() {
        let spy = Spy::default();
        let state = AppState::for_tests();
        let token = state.tokens.issue("u-1").unwrap().token;
        let app = gated_app(state, spy.clone());

        let (status, body) = read(
            app.oneshot(request(&guarded_body(), Some(&format!("Token {token}"))))
                .await
                .unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(error_message(&body), "Missing or invalid Authorization header");
        assert_eq!(spy.calls(), 0);
    }

    #[tokio::test]
    async fn forged_and_expired_tokens_share_one_message() {
        let state = AppState::for_tests();
        let valid = state.tokens.issue("u-1").unwrap().token;
        let forged = TokenService::new(b"some-other-secret", 3600)
            .issue("u-1")
            .unwrap()
            .token;
        let expired = state
            .tokens
            .issue_at("u-1", Utc::now() - Duration::days(30))
            .unwrap()
            .token;

        for token in [forged, expired, format!("{valid}x"), "garbage".to_string()] {
            let spy = Spy::default();
            let app = gated_app(state.clone(), spy.clone());
            let (status, body) = read(
                app.oneshot(request(&guarded_body(), Some(&format!("Bearer {token}"))))
                    .await
                    .unwrap(),
            )
            .await;

            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(error_message(&body), "Invalid or expired token");
            assert_eq!(spy.calls(), 0);
        }
    }

    #[tokio::test]
    async fn empty_subject_is_rejected_as_missing_user_id() {
        let spy = Spy::default();
        let state = AppState::for_tests();
        let token = state.tokens.issue("").unwrap().token;
        let app = gated_app(state, spy.clone());

        let (status, body) = read(
            app.oneshot(request(&guarded_body(), Some(&format!("Bearer {token}"))))
                .await
                .unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(error_message(&body), "Missing user ID in token");
        assert_eq!(spy.calls(), 0);
    }

    #[tokio::test]
    async fn valid_token_reaches_handler_with_subject_and_intact_body() {
        let spy = Spy::default();
        let state = AppState::for_tests();
        let token = state.tokens.issue("u-42").unwrap().token;
        let app = gated_app(state, spy.clone());
        let payload = guarded_body();

        let (status, body) = read(
            app.oneshot(request(&payload, Some(&format!("Bearer {token}"))))
                .await
                .unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, format!("u-42|{payload}"));
        assert_eq!(spy.calls(), 1);
    }

    #[tokio::test]
    async fn login_bypasses_the_gate_and_keeps_the_body() {
        let spy = Spy::default();
        let app = gated_app(AppState::for_tests(), spy.clone());
        let payload = json!({
            "query": "mutation Login($input: LoginInput!) { login(input: $input) { token } }",
            "variables": { "input": { "email": "a@x.com", "password": "secret" } }
        });

        let (status, body) = read(app.oneshot(request(&payload, None)).await.unwrap()).await;

        assert_eq!(status, StatusCode::OK);
        // anonymous owner, untouched payload
        assert_eq!(body, format!("|{payload}"));
        assert_eq!(spy.calls(), 1);
    }

    #[tokio::test]
    async fn exempt_request_ignores_a_bad_header() {
        let spy = Spy::default();
        let app = gated_app(AppState::for_tests(), spy.clone());
        let payload = json!({ "query": r#"mutation { register(input: {name: "A", email: "a@x", password: "p"}) { token } }"# });

        let (status, _) = read(
            app.oneshot(request(&payload, Some("Bearer not-a-token")))
                .await
                .unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(spy.calls(), 1);
    }

    #[tokio::test]
    async fn masquerading_payload_is_still_guarded() {
        let spy = Spy::default();
        let app = gated_app(AppState::for_tests(), spy.clone());
        let payload = json!({ "query": r#"mutation login { login: deleteExpense(id: "login") }"# });

        let (status, _) = read(app.oneshot(request(&payload, None)).await.unwrap()).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(spy.calls(), 0);
    }

    #[tokio::test]
    async fn oversized_body_is_refused() {
        let spy = Spy::default();
        let mut state = AppState::for_tests();
        state.body_limit = 16;
        let app = gated_app(state, spy.clone());

        let (status, _) = read(app.oneshot(request(&guarded_body(), None)).await.unwrap()).await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(spy.calls(), 0);
    }
}
