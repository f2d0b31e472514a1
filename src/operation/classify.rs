//! Route classification for the authentication gate.
//!
//! A request bypasses the gate only when the operation it would execute is a mutation
//! whose root fields are all registration/login. The decision is made on the parsed
//! document, never on substrings of the body, so a payload cannot claim an exemption
//! by mentioning `login` in a name, alias, argument or comment.
use crate::operation::{OperationKind, OperationRequest, parse};

/// Root mutation fields reachable without a bearer token.
pub const EXEMPT_OPERATIONS: [&str; 2] = ["register", "login"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    Exempt,
    Guarded,
}

/// Classify a raw request body. Anything that does not parse is guarded.
pub fn classify(body: &[u8]) -> RouteClass {
    let Ok(request) = serde_json::from_slice::<OperationRequest>(body) else {
        return RouteClass::Guarded;
    };
    let Ok(document) = parse(&request.query) else {
        return RouteClass::Guarded;
    };
    let Ok(operation) = document.select(request.operation_name.as_deref()) else {
        return RouteClass::Guarded;
    };

    let exempt = operation.kind == OperationKind::Mutation
        && operation
            .selection
            .iter()
            .all(|field| EXEMPT_OPERATIONS.contains(&field.name.as_str()));

    if exempt {
        RouteClass::Exempt
    } else {
        RouteClass::Guarded
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn body(query: &str) -> Vec<u8> {
        json!({ "query": query }).to_string().into_bytes()
    }

    #[test]
    fn register_and_login_are_exempt() {
        assert_eq!(
            classify(&body(r#"mutation { register(input: {name: "a", email: "a@x", password: "p"}) { token } }"#)),
            RouteClass::Exempt
        );
        assert_eq!(
            classify(&body(
                "mutation SignIn($input: LoginInput!) { login(input: $input) { token user { id } } }"
            )),
            RouteClass::Exempt
        );
    }

    #[test]
    fn expense_operations_are_guarded() {
        assert_eq!(classify(&body("{ getExpenses { id } }")), RouteClass::Guarded);
        assert_eq!(
            classify(&body(r#"mutation { deleteExpense(id: "e-1") }"#)),
            RouteClass::Guarded
        );
        assert_eq!(classify(&body("{ hello }")), RouteClass::Guarded);
    }

    #[test]
    fn mentioning_login_does_not_exempt() {
        // named after login, aliased as login, with "login" in a string and a comment
        let query = r#"
            # login
            mutation login {
              login: deleteExpense(id: "login")
            }
        "#;
        assert_eq!(classify(&body(query)), RouteClass::Guarded);
    }

    #[test]
    fn login_bundled_with_another_field_is_guarded() {
        assert_eq!(
            classify(&body(
                r#"mutation { login(input: {email: "a", password: "b"}) { token } deleteExpense(id: "e-1") }"#
            )),
            RouteClass::Guarded
        );
    }

    #[test]
    fn login_as_a_query_field_is_guarded() {
        assert_eq!(classify(&body("query { login { token } }")), RouteClass::Guarded);
    }

    #[test]
    fn selected_operation_decides_in_multi_operation_documents() {
        let query = r#"
            mutation SignIn { login(input: {email: "a", password: "b"}) { token } }
            query Mine { getExpenses { id } }
        "#;
        let pick = |name: &str| {
            json!({ "query": query, "operationName": name })
                .to_string()
                .into_bytes()
        };

        assert_eq!(classify(&pick("SignIn")), RouteClass::Exempt);
        assert_eq!(classify(&pick("Mine")), RouteClass::Guarded);
        // ambiguous without a name
        assert_eq!(classify(&body(query)), RouteClass::Guarded);
    }

    #[test]
    fn unparseable_payloads_are_guarded() {
        assert_eq!(classify(b""), RouteClass::Guarded);
        assert_eq!(classify(b"login"), RouteClass::Guarded);
        assert_eq!(classify(br#"{"query": 1}"#), RouteClass::Guarded);
        assert_eq!(classify(&body("mutation { login(")), RouteClass::Guarded);
        // batched arrays are not accepted
        assert_eq!(
            classify(br#"[{"query":"mutation { login(input: {}) { token } }"}]"#),
            RouteClass::Guarded
        );
    }
}
