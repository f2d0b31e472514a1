/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - /query は access gate (middleware::auth) を route_layer で掛ける
 */
use axum::{Router, routing::post};

use crate::api::v1::handlers::query::execute;
use crate::middleware;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let query = Router::new().route("/query", post(execute));

    middleware::auth::apply(query, state)
}
