use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::modules::management::inbound::http as management_http;
use crate::shell::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(management_http::health))
        .route("/diagnostics", get(management_http::diagnostics))
        .route("/routes", get(management_http::routes))
        .route("/statistics", get(management_http::statistics))
        .route("/inflight", get(management_http::inflight))
        .route("/backlog", get(management_http::backlog))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
