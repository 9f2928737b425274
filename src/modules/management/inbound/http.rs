// Read-only management endpoints over the running route context.

use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;
use serde_json::json;

use crate::shared::infrastructure::engine::context::{ContextStatus, RouteInfo};
use crate::shell::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutesResponse {
    pub context: String,
    pub status: ContextStatus,
    pub routes: Vec<RouteInfo>,
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let status = state.context.status().await;
    let health = if status == ContextStatus::Started {
        "UP"
    } else {
        "DOWN"
    };
    Json(json!({ "status": health, "context": status.as_str() }))
}

pub async fn diagnostics(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.context.diagnostics_settings())
}

pub async fn routes(State(state): State<AppState>) -> impl IntoResponse {
    Json(RoutesResponse {
        context: state.context.name().to_string(),
        status: state.context.status().await,
        routes: state.context.route_infos().await,
    })
}

pub async fn statistics(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.context.statistics_snapshot().await)
}

pub async fn inflight(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.context.inflight_repository().browse().await)
}

pub async fn backlog(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.context.backlog_tracer().dump_all().await)
}
