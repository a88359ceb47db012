//! HTTP Handlers

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::service::RoleService;
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub server: String,
    pub version: String,
    pub provider: String,
    pub model: String,
}

/// Build the HTTP router: `/health` plus the MCP endpoint at `/mcp`
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mcp = RoleService::new(state.clone()).http_service();

    Router::new()
        .route("/health", get(health_check))
        .nest_service("/mcp", mcp)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        server: state.server.name.clone(),
        version: state.server.version.clone(),
        provider: state.provider.name.clone(),
        model: state.provider.model.clone(),
    })
}
