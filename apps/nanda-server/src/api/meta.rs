use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthStatus {
    #[schema(example = "ok")]
    pub status: String,
    pub name: String,
    pub uptime_sec: u64,
    pub messages: u64,
    pub rate_limit_per_min: u32,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AgentDescriptor {
    pub id: String,
    pub name: String,
}

/// Health probe with uptime and message counters.
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Meta",
    operation_id = "health_doc",
    description = "Service health, uptime, accepted message count and rate limit.",
    responses(
        (status = 200, description = "Service healthy", body = HealthStatus)
    )
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    let session = state.session().await;
    let identity = state.identity();
    Json(HealthStatus {
        status: "ok".into(),
        name: identity.service_name.clone(),
        uptime_sec: session.uptime_secs(),
        messages: session.message_count(),
        rate_limit_per_min: session.limiter().limit(),
        version: identity.version.to_string(),
    })
}

/// Static discovery listing for this agent.
#[utoipa::path(
    get,
    path = "/api/agents/list",
    tag = "Meta",
    operation_id = "agents_list_doc",
    responses(
        (status = 200, description = "Agents served by this instance", body = [AgentDescriptor])
    )
)]
pub async fn agents_list(State(state): State<AppState>) -> Json<Vec<AgentDescriptor>> {
    let identity = state.identity();
    Json(vec![AgentDescriptor {
        id: identity.agent_id.clone(),
        name: identity.agent_name.clone(),
    }])
}
