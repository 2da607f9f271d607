use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::{error::ApiResult, state::AppState};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// `healthy`, or `degraded` when a backing service is unreachable
    pub status: String,
    pub version: String,
    pub services: HashMap<String, String>,
}

/// Health check endpoint
///
/// Reports the conversation store, the cache backend and the classifier pool.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service health", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> ApiResult<Json<HealthResponse>> {
    let mut services = HashMap::new();
    let mut healthy = true;

    let store = state.store.backend();
    match state.store.ping().await {
        Ok(()) => services.insert("store".to_string(), format!("{store}: connected")),
        Err(e) => {
            tracing::warn!(backend = store, "Conversation store unreachable: {}", e);
            healthy = false;
            services.insert("store".to_string(), format!("{store}: disconnected"))
        }
    };

    let cache = state.sessions.store();
    match cache.ping().await {
        Ok(()) => services.insert("cache".to_string(), format!("{}: connected", cache.backend())),
        Err(e) => {
            tracing::warn!(backend = cache.backend(), "Cache unreachable: {}", e);
            healthy = false;
            services.insert("cache".to_string(), format!("{}: disconnected", cache.backend()))
        }
    };

    let ml = state.ml.status().await;
    services.insert(
        "classifier".to_string(),
        format!(
            "{}/{} models loaded, {}/{} requests active",
            ml.pool.active_models, ml.pool.max_models, ml.active_requests, ml.max_concurrent
        ),
    );

    Ok(Json(HealthResponse {
        status: if healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        services,
    }))
}
