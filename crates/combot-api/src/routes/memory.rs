use axum::{extract::State, Json};
use std::sync::Arc;

use crate::memory::MemoryStatus;
use crate::state::AppState;

/// Memory usage of the host and the number of chat turns served
#[utoipa::path(
    get,
    path = "/api/memory-status/",
    responses(
        (status = 200, description = "Current memory status", body = MemoryStatus)
    ),
    tag = "health"
)]
pub async fn memory_status(State(state): State<Arc<AppState>>) -> Json<MemoryStatus> {
    Json(state.memory.status())
}
