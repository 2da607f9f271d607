use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use combot_types::EndpointType;
use serde_json::Value;
use std::sync::Arc;

use crate::chat::{handle_turn, ChatReply};
use crate::error::{ApiResult, ErrorBody};
use crate::middleware::Session;
use crate::state::AppState;
use crate::validation::{json_body, validate_turn, ChatTurnRequest};

async fn run(
    state: &AppState,
    session: &Session,
    endpoint: EndpointType,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<ChatReply>> {
    let body = json_body(payload)?;
    let turn = validate_turn(&body)?;
    let reply = handle_turn(state, session, endpoint, turn).await?;
    Ok(Json(reply))
}

/// Chat turn on the general endpoint
#[utoipa::path(
    post,
    path = "/api/chatbot/",
    request_body = ChatTurnRequest,
    responses(
        (status = 200, description = "Bot reply", body = ChatReply),
        (status = 400, description = "Invalid payload", body = ErrorBody),
        (status = 503, description = "Classifier busy or memory pressure", body = ErrorBody)
    ),
    tag = "chat"
)]
pub async fn chatbot_turn(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<ChatReply>> {
    run(&state, &session, EndpointType::General, payload).await
}

/// Chat turn on the Lulu endpoint
#[utoipa::path(
    post,
    path = "/api/lulu/",
    request_body = ChatTurnRequest,
    responses(
        (status = 200, description = "Bot reply", body = ChatReply),
        (status = 400, description = "Invalid payload", body = ErrorBody),
        (status = 503, description = "Classifier busy or memory pressure", body = ErrorBody)
    ),
    tag = "chat"
)]
pub async fn lulu_turn(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<ChatReply>> {
    run(&state, &session, EndpointType::Lulu, payload).await
}

/// Chat turn routed to the endpoint family assigned to the session
#[utoipa::path(
    post,
    path = "/api/random/",
    request_body = ChatTurnRequest,
    responses(
        (status = 200, description = "Bot reply", body = ChatReply),
        (status = 400, description = "Invalid payload", body = ErrorBody),
        (status = 503, description = "Classifier busy or memory pressure", body = ErrorBody)
    ),
    tag = "chat"
)]
pub async fn random_turn(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<ChatReply>> {
    let endpoint = session.data().await.endpoint_type.unwrap_or_default();
    run(&state, &session, endpoint, payload).await
}
