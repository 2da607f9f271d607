use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Json,
};
use combot_persist::{ConversationRecord, PersistError};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;

use crate::error::{ApiError, ApiResult, ErrorBody};
use crate::state::AppState;
use crate::validation::validate_email;

const DEFAULT_LIMIT: i64 = 10;
const MAX_LIMIT: i64 = 100;

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListConversationsQuery {
    /// Participant email the conversations were saved under
    pub email: Option<String>,
    /// Maximum number of conversations (default 10, max 100)
    pub limit: Option<i64>,
}

/// List saved conversations for an email, newest first
#[utoipa::path(
    get,
    path = "/api/conversations/",
    params(ListConversationsQuery),
    responses(
        (status = 200, description = "Saved conversations", body = Vec<ConversationRecord>),
        (status = 400, description = "Missing or invalid email", body = ErrorBody)
    ),
    tag = "conversations"
)]
pub async fn list_conversations(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ListConversationsQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<ConversationRecord>>> {
    let Query(params) =
        query.map_err(|rejection| ApiError::validation(format!("Invalid query string: {}", rejection.body_text())))?;
    let email = match params.email.as_deref() {
        Some(email) if !email.trim().is_empty() => validate_email(email)?,
        _ => return Err(ApiError::invalid_field("email", "email is required")),
    };
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let conversations = state.store.list_by_email(&email, Some(limit)).await?;
    Ok(Json(conversations))
}

/// Fetch one saved conversation
#[utoipa::path(
    get,
    path = "/api/conversations/{conversation_id}",
    params(("conversation_id" = String, Path, description = "Conversation ID")),
    responses(
        (status = 200, description = "Conversation", body = ConversationRecord),
        (status = 404, description = "Conversation not found", body = ErrorBody)
    ),
    tag = "conversations"
)]
pub async fn get_conversation(
    State(state): State<Arc<AppState>>,
    Path(conversation_id): Path<String>,
) -> ApiResult<Json<ConversationRecord>> {
    match state.store.get(&conversation_id).await {
        Ok(Some(record)) => Ok(Json(record)),
        Ok(None) | Err(PersistError::InvalidId(_)) => Err(ApiError::NotFound(conversation_id)),
        Err(e) => Err(e.into()),
    }
}
