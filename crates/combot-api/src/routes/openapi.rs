use axum::Json;
use utoipa::OpenApi;

use crate::chat::ChatReply;
use crate::error::ErrorBody;
use crate::memory::{MemoryHealth, MemoryStatus};
use crate::routes::{chat, conversations, health, memory, scenario};
use crate::validation::ChatTurnRequest;
use combot_persist::ConversationRecord;
use combot_types::{Brand, ChatLogEntry, EndpointType, Level, MessageTypeEntry, ProblemType, Scenario, ScenarioPatch};

#[derive(OpenApi)]
#[openapi(
    info(title = "Combot API", description = "Customer-service chatbot backend"),
    paths(
        health::health_check,
        memory::memory_status,
        chat::chatbot_turn,
        chat::lulu_turn,
        chat::random_turn,
        scenario::chatbot_initial,
        scenario::lulu_initial,
        scenario::random_initial,
        scenario::chatbot_closing,
        scenario::lulu_closing,
        scenario::random_closing,
        scenario::random_endpoint_assign,
        scenario::reset_session,
        conversations::list_conversations,
        conversations::get_conversation,
    ),
    components(schemas(
        health::HealthResponse,
        MemoryStatus,
        MemoryHealth,
        ChatTurnRequest,
        ChatReply,
        ErrorBody,
        scenario::InitialResponse,
        scenario::MessageResponse,
        scenario::RandomEndpointResponse,
        scenario::ResetResponse,
        ConversationRecord,
        ChatLogEntry,
        MessageTypeEntry,
        Scenario,
        ScenarioPatch,
        Brand,
        ProblemType,
        Level,
        EndpointType,
    )),
    tags(
        (name = "health", description = "Liveness and memory"),
        (name = "chat", description = "Conversation turns"),
        (name = "scenario", description = "Greetings, closings and session assignment"),
        (name = "conversations", description = "Saved transcripts"),
    )
)]
pub struct ApiDoc;

/// OpenAPI document for the whole API
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
