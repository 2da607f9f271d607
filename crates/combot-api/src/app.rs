use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{logging, session};
use crate::routes::{chat, conversations, health, memory, openapi, scenario};
use crate::state::AppState;

/// Full application router with middleware
pub fn build_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Health
        .route("/health", get(health::health_check))
        .route("/api/memory-status/", get(memory::memory_status))
        // General endpoint
        .route("/api/chatbot/", post(chat::chatbot_turn))
        .route("/api/chatbot/initial/", get(scenario::chatbot_initial))
        .route("/api/chatbot/closing/", get(scenario::chatbot_closing))
        // Lulu endpoint
        .route("/api/lulu/", post(chat::lulu_turn))
        .route("/api/lulu/initial/", get(scenario::lulu_initial))
        .route("/api/lulu/closing/", get(scenario::lulu_closing))
        // Randomized assignment
        .route(
            "/api/random/",
            get(scenario::random_endpoint_assign).post(chat::random_turn),
        )
        .route("/api/random/initial/", get(scenario::random_initial))
        .route("/api/random/closing/", get(scenario::random_closing))
        .route(
            "/api/random/reset/",
            get(scenario::reset_session).post(scenario::reset_session),
        )
        // Saved conversations
        .route("/api/conversations/", get(conversations::list_conversations))
        .route("/api/conversations/:conversation_id", get(conversations::get_conversation))
        .route("/api/openapi.json", get(openapi::openapi_json));

    let timeout = Duration::from_secs(state.config.server.request_timeout_secs);

    api_routes
        .layer(middleware::from_fn_with_state(state.clone(), session::load_session))
        .layer(middleware::from_fn(logging::log_request))
        .layer(TimeoutLayer::new(timeout))
        .layer(CompressionLayer::new())
        .layer(build_cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS from config. Session cookies need credentials, so explicit origins
/// are required for the browser client; `*` allows any origin without them.
pub fn build_cors_layer(config: &Config) -> CorsLayer {
    if !config.cors.enabled {
        return CorsLayer::permissive();
    }

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
            axum::http::header::AUTHORIZATION,
        ]);

    if config.cors.origins.iter().any(|o| o == "*") {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors
        .origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    cors.allow_origin(origins).allow_credentials(true)
}
