//! Scenario assignment, greetings, and closing texts.

use axum::{Extension, Json};
use combot_types::{Brand, EndpointType, Level, ProblemType, Scenario};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::chat::messages;
use crate::middleware::Session;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InitialResponse {
    pub message: String,
    pub scenario: Scenario,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RandomEndpointResponse {
    /// Chat path the client should post to
    pub endpoint: String,
    pub endpoint_type: EndpointType,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResetResponse {
    pub message: String,
    pub status: String,
}

/// Random condition for `brand`: an on-topic problem type and random levels
pub fn random_scenario<R: Rng + ?Sized>(brand: Brand, rng: &mut R) -> Scenario {
    let problem_type = *ProblemType::ON_TOPIC.choose(rng).unwrap_or(&ProblemType::A);
    let think_level = *Level::ALL.choose(rng).unwrap_or(&Level::High);
    let feel_level = *Level::ALL.choose(rng).unwrap_or(&Level::High);
    Scenario::new(brand, problem_type, think_level, feel_level)
}

fn random_endpoint() -> EndpointType {
    let mut rng = rand::thread_rng();
    *EndpointType::ALL.choose(&mut rng).unwrap_or(&EndpointType::General)
}

fn brand_for(endpoint: EndpointType) -> Brand {
    match endpoint {
        EndpointType::General => Brand::Basic,
        EndpointType::Lulu => Brand::Lulu,
    }
}

/// Assign a fresh scenario to the session and greet by think level
async fn greet(session: &Session, brand: Brand, endpoint_type: Option<EndpointType>) -> InitialResponse {
    let scenario = random_scenario(brand, &mut rand::thread_rng());

    session
        .update(|data| {
            data.scenario = Some(scenario);
            if endpoint_type.is_some() {
                data.endpoint_type = endpoint_type;
            }
        })
        .await;

    tracing::info!(
        session_id = %session.id(),
        brand = %scenario.brand,
        problem_type = %scenario.problem_type,
        think = %scenario.think_level,
        feel = %scenario.feel_level,
        "Scenario assigned"
    );

    InitialResponse {
        message: messages::initial_message(brand, scenario.think_level).to_string(),
        scenario,
    }
}

/// Greeting for the general endpoint; assigns a Basic scenario
#[utoipa::path(
    get,
    path = "/api/chatbot/initial/",
    responses((status = 200, description = "Greeting and assigned scenario", body = InitialResponse)),
    tag = "scenario"
)]
pub async fn chatbot_initial(Extension(session): Extension<Session>) -> Json<InitialResponse> {
    Json(greet(&session, Brand::Basic, None).await)
}

/// Greeting for the Lulu endpoint; assigns a Lulu scenario
#[utoipa::path(
    get,
    path = "/api/lulu/initial/",
    responses((status = 200, description = "Greeting and assigned scenario", body = InitialResponse)),
    tag = "scenario"
)]
pub async fn lulu_initial(Extension(session): Extension<Session>) -> Json<InitialResponse> {
    Json(greet(&session, Brand::Lulu, None).await)
}

/// Pick an endpoint family at random, then greet as that family
#[utoipa::path(
    get,
    path = "/api/random/initial/",
    responses((status = 200, description = "Greeting and assigned scenario", body = InitialResponse)),
    tag = "scenario"
)]
pub async fn random_initial(Extension(session): Extension<Session>) -> Json<InitialResponse> {
    let endpoint = random_endpoint();
    Json(greet(&session, brand_for(endpoint), Some(endpoint)).await)
}

#[utoipa::path(
    get,
    path = "/api/chatbot/closing/",
    responses((status = 200, description = "Closing text", body = MessageResponse)),
    tag = "scenario"
)]
pub async fn chatbot_closing() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: messages::closing_message(EndpointType::General).to_string(),
    })
}

#[utoipa::path(
    get,
    path = "/api/lulu/closing/",
    responses((status = 200, description = "Closing text", body = MessageResponse)),
    tag = "scenario"
)]
pub async fn lulu_closing() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: messages::closing_message(EndpointType::Lulu).to_string(),
    })
}

/// Closing text of the session's endpoint family (general when unassigned)
#[utoipa::path(
    get,
    path = "/api/random/closing/",
    responses((status = 200, description = "Closing text", body = MessageResponse)),
    tag = "scenario"
)]
pub async fn random_closing(Extension(session): Extension<Session>) -> Json<MessageResponse> {
    let endpoint = session.data().await.endpoint_type.unwrap_or_default();
    Json(MessageResponse {
        message: messages::closing_message(endpoint).to_string(),
    })
}

/// Assign a random endpoint family to the session
#[utoipa::path(
    get,
    path = "/api/random/",
    responses((status = 200, description = "Assigned endpoint", body = RandomEndpointResponse)),
    tag = "scenario"
)]
pub async fn random_endpoint_assign(Extension(session): Extension<Session>) -> Json<RandomEndpointResponse> {
    let endpoint = random_endpoint();
    session.update(|data| data.endpoint_type = Some(endpoint)).await;
    tracing::info!(session_id = %session.id(), endpoint_type = %endpoint, "Endpoint assigned");

    Json(RandomEndpointResponse {
        endpoint: endpoint.chat_path().to_string(),
        endpoint_type: endpoint,
    })
}

/// Forget the session's scenario and endpoint assignment
#[utoipa::path(
    post,
    path = "/api/random/reset/",
    responses((status = 200, description = "Session cleared", body = ResetResponse)),
    tag = "scenario"
)]
pub async fn reset_session(Extension(session): Extension<Session>) -> Json<ResetResponse> {
    session.flush().await;
    tracing::info!(session_id = %session.id(), "Session reset");

    Json(ResetResponse {
        message: "Session reset successfully".to_string(),
        status: "reset".to_string(),
    })
}
