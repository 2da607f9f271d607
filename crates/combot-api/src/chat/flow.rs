use combot_ml::apply_return_override;
use combot_persist::{NewConversation, DEFAULT_EMAIL};
use combot_types::{
    flow, Brand, Classification, EndpointType, MessageTypeEntry, ProblemType, ResponseKind, Scenario, ScenarioPatch,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::chat::messages::{self, BLANK_REPLY};
use crate::error::ApiResult;
use crate::middleware::{Session, SessionData};
use crate::state::AppState;
use crate::validation::{is_valid_email, ChatTurn};

/// Reply to one chat turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub reply: String,
    /// Index the client should send with its next message
    pub index: u32,
    /// Complaint category, empty until the first message is classified
    pub class_type: String,
    pub message_type: String,
}

impl ChatReply {
    fn new(reply: impl Into<String>, index: u32, class_type: Option<ProblemType>, message_type: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            index,
            class_type: class_type.map(|c| c.to_string()).unwrap_or_default(),
            message_type: message_type.into(),
        }
    }
}

/// Scenario for this turn. A scenario in the request replaces the stored one.
pub fn resolve_scenario(data: &mut SessionData, patch: Option<&ScenarioPatch>, endpoint: EndpointType) -> Scenario {
    let scenario = match patch {
        Some(patch) => {
            let scenario = Scenario::default().apply(patch);
            data.scenario = Some(scenario);
            scenario
        }
        None => data.scenario.unwrap_or_default(),
    };

    match endpoint {
        EndpointType::Lulu => scenario.with_brand(Brand::Lulu),
        EndpointType::General => scenario,
    }
}

/// Whether the opening reply was a paraphrase, which keeps the rest of the
/// follow-up phase on the language model
pub fn follow_up_is_low(message_type_log: &[MessageTypeEntry]) -> bool {
    message_type_log
        .get(1)
        .is_some_and(|entry| entry.text().contains("Low"))
}

/// Address stored with a saved conversation: the explicit field, then the
/// message itself, then a placeholder
pub fn save_email(turn: &ChatTurn) -> String {
    if let Some(email) = &turn.email {
        return email.clone();
    }
    let candidate = turn.message.trim();
    if is_valid_email(candidate) {
        return candidate.to_lowercase();
    }
    tracing::warn!("No usable email at save point, storing placeholder");
    DEFAULT_EMAIL.to_string()
}

/// Run one turn of the scripted conversation
pub async fn handle_turn(
    state: &AppState,
    session: &Session,
    endpoint: EndpointType,
    turn: ChatTurn,
) -> ApiResult<ChatReply> {
    state.memory.guard(&state.ml).await?;

    let mut data = session.data().await;
    let scenario = resolve_scenario(&mut data, turn.scenario.as_ref(), endpoint);
    if turn.scenario.is_some() {
        session.save(&data).await;
    }

    tracing::debug!(
        session_id = %session.id(),
        index = turn.index,
        brand = %scenario.brand,
        think = %scenario.think_level,
        feel = %scenario.feel_level,
        "Handling chat turn"
    );

    let index = turn.index;
    let reply = match index {
        flow::INITIAL => {
            let classification = classify_opening(state, &turn.message).await?;
            data.product_type_breakdown = Some(classification.scores.clone());
            session.save(&data).await;

            opening_reply(state, &scenario, &turn, classification.primary_type).await
        }
        i if flow::is_follow_up(i) => {
            let reply = follow_up_reply(state, &scenario, &turn).await;
            ChatReply::new(reply, i + 1, turn.class_type, BLANK_REPLY)
        }
        flow::UNDERSTANDING => {
            let (text, message_type) = messages::understanding_statement(scenario.brand, scenario.feel_level);
            ChatReply::new(text, index + 1, turn.class_type, message_type)
        }
        flow::SAVE => {
            save_conversation(state, &data, scenario, endpoint, &turn).await?;
            ChatReply::new(
                messages::thank_you_message(scenario.brand),
                index + 1,
                turn.class_type,
                BLANK_REPLY,
            )
        }
        i if flow::is_off_topic(i) => {
            let reply = state
                .responder
                .reply(&scenario, ResponseKind::OffTopic, &turn.message, &turn.chat_log)
                .await;
            ChatReply::new(reply, i + 1, turn.class_type, BLANK_REPLY)
        }
        i => ChatReply::new(BLANK_REPLY, i + 1, turn.class_type, BLANK_REPLY),
    };

    Ok(reply)
}

/// Classify the opening complaint. A saturated classifier is an error; any
/// other failure falls back to `Other`.
async fn classify_opening(state: &AppState, text: &str) -> ApiResult<Classification> {
    let ml = &state.config.ml;

    match state.ml.classify(text, true).await {
        Ok(Some(classified)) => {
            let mut classification = classified.classification;
            apply_return_override(&mut classification, text, ml.return_keywords.as_slice(), ml.return_confidence);
            tracing::info!(
                class_type = %classification.primary_type,
                confidence = classification.confidence,
                cached = classified.was_cached,
                "Opening message classified"
            );
            Ok(classification)
        }
        Ok(None) => Ok(Classification::other()),
        Err(e) if e.is_busy() => Err(e.into()),
        Err(e) => {
            tracing::warn!("Classification failed, treating complaint as Other: {}", e);
            Ok(Classification::other())
        }
    }
}

async fn opening_reply(state: &AppState, scenario: &Scenario, turn: &ChatTurn, class: ProblemType) -> ChatReply {
    if !class.is_on_topic() {
        let reply = state
            .responder
            .reply(scenario, ResponseKind::OffTopic, &turn.message, &turn.chat_log)
            .await;
        return ChatReply::new(
            reply,
            flow::INITIAL + flow::OFF_TOPIC_OFFSET + 1,
            Some(class),
            format!("{}Other", scenario.think_level),
        );
    }

    // coin flip between a canned question and a paraphrase
    let canned = {
        let mut rng = rand::thread_rng();
        if rng.gen_bool(0.5) {
            messages::random_question(scenario.brand, class, &mut rng)
        } else {
            None
        }
    };

    match canned {
        Some(question) => ChatReply::new(
            question,
            flow::INITIAL + 1,
            Some(class),
            format!("{}{}", scenario.think_level, class),
        ),
        None => {
            let reply = state
                .responder
                .reply(scenario, ResponseKind::Paraphrase, &turn.message, &turn.chat_log)
                .await;
            ChatReply::new(reply, flow::INITIAL + 1, Some(class), format!("Low{}", class))
        }
    }
}

async fn follow_up_reply(state: &AppState, scenario: &Scenario, turn: &ChatTurn) -> String {
    if follow_up_is_low(&turn.message_type_log) {
        return state
            .responder
            .reply(scenario, ResponseKind::LowContinuation, &turn.message, &turn.chat_log)
            .await;
    }

    let next = turn.class_type.and_then(|class| {
        let mut rng = rand::thread_rng();
        messages::next_question(scenario.brand, class, &turn.chat_log, &mut rng)
    });

    match next {
        Some(question) => question.to_string(),
        None => {
            state
                .responder
                .reply(scenario, ResponseKind::Continuation, &turn.message, &turn.chat_log)
                .await
        }
    }
}

async fn save_conversation(
    state: &AppState,
    data: &SessionData,
    scenario: Scenario,
    endpoint: EndpointType,
    turn: &ChatTurn,
) -> ApiResult<()> {
    let mut conversation = NewConversation::for_scenario(scenario, data.endpoint_type.unwrap_or(endpoint));
    conversation.email = save_email(turn);
    conversation.time_spent = turn.timer;
    conversation.chat_log = turn.chat_log.clone();
    conversation.message_type_log = turn.message_type_log.clone();
    conversation.product_type_breakdown = data.product_type_breakdown.clone();

    let record = state.store.create(conversation).await?;
    tracing::info!(
        conversation_id = %record.id,
        endpoint_type = %record.endpoint_type,
        messages = record.chat_log.len(),
        "Conversation saved"
    );
    Ok(())
}
