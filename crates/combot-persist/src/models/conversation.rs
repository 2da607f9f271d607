use chrono::{DateTime, Utc};
use combot_types::{Brand, ChatLogEntry, EndpointType, Level, MessageTypeEntry, ProblemType, Scenario};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// Stored when the user never supplies a usable address
pub const DEFAULT_EMAIL: &str = "temp@temp.com";

/// A saved conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ConversationRecord {
    pub id: String,
    pub email: String,
    /// Seconds the participant spent in the chat
    pub time_spent: u32,
    pub chat_log: Vec<ChatLogEntry>,
    pub message_type_log: Vec<MessageTypeEntry>,
    /// Per-label classifier scores for the opening message
    pub product_type_breakdown: Option<BTreeMap<String, f32>>,
    /// Brand the participant talked to
    pub test_type: Brand,
    pub problem_type: ProblemType,
    pub think_level: Level,
    pub feel_level: Level,
    pub endpoint_type: EndpointType,
    pub created_at: DateTime<Utc>,
}

/// Input for [`ConversationStore::create`](crate::ConversationStore::create)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewConversation {
    pub email: String,
    pub time_spent: u32,
    pub chat_log: Vec<ChatLogEntry>,
    pub message_type_log: Vec<MessageTypeEntry>,
    pub product_type_breakdown: Option<BTreeMap<String, f32>>,
    pub test_type: Brand,
    pub problem_type: ProblemType,
    pub think_level: Level,
    pub feel_level: Level,
    pub endpoint_type: EndpointType,
}

impl NewConversation {
    /// Empty conversation carrying the session's scenario
    pub fn for_scenario(scenario: Scenario, endpoint_type: EndpointType) -> Self {
        Self {
            email: DEFAULT_EMAIL.to_string(),
            time_spent: 0,
            chat_log: Vec::new(),
            message_type_log: Vec::new(),
            product_type_breakdown: None,
            test_type: scenario.brand,
            problem_type: scenario.problem_type,
            think_level: scenario.think_level,
            feel_level: scenario.feel_level,
            endpoint_type,
        }
    }

    pub fn into_record(self, id: String, created_at: DateTime<Utc>) -> ConversationRecord {
        ConversationRecord {
            id,
            email: self.email,
            time_spent: self.time_spent,
            chat_log: self.chat_log,
            message_type_log: self.message_type_log,
            product_type_breakdown: self.product_type_breakdown,
            test_type: self.test_type,
            problem_type: self.problem_type,
            think_level: self.think_level,
            feel_level: self.feel_level,
            endpoint_type: self.endpoint_type,
            created_at,
        }
    }
}

impl ConversationRecord {
    pub fn scenario(&self) -> Scenario {
        Scenario::new(self.test_type, self.problem_type, self.think_level, self.feel_level)
    }
}
