use chrono::{DateTime, Utc};
use combot_types::{Brand, ChatLogEntry, EndpointType, Level, MessageTypeEntry, ProblemType};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{ConversationRecord, NewConversation};

/// MongoDB-specific conversation document (uses ObjectId)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoConversation {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub email: String,
    pub time_spent: u32,
    pub chat_log: Vec<ChatLogEntry>,
    pub message_type_log: Vec<MessageTypeEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_type_breakdown: Option<BTreeMap<String, f32>>,
    pub test_type: Brand,
    pub problem_type: ProblemType,
    pub think_level: Level,
    pub feel_level: Level,
    pub endpoint_type: EndpointType,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl MongoConversation {
    pub fn from_new(conversation: NewConversation, created_at: DateTime<Utc>) -> Self {
        Self {
            id: ObjectId::new(),
            email: conversation.email,
            time_spent: conversation.time_spent,
            chat_log: conversation.chat_log,
            message_type_log: conversation.message_type_log,
            product_type_breakdown: conversation.product_type_breakdown,
            test_type: conversation.test_type,
            problem_type: conversation.problem_type,
            think_level: conversation.think_level,
            feel_level: conversation.feel_level,
            endpoint_type: conversation.endpoint_type,
            created_at,
        }
    }
}

impl From<MongoConversation> for ConversationRecord {
    fn from(doc: MongoConversation) -> Self {
        Self {
            id: doc.id.to_hex(),
            email: doc.email,
            time_spent: doc.time_spent,
            chat_log: doc.chat_log,
            message_type_log: doc.message_type_log,
            product_type_breakdown: doc.product_type_breakdown,
            test_type: doc.test_type,
            problem_type: doc.problem_type,
            think_level: doc.think_level,
            feel_level: doc.feel_level,
            endpoint_type: doc.endpoint_type,
            created_at: doc.created_at,
        }
    }
}
