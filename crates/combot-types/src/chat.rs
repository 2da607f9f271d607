use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Sender name the frontend uses for bot turns in the chat log
pub const BOT_SENDER: &str = "combot";

/// One line of the transcript kept by the frontend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ChatLogEntry {
    #[serde(alias = "role")]
    pub sender: String,
    #[serde(alias = "content")]
    pub text: String,
}

impl ChatLogEntry {
    pub fn new(sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            text: text.into(),
        }
    }

    pub fn is_bot(&self) -> bool {
        self.sender == BOT_SENDER
    }
}

/// Message-type marker echoed back by the frontend
///
/// Older clients send bare strings, newer ones send `{ "text": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum MessageTypeEntry {
    Text(String),
    Tagged { text: String },
}

impl MessageTypeEntry {
    pub fn text(&self) -> &str {
        match self {
            MessageTypeEntry::Text(text) => text,
            MessageTypeEntry::Tagged { text } => text,
        }
    }
}

/// Prompt family used when asking the language model for a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResponseKind {
    #[serde(rename = "continuation")]
    Continuation,
    #[serde(rename = "paraphrase")]
    Paraphrase,
    #[serde(rename = "index_10")]
    OffTopic,
    #[serde(rename = "low_continuation")]
    LowContinuation,
}

impl ResponseKind {
    /// Whether the prompt is built from the latest user message (otherwise from the transcript)
    pub fn uses_user_input(&self) -> bool {
        matches!(self, ResponseKind::Paraphrase | ResponseKind::OffTopic)
    }
}

/// Conversation index checkpoints
pub mod flow {
    /// First user message: classify and ask the first question
    pub const INITIAL: u32 = 0;
    /// Last index of the follow-up question phase
    pub const LAST_FOLLOW_UP: u32 = 4;
    /// Understanding statement
    pub const UNDERSTANDING: u32 = 5;
    /// The user message carries their email; the transcript is saved
    pub const SAVE: u32 = 6;
    /// Added to the index when the complaint is off topic
    pub const OFF_TOPIC_OFFSET: u32 = 10;
    /// Highest index a client may send; off-topic chats keep counting up to it
    pub const MAX_INDEX: u32 = 1_000;

    pub fn is_follow_up(index: u32) -> bool {
        (INITIAL + 1..=LAST_FOLLOW_UP).contains(&index)
    }

    pub fn is_off_topic(index: u32) -> bool {
        index >= OFF_TOPIC_OFFSET
    }
}
