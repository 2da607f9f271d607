mod conversation;

pub use conversation::{ConversationRecord, NewConversation, DEFAULT_EMAIL};
