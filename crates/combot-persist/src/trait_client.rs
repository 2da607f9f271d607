use async_trait::async_trait;

use crate::error::Result;
use crate::models::{ConversationRecord, NewConversation};

/// Storage for finished conversations
///
/// Implementations provide database-specific persistence
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Persist a conversation and return the stored record (with id and timestamp)
    async fn create(&self, conversation: NewConversation) -> Result<ConversationRecord>;

    /// Get a conversation by ID
    async fn get(&self, id: &str) -> Result<Option<ConversationRecord>>;

    /// Conversations saved under `email`, newest first
    async fn list_by_email(&self, email: &str, limit: Option<i64>) -> Result<Vec<ConversationRecord>>;

    /// Cheap connectivity check used by the health endpoint
    async fn ping(&self) -> Result<()>;

    fn backend(&self) -> &'static str;
}
