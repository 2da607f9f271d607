use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{ConversationRecord, NewConversation};
use crate::trait_client::ConversationStore;

/// Process-local store for development and tests
#[derive(Default)]
pub struct InMemoryConversationStore {
    records: RwLock<Vec<ConversationRecord>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn create(&self, conversation: NewConversation) -> Result<ConversationRecord> {
        let record = conversation.into_record(Uuid::new_v4().to_string(), Utc::now());
        self.records.write().await.push(record.clone());
        tracing::debug!(conversation_id = %record.id, "Conversation stored in memory");
        Ok(record)
    }

    async fn get(&self, id: &str) -> Result<Option<ConversationRecord>> {
        let records = self.records.read().await;
        Ok(records.iter().find(|r| r.id == id).cloned())
    }

    async fn list_by_email(&self, email: &str, limit: Option<i64>) -> Result<Vec<ConversationRecord>> {
        let records = self.records.read().await;
        let limit = limit.and_then(|l| usize::try_from(l).ok()).unwrap_or(usize::MAX);
        // insertion order is creation order
        Ok(records
            .iter()
            .rev()
            .filter(|r| r.email == email)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
