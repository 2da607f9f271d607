use async_trait::async_trait;
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::{Client, Collection, IndexModel};

use super::models::MongoConversation;
use crate::error::{PersistError, Result};
use crate::models::{ConversationRecord, NewConversation};
use crate::trait_client::ConversationStore;

const COLLECTION: &str = "conversations";

#[derive(Clone)]
pub struct MongoConversationStore {
    client: Client,
    database: String,
    collection: Collection<MongoConversation>,
}

impl MongoConversationStore {
    /// Connect to MongoDB and make sure the email index exists
    pub async fn connect(mongodb_uri: &str, database: &str) -> Result<Self> {
        let client = Client::with_uri_str(mongodb_uri)
            .await
            .map_err(|e| PersistError::Connection(e.to_string()))?;

        let collection = client.database(database).collection(COLLECTION);
        let index = IndexModel::builder()
            .keys(doc! { "email": 1, "created_at": -1 })
            .build();
        collection.create_index(index).await?;

        tracing::info!(database = %database, "MongoDB conversation store ready");

        Ok(Self {
            client,
            database: database.to_string(),
            collection,
        })
    }
}

#[async_trait]
impl ConversationStore for MongoConversationStore {
    async fn create(&self, conversation: NewConversation) -> Result<ConversationRecord> {
        let doc = MongoConversation::from_new(conversation, Utc::now());
        self.collection.insert_one(&doc).await?;
        tracing::info!(conversation_id = %doc.id.to_hex(), "Conversation saved");
        Ok(doc.into())
    }

    async fn get(&self, id: &str) -> Result<Option<ConversationRecord>> {
        let oid = ObjectId::parse_str(id).map_err(|_| PersistError::InvalidId(id.to_string()))?;
        let found = self.collection.find_one(doc! { "_id": oid }).await?;
        Ok(found.map(Into::into))
    }

    async fn list_by_email(&self, email: &str, limit: Option<i64>) -> Result<Vec<ConversationRecord>> {
        let mut find = self
            .collection
            .find(doc! { "email": email })
            .sort(doc! { "created_at": -1 });
        if let Some(limit) = limit {
            find = find.limit(limit);
        }

        let docs: Vec<MongoConversation> = find.await?.try_collect().await?;
        Ok(docs.into_iter().map(Into::into).collect())
    }

    async fn ping(&self) -> Result<()> {
        self.client
            .database(&self.database)
            .run_command(doc! { "ping": 1 })
            .await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "mongodb"
    }
}
