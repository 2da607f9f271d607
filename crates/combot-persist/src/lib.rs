pub mod dbs;
pub mod error;
pub mod models;
pub mod trait_client;

pub use dbs::memory::InMemoryConversationStore;
#[cfg(feature = "mongodb")]
pub use dbs::mongo::MongoConversationStore;
pub use error::{PersistError, Result};
pub use models::{ConversationRecord, NewConversation, DEFAULT_EMAIL};
pub use trait_client::ConversationStore;
