use combot_llm::ChatClient;
use combot_ml::{CacheStore, MlService, TtlCache};
use combot_persist::ConversationStore;
use std::sync::Arc;
use std::time::Duration;

use crate::chat::Responder;
use crate::config::Config;
use crate::memory::MemoryMonitor;
use crate::middleware::session::SESSION_NAMESPACE;

/// Shared application state passed to all handlers
///
/// Everything is behind `Arc` so the state is cheap to clone into tasks.
/// Sessions share the cache backend with classification results but live
/// under their own namespace.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub responder: Responder,
    pub ml: Arc<MlService>,
    pub store: Arc<dyn ConversationStore>,
    pub sessions: TtlCache,
    pub memory: Arc<MemoryMonitor>,
}

impl AppState {
    pub fn new(
        config: Config,
        llm_client: Arc<dyn ChatClient>,
        ml: Arc<MlService>,
        store: Arc<dyn ConversationStore>,
        cache_store: Arc<dyn CacheStore>,
        memory: MemoryMonitor,
    ) -> Self {
        let responder = Responder::new(llm_client, &config.llm);
        let sessions = TtlCache::new(
            cache_store,
            SESSION_NAMESPACE,
            Duration::from_secs(config.session.ttl_secs),
        );

        Self {
            config: Arc::new(config),
            responder,
            ml,
            store,
            sessions,
            memory: Arc::new(memory),
        }
    }
}
