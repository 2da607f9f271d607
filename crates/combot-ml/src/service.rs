use combot_types::Classification;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

use crate::admission::AdmissionControl;
use crate::cache::{CacheStore, TtlCache};
use crate::classifier::ModelLoader;
use crate::error::Result;
use crate::pool::{ModelPool, PoolStatus};

pub const RESULT_NAMESPACE: &str = "ml_classification:";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MlSettings {
    pub model_name: String,
    pub max_models: usize,
    pub max_concurrent: usize,
    pub queue_timeout_secs: u64,
    pub results_ttl_secs: u64,
    pub model_max_age_secs: u64,
    pub cleanup_interval_secs: u64,
}

impl Default for MlSettings {
    fn default() -> Self {
        Self {
            model_name: "jpsteinhafel/complaints_classifier".to_string(),
            max_models: 2,
            max_concurrent: 3,
            queue_timeout_secs: 30,
            results_ttl_secs: 7200,
            model_max_age_secs: 3600,
            cleanup_interval_secs: 300,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedText {
    pub classification: Classification,
    pub was_cached: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct MlStatus {
    #[serde(flatten)]
    pub pool: PoolStatus,
    pub active_requests: usize,
    pub max_concurrent: usize,
    pub cache_backend: &'static str,
}

pub struct MlService {
    settings: MlSettings,
    pool: ModelPool,
    admission: AdmissionControl,
    results: TtlCache,
}

impl MlService {
    pub fn new(settings: MlSettings, loader: Arc<dyn ModelLoader>, store: Arc<dyn CacheStore>) -> Self {
        let pool = ModelPool::new(loader, settings.max_models);
        let admission = AdmissionControl::new(
            settings.max_concurrent,
            Duration::from_secs(settings.queue_timeout_secs),
        );
        let results = TtlCache::new(
            store,
            RESULT_NAMESPACE,
            Duration::from_secs(settings.results_ttl_secs),
        );

        Self {
            settings,
            pool,
            admission,
            results,
        }
    }

    pub fn settings(&self) -> &MlSettings {
        &self.settings
    }

    /// Cache key for a message: hex sha256 of the trimmed, lower-cased text
    pub fn cache_key(text: &str) -> String {
        let normalized = text.trim().to_lowercase();
        hex::encode(Sha256::digest(normalized.as_bytes()))
    }

    /// Classify `text`. Blank input yields `Ok(None)`.
    ///
    /// A full admission counter surfaces as [`MlError::Busy`](crate::MlError::Busy);
    /// the caller decides whether that is fatal.
    pub async fn classify(&self, text: &str, use_cache: bool) -> Result<Option<ClassifiedText>> {
        if text.trim().is_empty() {
            return Ok(None);
        }

        let key = Self::cache_key(text);
        if use_cache {
            if let Some(classification) = self.results.get_json::<Classification>(&key).await {
                tracing::debug!(key = %key, "Classification cache hit");
                return Ok(Some(ClassifiedText {
                    classification,
                    was_cached: true,
                }));
            }
        }

        let _permit = self.admission.acquire().await?;

        let model = self.pool.get_model(&self.settings.model_name).await?;
        let started = Instant::now();
        let scores = model.classify(text).await?;
        let processing_ms = started.elapsed().as_millis() as u64;

        let classification = Classification::from_scores(&scores, processing_ms);
        tracing::info!(
            class_type = %classification.primary_type,
            confidence = classification.confidence,
            processing_ms,
            "Text classified"
        );

        if use_cache {
            self.results.set_json(&key, &classification).await;
        }

        Ok(Some(ClassifiedText {
            classification,
            was_cached: false,
        }))
    }

    pub async fn status(&self) -> MlStatus {
        MlStatus {
            pool: self.pool.status().await,
            active_requests: self.admission.active(),
            max_concurrent: self.admission.max_concurrent(),
            cache_backend: self.results.store().backend(),
        }
    }

    pub async fn cleanup_idle_models(&self) -> usize {
        self.pool
            .cleanup_older_than(Duration::from_secs(self.settings.model_max_age_secs))
            .await
    }

    /// Drop every cached classification
    pub async fn clear_results(&self) -> usize {
        self.results.clear().await
    }

    /// Periodically evict idle models until the returned handle is aborted
    pub fn spawn_cleanup_task(self: &Arc<Self>) -> JoinHandle<()> {
        let service = Arc::clone(self);
        let period = Duration::from_secs(self.settings.cleanup_interval_secs.max(1));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = service.cleanup_idle_models().await;
                if removed > 0 {
                    tracing::info!(removed, "Idle models cleaned up");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_normalizes_text() {
        assert_eq!(
            MlService::cache_key("  My Package Is Late "),
            MlService::cache_key("my package is late")
        );
        assert_ne!(MlService::cache_key("a"), MlService::cache_key("b"));
        assert_eq!(MlService::cache_key("x").len(), 64);
    }

    #[test]
    fn test_default_settings() {
        let settings = MlSettings::default();
        assert_eq!(settings.max_models, 2);
        assert_eq!(settings.max_concurrent, 3);
        assert_eq!(settings.results_ttl_secs, 7200);
    }
}
