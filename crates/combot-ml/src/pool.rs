use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::classifier::{ModelLoader, TextClassifier};
use crate::error::Result;

struct PooledModel {
    classifier: Arc<dyn TextClassifier>,
    last_used: Instant,
}

#[derive(Debug, Clone, Serialize)]
pub struct PoolStatus {
    pub active_models: usize,
    pub max_models: usize,
    pub loaded_models: Vec<String>,
}

/// Bounded set of loaded classifiers with least-recently-used eviction.
///
/// Loads are serialized by a separate lock so two callers never load the same
/// model twice, while `status` and cache hits only touch the model map.
pub struct ModelPool {
    loader: Arc<dyn ModelLoader>,
    max_models: usize,
    models: Mutex<HashMap<String, PooledModel>>,
    loading: Mutex<()>,
}

impl ModelPool {
    pub fn new(loader: Arc<dyn ModelLoader>, max_models: usize) -> Self {
        Self {
            loader,
            max_models: max_models.max(1),
            models: Mutex::new(HashMap::new()),
            loading: Mutex::new(()),
        }
    }

    async fn touch(&self, model_name: &str) -> Option<Arc<dyn TextClassifier>> {
        let mut models = self.models.lock().await;
        models.get_mut(model_name).map(|entry| {
            entry.last_used = Instant::now();
            entry.classifier.clone()
        })
    }

    /// Return the named model, loading it on a miss. The least recently used
    /// model is evicted only once the new one has loaded.
    pub async fn get_model(&self, model_name: &str) -> Result<Arc<dyn TextClassifier>> {
        if let Some(classifier) = self.touch(model_name).await {
            return Ok(classifier);
        }

        let _loading = self.loading.lock().await;
        // loaded by another caller while we waited
        if let Some(classifier) = self.touch(model_name).await {
            return Ok(classifier);
        }

        let started = Instant::now();
        let classifier = self.loader.load(model_name).await?;
        tracing::info!(
            model = %model_name,
            load_ms = started.elapsed().as_millis() as u64,
            "Model loaded"
        );

        let mut models = self.models.lock().await;
        if models.len() >= self.max_models {
            let oldest = models
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(name, _)| name.clone());
            if let Some(name) = oldest {
                tracing::info!(model = %name, "Evicting least recently used model");
                models.remove(&name);
            }
        }
        models.insert(
            model_name.to_string(),
            PooledModel {
                classifier: classifier.clone(),
                last_used: Instant::now(),
            },
        );

        Ok(classifier)
    }

    /// Drop models idle for longer than `max_age`; returns how many were removed
    pub async fn cleanup_older_than(&self, max_age: Duration) -> usize {
        let mut models = self.models.lock().await;
        let before = models.len();
        models.retain(|name, entry| {
            let keep = entry.last_used.elapsed() <= max_age;
            if !keep {
                tracing::info!(model = %name, "Cleaning up idle model");
            }
            keep
        });
        before - models.len()
    }

    /// Unload every model; returns how many were loaded
    pub async fn clear(&self) -> usize {
        let mut models = self.models.lock().await;
        let removed = models.len();
        models.clear();
        removed
    }

    pub async fn status(&self) -> PoolStatus {
        let models = self.models.lock().await;
        let mut loaded_models: Vec<String> = models.keys().cloned().collect();
        loaded_models.sort();
        PoolStatus {
            active_models: models.len(),
            max_models: self.max_models,
            loaded_models,
        }
    }
}
