use async_trait::async_trait;
use combot_types::LabelScore;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{MlError, Result};

/// A loaded text-classification model
#[async_trait]
pub trait TextClassifier: Send + Sync {
    fn model_name(&self) -> &str;

    /// Score `text` against every label the model knows
    async fn classify(&self, text: &str) -> Result<Vec<LabelScore>>;
}

/// Produces classifier instances for the model pool
#[async_trait]
pub trait ModelLoader: Send + Sync {
    async fn load(&self, model_name: &str) -> Result<Arc<dyn TextClassifier>>;
}

const WARM_UP_TEXT: &str = "warm up";

/// Classifier backed by a hosted inference endpoint
/// (`POST {endpoint}/{model}` with `{"inputs": ..., "options": {...}}`).
pub struct HttpClassifier {
    http_client: reqwest::Client,
    url: String,
    model_name: String,
}

impl HttpClassifier {
    pub fn new(http_client: reqwest::Client, endpoint: &str, model_name: impl Into<String>) -> Self {
        let model_name = model_name.into();
        Self {
            url: format!("{}/{}", endpoint.trim_end_matches('/'), model_name),
            http_client,
            model_name,
        }
    }
}

/// Inference endpoints answer with either one list per input or a flat list
#[derive(Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    Batched(Vec<Vec<LabelScore>>),
    Single(Vec<LabelScore>),
}

impl InferenceResponse {
    fn into_scores(self) -> Vec<LabelScore> {
        match self {
            Self::Batched(batches) => batches.into_iter().next().unwrap_or_default(),
            Self::Single(scores) => scores,
        }
    }
}

#[async_trait]
impl TextClassifier for HttpClassifier {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn classify(&self, text: &str) -> Result<Vec<LabelScore>> {
        let payload = serde_json::json!({
            "inputs": text,
            "options": { "wait_for_model": true },
        });

        let response = self.http_client.post(&self.url).json(&payload).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MlError::Inference(format!("{} returned {}: {}", self.model_name, status, body)));
        }

        let parsed: InferenceResponse = response.json().await?;
        let scores = parsed.into_scores();
        if scores.is_empty() {
            return Err(MlError::Inference(format!("{} returned no scores", self.model_name)));
        }

        Ok(scores)
    }
}

/// Loads [`HttpClassifier`]s that share one HTTP connection pool
pub struct HttpModelLoader {
    http_client: reqwest::Client,
    endpoint: String,
    warm_up: bool,
}

impl HttpModelLoader {
    pub fn new(endpoint: impl Into<String>, api_token: Option<&str>, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(token) = api_token.filter(|t| !t.is_empty()) {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| MlError::Inference(format!("Invalid API token: {}", e)))?;
            headers.insert(AUTHORIZATION, value);
        }

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http_client,
            endpoint: endpoint.into(),
            warm_up: true,
        })
    }

    /// Skip the verification request issued on load
    pub fn without_warm_up(mut self) -> Self {
        self.warm_up = false;
        self
    }
}

#[async_trait]
impl ModelLoader for HttpModelLoader {
    async fn load(&self, model_name: &str) -> Result<Arc<dyn TextClassifier>> {
        let classifier = HttpClassifier::new(self.http_client.clone(), &self.endpoint, model_name);

        if self.warm_up {
            tracing::info!(model = %model_name, "Loading classifier");
            classifier
                .classify(WARM_UP_TEXT)
                .await
                .map_err(|e| MlError::ModelLoad {
                    model: model_name.to_string(),
                    reason: e.to_string(),
                })?;
        }

        Ok(Arc::new(classifier))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_batched_response() {
        let body = r#"[[{"label":"A","score":0.9},{"label":"B","score":0.1}]]"#;
        let parsed: InferenceResponse = serde_json::from_str(body).unwrap();
        let scores = parsed.into_scores();
        assert_eq!(scores.len(), 2);
        assert_eq!(scores[0].label, "A");
    }

    #[test]
    fn test_parse_flat_response() {
        let body = r#"[{"label":"C","score":0.7}]"#;
        let parsed: InferenceResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.into_scores(), vec![LabelScore::new("C", 0.7)]);
    }

    #[test]
    fn test_url_joins_endpoint_and_model() {
        let classifier = HttpClassifier::new(reqwest::Client::new(), "http://localhost/models/", "org/model");
        assert_eq!(classifier.url, "http://localhost/models/org/model");
    }
}
