use async_trait::async_trait;
use combot_ml::{
    CacheStore, HttpModelLoader, MemoryStore, MlError, MlService, MlSettings, ModelLoader, TextClassifier,
};
use combot_types::{LabelScore, ProblemType};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

struct ScriptedClassifier {
    calls: Arc<AtomicUsize>,
    delay: Duration,
}

#[async_trait]
impl TextClassifier for ScriptedClassifier {
    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn classify(&self, text: &str) -> combot_ml::Result<Vec<LabelScore>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        if text.contains("late") {
            Ok(vec![LabelScore::new("A", 0.1), LabelScore::new("B", 0.85), LabelScore::new("C", 0.05)])
        } else {
            Ok(vec![LabelScore::new("A", 0.2), LabelScore::new("Other", 0.7)])
        }
    }
}

struct ScriptedLoader {
    calls: Arc<AtomicUsize>,
    delay: Duration,
}

#[async_trait]
impl ModelLoader for ScriptedLoader {
    async fn load(&self, _model_name: &str) -> combot_ml::Result<Arc<dyn TextClassifier>> {
        Ok(Arc::new(ScriptedClassifier {
            calls: self.calls.clone(),
            delay: self.delay,
        }))
    }
}

fn service(settings: MlSettings, delay: Duration) -> (Arc<MlService>, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let loader = Arc::new(ScriptedLoader {
        calls: calls.clone(),
        delay,
    });
    let service = MlService::new(settings, loader, Arc::new(MemoryStore::new()));
    (Arc::new(service), calls)
}

#[tokio::test]
async fn test_blank_text_is_not_classified() {
    let (service, calls) = service(MlSettings::default(), Duration::ZERO);

    assert!(service.classify("   ", true).await.unwrap().is_none());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_repeated_text_hits_cache() {
    let (service, calls) = service(MlSettings::default(), Duration::ZERO);

    let first = service.classify("My parcel is late", true).await.unwrap().unwrap();
    assert!(!first.was_cached);
    assert_eq!(first.classification.primary_type, ProblemType::B);

    let second = service.classify("  my parcel is LATE ", true).await.unwrap().unwrap();
    assert!(second.was_cached);
    assert_eq!(second.classification, first.classification);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_cache_bypass_always_runs_model() {
    let (service, calls) = service(MlSettings::default(), Duration::ZERO);

    service.classify("hello there", false).await.unwrap();
    let again = service.classify("hello there", false).await.unwrap().unwrap();

    assert!(!again.was_cached);
    assert_eq!(again.classification.primary_type, ProblemType::Other);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_clear_results_forces_recompute() {
    let (service, calls) = service(MlSettings::default(), Duration::ZERO);

    service.classify("late again", true).await.unwrap();
    assert_eq!(service.clear_results().await, 1);
    let after = service.classify("late again", true).await.unwrap().unwrap();

    assert!(!after.was_cached);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_busy_when_all_slots_taken() {
    let settings = MlSettings {
        max_concurrent: 1,
        queue_timeout_secs: 0,
        ..MlSettings::default()
    };
    let (service, _) = service(settings, Duration::from_millis(200));

    let slow = {
        let service = service.clone();
        tokio::spawn(async move { service.classify("slow late message", false).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    let err = service.classify("another late message", false).await.unwrap_err();
    assert!(matches!(err, MlError::Busy { max_concurrent: 1 }));
    assert!(slow.await.unwrap().is_ok());
}

#[tokio::test]
async fn test_status_reports_pool_and_admission() {
    let (service, _) = service(MlSettings::default(), Duration::ZERO);
    service.classify("late", false).await.unwrap();

    let status = service.status().await;
    assert_eq!(status.pool.active_models, 1);
    assert_eq!(status.pool.max_models, 2);
    assert_eq!(status.active_requests, 0);
    assert_eq!(status.max_concurrent, 3);
    assert_eq!(status.cache_backend, "memory");
}

#[tokio::test]
async fn test_http_loader_against_inference_endpoint() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/models/org/complaints")
        .match_header("authorization", "Bearer hf-token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!([[{"label": "C", "score": 0.9}, {"label": "A", "score": 0.1}]]).to_string())
        .expect(2)
        .create_async()
        .await;

    let loader = HttpModelLoader::new(format!("{}/models", server.url()), Some("hf-token"), Duration::from_secs(5))
        .unwrap();
    let settings = MlSettings {
        model_name: "org/complaints".to_string(),
        ..MlSettings::default()
    };
    let store: Arc<dyn CacheStore> = Arc::new(MemoryStore::new());
    let service = MlService::new(settings, Arc::new(loader), store);

    // one warm-up request on load, one for the message
    let result = service.classify("the clerk ignored me", true).await.unwrap().unwrap();

    mock.assert_async().await;
    assert_eq!(result.classification.primary_type, ProblemType::C);
}

#[tokio::test]
async fn test_http_loader_without_warm_up() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/complaints")
        .with_status(200)
        .with_body(json!([{"label": "A", "score": 0.8}]).to_string())
        .expect(1)
        .create_async()
        .await;

    let loader = HttpModelLoader::new(server.url(), None, Duration::from_secs(5))
        .unwrap()
        .without_warm_up();
    let settings = MlSettings {
        model_name: "complaints".to_string(),
        ..MlSettings::default()
    };
    let service = MlService::new(settings, Arc::new(loader), Arc::new(MemoryStore::new()));

    let result = service.classify("broken zipper", false).await.unwrap().unwrap();

    mock.assert_async().await;
    assert_eq!(result.classification.primary_type, ProblemType::A);
}

#[tokio::test]
async fn test_http_loader_failure_is_model_load_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/missing")
        .with_status(404)
        .with_body("not found")
        .create_async()
        .await;

    let loader = HttpModelLoader::new(server.url(), None, Duration::from_secs(5)).unwrap();
    let settings = MlSettings {
        model_name: "missing".to_string(),
        ..MlSettings::default()
    };
    let service = MlService::new(settings, Arc::new(loader), Arc::new(MemoryStore::new()));

    let err = service.classify("anything", true).await.unwrap_err();
    assert!(matches!(err, MlError::ModelLoad { .. }));
}
