use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use combot_api::{
    app::build_router,
    config::Config,
    memory::{MemoryMonitor, MemoryProbe},
    state::AppState,
};
use combot_llm::{ChatClient, ChatRequest, ChatResponse};
use combot_ml::{MemoryStore, MlService, MlSettings, ModelLoader, TextClassifier};
use combot_persist::InMemoryConversationStore;
use combot_types::LabelScore;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

const LLM_REPLY: &str = "Could you tell me a bit more about that?";

struct FakeChat {
    fail: bool,
    calls: AtomicUsize,
}

#[async_trait]
impl ChatClient for FakeChat {
    async fn chat(&self, _request: ChatRequest) -> anyhow::Result<ChatResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            anyhow::bail!("OpenAI API error (500): boom");
        }
        Ok(ChatResponse {
            content: Some(format!("\"{LLM_REPLY}\"")),
            usage: None,
            finish_reason: Some("stop".to_string()),
            raw: Value::Null,
        })
    }
}

/// Complaints about lateness are B, refunds are weak A, anything else is Other
struct KeywordClassifier {
    calls: Arc<AtomicUsize>,
    delay: Duration,
}

#[async_trait]
impl TextClassifier for KeywordClassifier {
    fn model_name(&self) -> &str {
        "keyword"
    }

    async fn classify(&self, text: &str) -> combot_ml::Result<Vec<LabelScore>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;

        let text = text.to_lowercase();
        let scores = if text.contains("late") {
            vec![LabelScore::new("A", 0.05), LabelScore::new("B", 0.9), LabelScore::new("C", 0.05)]
        } else if text.contains("refund") {
            vec![LabelScore::new("A", 0.25), LabelScore::new("Other", 0.2)]
        } else {
            vec![LabelScore::new("A", 0.1), LabelScore::new("Other", 0.8)]
        };
        Ok(scores)
    }
}

struct KeywordLoader {
    calls: Arc<AtomicUsize>,
    delay: Duration,
}

#[async_trait]
impl ModelLoader for KeywordLoader {
    async fn load(&self, _model_name: &str) -> combot_ml::Result<Arc<dyn TextClassifier>> {
        Ok(Arc::new(KeywordClassifier {
            calls: self.calls.clone(),
            delay: self.delay,
        }))
    }
}

struct FixedProbe(f64);

impl MemoryProbe for FixedProbe {
    fn usage(&self) -> f64 {
        self.0
    }
}

struct TestApp {
    router: Router,
    classifier_calls: Arc<AtomicUsize>,
    llm: Arc<FakeChat>,
}

struct Options {
    memory_usage: f64,
    llm_fails: bool,
    classify_delay: Duration,
    max_concurrent: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            memory_usage: 0.3,
            llm_fails: false,
            classify_delay: Duration::ZERO,
            max_concurrent: 3,
        }
    }
}

fn test_config() -> Config {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../config/default.toml");
    let mut config = Config::from_file(path).expect("default config parses");
    config.openai_api_key = "test-key".to_string();
    config
}

fn app(options: Options) -> TestApp {
    let mut config = test_config();
    config.ml.max_concurrent = options.max_concurrent;
    config.ml.queue_timeout_secs = 0;

    let classifier_calls = Arc::new(AtomicUsize::new(0));
    let loader = Arc::new(KeywordLoader {
        calls: classifier_calls.clone(),
        delay: options.classify_delay,
    });
    let cache = Arc::new(MemoryStore::new());
    let ml = Arc::new(MlService::new(MlSettings::from(&config.ml), loader, cache.clone()));

    let llm = Arc::new(FakeChat {
        fail: options.llm_fails,
        calls: AtomicUsize::new(0),
    });
    let memory = MemoryMonitor::with_probe(config.memory.clone(), Box::new(FixedProbe(options.memory_usage)));

    let state = AppState::new(
        config,
        llm.clone(),
        ml,
        Arc::new(InMemoryConversationStore::new()),
        cache,
        memory,
    );

    TestApp {
        router: build_router(Arc::new(state)),
        classifier_calls,
        llm,
    }
}

struct Reply {
    status: StatusCode,
    cookie: Option<String>,
    body: Value,
}

async fn send(router: &Router, request: Request<Body>) -> Reply {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_string);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    Reply { status, cookie, body }
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn post(uri: &str, cookie: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn test_health_is_idempotent() {
    let app = app(Options::default());

    let first = send(&app.router, get("/health", None)).await;
    let second = send(&app.router, get("/health", None)).await;

    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body, second.body);
    assert_eq!(first.body["status"], "healthy");
    assert_eq!(first.body["services"]["store"], "memory: connected");
    assert!(first.cookie.is_none());
}

#[tokio::test]
async fn test_closing_endpoints() {
    let app = app(Options::default());

    let first = send(&app.router, get("/api/chatbot/closing/", None)).await;
    let second = send(&app.router, get("/api/chatbot/closing/", None)).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body, second.body);
    assert!(first.body["message"].as_str().unwrap().ends_with("email below..."));

    let lulu = send(&app.router, get("/api/lulu/closing/", None)).await;
    assert!(lulu.body["message"].as_str().unwrap().ends_with("email address below..."));
}

#[tokio::test]
async fn test_memory_status() {
    let app = app(Options::default());

    let reply = send(&app.router, get("/api/memory-status/", None)).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["status"], "healthy");
    assert_eq!(reply.body["memory_threshold"], 0.6);
    assert_eq!(reply.body["user_count"], 0);
}

#[tokio::test]
async fn test_initial_assigns_scenario() {
    let app = app(Options::default());

    let reply = send(&app.router, get("/api/lulu/initial/", None)).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["scenario"]["brand"], "Lulu");
    assert_ne!(reply.body["scenario"]["problem_type"], "Other");
    assert!(reply.body["message"].as_str().unwrap().contains("Combot"));

    let cookie = reply.cookie.expect("new session sets a cookie");
    assert!(cookie.starts_with("sessionid="));

    // saving into an existing session refreshes the cookie's lifetime
    let again = send(&app.router, get("/api/lulu/initial/", Some(&cookie))).await;
    assert_eq!(again.status, StatusCode::OK);
    assert_eq!(again.cookie.as_deref(), Some(cookie.as_str()));

    let status = send(&app.router, get("/health", Some(&cookie))).await;
    assert!(status.cookie.is_none());
}

#[tokio::test]
async fn test_invalid_payloads_are_rejected() {
    let app = app(Options::default());

    let reply = send(&app.router, post("/api/chatbot/", None, json!({"index": 0}))).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["error_code"], "VALIDATION_ERROR");
    assert_eq!(reply.body["error"], "message cannot be empty");
    assert_eq!(reply.body["details"]["field"], "message");

    let reply = send(&app.router, post("/api/lulu/", None, json!({"message": "hi", "index": -3}))).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["details"]["field"], "index");

    let reply = send(
        &app.router,
        post("/api/chatbot/", None, json!({"message": "hi", "index": 4294967295u64})),
    )
    .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["details"]["field"], "index");

    let malformed = Request::builder()
        .method("POST")
        .uri("/api/chatbot/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let reply = send(&app.router, malformed).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["error_code"], "VALIDATION_ERROR");

    assert_eq!(app.classifier_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_opening_message_is_classified_once() {
    let app = app(Options::default());
    let body = json!({"message": "My package is three weeks late", "index": 0});

    let first = send(&app.router, post("/api/chatbot/", None, body.clone())).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body["index"], 1);
    assert_eq!(first.body["classType"], "B");
    let message_type = first.body["messageType"].as_str().unwrap();
    assert!(message_type == "HighB" || message_type == "LowB", "{message_type}");

    let second = send(&app.router, post("/api/chatbot/", None, body)).await;
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(second.body["classType"], "B");

    assert_eq!(app.classifier_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_off_topic_opening_jumps_index() {
    let app = app(Options::default());

    let reply = send(
        &app.router,
        post("/api/chatbot/", None, json!({"message": "What is the weather like?", "index": 0})),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["index"], 11);
    assert_eq!(reply.body["classType"], "Other");
    assert_eq!(reply.body["messageType"], "HighOther");
    assert_eq!(reply.body["reply"], format!("\"{LLM_REPLY}\""));

    let reply = send(
        &app.router,
        post("/api/chatbot/", None, json!({"message": "Still there?", "index": 11, "classType": "Other"})),
    )
    .await;
    assert_eq!(reply.body["index"], 12);
    assert_eq!(reply.body["messageType"], " ");
}

#[tokio::test]
async fn test_weak_refund_classification_becomes_other() {
    let app = app(Options::default());

    let reply = send(
        &app.router,
        post("/api/chatbot/", None, json!({"message": "I want a refund for my jacket", "index": 0})),
    )
    .await;
    assert_eq!(reply.body["classType"], "Other");
    assert_eq!(reply.body["index"], 11);
}

#[tokio::test]
async fn test_busy_classifier_returns_503() {
    let app = app(Options {
        classify_delay: Duration::from_millis(300),
        max_concurrent: 1,
        ..Options::default()
    });

    let (a, b) = tokio::join!(
        send(&app.router, post("/api/chatbot/", None, json!({"message": "Order is late", "index": 0}))),
        send(&app.router, post("/api/chatbot/", None, json!({"message": "Parcel is late too", "index": 0}))),
    );

    let statuses = [a.status, b.status];
    assert!(statuses.contains(&StatusCode::OK));
    assert!(statuses.contains(&StatusCode::SERVICE_UNAVAILABLE));

    let busy = if a.status == StatusCode::SERVICE_UNAVAILABLE { a } else { b };
    assert_eq!(busy.body["error_code"], "SERVICE_UNAVAILABLE_ERROR");
    assert_eq!(busy.body["details"]["max_concurrent"], 1);
}

#[tokio::test]
async fn test_memory_pressure_refuses_turns() {
    let app = app(Options {
        memory_usage: 0.95,
        ..Options::default()
    });

    for _ in 0..2 {
        let reply = send(&app.router, post("/api/chatbot/", None, json!({"message": "hello", "index": 3}))).await;
        assert_eq!(reply.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(reply.body["error_code"], "MEMORY_ERROR");
    }

    let status = send(&app.router, get("/api/memory-status/", None)).await;
    assert_eq!(status.body["status"], "warning");
}

#[tokio::test]
async fn test_llm_failure_still_replies() {
    let app = app(Options {
        llm_fails: true,
        ..Options::default()
    });

    let reply = send(
        &app.router,
        post("/api/chatbot/", None, json!({"message": "Tell me a joke", "index": 0})),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(
        reply.body["reply"],
        "An error occurred while generating the response. Please try again."
    );
    assert_eq!(app.llm.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_follow_up_uses_unasked_question() {
    let app = app(Options::default());
    let chat_log = json!([
        {"sender": "combot", "text": "Can you provide us with more details about the interaction with the employee?"},
        {"sender": "user", "text": "He shouted at me"},
        {"sender": "combot", "text": "When and where did the interaction take place?"},
        {"sender": "user", "text": "Yesterday, downtown store"},
        {"sender": "combot", "text": "Was there a specific instance or series of incidents that led to you feeling mistreated?"},
        {"sender": "user", "text": "Just that once"},
    ]);

    let reply = send(
        &app.router,
        post(
            "/api/chatbot/",
            None,
            json!({
                "message": "Just that once",
                "index": 3,
                "classType": "C",
                "chatLog": chat_log,
                "messageTypeLog": ["", "HighC"],
            }),
        ),
    )
    .await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["reply"], "How did the employee behave in a rude or disrespectful manner?");
    assert_eq!(reply.body["index"], 4);
    assert_eq!(reply.body["classType"], "C");
    assert_eq!(app.llm.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_low_follow_up_uses_language_model() {
    let app = app(Options::default());

    let reply = send(
        &app.router,
        post(
            "/api/chatbot/",
            None,
            json!({
                "message": "It arrived broken",
                "index": 2,
                "classType": "A",
                "chatLog": [{"sender": "user", "text": "It arrived broken"}],
                "messageTypeLog": [{"text": ""}, {"text": "LowA"}],
            }),
        ),
    )
    .await;

    assert_eq!(reply.body["reply"], LLM_REPLY);
    assert_eq!(reply.body["messageType"], " ");
}

#[tokio::test]
async fn test_conversation_is_saved_and_listed() {
    let app = app(Options::default());

    let initial = send(&app.router, get("/api/chatbot/initial/", None)).await;
    let cookie = initial.cookie.expect("session cookie");
    let scenario = initial.body["scenario"].clone();

    let reply = send(
        &app.router,
        post(
            "/api/chatbot/",
            Some(&cookie),
            json!({
                "message": "Participant@Example.com",
                "index": 6,
                "timer": 245,
                "classType": "B",
                "chatLog": [
                    {"sender": "user", "text": "My package is late"},
                    {"sender": "combot", "text": "What was the expected delivery date?"},
                ],
                "messageTypeLog": ["", "HighB"],
            }),
        ),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body["reply"].as_str().unwrap().contains("Survey Link"));
    assert_eq!(reply.body["index"], 7);

    let list = send(&app.router, get("/api/conversations/?email=participant@example.com", None)).await;
    assert_eq!(list.status, StatusCode::OK);
    let records = list.body.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["time_spent"], 245);
    assert_eq!(records[0]["endpoint_type"], "general");
    assert_eq!(records[0]["test_type"], "Basic");
    assert_eq!(records[0]["think_level"], scenario["think_level"]);
    assert_eq!(records[0]["chat_log"].as_array().unwrap().len(), 2);

    let id = records[0]["id"].as_str().unwrap();
    let one = send(&app.router, get(&format!("/api/conversations/{id}"), None)).await;
    assert_eq!(one.status, StatusCode::OK);
    assert_eq!(one.body["email"], "participant@example.com");

    let no_email = send(&app.router, get("/api/conversations/", None)).await;
    assert_eq!(no_email.status, StatusCode::BAD_REQUEST);
    assert_eq!(no_email.body["error_code"], "VALIDATION_ERROR");
    assert_eq!(no_email.body["details"]["field"], "email");

    let bad_limit = send(&app.router, get("/api/conversations/?email=a@b.io&limit=many", None)).await;
    assert_eq!(bad_limit.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad_limit.body["error_code"], "VALIDATION_ERROR");

    let missing = send(&app.router, get("/api/conversations/does-not-exist", None)).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.body["error_code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_random_assignment_follows_session() {
    let app = app(Options::default());

    let assigned = send(&app.router, get("/api/random/", None)).await;
    assert_eq!(assigned.status, StatusCode::OK);
    let cookie = assigned.cookie.expect("session cookie");
    let endpoint_type = assigned.body["endpoint_type"].as_str().unwrap().to_string();
    let expected_path = if endpoint_type == "lulu" { "/api/lulu/" } else { "/api/chatbot/" };
    assert_eq!(assigned.body["endpoint"], expected_path);

    let reply = send(
        &app.router,
        post("/api/random/", Some(&cookie), json!({"message": "ok", "index": 5, "classType": "A"})),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    let expected_type = if endpoint_type == "lulu" { "Understanding" } else { "High" };
    assert_eq!(reply.body["messageType"], expected_type);

    let closing = send(&app.router, get("/api/random/closing/", Some(&cookie))).await;
    let closing_text = closing.body["message"].as_str().unwrap();
    assert_eq!(closing_text.contains("email address"), endpoint_type == "lulu");

    let reset = send(&app.router, post("/api/random/reset/", Some(&cookie), json!({}))).await;
    assert_eq!(reset.body["status"], "reset");

    let closing = send(&app.router, get("/api/random/closing/", Some(&cookie))).await;
    assert!(closing.body["message"].as_str().unwrap().ends_with("email below..."));
}

#[tokio::test]
async fn test_openapi_document_lists_chat_paths() {
    let app = app(Options::default());

    let reply = send(&app.router, get("/api/openapi.json", None)).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body["paths"]["/api/chatbot/"].is_object());
    assert!(reply.body["paths"]["/api/random/reset/"].is_object());
}
