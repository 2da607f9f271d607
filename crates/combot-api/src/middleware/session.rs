use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use combot_ml::TtlCache;
use combot_types::{EndpointType, Scenario};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use crate::state::AppState;

/// Cache namespace holding session payloads
pub const SESSION_NAMESPACE: &str = "session:";

/// Everything remembered about a participant between requests
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario: Option<Scenario>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_type: Option<EndpointType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_type_breakdown: Option<BTreeMap<String, f32>>,
}

/// Handle to the current request's session, inserted by [`load_session`]
#[derive(Clone)]
pub struct Session {
    id: String,
    cache: TtlCache,
    is_new: bool,
    written: Arc<AtomicBool>,
}

impl Session {
    pub fn new(id: impl Into<String>, cache: TtlCache, is_new: bool) -> Self {
        Self {
            id: id.into(),
            cache,
            is_new,
            written: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// Stored data, or an empty session when nothing was saved (or it expired)
    pub async fn data(&self) -> SessionData {
        if self.is_new && !self.written.load(Ordering::Relaxed) {
            return SessionData::default();
        }
        self.cache.get_json(&self.id).await.unwrap_or_default()
    }

    pub async fn save(&self, data: &SessionData) -> bool {
        self.written.store(true, Ordering::Relaxed);
        self.cache.set_json(&self.id, data).await
    }

    /// Load, modify and store in one step
    pub async fn update(&self, f: impl FnOnce(&mut SessionData)) -> SessionData {
        let mut data = self.data().await;
        f(&mut data);
        self.save(&data).await;
        data
    }

    /// Forget everything stored for this session
    pub async fn flush(&self) {
        self.cache.delete(&self.id).await;
        tracing::debug!(session_id = %self.id, "Session flushed");
    }

    /// Any save renews the stored data's TTL, so the cookie is re-issued with it
    fn needs_cookie(&self) -> bool {
        self.written.load(Ordering::Relaxed)
    }
}

/// Session middleware
///
/// Reads the session cookie (minting a new id when absent or malformed),
/// exposes a [`Session`] in request extensions, and (re)sets the cookie
/// whenever the request stored something.
pub async fn load_session(State(state): State<Arc<AppState>>, mut req: Request, next: Next) -> Response {
    let settings = &state.config.session;

    let (id, is_new) = match session_id_from_headers(req.headers(), &settings.cookie_name) {
        Some(id) => (id, false),
        None => (Uuid::new_v4().to_string(), true),
    };

    let session = Session::new(id, state.sessions.clone(), is_new);
    req.extensions_mut().insert(session.clone());

    let mut response = next.run(req).await;

    if session.needs_cookie() {
        let cookie = format!(
            "{}={}; Path=/; Max-Age={}; SameSite=Lax",
            settings.cookie_name,
            session.id(),
            settings.ttl_secs
        );
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => tracing::warn!("Invalid session cookie: {}", e),
        }
    }

    response
}

/// Session id from the `Cookie` headers; only well-formed UUIDs are accepted
pub fn session_id_from_headers(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
        .map(|id| id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use combot_ml::MemoryStore;
    use combot_types::{Brand, Level, ProblemType};
    use std::time::Duration;

    fn cache() -> TtlCache {
        TtlCache::new(Arc::new(MemoryStore::new()), SESSION_NAMESPACE, Duration::from_secs(60))
    }

    #[test]
    fn test_cookie_parsing() {
        let id = Uuid::new_v4().to_string();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("theme=dark; sessionid={id}")).unwrap(),
        );

        assert_eq!(session_id_from_headers(&headers, "sessionid"), Some(id));
        assert_eq!(session_id_from_headers(&headers, "other"), None);
    }

    #[test]
    fn test_malformed_cookie_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("sessionid=../../etc"));
        assert_eq!(session_id_from_headers(&headers, "sessionid"), None);
    }

    #[tokio::test]
    async fn test_session_round_trip_and_flush() {
        let cache = cache();
        let id = Uuid::new_v4().to_string();
        let scenario = Scenario::new(Brand::Lulu, ProblemType::B, Level::Low, Level::High);

        let first = Session::new(id.clone(), cache.clone(), true);
        assert_eq!(first.data().await, SessionData::default());
        first
            .update(|data| {
                data.scenario = Some(scenario);
                data.endpoint_type = Some(EndpointType::Lulu);
            })
            .await;
        assert!(first.needs_cookie());

        let second = Session::new(id, cache, false);
        let data = second.data().await;
        assert_eq!(data.scenario, Some(scenario));
        assert!(!second.needs_cookie());

        second.save(&data).await;
        assert!(second.needs_cookie());

        second.flush().await;
        assert_eq!(second.data().await, SessionData::default());
    }
}
