#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ignite_gym::auth::{MemoryTokenStore, TokenPair};
use ignite_gym::client::{ApiClient, InterceptorHandle};
use ignite_gym::config::ClientConfig;
use serde_json::{json, Value};
use wiremock::{MockServer, ResponseTemplate};

pub const REFRESH_PATH: &str = "/sessions/refresh-token";

pub fn config_for(server: &MockServer) -> ClientConfig {
    ClientConfig::new(server.uri())
        .with_request_timeout(Duration::from_secs(5))
        .with_refresh_timeout(Duration::from_secs(5))
}

/// Client whose store and bearer header hold `pair`.
pub fn signed_in_client(server: &MockServer, pair: TokenPair) -> (ApiClient, Arc<MemoryTokenStore>) {
    let store = Arc::new(MemoryTokenStore::with_pair(pair.clone()));
    let client = ApiClient::new(config_for(server), store.clone()).expect("client");
    client
        .set_access_token(Some(&pair.access_token))
        .expect("bearer");
    (client, store)
}

pub fn expired() -> ResponseTemplate {
    ResponseTemplate::new(401).set_body_json(json!({ "status": "error", "message": "token.expired" }))
}

pub fn tokens(token: &str, refresh_token: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "token": token, "refresh_token": refresh_token }))
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

pub fn user_json() -> Value {
    json!({
        "id": 1,
        "name": "Ana",
        "email": "ana@example.com",
        "avatar": null,
        "created_at": "2024-03-01 10:00:00",
        "updated_at": "2024-03-01 10:00:00"
    })
}

/// Counts session-termination callbacks.
#[derive(Clone, Default)]
pub struct TerminationProbe {
    calls: Arc<AtomicUsize>,
}

impl TerminationProbe {
    pub fn install(client: &ApiClient) -> (Self, InterceptorHandle) {
        let probe = Self::default();
        let calls = probe.calls.clone();
        let handle = client.register_session_termination_handler(move || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
            }
        });
        (probe, handle)
    }

    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

/// Wait until `expected` requests are parked behind the refresh.
pub async fn wait_for_parked(client: &ApiClient, expected: usize) {
    for _ in 0..200 {
        if client.pending_refreshes() == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!(
        "expected {expected} parked requests, saw {}",
        client.pending_refreshes()
    );
}
