use std::sync::Arc;
use std::time::Duration;

use prospector_backend_client::BackendClient;
use prospector_backend_client::TokenStore;
use serde_json::Value;
use serde_json::json;
use tokio::sync::watch;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;
use wiremock::matchers::method;
use wiremock::matchers::path;

pub const TEST_ACCESS_TOKEN: &str = "test-access";
pub const TEST_REFRESH_TOKEN: &str = "test-refresh";

const DEFAULT_WAIT: Duration = Duration::from_secs(5);

/// A backend client for `server`, already holding a token pair.
pub fn logged_in_client(server: &MockServer) -> (BackendClient, Arc<TokenStore>) {
    let tokens = TokenStore::ephemeral();
    tokens
        .set(
            Some(TEST_ACCESS_TOKEN.to_string()),
            Some(TEST_REFRESH_TOKEN.to_string()),
        )
        .expect("ephemeral store accepts tokens");
    let tokens = Arc::new(tokens);
    let client = BackendClient::new(server.uri(), Arc::clone(&tokens)).expect("client builds");
    (client, tokens)
}

pub fn results(companies: Value, people: Value) -> Value {
    json!({ "results": { "companies": companies, "people": people } })
}

/// Answers every `POST /search/` with `body`.
pub async fn mount_search(server: &MockServer, body: Value) {
    Mock::given(method("POST"))
        .and(path("/search/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Answers every `POST /chat/` with `body`.
pub async fn mount_chat(server: &MockServer, body: Value) {
    Mock::given(method("POST"))
        .and(path("/chat/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// JSON bodies of every request the server received on `route`, in order.
pub async fn request_bodies(server: &MockServer, route: &str) -> Vec<Value> {
    server
        .received_requests()
        .await
        .expect("request recording enabled")
        .into_iter()
        .filter(|request| request.url.path() == route)
        .map(|request| serde_json::from_slice(&request.body).expect("json request body"))
        .collect()
}

/// Waits until the watched value satisfies `predicate` and returns it.
pub async fn wait_for_state<T, F>(receiver: &mut watch::Receiver<T>, mut predicate: F) -> T
where
    T: Clone,
    F: FnMut(&T) -> bool,
{
    tokio::time::timeout(DEFAULT_WAIT, async {
        loop {
            {
                let current = receiver.borrow_and_update();
                if predicate(&current) {
                    return current.clone();
                }
            }
            receiver.changed().await.expect("state sender dropped");
        }
    })
    .await
    .expect("timeout waiting for state")
}

/// Polls `route` until the server has seen `count` requests on it.
pub async fn wait_for_requests(server: &MockServer, route: &str, count: usize) -> Vec<Value> {
    tokio::time::timeout(DEFAULT_WAIT, async {
        loop {
            let bodies = request_bodies(server, route).await;
            if bodies.len() >= count {
                return bodies;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("timeout waiting for requests")
}
