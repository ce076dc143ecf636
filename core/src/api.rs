use async_trait::async_trait;
use prospector_backend_client::ApiError;
use prospector_backend_client::BackendClient;
use prospector_backend_client::ChatRequest;
use prospector_backend_client::ChatResponse;
use prospector_backend_client::SearchResult;
use serde_json::Value;

/// The backend calls the orchestration layer depends on.
#[async_trait]
pub trait ProspectorApi: Send + Sync {
    async fn search(&self, body: &Value) -> Result<SearchResult, ApiError>;

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, ApiError>;
}

#[async_trait]
impl ProspectorApi for BackendClient {
    async fn search(&self, body: &Value) -> Result<SearchResult, ApiError> {
        BackendClient::search(self, body).await
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, ApiError> {
        BackendClient::chat(self, request).await
    }
}
