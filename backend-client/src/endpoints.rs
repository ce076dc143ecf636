//! Typed wrappers over [`BackendClient::send`], one per backend route.

use serde::Serialize;
use serde_json::Value;
use serde_json::json;

use crate::client::BackendClient;
use crate::error::Result;
use crate::request::ApiRequest;
use crate::request::FileUpload;
use crate::types::ChatRequest;
use crate::types::ChatResponse;
use crate::types::ConversationSummary;
use crate::types::LoginRequest;
use crate::types::MessageResponse;
use crate::types::ProspectListSummary;
use crate::types::ProspectListing;
use crate::types::RegisterRequest;
use crate::types::SearchResponse;
use crate::types::SearchResult;
use crate::types::TokenResponse;
use crate::types::UserProfile;

impl BackendClient {
    /// Exchanges credentials for a token pair and stores it.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenResponse> {
        let request = ApiRequest::post_json(
            "/auth/login",
            &LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            },
        )?;
        let tokens: TokenResponse = self.send_json_without_recovery(&request).await?;
        self.tokens()
            .set(tokens.access_token.clone(), tokens.refresh_token.clone())?;
        tracing::info!("logged in");
        Ok(tokens)
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<MessageResponse> {
        let request = ApiRequest::post_json(
            "/auth/register",
            &RegisterRequest {
                name: name.to_string(),
                email: email.to_string(),
                password: password.to_string(),
            },
        )?;
        self.send_json_without_recovery(&request).await
    }

    pub async fn me(&self) -> Result<UserProfile> {
        self.send_json(&ApiRequest::get("/auth/me")).await
    }

    /// Ends the session locally. The backend is asked to revoke the refresh
    /// token first; that call is best effort and its failure is not reported.
    pub async fn logout(&self) -> Result<()> {
        if let Some(refresh_token) = self.tokens().refresh_token() {
            let request =
                ApiRequest::post_json("/auth/logout", &json!({ "refresh_token": refresh_token }))?;
            match self.send_without_recovery(&request).await {
                Ok(response) if !response.status().is_success() => {
                    tracing::debug!("refresh token revocation returned {}", response.status());
                }
                Ok(_) => {}
                Err(err) => tracing::debug!("refresh token revocation failed: {err}"),
            }
        }
        self.tokens().clear()?;
        tracing::info!("logged out");
        Ok(())
    }

    /// Runs a search. `filter` is sent as the request body verbatim.
    pub async fn search<T: Serialize + ?Sized>(&self, filter: &T) -> Result<SearchResult> {
        let request = ApiRequest::post_json("/search/", filter)?;
        let response: SearchResponse = self.send_json(&request).await?;
        Ok(response.results)
    }

    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        self.send_json(&ApiRequest::post_json("/chat/", request)?)
            .await
    }

    pub async fn conversations(&self) -> Result<Vec<ConversationSummary>> {
        self.send_json(&ApiRequest::get("/chat/history")).await
    }

    pub async fn conversation(&self, conversation_id: &str) -> Result<Value> {
        self.send_json(&ApiRequest::get(format!("/chat/history/{conversation_id}")))
            .await
    }

    pub async fn list_prospects(&self) -> Result<Vec<ProspectListSummary>> {
        let listing: ProspectListing = self.send_json(&ApiRequest::get("/prospects")).await?;
        Ok(listing.into_items())
    }

    /// A saved prospect list. Companies and people are read from the top
    /// level of the document, or from its `results` object when the top
    /// level has neither.
    pub async fn prospect_list(&self, prospect_list_id: &str) -> Result<SearchResult> {
        let document: Value = self
            .send_json(&ApiRequest::get(format!("/prospects/{prospect_list_id}")))
            .await?;
        let has_lists = document.get("companies").is_some() || document.get("people").is_some();
        let source = match document.get("results") {
            Some(results) if !has_lists => results.clone(),
            _ => document,
        };
        Ok(serde_json::from_value(source).unwrap_or_default())
    }

    pub async fn import_vault(&self, upload: FileUpload) -> Result<MessageResponse> {
        self.send_json(&ApiRequest::post_file("/admin/import-vault", upload))
            .await
    }

    pub async fn import_excel(&self, upload: FileUpload) -> Result<MessageResponse> {
        self.send_json(&ApiRequest::post_file("/import/excel", upload))
            .await
    }
}
