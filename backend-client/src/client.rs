use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Response;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::error::Result;
use crate::refresh::RefreshCoordinator;
use crate::refresh::RefreshFailed;
use crate::refresh::RefreshOutcome;
use crate::request::ApiRequest;
use crate::request::join_url;
use crate::token_store::TokenStore;
use crate::types::RefreshRequest;
use crate::types::TokenResponse;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const REFRESH_PATH: &str = "/auth/refresh";

/// Invoked once per irrecoverable refresh failure, after the token store has
/// been cleared. Front ends use it to send the user back to login.
pub type SessionExpiredHook = Arc<dyn Fn() + Send + Sync>;

/// HTTP client for the prospecting backend.
///
/// Every call made through [`BackendClient::send`] carries the stored access
/// token. An `Unauthorized` answer triggers one session renewal (shared with
/// every other caller hitting the same condition) and one replay of the
/// request. Clones share the token store and the refresh coordinator.
#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<TokenStore>,
    refresh: Arc<RefreshCoordinator>,
    on_session_expired: Option<SessionExpiredHook>,
}

impl fmt::Debug for BackendClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendClient")
            .field("base_url", &self.base_url)
            .field("refreshing", &self.refresh.is_refreshing())
            .field("on_session_expired", &self.on_session_expired.is_some())
            .finish()
    }
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>, tokens: Arc<TokenStore>) -> Result<Self> {
        Self::with_timeout(base_url, tokens, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        tokens: Arc<TokenStore>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            tokens,
            refresh: Arc::new(RefreshCoordinator::new()),
            on_session_expired: None,
        })
    }

    /// Shares `coordinator` with other clients built over the same token
    /// store, so a renewal is single-flight across all of them.
    pub fn with_refresh_coordinator(mut self, coordinator: Arc<RefreshCoordinator>) -> Self {
        self.refresh = coordinator;
        self
    }

    pub fn with_session_expired_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_session_expired = Some(Arc::new(hook));
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tokens(&self) -> &Arc<TokenStore> {
        &self.tokens
    }

    pub fn refresh_coordinator(&self) -> &Arc<RefreshCoordinator> {
        &self.refresh
    }

    /// Issues `request`, renewing the session and replaying it once if the
    /// backend answers `401 Unauthorized`. Every other response, success or
    /// not, is returned as is.
    pub async fn send(&self, request: &ApiRequest) -> Result<Response> {
        let sent_token = self.tokens.access_token();
        let response = self.execute(request, sent_token.as_deref()).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let token = match self.tokens.access_token() {
            Some(current) if sent_token.as_deref() != Some(current.as_str()) => {
                tracing::debug!(
                    path = request.path(),
                    "access token changed while request was in flight; replaying"
                );
                current
            }
            None if self.tokens.get().is_empty() => {
                tracing::debug!(path = request.path(), "request unauthorized with no session");
                return Err(RefreshFailed::new("no session").into());
            }
            _ => {
                tracing::debug!(path = request.path(), "request unauthorized; renewing session");
                self.refresh.run(|| self.refresh_tokens()).await?
            }
        };

        // Replayed at most once: a second 401 goes back to the caller.
        self.execute(request, Some(&token)).await
    }

    /// Issues `request` with the stored access token but without session
    /// recovery. Used for calls where `401` means bad credentials.
    pub async fn send_without_recovery(&self, request: &ApiRequest) -> Result<Response> {
        let token = self.tokens.access_token();
        self.execute(request, token.as_deref()).await
    }

    /// [`BackendClient::send`], mapping non-2xx responses to
    /// [`ApiError::Status`].
    pub async fn send_checked(&self, request: &ApiRequest) -> Result<Response> {
        ensure_success(self.send(request).await?).await
    }

    pub async fn send_json<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T> {
        decode_json(self.send_checked(request).await?).await
    }

    pub(crate) async fn send_json_without_recovery<T: DeserializeOwned>(
        &self,
        request: &ApiRequest,
    ) -> Result<T> {
        let response = ensure_success(self.send_without_recovery(request).await?).await?;
        decode_json(response).await
    }

    async fn execute(&self, request: &ApiRequest, access_token: Option<&str>) -> Result<Response> {
        let builder = request.build(&self.http, &self.base_url, access_token)?;
        let response = builder.send().await?;
        tracing::debug!(
            method = %request.method(),
            path = request.path(),
            status = %response.status(),
            "backend request completed"
        );
        Ok(response)
    }

    async fn refresh_tokens(&self) -> RefreshOutcome {
        match self.request_new_tokens().await {
            Ok(access_token) => {
                tracing::info!("session renewed");
                Ok(access_token)
            }
            Err(failure) => {
                self.expire_session(&failure);
                Err(failure)
            }
        }
    }

    /// Exchanges the stored refresh token for a new pair. Talks to the
    /// transport directly so a rejected refresh never recurses into recovery.
    async fn request_new_tokens(&self) -> RefreshOutcome {
        let Some(refresh_token) = self.tokens.refresh_token() else {
            return Err(RefreshFailed::new("no refresh token"));
        };

        let response = self
            .http
            .post(join_url(&self.base_url, REFRESH_PATH))
            .json(&RefreshRequest {
                refresh_token: &refresh_token,
            })
            .send()
            .await
            .map_err(|err| RefreshFailed::new(format!("token refresh request failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RefreshFailed::new(format!(
                "token refresh rejected with status {status}"
            )));
        }

        let renewed: TokenResponse = response
            .json()
            .await
            .map_err(|err| RefreshFailed::new(format!("invalid token refresh response: {err}")))?;
        let Some(access_token) = renewed.access_token.filter(|token| !token.is_empty()) else {
            return Err(RefreshFailed::new("token refresh returned no access token"));
        };

        if let Err(err) = self
            .tokens
            .set(Some(access_token.clone()), renewed.refresh_token)
        {
            tracing::warn!("failed to persist renewed tokens: {err}");
        }
        Ok(access_token)
    }

    fn expire_session(&self, failure: &RefreshFailed) {
        tracing::warn!("session expired: {failure}");
        if let Err(err) = self.tokens.clear() {
            tracing::warn!("failed to remove persisted tokens: {err}");
        }
        if let Some(hook) = &self.on_session_expired {
            hook();
        }
    }
}

async fn ensure_success(response: Response) -> Result<Response> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(ApiError::from_response(response).await)
    }
}

async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}
