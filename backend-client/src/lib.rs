mod client;
mod endpoints;
mod error;
mod refresh;
mod request;
mod token_store;
pub mod types;

pub use client::BackendClient;
pub use client::DEFAULT_BASE_URL;
pub use client::DEFAULT_REQUEST_TIMEOUT;
pub use client::SessionExpiredHook;
pub use error::ApiError;
pub use error::Result;
pub use refresh::RefreshCoordinator;
pub use refresh::RefreshFailed;
pub use refresh::RefreshOutcome;
pub use request::ApiRequest;
pub use request::FileUpload;
pub use request::RequestBody;
pub use reqwest::StatusCode;
pub use token_store::TokenPair;
pub use token_store::TokenStore;
pub use token_store::TokenStoreMode;
pub use token_store::get_auth_file;
pub use types::ChatRequest;
pub use types::ChatResponse;
pub use types::SearchResult;
