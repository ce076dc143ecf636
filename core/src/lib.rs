//! Client-side orchestration for the prospecting backend: filter rows and
//! their canonical query, debounced live search, and the assistant chat that
//! feeds both.

mod api;
pub mod chat;
pub mod config;
pub mod filters;
pub mod payload;
pub mod records;
pub mod search_sync;
mod session;

pub use api::ProspectorApi;
pub use chat::ChatOrchestrator;
pub use chat::Conversation;
pub use chat::SendOutcome;
pub use config::ConfigError;
pub use config::ConfigOverrides;
pub use config::ProspectorConfig;
pub use config::find_prospector_home;
pub use filters::CanonicalFilter;
pub use filters::FilterBoard;
pub use filters::FilterCategory;
pub use filters::FilterModel;
pub use payload::IcpPayload;
pub use search_sync::SearchState;
pub use search_sync::SearchSync;
pub use session::ProspectingSession;
