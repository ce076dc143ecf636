use std::io;
use std::path::Path;
use std::sync::Arc;
use std::sync::RwLock;

mod storage;
pub use storage::TokenPair;
pub use storage::TokenStoreMode;
pub use storage::get_auth_file;

use storage::TokenStorageBackend;
use storage::create_token_storage;

/// Process-wide holder of the access/refresh token pair.
///
/// Reads are served from memory; every mutation is written through to the
/// storage backend. The in-memory copy stays authoritative even when the
/// write-through fails, so a flaky disk cannot resurrect a cleared session.
#[derive(Debug)]
pub struct TokenStore {
    tokens: RwLock<TokenPair>,
    storage: Arc<dyn TokenStorageBackend>,
}

impl TokenStore {
    /// Loads the persisted pair from `home` (if any).
    pub fn load(home: &Path, mode: TokenStoreMode) -> io::Result<Self> {
        let storage = create_token_storage(home.to_path_buf(), mode);
        let tokens = storage.load()?.unwrap_or_default();
        Ok(Self {
            tokens: RwLock::new(tokens),
            storage,
        })
    }

    pub fn shared(home: &Path, mode: TokenStoreMode) -> io::Result<Arc<Self>> {
        Self::load(home, mode).map(Arc::new)
    }

    /// An empty in-memory store.
    pub fn ephemeral() -> Self {
        Self {
            tokens: RwLock::new(TokenPair::default()),
            storage: create_token_storage(Default::default(), TokenStoreMode::Ephemeral),
        }
    }

    pub fn get(&self) -> TokenPair {
        match self.tokens.read() {
            Ok(tokens) => tokens.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn access_token(&self) -> Option<String> {
        self.get().access_token
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.get().refresh_token
    }

    /// Replaces the provided fields and leaves omitted (or empty) ones as they
    /// were.
    pub fn set(
        &self,
        access_token: Option<String>,
        refresh_token: Option<String>,
    ) -> io::Result<()> {
        let snapshot = {
            let mut tokens = self
                .tokens
                .write()
                .map_err(|_| io::Error::other("failed to lock token store"))?;
            if let Some(access) = access_token.filter(|t| !t.is_empty()) {
                tokens.access_token = Some(access);
            }
            if let Some(refresh) = refresh_token.filter(|t| !t.is_empty()) {
                tokens.refresh_token = Some(refresh);
            }
            tokens.clone()
        };
        self.storage.save(&snapshot)
    }

    /// Forgets both tokens, in memory and on disk.
    pub fn clear(&self) -> io::Result<()> {
        {
            let mut tokens = self
                .tokens
                .write()
                .map_err(|_| io::Error::other("failed to lock token store"))?;
            *tokens = TokenPair::default();
        }
        self.storage.delete().map(|_| ())
    }
}
