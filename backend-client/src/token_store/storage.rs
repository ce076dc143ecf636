use std::fmt::Debug;
use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;

use serde::Deserialize;
use serde::Serialize;

/// The persisted credential pair. Both values are opaque to the client.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct TokenPair {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl TokenPair {
    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none()
    }
}

/// Where the token pair is persisted between runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TokenStoreMode {
    /// `<home>/auth.json`.
    #[default]
    File,
    /// Kept in memory only; nothing survives the process.
    Ephemeral,
}

pub(crate) trait TokenStorageBackend: Debug + Send + Sync {
    fn load(&self) -> io::Result<Option<TokenPair>>;
    fn save(&self, tokens: &TokenPair) -> io::Result<()>;
    fn delete(&self) -> io::Result<bool>;
}

pub fn get_auth_file(home: &Path) -> PathBuf {
    home.join("auth.json")
}

pub fn try_read_auth_json(auth_file: &Path) -> io::Result<TokenPair> {
    let mut file = File::open(auth_file)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    let tokens: TokenPair = serde_json::from_str(&contents)?;
    Ok(tokens)
}

pub fn write_auth_json(auth_file: &Path, tokens: &TokenPair) -> io::Result<()> {
    if let Some(parent) = auth_file.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json_data = serde_json::to_string_pretty(tokens)?;
    let mut options = OpenOptions::new();
    options.truncate(true).write(true).create(true);
    #[cfg(unix)]
    {
        options.mode(0o600);
    }
    let mut file = options.open(auth_file)?;
    file.write_all(json_data.as_bytes())?;
    file.flush()?;
    Ok(())
}

#[derive(Debug)]
struct FileTokenStorage {
    home: PathBuf,
}

impl TokenStorageBackend for FileTokenStorage {
    fn load(&self) -> io::Result<Option<TokenPair>> {
        match try_read_auth_json(&get_auth_file(&self.home)) {
            Ok(tokens) => Ok(Some(tokens)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn save(&self, tokens: &TokenPair) -> io::Result<()> {
        write_auth_json(&get_auth_file(&self.home), tokens)
    }

    fn delete(&self) -> io::Result<bool> {
        match std::fs::remove_file(get_auth_file(&self.home)) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err),
        }
    }
}

#[derive(Debug, Default)]
struct EphemeralTokenStorage {
    tokens: Mutex<Option<TokenPair>>,
}

impl TokenStorageBackend for EphemeralTokenStorage {
    fn load(&self) -> io::Result<Option<TokenPair>> {
        let guard = self
            .tokens
            .lock()
            .map_err(|_| io::Error::other("failed to lock token storage"))?;
        Ok(guard.clone())
    }

    fn save(&self, tokens: &TokenPair) -> io::Result<()> {
        let mut guard = self
            .tokens
            .lock()
            .map_err(|_| io::Error::other("failed to lock token storage"))?;
        *guard = Some(tokens.clone());
        Ok(())
    }

    fn delete(&self) -> io::Result<bool> {
        let mut guard = self
            .tokens
            .lock()
            .map_err(|_| io::Error::other("failed to lock token storage"))?;
        Ok(guard.take().is_some())
    }
}

pub(crate) fn create_token_storage(
    home: PathBuf,
    mode: TokenStoreMode,
) -> Arc<dyn TokenStorageBackend> {
    match mode {
        TokenStoreMode::File => Arc::new(FileTokenStorage { home }),
        TokenStoreMode::Ephemeral => Arc::new(EphemeralTokenStorage::default()),
    }
}
