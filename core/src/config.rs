use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use dirs::home_dir;
use prospector_backend_client::DEFAULT_BASE_URL;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

pub const PROSPECTOR_HOME_ENV: &str = "PROSPECTOR_HOME";
pub const API_URL_ENV: &str = "PROSPECTOR_API_URL";
pub const CONFIG_FILE: &str = "config.toml";

pub const DEFAULT_SEARCH_LIMIT: u32 = 50;
pub const DEFAULT_DEBOUNCE_MS: u64 = 450;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not locate home directory")]
    NoHomeDir,

    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Settings read from `<home>/config.toml`. Every key is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProspectorConfig {
    pub base_url: String,
    /// `limit` sent with every search.
    pub search_limit: u32,
    /// Quiet period before a filter edit turns into a search.
    pub debounce_ms: u64,
    pub request_timeout_secs: u64,
}

impl Default for ProspectorConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            search_limit: DEFAULT_SEARCH_LIMIT,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

/// Values supplied on the command line. They win over the environment and
/// the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub base_url: Option<String>,
    pub search_limit: Option<u32>,
    pub debounce_ms: Option<u64>,
    pub request_timeout_secs: Option<u64>,
}

impl ProspectorConfig {
    /// Loads `<home>/config.toml` (if present), then applies
    /// `PROSPECTOR_API_URL` and `overrides`.
    pub fn load(home: &Path, overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        let env_base_url = std::env::var(API_URL_ENV)
            .ok()
            .filter(|url| !url.trim().is_empty());
        Self::load_with_env(home, overrides, env_base_url)
    }

    pub fn load_with_env(
        home: &Path,
        overrides: ConfigOverrides,
        env_base_url: Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::from_file(&home.join(CONFIG_FILE))?;
        if let Some(base_url) = env_base_url {
            config.base_url = base_url;
        }
        config.apply(overrides);
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn apply(&mut self, overrides: ConfigOverrides) {
        let ConfigOverrides {
            base_url,
            search_limit,
            debounce_ms,
            request_timeout_secs,
        } = overrides;
        if let Some(base_url) = base_url {
            self.base_url = base_url;
        }
        if let Some(search_limit) = search_limit {
            self.search_limit = search_limit;
        }
        if let Some(debounce_ms) = debounce_ms {
            self.debounce_ms = debounce_ms;
        }
        if let Some(request_timeout_secs) = request_timeout_secs {
            self.request_timeout_secs = request_timeout_secs;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("base_url must not be empty".to_string()));
        }
        if self.search_limit == 0 {
            return Err(ConfigError::Invalid(
                "search_limit must be greater than zero".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// `$PROSPECTOR_HOME` when set, otherwise `~/.prospector`.
pub fn find_prospector_home() -> Result<PathBuf, ConfigError> {
    if let Ok(home) = std::env::var(PROSPECTOR_HOME_ENV)
        && !home.is_empty()
    {
        return Ok(PathBuf::from(home));
    }

    let mut home = home_dir().ok_or(ConfigError::NoHomeDir)?;
    home.push(".prospector");
    Ok(home)
}
