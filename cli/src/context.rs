use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use anyhow::bail;
use prospector_backend_client::BackendClient;
use prospector_backend_client::TokenStore;
use prospector_backend_client::TokenStoreMode;
use prospector_backend_client::get_auth_file;
use prospector_core::ProspectorConfig;
use prospector_core::find_prospector_home;

use crate::commands::GlobalArgs;

pub(crate) const SESSION_EXPIRED: &str =
    "Session expired. Run `prospector login` to sign in again.";

/// Everything a command needs: the resolved home, the merged configuration
/// and a client over the stored session.
pub(crate) struct CliContext {
    pub home: PathBuf,
    pub config: ProspectorConfig,
    pub client: BackendClient,
}

impl CliContext {
    pub(crate) fn load(global: &GlobalArgs) -> Result<Self> {
        let home = match &global.home {
            Some(home) => home.clone(),
            None => find_prospector_home().context("failed to resolve PROSPECTOR_HOME")?,
        };
        let config = ProspectorConfig::load(&home, global.overrides())
            .context("failed to load configuration")?;

        let mode = if global.no_persist {
            TokenStoreMode::Ephemeral
        } else {
            TokenStoreMode::File
        };
        let tokens = TokenStore::shared(&home, mode).with_context(|| {
            format!(
                "failed to read session from {}",
                get_auth_file(&home).display()
            )
        })?;
        let client =
            BackendClient::with_timeout(config.base_url.clone(), tokens, config.request_timeout())
                .context("failed to build HTTP client")?
                .with_session_expired_hook(|| eprintln!("{SESSION_EXPIRED}"));

        tracing::debug!("using backend {} (home {})", config.base_url, home.display());
        Ok(Self {
            home,
            config,
            client,
        })
    }

    /// Fails early, without a network call, when no session is stored.
    pub(crate) fn require_session(&self) -> Result<()> {
        if self.client.tokens().get().is_empty() {
            bail!("Not logged in. Run `prospector login` first.");
        }
        Ok(())
    }
}
