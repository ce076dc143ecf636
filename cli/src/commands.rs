use std::path::PathBuf;

use anyhow::Result;
use prospector_core::ConfigOverrides;

use crate::context::CliContext;

mod auth;
mod chat;
mod import;
mod prospects;
mod search;

/// Client for the prospecting backend.
///
/// Subcommands:
/// - `login` / `register` / `logout` / `whoami`: manage the stored session
/// - `search`: one filtered search, printed as tables
/// - `chat`: talk to the assistant while filters and results update live
/// - `prospects`: list saved prospect lists or show one
/// - `import`: upload a vault or spreadsheet file
#[derive(Debug, clap::Parser)]
#[command(name = "prospector", version)]
pub struct Cli {
    #[clap(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Default, clap::Args)]
pub struct GlobalArgs {
    /// Backend origin. Overrides `base_url` and `PROSPECTOR_API_URL`.
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Directory holding `config.toml` and `auth.json`.
    #[arg(long, global = true, value_name = "DIR")]
    pub home: Option<PathBuf>,

    /// `limit` sent with every search.
    #[arg(long, global = true)]
    pub limit: Option<u32>,

    /// Quiet period before a filter edit turns into a search.
    #[arg(long, global = true, value_name = "MS")]
    pub debounce_ms: Option<u64>,

    /// HTTP request timeout.
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// Keep the session in memory only; nothing is written to `auth.json`.
    #[arg(long, global = true)]
    pub no_persist: bool,
}

impl GlobalArgs {
    pub(crate) fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            base_url: self.api_url.clone(),
            search_limit: self.limit,
            debounce_ms: self.debounce_ms,
            request_timeout_secs: self.timeout_secs,
        }
    }
}

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// Sign in and store the session.
    Login(auth::LoginArgs),

    /// Create an account.
    Register(auth::RegisterArgs),

    /// Revoke and forget the stored session.
    Logout,

    /// Show the signed-in account.
    Whoami,

    /// Run one search against the filters given as flags.
    Search(search::SearchArgs),

    /// Chat with the prospecting assistant.
    Chat(chat::ChatArgs),

    /// List saved prospect lists, or show one by id.
    Prospects(prospects::ProspectsArgs),

    /// Upload a data file.
    Import(import::ImportArgs),
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let Cli { global, command } = self;
        let context = CliContext::load(&global)?;

        match command {
            Command::Login(args) => auth::run_login(&context, args).await,
            Command::Register(args) => auth::run_register(&context, args).await,
            Command::Logout => auth::run_logout(&context).await,
            Command::Whoami => auth::run_whoami(&context).await,
            Command::Search(args) => search::run_search(&context, args).await,
            Command::Chat(args) => chat::run_chat(&context, args).await,
            Command::Prospects(args) => prospects::run_prospects(&context, args).await,
            Command::Import(args) => import::run_import(&context, args).await,
        }
    }
}
