//! The `prospector` command-line front end. Every command is a thin layer
//! over `prospector-backend-client` and `prospector-core`.

mod commands;
mod context;
mod render;

pub use commands::Cli;
pub use commands::Command;
pub use commands::GlobalArgs;

use tracing_subscriber::EnvFilter;

/// Installs the stderr log subscriber. `RUST_LOG` selects the level,
/// `warn` otherwise.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
