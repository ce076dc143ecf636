use clap::Parser;
use prospector_cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    prospector_cli::init_tracing();
    Cli::parse().run().await
}
