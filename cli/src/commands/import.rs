use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use anyhow::anyhow;
use clap::ArgGroup;
use prospector_backend_client::FileUpload;

use crate::context::CliContext;

#[derive(Debug, clap::Args)]
#[command(
    group(
        ArgGroup::new("source")
            .args(["vault", "excel"])
            .required(true)
            .multiple(false)
    )
)]
pub struct ImportArgs {
    /// Vault export to ingest (admin only).
    #[arg(long, value_name = "FILE")]
    pub vault: Option<PathBuf>,

    /// Spreadsheet of companies or people.
    #[arg(long, value_name = "FILE")]
    pub excel: Option<PathBuf>,
}

pub(crate) async fn run_import(context: &CliContext, args: ImportArgs) -> Result<()> {
    context.require_session()?;
    let ImportArgs { vault, excel } = args;

    let response = match (vault, excel) {
        (Some(path), _) => context.client.import_vault(read_upload(&path)?).await,
        (None, Some(path)) => context.client.import_excel(read_upload(&path)?).await,
        (None, None) => return Err(anyhow!("one of --vault or --excel is required")),
    }
    .map_err(|err| anyhow!(err.user_message("Upload failed")))?;

    println!("Upload successful.");
    if let Some(msg) = response.msg {
        println!("{msg}");
    }
    if let Some(summary) = response.summary {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    Ok(())
}

fn read_upload(path: &Path) -> Result<FileUpload> {
    FileUpload::from_path(path).with_context(|| format!("failed to read {}", path.display()))
}
