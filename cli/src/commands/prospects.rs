use anyhow::Result;
use anyhow::anyhow;
use serde_json::json;

use crate::context::CliContext;
use crate::render::format_prospect_lists;
use crate::render::format_results;

#[derive(Debug, clap::Parser)]
pub struct ProspectsArgs {
    /// Show the companies and people of this list instead of listing all.
    pub id: Option<String>,

    /// Print JSON instead of tables.
    #[arg(long)]
    pub json: bool,
}

pub(crate) async fn run_prospects(context: &CliContext, args: ProspectsArgs) -> Result<()> {
    context.require_session()?;
    let ProspectsArgs { id, json } = args;

    if let Some(id) = id {
        let results = context
            .client
            .prospect_list(&id)
            .await
            .map_err(|err| anyhow!(err.user_message("Failed to load prospect list")))?;
        if json {
            println!("{}", serde_json::to_string_pretty(&results)?);
        } else {
            println!("{}", format_results(&results));
        }
        return Ok(());
    }

    let lists = context
        .client
        .list_prospects()
        .await
        .map_err(|err| anyhow!(err.user_message("Failed to load prospect lists")))?;
    if json {
        let lists: Vec<_> = lists
            .iter()
            .map(|list| {
                json!({
                    "id": list.id,
                    "created_at": list.created_at,
                    "summary": list.summary,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&lists)?);
    } else {
        println!("{}", format_prospect_lists(&lists));
    }
    Ok(())
}
