use std::sync::Arc;

use anyhow::Result;
use anyhow::bail;
use prospector_core::FilterCategory;
use prospector_core::FilterModel;
use prospector_core::ProspectorApi;
use prospector_core::SearchSync;

use crate::context::CliContext;
use crate::render::format_results;

#[derive(Debug, clap::Parser)]
pub struct SearchArgs {
    /// Comma-separated industries. May be repeated.
    #[arg(long, value_name = "LIST")]
    pub industry: Vec<String>,

    /// Comma-separated locations. May be repeated.
    #[arg(long, value_name = "LIST")]
    pub geography: Vec<String>,

    /// Comma-separated job roles. May be repeated.
    #[arg(long, value_name = "LIST")]
    pub roles: Vec<String>,

    /// Print the raw result set as JSON.
    #[arg(long)]
    pub json: bool,
}

impl SearchArgs {
    /// One filter row per flag occurrence, as if typed into the filter pane.
    fn filter_model(&self, limit: u32) -> FilterModel {
        let mut model = FilterModel::new(limit);
        for (category, values) in [
            (FilterCategory::Industry, &self.industry),
            (FilterCategory::Geography, &self.geography),
            (FilterCategory::Roles, &self.roles),
        ] {
            for value in values {
                let row = model.add_row(category);
                model.update_row(row, value.as_str());
            }
        }
        model
    }
}

pub(crate) async fn run_search(context: &CliContext, args: SearchArgs) -> Result<()> {
    context.require_session()?;
    let filter = args.filter_model(context.config.search_limit).canonicalize();
    tracing::debug!("searching with {filter:?}");

    let api: Arc<dyn ProspectorApi> = Arc::new(context.client.clone());
    let search = SearchSync::new(api);
    search.search(&filter).await;

    let state = search.current();
    if let Some(error) = state.error {
        bail!(error);
    }
    if args.json {
        println!("{}", serde_json::to_string_pretty(&state.results)?);
    } else {
        println!("{}", format_results(&state.results));
    }
    Ok(())
}
