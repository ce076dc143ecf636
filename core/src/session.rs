use std::sync::Arc;
use std::time::Duration;

use prospector_async_utils::Debouncer;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::api::ProspectorApi;
use crate::chat::ChatOrchestrator;
use crate::config::ProspectorConfig;
use crate::filters::CanonicalFilter;
use crate::filters::FilterBoard;
use crate::filters::FilterModel;
use crate::search_sync::SearchSync;

/// One prospecting page: editable filters, the live result set they drive,
/// and the assistant chat that can rewrite both.
///
/// A background task watches the canonical filter, debounces it and issues
/// one search per stable value. The first search runs right away with the
/// initial filter. Dropping the session stops the task; searches already in
/// flight still land, but no new one is issued.
pub struct ProspectingSession {
    filters: Arc<FilterBoard>,
    search: Arc<SearchSync>,
    chat: Arc<ChatOrchestrator>,
    cancel: CancellationToken,
    driver: JoinHandle<()>,
}

impl ProspectingSession {
    pub fn start(api: Arc<dyn ProspectorApi>, config: &ProspectorConfig) -> Self {
        Self::with_filters(
            api,
            FilterModel::with_blank_row(config.search_limit),
            config.debounce(),
        )
    }

    pub fn with_filters(
        api: Arc<dyn ProspectorApi>,
        model: FilterModel,
        debounce: Duration,
    ) -> Self {
        let filters = Arc::new(FilterBoard::new(model));
        let search = Arc::new(SearchSync::new(Arc::clone(&api)));
        let chat = Arc::new(ChatOrchestrator::new(
            api,
            Arc::clone(&filters),
            Arc::clone(&search),
        ));
        let cancel = CancellationToken::new();
        let driver = tokio::spawn(drive_searches(
            filters.subscribe(),
            Arc::clone(&search),
            debounce,
            cancel.clone(),
        ));
        Self {
            filters,
            search,
            chat,
            cancel,
            driver,
        }
    }

    pub fn filters(&self) -> &Arc<FilterBoard> {
        &self.filters
    }

    pub fn search(&self) -> &Arc<SearchSync> {
        &self.search
    }

    pub fn chat(&self) -> &Arc<ChatOrchestrator> {
        &self.chat
    }

    /// Stops the search driver and waits for it to exit.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Err(err) = (&mut self.driver).await
            && err.is_panic()
        {
            tracing::warn!("search driver panicked: {err}");
        }
    }
}

impl Drop for ProspectingSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn drive_searches(
    mut filters: watch::Receiver<CanonicalFilter>,
    search: Arc<SearchSync>,
    delay: Duration,
    cancel: CancellationToken,
) {
    let (debouncer, mut stable) = Debouncer::with_cancellation(delay, cancel.child_token());

    let initial = filters.borrow_and_update().clone();
    spawn_search(&search, initial);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            changed = filters.changed() => {
                if changed.is_err() {
                    break;
                }
                debouncer.push(filters.borrow_and_update().clone());
            }
            Some(filter) = stable.recv() => spawn_search(&search, filter),
        }
    }
    tracing::debug!("search driver stopped");
}

fn spawn_search(search: &Arc<SearchSync>, filter: CanonicalFilter) {
    let search = Arc::clone(search);
    tokio::spawn(async move { search.search(&filter).await });
}
