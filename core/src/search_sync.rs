use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;

use prospector_backend_client::ApiError;
use prospector_backend_client::SearchResult;
use serde_json::Value;
use tokio::sync::watch;

use crate::api::ProspectorApi;
use crate::filters::CanonicalFilter;

pub const SEARCH_FAILED: &str = "Search failed";

/// What the results pane shows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    pub results: SearchResult,
    /// Text of the last failed filter search, cleared when the next starts.
    pub error: Option<String>,
    pub loading: bool,
}

#[derive(Debug, Default)]
struct Sequence {
    issued: u64,
    applied: u64,
    /// Tickets whose search has not come back yet.
    outstanding: BTreeSet<u64>,
}

impl Sequence {
    /// True when no search issued after the applied one is still running.
    fn settled(&self) -> bool {
        self.outstanding.range(self.applied + 1..).next().is_none()
    }
}

/// Turns canonical filters into searches and owns the current result set.
///
/// Every search takes a ticket when it is issued. A response is applied only
/// if no later-issued search has been applied yet, so results never move
/// backwards when responses arrive out of order.
pub struct SearchSync {
    api: Arc<dyn ProspectorApi>,
    sequence: Mutex<Sequence>,
    state: watch::Sender<SearchState>,
}

impl SearchSync {
    pub fn new(api: Arc<dyn ProspectorApi>) -> Self {
        let (state, _) = watch::channel(SearchState::default());
        Self {
            api,
            sequence: Mutex::new(Sequence::default()),
            state,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.subscribe()
    }

    pub fn current(&self) -> SearchState {
        self.state.borrow().clone()
    }

    /// Runs one search for `filter`. Failures become state: results are
    /// emptied and the error text is published.
    pub async fn search(&self, filter: &CanonicalFilter) {
        let ticket = self.issue();
        self.state.send_modify(|state| {
            state.error = None;
            state.loading = true;
        });

        let outcome = match serde_json::to_value(filter) {
            Ok(body) => self.api.search(&body).await,
            Err(err) => Err(ApiError::from(err)),
        };

        let applied = self.apply(ticket, |state| match outcome {
            Ok(results) => {
                tracing::debug!(
                    companies = results.companies.len(),
                    people = results.people.len(),
                    "search results applied"
                );
                state.results = results;
                state.error = None;
            }
            Err(err) => {
                tracing::warn!("search failed: {err}");
                state.results = SearchResult::default();
                state.error = Some(err.user_message(SEARCH_FAILED));
            }
        });
        if !applied {
            tracing::debug!(ticket, "discarded stale search response");
        }
    }

    /// Runs a search with a raw request body on behalf of another component.
    /// Results are applied like any other search; a failure is returned to
    /// the caller and leaves the current results untouched.
    pub async fn search_body(&self, body: &Value) -> Result<(), ApiError> {
        let ticket = self.issue();
        match self.api.search(body).await {
            Ok(results) => {
                self.apply(ticket, |state| state.results = results);
                Ok(())
            }
            Err(err) => {
                self.abandon(ticket);
                Err(err)
            }
        }
    }

    /// Replaces the results with a set obtained elsewhere (a chat reply).
    pub fn replace_results(&self, results: SearchResult) {
        let ticket = self.issue();
        self.apply(ticket, |state| state.results = results);
    }

    fn issue(&self) -> u64 {
        let mut sequence = self.lock_sequence();
        sequence.issued += 1;
        let ticket = sequence.issued;
        sequence.outstanding.insert(ticket);
        ticket
    }

    fn apply(&self, ticket: u64, update: impl FnOnce(&mut SearchState)) -> bool {
        let mut sequence = self.lock_sequence();
        sequence.outstanding.remove(&ticket);
        if ticket < sequence.applied {
            return false;
        }
        sequence.applied = ticket;
        let settled = sequence.settled();
        self.state.send_modify(|state| {
            update(state);
            if settled {
                state.loading = false;
            }
        });
        true
    }

    /// Retires a ticket whose search produced nothing to apply.
    fn abandon(&self, ticket: u64) {
        let mut sequence = self.lock_sequence();
        sequence.outstanding.remove(&ticket);
        if sequence.settled() {
            self.state.send_if_modified(|state| {
                let was_loading = state.loading;
                state.loading = false;
                was_loading
            });
        }
    }

    fn lock_sequence(&self) -> std::sync::MutexGuard<'_, Sequence> {
        self.sequence.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
