use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use serde::Deserialize;
use serde::Serialize;
use tokio::sync::watch;
use uuid::Uuid;

use crate::config::DEFAULT_SEARCH_LIMIT;
use crate::payload::IcpPayload;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterCategory {
    Industry,
    Geography,
    Roles,
}

impl FilterCategory {
    pub const ALL: [FilterCategory; 3] = [
        FilterCategory::Industry,
        FilterCategory::Geography,
        FilterCategory::Roles,
    ];

    /// Key used for this category in search requests and payloads.
    pub fn key(self) -> &'static str {
        match self {
            FilterCategory::Industry => "industry",
            FilterCategory::Geography => "geography",
            FilterCategory::Roles => "roles",
        }
    }
}

impl fmt::Display for FilterCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for FilterCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "industry" | "industries" => Ok(FilterCategory::Industry),
            "geography" | "geo" | "location" => Ok(FilterCategory::Geography),
            "roles" | "role" => Ok(FilterCategory::Roles),
            other => Err(format!("unknown filter category: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FilterRowId(Uuid);

impl FilterRowId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for FilterRowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterRow {
    pub id: FilterRowId,
    pub category: FilterCategory,
    /// As typed: comma-separated values, untrimmed.
    pub raw_value: String,
}

/// The search query derived from the filter rows. A category key is present
/// only when it has at least one token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geography: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
    pub limit: u32,
}

impl CanonicalFilter {
    pub fn empty(limit: u32) -> Self {
        Self {
            industry: None,
            geography: None,
            roles: None,
            limit,
        }
    }

    pub fn tokens(&self, category: FilterCategory) -> &[String] {
        let tokens = match category {
            FilterCategory::Industry => &self.industry,
            FilterCategory::Geography => &self.geography,
            FilterCategory::Roles => &self.roles,
        };
        tokens.as_deref().unwrap_or_default()
    }

    fn slot(&mut self, category: FilterCategory) -> &mut Option<Vec<String>> {
        match category {
            FilterCategory::Industry => &mut self.industry,
            FilterCategory::Geography => &mut self.geography,
            FilterCategory::Roles => &mut self.roles,
        }
    }

    pub fn is_unfiltered(&self) -> bool {
        FilterCategory::ALL
            .iter()
            .all(|category| self.tokens(*category).is_empty())
    }
}

/// The editable filter rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterModel {
    rows: Vec<FilterRow>,
    limit: u32,
}

impl Default for FilterModel {
    fn default() -> Self {
        Self::new(DEFAULT_SEARCH_LIMIT)
    }
}

impl FilterModel {
    pub fn new(limit: u32) -> Self {
        Self {
            rows: Vec::new(),
            limit,
        }
    }

    /// A model holding one blank industry row, the state a new search page
    /// starts from.
    pub fn with_blank_row(limit: u32) -> Self {
        let mut model = Self::new(limit);
        model.add_row(FilterCategory::Industry);
        model
    }

    /// One row per category present in `filter`, tokens joined with ", ".
    pub fn from_canonical(filter: &CanonicalFilter) -> Self {
        let mut model = Self::new(filter.limit);
        for category in FilterCategory::ALL {
            let tokens = filter.tokens(category);
            if !tokens.is_empty() {
                model.push_row(category, tokens.join(", "));
            }
        }
        model
    }

    pub fn rows(&self) -> &[FilterRow] {
        &self.rows
    }

    pub fn row(&self, id: FilterRowId) -> Option<&FilterRow> {
        self.rows.iter().find(|row| row.id == id)
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn add_row(&mut self, category: FilterCategory) -> FilterRowId {
        self.push_row(category, String::new())
    }

    /// Returns `false` if no row has `id`.
    pub fn update_row(&mut self, id: FilterRowId, value: impl Into<String>) -> bool {
        match self.rows.iter_mut().find(|row| row.id == id) {
            Some(row) => {
                row.raw_value = value.into();
                true
            }
            None => false,
        }
    }

    /// Returns `false` if no row has `id`.
    pub fn remove_row(&mut self, id: FilterRowId) -> bool {
        let before = self.rows.len();
        self.rows.retain(|row| row.id != id);
        self.rows.len() != before
    }

    pub fn canonicalize(&self) -> CanonicalFilter {
        let mut filter = CanonicalFilter::empty(self.limit);
        for category in FilterCategory::ALL {
            let tokens: Vec<String> = self
                .rows
                .iter()
                .filter(|row| row.category == category)
                .flat_map(|row| row.raw_value.split(','))
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .map(str::to_string)
                .collect();
            if !tokens.is_empty() {
                *filter.slot(category) = Some(tokens);
            }
        }
        filter
    }

    /// Folds the categories carried by `payload` into the rows: the first
    /// blank row of a category takes the value, otherwise a new row is
    /// appended. Returns whether any row changed.
    pub fn merge_payload(&mut self, payload: &IcpPayload) -> bool {
        let mut changed = false;
        for category in FilterCategory::ALL {
            let Some(value) = payload.category_value(category) else {
                continue;
            };
            match self
                .rows
                .iter_mut()
                .find(|row| row.category == category && row.raw_value.trim().is_empty())
            {
                Some(blank) => blank.raw_value = value,
                None => {
                    self.push_row(category, value);
                }
            }
            changed = true;
        }
        changed
    }

    fn push_row(&mut self, category: FilterCategory, raw_value: String) -> FilterRowId {
        let id = FilterRowId::new();
        self.rows.push(FilterRow {
            id,
            category,
            raw_value,
        });
        id
    }
}

/// A [`FilterModel`] shared between the editing surface and the search
/// driver. Each mutation republishes the canonical filter, but only when it
/// actually changed, so edits that do not affect the query never restart the
/// debounce window.
#[derive(Debug)]
pub struct FilterBoard {
    model: Mutex<FilterModel>,
    canonical: watch::Sender<CanonicalFilter>,
}

impl FilterBoard {
    pub fn new(model: FilterModel) -> Self {
        let (canonical, _) = watch::channel(model.canonicalize());
        Self {
            model: Mutex::new(model),
            canonical,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<CanonicalFilter> {
        self.canonical.subscribe()
    }

    pub fn canonical(&self) -> CanonicalFilter {
        self.canonical.borrow().clone()
    }

    pub fn snapshot(&self) -> FilterModel {
        self.lock_model().clone()
    }

    pub fn add_row(&self, category: FilterCategory) -> FilterRowId {
        self.mutate(|model| model.add_row(category))
    }

    pub fn update_row(&self, id: FilterRowId, value: impl Into<String>) -> bool {
        self.mutate(|model| model.update_row(id, value))
    }

    pub fn remove_row(&self, id: FilterRowId) -> bool {
        self.mutate(|model| model.remove_row(id))
    }

    pub fn merge_payload(&self, payload: &IcpPayload) -> bool {
        self.mutate(|model| model.merge_payload(payload))
    }

    /// Replaces every row at once.
    pub fn replace(&self, next: FilterModel) {
        self.mutate(|model| *model = next);
    }

    fn mutate<R>(&self, edit: impl FnOnce(&mut FilterModel) -> R) -> R {
        let mut model = self.lock_model();
        let result = edit(&mut model);
        let next = model.canonicalize();
        self.canonical.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                tracing::debug!(?next, "filter changed");
                *current = next;
                true
            }
        });
        result
    }

    fn lock_model(&self) -> MutexGuard<'_, FilterModel> {
        self.model.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
