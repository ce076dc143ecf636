use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

/// Loosely typed backend record (company or person). Field names vary
/// between data sources, so records are kept as raw JSON objects.
pub type Record = Value;

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct MessageResponse {
    #[serde(default)]
    pub msg: Option<String>,
    /// Import endpoints report what they ingested here.
    #[serde(default)]
    pub summary: Option<Value>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: String,
}

/// A result set. Both lists are always present; anything that is not an
/// array decodes as empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    #[serde(default, deserialize_with = "lenient_records")]
    pub companies: Vec<Record>,
    #[serde(default, deserialize_with = "lenient_records")]
    pub people: Vec<Record>,
}

impl SearchResult {
    pub fn is_empty(&self) -> bool {
        self.companies.is_empty() && self.people.is_empty()
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct SearchResponse {
    #[serde(default, deserialize_with = "lenient_results")]
    pub results: SearchResult,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ChatRequest {
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ChatResponse {
    #[serde(default)]
    pub conversation_id: Option<String>,
    /// Usually a string; kept raw because the backend does not guarantee it.
    #[serde(default)]
    pub reply: Value,
    /// Absent (or `null`) when the backend ran no search for this turn.
    #[serde(default)]
    pub results: Option<Value>,
    #[serde(default)]
    pub prospect_list_id: Option<String>,
}

impl ChatResponse {
    /// The inline result set, when the reply carried companies or people.
    pub fn inline_results(&self) -> Option<SearchResult> {
        let results = self.results.as_ref()?.as_object()?;
        let present = |key: &str| results.get(key).is_some_and(|value| !value.is_null());
        if !present("companies") && !present("people") {
            return None;
        }
        Some(SearchResult {
            companies: records_from(results.get("companies")),
            people: records_from(results.get("people")),
        })
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ConversationSummary {
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One saved prospect list. Stored documents carry several id fields; the
/// first of `id`, `prospect_list_id`, `_id` wins.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(from = "Map<String, Value>")]
pub struct ProspectListSummary {
    pub id: String,
    pub created_at: Option<String>,
    pub summary: Option<Value>,
}

impl From<Map<String, Value>> for ProspectListSummary {
    fn from(mut fields: Map<String, Value>) -> Self {
        let id = ["id", "prospect_list_id", "_id"]
            .iter()
            .find_map(|key| match fields.get(*key) {
                Some(Value::String(id)) if !id.is_empty() => Some(id.clone()),
                Some(Value::Number(id)) => Some(id.to_string()),
                _ => None,
            })
            .unwrap_or_default();
        let created_at = match fields.remove("created_at") {
            Some(Value::String(created_at)) => Some(created_at),
            _ => None,
        };
        let summary = fields.remove("summary").filter(|summary| !summary.is_null());
        Self {
            id,
            created_at,
            summary,
        }
    }
}

/// `GET /prospects` answers either with a bare array or `{items: [..]}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum ProspectListing {
    Bare(Vec<ProspectListSummary>),
    Wrapped {
        #[serde(default)]
        items: Vec<ProspectListSummary>,
    },
}

impl ProspectListing {
    pub(crate) fn into_items(self) -> Vec<ProspectListSummary> {
        match self {
            ProspectListing::Bare(items) | ProspectListing::Wrapped { items } => items,
        }
    }
}

fn records_from(value: Option<&Value>) -> Vec<Record> {
    match value {
        Some(Value::Array(items)) => items.clone(),
        _ => Vec::new(),
    }
}

fn lenient_records<'de, D>(deserializer: D) -> Result<Vec<Record>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(records_from(Some(&value)))
}

fn lenient_results<'de, D>(deserializer: D) -> Result<SearchResult, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Some(results) = value.as_object() else {
        return Ok(SearchResult::default());
    };
    Ok(SearchResult {
        companies: records_from(results.get("companies")),
        people: records_from(results.get("people")),
    })
}
