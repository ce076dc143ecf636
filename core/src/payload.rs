use std::sync::LazyLock;

use regex_lite::Regex;
use serde_json::Map;
use serde_json::Value;

use crate::filters::FilterCategory;
use crate::records::to_text;

#[allow(clippy::expect_used)]
static ICP_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<icp_json>(.*?)</icp_json>").expect("valid icp_json pattern")
});

/// Structured targeting criteria embedded in an assistant reply between
/// `<icp_json>` tags.
#[derive(Debug, Clone, PartialEq)]
pub struct IcpPayload {
    fields: Map<String, Value>,
}

impl IcpPayload {
    /// The first embedded payload in `text`. A block that is missing, not
    /// valid JSON, or not a JSON object counts as no payload.
    pub fn extract(text: &str) -> Option<Self> {
        let block = ICP_BLOCK.captures(text)?.get(1)?.as_str().trim();
        match serde_json::from_str::<Value>(block) {
            Ok(Value::Object(fields)) => Some(Self { fields }),
            Ok(other) => {
                tracing::debug!("ignoring icp_json block that is not an object: {other}");
                None
            }
            Err(err) => {
                tracing::debug!("ignoring malformed icp_json block: {err}");
                None
            }
        }
    }

    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// The row value this payload carries for `category`: a string as is, an
    /// array as its non-empty items joined with ", ". Empty values count as
    /// absent.
    pub fn category_value(&self, category: FilterCategory) -> Option<String> {
        let value = match self.fields.get(category.key())? {
            Value::Null | Value::Bool(false) => return None,
            Value::String(text) => text.clone(),
            Value::Array(items) => items
                .iter()
                .map(to_text)
                .filter(|item| !item.is_empty())
                .collect::<Vec<_>>()
                .join(", "),
            other => to_text(other),
        };
        (!value.is_empty()).then_some(value)
    }

    /// Search request body: every payload field plus `limit`.
    pub fn search_body(&self, limit: u32) -> Value {
        let mut body = self.fields.clone();
        body.insert("limit".to_string(), Value::from(limit));
        Value::Object(body)
    }
}
