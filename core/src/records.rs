//! Display text for loosely shaped backend records.
//!
//! Companies and people come from several import sources, each with its own
//! field names. Every displayed column is resolved through an ordered chain
//! of candidate fields; the first present, non-null one wins.

use serde_json::Value;

const OBJECT_TEXT_FIELDS: [&str; 6] = ["name", "title", "label", "text", "email", "id"];

const PERSON_NAME: &[&[&str]] = &[&["full_name"], &["fullName"]];
const PERSON_TITLE: &[&[&str]] = &[&["employment", "title"], &["Designation"], &["Title"]];
const PERSON_COMPANY: &[&[&str]] = &[&["company"], &["company_name"], &["Company"]];
const PERSON_EMAIL: &[&[&str]] = &[&["email"], &["emails"]];

const COMPANY_NAME: &[&[&str]] = &[&["name"], &["company_name"]];
const COMPANY_INDUSTRY: &[&[&str]] = &[&["industry"]];
const COMPANY_SIZE: &[&[&str]] = &[&["size"], &["employee_count"]];
const COMPANY_LOCATION: &[&[&str]] = &[&["location"], &["country"]];

const RECORD_KEY: &[&[&str]] = &[&["id"], &["_id"]];

/// Renders any JSON value as a single line of text.
///
/// Scalars render as themselves, arrays as their non-empty item texts joined
/// with ", ", objects through `value` or the first common label field, and
/// anything else as compact JSON.
pub fn to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        Value::Array(items) => items
            .iter()
            .map(to_text)
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(fields) => {
            if let Some(inner) = fields.get("value") {
                return to_text(inner);
            }
            OBJECT_TEXT_FIELDS
                .iter()
                .find_map(|key| fields.get(*key).filter(|field| !field.is_null()))
                .map(to_text)
                .unwrap_or_else(|| value.to_string())
        }
    }
}

fn lookup<'a>(record: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter()
        .try_fold(record, |current, key| current.get(*key))
        .filter(|found| !found.is_null())
}

/// Text of the first candidate path present in `record`, or "".
pub fn resolve(record: &Value, chain: &[&[&str]]) -> String {
    chain
        .iter()
        .find_map(|path| lookup(record, path))
        .map(to_text)
        .unwrap_or_default()
}

/// Stable identity of a record, when it has one.
pub fn record_key(record: &Value) -> Option<String> {
    let key = resolve(record, RECORD_KEY);
    (!key.is_empty()).then_some(key)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonRow {
    pub name: String,
    pub title: String,
    pub company: String,
    pub email: String,
}

impl PersonRow {
    pub fn from_record(record: &Value) -> Self {
        Self {
            name: resolve(record, PERSON_NAME),
            title: resolve(record, PERSON_TITLE),
            company: resolve(record, PERSON_COMPANY),
            email: person_email(record),
        }
    }
}

fn person_email(record: &Value) -> String {
    if let Some(first) = record
        .get("emails")
        .and_then(Value::as_array)
        .and_then(|emails| emails.first())
    {
        return to_text(first);
    }
    resolve(record, PERSON_EMAIL)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompanyRow {
    pub name: String,
    pub industry: String,
    pub size: String,
    pub location: String,
}

impl CompanyRow {
    pub fn from_record(record: &Value) -> Self {
        Self {
            name: resolve(record, COMPANY_NAME),
            industry: resolve(record, COMPANY_INDUSTRY),
            size: resolve(record, COMPANY_SIZE),
            location: resolve(record, COMPANY_LOCATION),
        }
    }
}
