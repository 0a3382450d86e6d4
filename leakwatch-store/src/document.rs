//! Documents, filters and typed encoding helpers.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::StoreError;

/// The fields of a stored document.
pub type Fields = Map<String, Value>;

/// A stored document: its generated identifier plus its fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(default)]
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Decode the fields into a typed value.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        serde_json::from_value(Value::Object(self.fields.clone()))
            .map_err(|e| StoreError::Parse(format!("document {}: {}", self.id, e)))
    }
}

/// An equality predicate on a single field.
///
/// Queries take a slice of filters; a document matches when every
/// filter matches.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub value: Value,
}

impl Filter {
    /// `field == value`.
    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Whether `fields` satisfies this predicate.
    pub fn matches(&self, fields: &Fields) -> bool {
        fields.get(&self.field) == Some(&self.value)
    }

    /// The value rendered for a URL query string.
    pub fn query_value(&self) -> String {
        match &self.value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Whether every filter matches.
pub fn matches_all(filters: &[Filter], fields: &Fields) -> bool {
    filters.iter().all(|f| f.matches(fields))
}

/// Result of a conditional create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    /// No document matched the guard; a new one was written.
    Created(String),
    /// A document already matched the guard; nothing was written.
    Existing(String),
}

impl CreateOutcome {
    pub fn id(&self) -> &str {
        match self {
            CreateOutcome::Created(id) | CreateOutcome::Existing(id) => id,
        }
    }

    pub fn into_id(self) -> String {
        match self {
            CreateOutcome::Created(id) | CreateOutcome::Existing(id) => id,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, CreateOutcome::Created(_))
    }
}

/// Encode a serializable value as document fields.
///
/// The value must serialize to a JSON object.
pub fn to_fields<T: Serialize>(value: &T) -> Result<Fields, StoreError> {
    match serde_json::to_value(value).map_err(|e| StoreError::Encode(e.to_string()))? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Encode(format!(
            "expected an object, got {}",
            type_name(&other)
        ))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
