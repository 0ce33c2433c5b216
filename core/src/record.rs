//! Domain record types shared by adapters, action creators and reducers.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a domain record: a string or an integer.
///
/// Serialized untagged, so `"abc"` and `42` are both valid JSON ids.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    /// Numeric identifier
    Number(i64),
    /// Textual identifier
    Text(String),
}

impl RecordId {
    /// Read an identifier from a JSON value, if it is a string or an integer.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(s) => Some(Self::Text(s.clone())),
            serde_json::Value::Number(n) => n.as_i64().map(Self::Number),
            _ => None,
        }
    }

    /// Convert the identifier into a JSON value.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Number(n) => serde_json::Value::from(*n),
            Self::Text(s) => serde_json::Value::String(s.clone()),
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for RecordId {
    fn from(value: i32) -> Self {
        Self::Number(i64::from(value))
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// A domain record managed by a resource.
///
/// Records move into state on success; the core never keeps them beyond the
/// latest value held by the reducer.
pub trait Record: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// The record's unique identifier, if it has been assigned one yet.
    fn id(&self) -> Option<RecordId>;
}

impl Record for serde_json::Value {
    fn id(&self) -> Option<RecordId> {
        self.get("id").and_then(RecordId::from_json)
    }
}

/// A partial record used for updates: a JSON object of the fields to change.
pub type PartialRecord = serde_json::Map<String, serde_json::Value>;

/// Response of a count operation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountResponse {
    /// Number of records matching the filter
    pub count: u64,
}

impl CountResponse {
    /// Create a count response
    #[must_use]
    pub const fn new(count: u64) -> Self {
        Self { count }
    }
}

/// Response of a delete operation: the id of the removed record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResponse {
    /// Identifier of the deleted record
    pub id: RecordId,
}

impl DeleteResponse {
    /// Create a delete response
    #[must_use]
    pub fn new(id: impl Into<RecordId>) -> Self {
        Self { id: id.into() }
    }
}
