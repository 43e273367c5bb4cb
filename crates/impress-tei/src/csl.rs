//! CSL-JSON records from a reference-manager export
//!
//! Zotero exports a JSON array of CSL items. Only `id`, `issued` and `note`
//! are interpreted; everything else is carried along untouched.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::date::normalize_csl_date;
use crate::error::SourceError;

/// One item of a CSL-JSON export.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CslRecord {
    /// Item URI, e.g. `http://zotero.org/users/1/items/AB12CD34`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issued: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CslRecord {
    /// Last `/`-separated segment of the id.
    ///
    /// A missing or non-string id yields an empty key.
    pub fn item_key(&self) -> &str {
        self.id
            .as_ref()
            .and_then(Value::as_str)
            .and_then(|id| id.rsplit('/').next())
            .unwrap_or("")
    }

    /// Normalized issued date, if one can be computed.
    pub fn normalized_date(&self) -> Option<String> {
        self.issued.as_ref().and_then(normalize_csl_date)
    }

    /// Bibliographic note text; empty notes count as absent.
    pub fn note_text(&self) -> Option<&str> {
        self.note
            .as_ref()
            .and_then(Value::as_str)
            .filter(|note| !note.is_empty())
    }
}

/// Parse a CSL-JSON export held in memory.
pub fn parse_records(json: &str) -> Result<Vec<CslRecord>, SourceError> {
    let value: Value = serde_json::from_str(json)?;
    match value {
        Value::Array(_) => Ok(serde_json::from_value(value)?),
        other => Err(SourceError::NotAnArray(json_kind(&other))),
    }
}

/// Read and parse a CSL-JSON export file.
pub fn load_records(path: impl AsRef<Path>) -> Result<Vec<CslRecord>, SourceError> {
    let content = std::fs::read_to_string(path)?;
    parse_records(&content)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
