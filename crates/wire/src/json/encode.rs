//! Canonical JSON encoding of annotation entries
//!
//! The canonical array is what exports and backups contain, and what the
//! decoder reads back unchanged.

use annolog_core::{AnnotationEntry, Origin, Timestamp};
use chrono::SecondsFormat;
use serde::Serialize;
use serde_json::{json, Value};

/// Encode a timestamp the way the canonical array stores it
pub fn encode_timestamp(ts: &Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Encode one entry as a canonical JSON object
pub fn encode_entry(entry: &AnnotationEntry) -> Value {
    let origin = match entry.origin {
        Origin::Native => "native",
        Origin::Legacy => "legacy",
    };
    json!({
        "id": entry.id.as_str(),
        "author": entry.author,
        "content": entry.content,
        "created_at": entry.created_at.as_ref().map(encode_timestamp),
        "origin": origin,
    })
}

/// Encode entries as a canonical JSON array
pub fn encode_entries(entries: &[AnnotationEntry]) -> Value {
    Value::Array(entries.iter().map(encode_entry).collect())
}

/// Encode entries as the text of a canonical feedback column
pub fn encode_column(entries: &[AnnotationEntry]) -> String {
    encode_entries(entries).to_string()
}

/// What history readers outside the engine get for each entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotationView {
    /// Who wrote the note
    pub author: String,
    /// The note text
    pub content: String,
    /// When the note was written, if known
    #[serde(rename = "createdAt")]
    pub created_at: Option<Timestamp>,
}

impl From<&AnnotationEntry> for AnnotationView {
    fn from(entry: &AnnotationEntry) -> Self {
        Self {
            author: entry.author.clone(),
            content: entry.content.clone(),
            created_at: entry.created_at,
        }
    }
}
