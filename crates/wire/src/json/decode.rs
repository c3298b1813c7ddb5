//! Legacy annotation decoding
//!
//! Maps every raw shape the feedback column has ever held onto the canonical
//! [`AnnotationEntry`]:
//!
//! | Raw shape | Result |
//! |-----------|--------|
//! | absent / blank / `null` | `[]` |
//! | bare string (JSON or not) | one entry, author `legacy`, no timestamp |
//! | single object | wrapped as a one-element array |
//! | array of objects and/or strings | each item decoded individually |
//!
//! Field aliases are tried in a fixed priority order:
//! author `author` → `writer_name` → `작성자 미상`; content `content` → `text`;
//! timestamp `timestamp` → `created_at` → `createdAt` → null.
//!
//! Decoding never fails. Unreadable fragments are dropped and reported as
//! [`MalformedLegacyDataWarning`]s. Decoding its own output (see
//! [`encode_entries`](super::encode_entries)) returns the same entries.

use super::error::{MalformedKind, MalformedLegacyDataWarning};
use annolog_core::{AnnotationEntry, EntryId, Origin, Timestamp};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::{Map, Value};
use tracing::warn;
use xxhash_rust::xxh3::xxh3_64;

/// Author given to bare-string legacy entries
pub const LEGACY_AUTHOR: &str = "legacy";

/// Author given to legacy objects that name no author
pub const UNKNOWN_AUTHOR: &str = "작성자 미상";

const AUTHOR_FIELDS: [&str; 2] = ["author", "writer_name"];
const CONTENT_FIELDS: [&str; 2] = ["content", "text"];
const TIMESTAMP_FIELDS: [&str; 3] = ["timestamp", "created_at", "createdAt"];

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Decoded entries plus everything that had to be dropped or degraded
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
    /// Canonical entries, in raw order
    pub entries: Vec<AnnotationEntry>,
    /// Non-fatal diagnostics
    pub warnings: Vec<MalformedLegacyDataWarning>,
}

/// Interpret the text of a legacy feedback column
///
/// Blank text is absent, text that parses as JSON is JSON, anything else is a
/// bare string kept verbatim.
pub fn decode_column(text: Option<&str>) -> Value {
    let text = match text {
        Some(t) => t,
        None => return Value::Null,
    };
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => value,
        Err(_) => Value::String(text.to_string()),
    }
}

/// Normalize raw annotation data, logging every warning
pub fn normalize(raw: &Value) -> Vec<AnnotationEntry> {
    let normalized = normalize_with_warnings(raw);
    for warning in &normalized.warnings {
        warn!(
            position = ?warning.position,
            kind = %warning.kind,
            detail = %warning.detail,
            "MalformedLegacyDataWarning"
        );
    }
    normalized.entries
}

/// Normalize the text of a legacy column, logging every warning
pub fn normalize_column(text: Option<&str>) -> Vec<AnnotationEntry> {
    normalize(&decode_column(text))
}

/// Normalize raw annotation data and return the warnings to the caller
pub fn normalize_with_warnings(raw: &Value) -> Normalized {
    let mut decoder = Decoder::default();
    match raw {
        Value::Null => {}
        Value::Array(items) => {
            for (pos, item) in items.iter().enumerate() {
                decoder.item(Some(pos), item);
            }
        }
        other => decoder.item(None, other),
    }
    decoder.out
}

/// Parse any timestamp representation legacy writers produced
///
/// Accepts RFC 3339, SQLite `YYYY-MM-DD HH:MM:SS[.fff]` (read as UTC), bare
/// dates, and integer epoch milliseconds.
pub fn parse_timestamp(value: &Value) -> Option<Timestamp> {
    match value {
        Value::String(s) => parse_timestamp_str(s),
        Value::Number(n) => n
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
        _ => None,
    }
}

fn parse_timestamp_str(s: &str) -> Option<Timestamp> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn legacy_fingerprint(author: &str, content: &str, created_at: Option<Timestamp>, pos: usize) -> u64 {
    let ts = created_at.map(|t| t.timestamp_millis().to_string()).unwrap_or_default();
    let key = format!("{}\u{0}{}\u{0}{}\u{0}{}", author, content, ts, pos);
    xxh3_64(key.as_bytes())
}

fn non_blank_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn non_blank_str(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        _ => None,
    }
}

#[derive(Default)]
struct Decoder {
    out: Normalized,
}

impl Decoder {
    fn warn(&mut self, pos: Option<usize>, kind: MalformedKind, detail: impl Into<String>) {
        self.out
            .warnings
            .push(MalformedLegacyDataWarning::new(pos, kind, detail));
    }

    fn item(&mut self, pos: Option<usize>, value: &Value) {
        match value {
            Value::String(s) => self.bare(pos, s),
            Value::Number(n) => self.bare(pos, &n.to_string()),
            Value::Bool(b) => self.bare(pos, &b.to_string()),
            Value::Object(map) => self.object(pos, map),
            Value::Null => self.warn(pos, MalformedKind::UnsupportedShape, "null"),
            Value::Array(_) => self.warn(pos, MalformedKind::UnsupportedShape, value.to_string()),
        }
    }

    fn bare(&mut self, pos: Option<usize>, text: &str) {
        if text.trim().is_empty() {
            self.warn(pos, MalformedKind::EmptyContent, text);
            return;
        }
        let fingerprint = legacy_fingerprint(LEGACY_AUTHOR, text, None, pos.unwrap_or(0));
        self.out.entries.push(AnnotationEntry {
            id: EntryId::derived(fingerprint),
            author: LEGACY_AUTHOR.to_string(),
            content: text.to_string(),
            created_at: None,
            origin: Origin::Legacy,
        });
    }

    fn object(&mut self, pos: Option<usize>, map: &Map<String, Value>) {
        let content = CONTENT_FIELDS
            .iter()
            .find_map(|field| map.get(*field).and_then(non_blank_text));
        let content = match content {
            Some(c) => c,
            None => {
                let kind = if CONTENT_FIELDS.iter().any(|f| map.contains_key(*f)) {
                    MalformedKind::EmptyContent
                } else {
                    MalformedKind::MissingContent
                };
                self.warn(pos, kind, Value::Object(map.clone()).to_string());
                return;
            }
        };

        let author = AUTHOR_FIELDS
            .iter()
            .find_map(|field| map.get(*field).and_then(non_blank_str))
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());

        let mut created_at = None;
        let mut unparsed = None;
        for field in TIMESTAMP_FIELDS {
            match map.get(field) {
                None | Some(Value::Null) => continue,
                Some(value) => match parse_timestamp(value) {
                    Some(ts) => {
                        created_at = Some(ts);
                        break;
                    }
                    None => {
                        unparsed.get_or_insert_with(|| value.to_string());
                    }
                },
            }
        }
        if created_at.is_none() {
            if let Some(raw) = unparsed {
                self.warn(pos, MalformedKind::UnparseableTimestamp, raw);
            }
        }

        let origin = map
            .get("origin")
            .and_then(Value::as_str)
            .and_then(Origin::from_name)
            .unwrap_or(Origin::Legacy);

        let id = match map.get("id") {
            Some(Value::String(s)) if !s.trim().is_empty() => EntryId::from_stored(s.clone()),
            Some(Value::Number(n)) => EntryId::from_stored(n.to_string()),
            _ => EntryId::derived(legacy_fingerprint(
                &author,
                &content,
                created_at,
                pos.unwrap_or(0),
            )),
        };

        self.out.entries.push(AnnotationEntry {
            id,
            author,
            content,
            created_at,
            origin,
        });
    }
}
