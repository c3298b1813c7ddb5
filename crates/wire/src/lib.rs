//! Wire handling for annotation data
//!
//! This crate is the schema normalizer of the engine: it turns every raw
//! representation of a record's feedback column ever observed into the
//! canonical [`AnnotationEntry`](annolog_core::AnnotationEntry) list, and
//! encodes canonical lists back to JSON.
//!
//! ## Examples
//!
//! ```
//! use annolog_wire::{encode_entries, normalize, normalize_column};
//!
//! let entries = normalize_column(Some("초기 상담 완료"));
//! assert_eq!(entries[0].author, "legacy");
//!
//! // decoding canonical output is a no-op
//! assert_eq!(normalize(&encode_entries(&entries)), entries);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod json;

pub use json::{
    decode_column, encode_column, encode_entries, encode_entry, encode_timestamp, normalize,
    normalize_column, normalize_with_warnings, parse_timestamp, AnnotationView, MalformedKind,
    MalformedLegacyDataWarning, Normalized, LEGACY_AUTHOR, UNKNOWN_AUTHOR,
};
