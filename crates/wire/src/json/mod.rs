//! JSON handling for annotation data
//!
//! - `decode`: legacy-tolerant normalization into canonical entries
//! - `encode`: canonical array encoding and the external entry view
//! - `error`: non-fatal decoding diagnostics

mod decode;
mod encode;
mod error;

pub use decode::{
    decode_column, normalize, normalize_column, normalize_with_warnings, parse_timestamp,
    Normalized, LEGACY_AUTHOR, UNKNOWN_AUTHOR,
};
pub use encode::{encode_column, encode_entries, encode_entry, encode_timestamp, AnnotationView};
pub use error::{MalformedKind, MalformedLegacyDataWarning};
