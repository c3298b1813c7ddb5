//! Non-fatal diagnostics raised while decoding legacy annotation data
//!
//! Decoding never fails. Anything that cannot be read is dropped or degraded
//! and reported as a [`MalformedLegacyDataWarning`] instead.

/// What was wrong with a fragment of legacy data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedKind {
    /// Text was present but blank after trimming
    EmptyContent,
    /// An object carried none of the known content fields
    MissingContent,
    /// The value had a shape no writer ever produced (nested array, null item)
    UnsupportedShape,
    /// A timestamp field was present but could not be parsed; it was dropped
    UnparseableTimestamp,
}

impl std::fmt::Display for MalformedKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MalformedKind::EmptyContent => "empty content",
            MalformedKind::MissingContent => "missing content",
            MalformedKind::UnsupportedShape => "unsupported shape",
            MalformedKind::UnparseableTimestamp => "unparseable timestamp",
        };
        f.write_str(s)
    }
}

/// One unreadable or degraded fragment of legacy data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedLegacyDataWarning {
    /// Array position of the fragment, `None` for a top-level value
    pub position: Option<usize>,
    /// Category of the problem
    pub kind: MalformedKind,
    /// Short excerpt of the offending value
    pub detail: String,
}

impl MalformedLegacyDataWarning {
    pub(crate) fn new(position: Option<usize>, kind: MalformedKind, detail: impl Into<String>) -> Self {
        let mut detail = detail.into();
        if detail.chars().count() > 80 {
            detail = detail.chars().take(80).collect::<String>() + "…";
        }
        Self {
            position,
            kind,
            detail,
        }
    }

    /// Whether the fragment was dropped (as opposed to degraded)
    pub fn dropped_entry(&self) -> bool {
        !matches!(self.kind, MalformedKind::UnparseableTimestamp)
    }
}

impl std::fmt::Display for MalformedLegacyDataWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.position {
            Some(pos) => write!(f, "malformed legacy data at [{}]: {} ({})", pos, self.kind, self.detail),
            None => write!(f, "malformed legacy data: {} ({})", self.kind, self.detail),
        }
    }
}
