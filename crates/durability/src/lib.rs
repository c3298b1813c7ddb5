//! Durability layer for the annotation log
//!
//! This crate implements write-ahead logging:
//! - WalRecord types: Commit, SeedLegacy
//! - Frame encoding/decoding with CRC32 checksums
//! - Durability modes: None, Strict, Batched (default)
//! - WalWriter: append + fsync policy; WalSyncer runs the fsync outside its lock
//! - Recovery: replay the WAL, truncating a torn or corrupt tail

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod encoding;
pub mod mode;
pub mod recovery;
pub mod wal;
pub mod writer;

pub use encoding::{decode_record, encode_record, FrameRead};
pub use mode::DurabilityMode;
pub use recovery::{RecoveryStats, WalReplay};
pub use wal::WalRecord;
pub use writer::{WalSyncer, WalWriter};

/// File name of the write-ahead log inside a data directory
pub const WAL_FILENAME: &str = "annotations.wal";
