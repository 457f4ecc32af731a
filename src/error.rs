//! Error types for the state store.
//!
//! Every fault is fatal to the operation that raised it and propagates to the
//! caller, which owns the enclosing transaction and decides whether to commit
//! or abort. The store never retries and never partially applies a write.

use thiserror::Error;

/// Errors that can occur while encoding, storing, or reading state.
#[derive(Debug, Error)]
pub enum StateStoreError {
    /// I/O error from filesystem operations (staging directories, environment
    /// creation). Fatal at construction time.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// LMDB error from the underlying engine.
    #[error("heed error: {0}")]
    Heed(#[from] heed::Error),

    /// A composed key exceeded the engine's maximum key length. Keys are
    /// never silently truncated.
    #[error("key of {len} bytes exceeds the maximum of {max}")]
    KeyTooLong { len: usize, max: usize },

    /// An encoded value carried a tag byte outside the known set.
    #[error("unknown value tag {0:#04x}")]
    UnknownValueTag(u8),

    /// An encoded value was shorter than its tag requires.
    #[error("truncated value: needed {needed} bytes, got {got}")]
    TruncatedValue { needed: usize, got: usize },

    /// A lookup id or hash was referenced by a live key but is missing from
    /// its table. Indicates corruption.
    #[error("{table} lookup row {id} is missing")]
    LookupNotFound { table: &'static str, id: String },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StateStoreError>;
