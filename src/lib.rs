//! Temporal key/value state storage over LMDB.
//!
//! This crate is the on-disk encoding and storage core for versioned
//! reference-data lookups. It layers four schema shapes (plain state,
//! unsigned key ranges, temporal key ranges, and string-key sessions) on a
//! single LMDB environment, sharing one strategy for packing keys,
//! timestamps, and values into order-preserving byte layouts that respect
//! the engine's hard key-size limit.
//!
//! # Architecture
//!
//! ```text
//! ingestion ──> schema store ──> value codec ──> lookup tables
//!                   │                               │
//!                   └──────── one LMDB write txn ───┘
//! ```
//!
//! - [`UnsignedCodec`] and [`TimeCodec`]: fixed-width big-endian codecs whose
//!   byte order matches numeric order, keeping range scans correct.
//! - [`LookupTables`]: UID and content-hash tables that hold medium and
//!   large values out of line, deduplicated, inside the caller's txn.
//! - [`ValueCodec`]: the tagged `Direct | UidLookup | HashLookup` value
//!   encoding, chosen by size threshold.
//! - Schema stores ([`StateStore`], [`RangeStateStore`],
//!   [`TemporalRangeStateStore`], [`SessionStore`]): one concrete type per
//!   record shape, selected when the store is constructed.
//! - [`StagingStore`]: numbered sequential receive files awaiting merge.
//! - [`gc`]: marks lookup rows still referenced by live keys so unreferenced
//!   rows can be swept.
//!
//! # Concurrency
//!
//! LMDB's transaction model applies unmodified: one writer at a time, any
//! number of snapshot readers. Everything here runs synchronously inside the
//! caller's transaction; commit and abort stay with the caller.

mod codec;
mod db;
mod error;
pub mod gc;
mod lookup;
mod schema;
mod staging;
mod value;

pub use codec::{
    TimeCodec, Timestamp, UnsignedCodec, INSERT_TIME_EPOCH_SECONDS, SECONDS_PER_DAY,
};
pub use db::{StateEnv, StateEnvOptions, MAX_KEY_LENGTH};
pub use error::{Result, StateStoreError};
pub use gc::{sweep, SweepStats, UsedLookups};
pub use lookup::{
    HashLookupTable, LookupTables, UidLookupTable, ValueHash, UID_LOOKUP_BASE,
};
pub use schema::{
    RangeStateStore, RangeWidth, SessionStore, StateStore, TemporalRangeStateStore,
};
pub use staging::{StagedPart, StagedPartWriter, StagingConfig, StagingStore};
pub use value::{
    StateValue, ValueCodec, ValueTag, HASH_VALUE_THRESHOLD, UID_VALUE_THRESHOLD,
};
