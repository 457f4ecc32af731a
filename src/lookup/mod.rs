//! Lookup tables for value indirection.
//!
//! Large values cannot live inline in a schema's key/value row without
//! breaching the engine's key-size limit, so they are stored once in an
//! auxiliary table and referenced by a compact id. Two table kinds exist:
//!
//! - the [`UidLookupTable`] assigns dense sequential integer ids to
//!   medium-sized values, keeping the indirection reference tiny;
//! - the [`HashLookupTable`] keys large values by content hash, which both
//!   bounds the table's own key size and deduplicates identical payloads.
//!
//! Both run inside the caller's transaction: repeated writes of equal bytes
//! within one transaction reuse the same row. Rows are only ever removed by
//! the garbage-collection sweep in [`crate::gc`], never by ordinary deletes,
//! because other keys may still reference the same value.

mod hash;
mod uid;

pub use hash::{HashLookupTable, ValueHash};
pub use uid::{UidLookupTable, UID_LOOKUP_BASE};

use heed::{Env, RwTxn};

use crate::error::Result;

/// The pair of lookup tables shared by every schema store in one environment.
#[derive(Debug, Clone)]
pub struct LookupTables {
    pub uid: UidLookupTable,
    pub hash: HashLookupTable,
}

impl LookupTables {
    /// Opens or creates both lookup tables in the given environment.
    pub(crate) fn open(env: &Env, txn: &mut RwTxn) -> Result<Self> {
        Ok(Self {
            uid: UidLookupTable::open(env, txn)?,
            hash: HashLookupTable::open(env, txn)?,
        })
    }
}
