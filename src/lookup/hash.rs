//! Content-hash lookup table.
//!
//! Rows are keyed by the 128-bit xxh3 hash of the value bytes, encoded
//! big-endian. Writing identical bytes twice lands on the same row, so the
//! table deduplicates large payloads for free. Hash collisions are treated
//! as negligible at this layer.

use heed::types::Bytes;
use heed::{Database, Env, RoTxn, RwTxn};
use xxhash_rust::xxh3::xxh3_128;

use crate::error::{Result, StateStoreError};

const HASH_DB: &str = "hash_lookup";

/// The content hash that keys a row: big-endian xxh3-128 of the value bytes.
pub type ValueHash = [u8; 16];

/// Computes the row key for `value`.
pub fn value_hash(value: &[u8]) -> ValueHash {
    xxh3_128(value).to_be_bytes()
}

/// Lookup table keyed by content hash, for values too large for the UID table.
#[derive(Debug, Clone)]
pub struct HashLookupTable {
    db: Database<Bytes, Bytes>,
}

impl HashLookupTable {
    /// Opens or creates the hash database.
    pub(crate) fn open(env: &Env, txn: &mut RwTxn) -> Result<Self> {
        let db = env.create_database(txn, Some(HASH_DB))?;
        Ok(Self { db })
    }

    /// Inserts `value` if absent and returns its hash. Identical bytes share
    /// one row.
    pub fn put(&self, txn: &mut RwTxn, value: &[u8]) -> Result<ValueHash> {
        let hash = value_hash(value);
        if self.db.get(txn, &hash)?.is_none() {
            self.db.put(txn, &hash, value)?;
        }
        Ok(hash)
    }

    /// Returns the hash of `value` if a row for it exists. Never mutates.
    pub fn get(&self, txn: &RoTxn, value: &[u8]) -> Result<Option<ValueHash>> {
        let hash = value_hash(value);
        Ok(self.db.get(txn, &hash)?.map(|_| hash))
    }

    /// Reverse lookup by hash. A live key referencing a missing hash means
    /// the table is corrupt, so absence surfaces as an error.
    pub fn get_value(&self, txn: &RoTxn, hash: &ValueHash) -> Result<Vec<u8>> {
        match self.db.get(txn, hash)? {
            Some(bytes) => Ok(bytes.to_vec()),
            None => Err(StateStoreError::LookupNotFound {
                table: "hash",
                id: hex_string(hash),
            }),
        }
    }

    /// Removes the row for `hash`. Only the GC sweep may call this.
    pub(crate) fn delete(&self, txn: &mut RwTxn, hash: &ValueHash) -> Result<bool> {
        Ok(self.db.delete(txn, hash)?)
    }

    /// Iterates all row hashes (for the GC sweep).
    pub(crate) fn hashes(&self, txn: &RoTxn) -> Result<Vec<ValueHash>> {
        let mut hashes = Vec::new();
        for entry in self.db.iter(txn)? {
            let (key, _) = entry?;
            let mut hash = [0u8; 16];
            hash.copy_from_slice(key);
            hashes.push(hash);
        }
        Ok(hashes)
    }

    /// Number of rows in the table.
    pub fn len(&self, txn: &RoTxn) -> Result<u64> {
        Ok(self.db.len(txn)?)
    }
}

fn hex_string(hash: &ValueHash) -> String {
    hash.iter().map(|b| format!("{b:02x}")).collect()
}
