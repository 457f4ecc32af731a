//! Sequential-id lookup table.
//!
//! A bijective table over value bytes: the forward database maps value bytes
//! to their assigned id, the reverse database maps ids back to the bytes.
//! Ids are allocated densely starting at [`UID_LOOKUP_BASE`]; inserting bytes
//! that already have a row returns the existing id without writing anything.

use heed::byteorder::BigEndian;
use heed::types::{Bytes, U32};
use heed::{Database, Env, RoTxn, RwTxn};

use crate::error::{Result, StateStoreError};

/// First id handed out by a fresh table. Part of the on-disk format.
pub const UID_LOOKUP_BASE: u32 = 0;

const FORWARD_DB: &str = "uid_lookup_forward";
const REVERSE_DB: &str = "uid_lookup_reverse";

/// Lookup table assigning compact sequential ids to value bytes.
#[derive(Debug, Clone)]
pub struct UidLookupTable {
    forward: Database<Bytes, U32<BigEndian>>,
    reverse: Database<U32<BigEndian>, Bytes>,
}

impl UidLookupTable {
    /// Opens or creates the forward and reverse databases.
    pub(crate) fn open(env: &Env, txn: &mut RwTxn) -> Result<Self> {
        let forward = env.create_database(txn, Some(FORWARD_DB))?;
        let reverse = env.create_database(txn, Some(REVERSE_DB))?;
        Ok(Self { forward, reverse })
    }

    /// Inserts `value` if absent and returns its id. Equal bytes always map
    /// to the same id, so re-inserting is a read plus nothing.
    pub fn put(&self, txn: &mut RwTxn, value: &[u8]) -> Result<u32> {
        if let Some(id) = self.forward.get(txn, value)? {
            return Ok(id);
        }
        let id = match self.reverse.last(txn)? {
            Some((last, _)) => last + 1,
            None => UID_LOOKUP_BASE,
        };
        self.forward.put(txn, value, &id)?;
        self.reverse.put(txn, &id, value)?;
        Ok(id)
    }

    /// Returns the id assigned to `value`, if any. Never mutates the table.
    pub fn get(&self, txn: &RoTxn, value: &[u8]) -> Result<Option<u32>> {
        Ok(self.forward.get(txn, value)?)
    }

    /// Reverse lookup. A live key referencing a missing id means the table
    /// is corrupt, so absence surfaces as an error rather than a None.
    pub fn get_value(&self, txn: &RoTxn, id: u32) -> Result<Vec<u8>> {
        match self.reverse.get(txn, &id)? {
            Some(bytes) => Ok(bytes.to_vec()),
            None => Err(StateStoreError::LookupNotFound {
                table: "uid",
                id: id.to_string(),
            }),
        }
    }

    /// Removes the row for `id` from both directions. Only the GC sweep may
    /// call this. Returns whether a row existed.
    pub(crate) fn delete(&self, txn: &mut RwTxn, id: u32) -> Result<bool> {
        let Some(bytes) = self.reverse.get(txn, &id)?.map(<[u8]>::to_vec) else {
            return Ok(false);
        };
        self.forward.delete(txn, &bytes)?;
        self.reverse.delete(txn, &id)?;
        Ok(true)
    }

    /// Iterates all assigned ids (for the GC sweep).
    pub(crate) fn ids(&self, txn: &RoTxn) -> Result<Vec<u32>> {
        let mut ids = Vec::new();
        for entry in self.reverse.iter(txn)? {
            let (id, _) = entry?;
            ids.push(id);
        }
        Ok(ids)
    }

    /// Number of rows in the table.
    pub fn len(&self, txn: &RoTxn) -> Result<u64> {
        Ok(self.reverse.len(txn)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{StateEnv, StateEnvOptions};
    use tempfile::TempDir;

    fn open_env() -> (TempDir, StateEnv) {
        let dir = TempDir::new().unwrap();
        let env = StateEnv::open(dir.path(), StateEnvOptions::default()).unwrap();
        (dir, env)
    }

    #[test]
    fn assigns_dense_ids_and_reuses_them() {
        let (_dir, env) = open_env();
        let table = env.lookups().uid.clone();
        let mut txn = env.write_txn().unwrap();

        let mut values = Vec::new();
        for i in 0..1100u32 {
            let value = format!("uid-lookup-test-value-{i:08}").into_bytes();
            let id = table.put(&mut txn, &value).unwrap();
            assert_eq!(id, UID_LOOKUP_BASE + i, "ids must be dense");
            values.push(value);
        }

        // Re-writing an existing value returns its original id.
        let again = table.put(&mut txn, &values[5]).unwrap();
        assert_eq!(again, UID_LOOKUP_BASE + 5);
        assert_eq!(table.len(&txn).unwrap(), 1100);
        txn.commit().unwrap();

        let rtxn = env.read_txn().unwrap();
        assert_eq!(table.get_value(&rtxn, UID_LOOKUP_BASE + 5).unwrap(), values[5]);
    }

    #[test]
    fn missing_id_is_an_error() {
        let (_dir, env) = open_env();
        let table = env.lookups().uid.clone();
        let rtxn = env.read_txn().unwrap();
        let err = table.get_value(&rtxn, 42).unwrap_err();
        assert!(matches!(
            err,
            crate::error::StateStoreError::LookupNotFound { table: "uid", .. }
        ));
    }

    #[test]
    fn delete_removes_both_directions() {
        let (_dir, env) = open_env();
        let table = env.lookups().uid.clone();
        let mut txn = env.write_txn().unwrap();
        let id = table.put(&mut txn, b"condemned row").unwrap();
        assert!(table.delete(&mut txn, id).unwrap());
        assert!(table.get(&txn, b"condemned row").unwrap().is_none());
        assert!(!table.delete(&mut txn, id).unwrap());
        txn.commit().unwrap();
    }
}
