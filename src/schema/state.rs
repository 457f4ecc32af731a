//! Plain key -> value state store.

use heed::types::Bytes;
use heed::{Database, RoTxn, RwTxn};
use tracing::debug;

use crate::db::{StateEnv, MAX_KEY_LENGTH};
use crate::error::{Result, StateStoreError};
use crate::gc::UsedLookups;
use crate::value::ValueCodec;

/// A state store mapping opaque byte keys to tagged values.
#[derive(Debug)]
pub struct StateStore {
    db: Database<Bytes, Bytes>,
    values: ValueCodec,
    scratch: Vec<u8>,
}

impl StateStore {
    pub(crate) fn open(env: &StateEnv, name: &str) -> Result<Self> {
        let mut txn = env.write_txn()?;
        let db = env.env().create_database(&mut txn, Some(name))?;
        txn.commit()?;
        debug!(name, "opened state store");
        Ok(Self {
            db,
            values: env.value_codec(),
            scratch: Vec::new(),
        })
    }

    /// Writes or overwrites the value for `key`.
    pub fn put(&mut self, txn: &mut RwTxn, key: &[u8], value: &[u8]) -> Result<()> {
        if key.len() > MAX_KEY_LENGTH {
            return Err(StateStoreError::KeyTooLong {
                len: key.len(),
                max: MAX_KEY_LENGTH,
            });
        }
        self.scratch.clear();
        self.values.encode_for_put(txn, value, &mut self.scratch)?;
        self.db.put(txn, key, &self.scratch)?;
        Ok(())
    }

    /// Fetches the value for `key`, dereferencing lookup indirection.
    pub fn get(&self, txn: &RoTxn, key: &[u8]) -> Result<Option<Vec<u8>>> {
        match self.db.get(txn, key)? {
            Some(raw) => Ok(Some(self.values.decode(txn, raw)?)),
            None => Ok(None),
        }
    }

    /// Returns whether `key` currently maps to exactly `value`, without
    /// writing any lookup row for the probe.
    pub fn exists(&self, txn: &RoTxn, key: &[u8], value: &[u8]) -> Result<bool> {
        let mut probe = Vec::new();
        if !self.values.encode_for_get(txn, value, &mut probe)? {
            return Ok(false);
        }
        Ok(self.db.get(txn, key)? == Some(probe.as_slice()))
    }

    /// Removes `key`. Lookup rows stay behind for the GC pass, since other
    /// keys may share them.
    pub fn delete(&self, txn: &mut RwTxn, key: &[u8]) -> Result<bool> {
        Ok(self.db.delete(txn, key)?)
    }

    /// Number of records in the store.
    pub fn len(&self, txn: &RoTxn) -> Result<u64> {
        Ok(self.db.len(txn)?)
    }

    /// Marks every lookup row referenced by a live value as in use.
    pub fn record_used_lookups(&self, txn: &RoTxn, used: &mut UsedLookups) -> Result<()> {
        for entry in self.db.iter(txn)? {
            let (_, raw) = entry?;
            used.record(raw, 0)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::StateEnvOptions;
    use tempfile::TempDir;

    fn open_store() -> (TempDir, StateEnv, StateStore) {
        let dir = TempDir::new().unwrap();
        let env = StateEnv::open(dir.path(), StateEnvOptions::default()).unwrap();
        let store = env.state_store("state").unwrap();
        (dir, env, store)
    }

    #[test]
    fn put_get_round_trip() {
        let (_dir, env, mut store) = open_store();
        let mut txn = env.write_txn().unwrap();
        store.put(&mut txn, b"alpha", b"small value").unwrap();
        store.put(&mut txn, b"beta", &vec![3u8; 700]).unwrap();
        txn.commit().unwrap();

        let rtxn = env.read_txn().unwrap();
        assert_eq!(store.get(&rtxn, b"alpha").unwrap().unwrap(), b"small value");
        assert_eq!(store.get(&rtxn, b"beta").unwrap().unwrap(), vec![3u8; 700]);
        assert!(store.get(&rtxn, b"gamma").unwrap().is_none());
    }

    #[test]
    fn oversized_key_is_rejected() {
        let (_dir, env, mut store) = open_store();
        let mut txn = env.write_txn().unwrap();
        let key = vec![b'k'; MAX_KEY_LENGTH + 1];
        let err = store.put(&mut txn, &key, b"v").unwrap_err();
        assert!(matches!(err, StateStoreError::KeyTooLong { len, max }
            if len == MAX_KEY_LENGTH + 1 && max == MAX_KEY_LENGTH));

        // A key of exactly the limit is fine.
        let key = vec![b'k'; MAX_KEY_LENGTH];
        store.put(&mut txn, &key, b"v").unwrap();
        txn.commit().unwrap();
    }

    #[test]
    fn exists_probes_without_writing() {
        let (_dir, env, mut store) = open_store();
        let large = vec![9u8; 100];

        let mut txn = env.write_txn().unwrap();
        store.put(&mut txn, b"k", &large).unwrap();
        txn.commit().unwrap();

        let rtxn = env.read_txn().unwrap();
        assert!(store.exists(&rtxn, b"k", &large).unwrap());
        assert!(!store.exists(&rtxn, b"k", &vec![8u8; 100]).unwrap());
        // The failed probe must not have created a lookup row.
        assert_eq!(env.lookups().uid.len(&rtxn).unwrap(), 1);
    }
}
