//! String-key session interval store.
//!
//! Each record is `(key, start, end)` packed entirely into the engine key as
//! `[utf8 bytes][start][end]`; the stored value is empty. Because the whole
//! record must fit the engine's key-size limit, the string key is bounded by
//! `MAX_KEY_LENGTH - 2 * time_codec_size`, enforced at write time.
//!
//! Session keys vary in length, so a prefix scan alone cannot distinguish
//! `"ab"` from `"abc"`: lookups additionally require the scanned record to
//! have exactly the expected total length.

use std::ops::Bound;

use heed::types::Bytes;
use heed::{Database, RoTxn, RwTxn};
use tracing::debug;

use crate::codec::{TimeCodec, Timestamp};
use crate::db::{StateEnv, MAX_KEY_LENGTH};
use crate::error::{Result, StateStoreError};

/// A store of named session intervals.
#[derive(Debug)]
pub struct SessionStore {
    db: Database<Bytes, Bytes>,
    time_codec: TimeCodec,
    scratch_key: Vec<u8>,
}

impl SessionStore {
    pub(crate) fn open(env: &StateEnv, name: &str, time_codec: TimeCodec) -> Result<Self> {
        let mut txn = env.write_txn()?;
        let db = env.env().create_database(&mut txn, Some(name))?;
        txn.commit()?;
        debug!(name, time_size = time_codec.size(), "opened session store");
        Ok(Self {
            db,
            time_codec,
            scratch_key: Vec::new(),
        })
    }

    /// The longest session key this store accepts, in UTF-8 bytes.
    pub fn max_key_len(&self) -> usize {
        MAX_KEY_LENGTH - 2 * self.time_codec.size()
    }

    fn encode_key(
        time_codec: TimeCodec,
        key: &str,
        start: Timestamp,
        end: Timestamp,
        out: &mut Vec<u8>,
    ) -> Result<()> {
        let max = MAX_KEY_LENGTH - 2 * time_codec.size();
        if key.len() > max {
            return Err(StateStoreError::KeyTooLong {
                len: key.len(),
                max,
            });
        }
        debug_assert!(start <= end, "session interval out of order");
        out.clear();
        out.extend_from_slice(key.as_bytes());
        time_codec.write(out, start);
        time_codec.write(out, end);
        Ok(())
    }

    /// Records a session for `key` covering `[start, end]` inclusive.
    pub fn put(
        &mut self,
        txn: &mut RwTxn,
        key: &str,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<()> {
        Self::encode_key(self.time_codec, key, start, end, &mut self.scratch_key)?;
        self.db.put(txn, &self.scratch_key, &[])?;
        Ok(())
    }

    /// Returns whether any session for exactly `key` covers `ts`.
    pub fn in_session(&self, txn: &RoTxn, key: &str, ts: Timestamp) -> Result<bool> {
        let time_size = self.time_codec.size();
        let record_len = key.len() + 2 * time_size;
        let prefix = key.as_bytes();

        let mut upper = prefix.to_vec();
        upper.extend(std::iter::repeat(0xff).take(2 * time_size));
        let bounds = (Bound::Included(prefix), Bound::Included(upper.as_slice()));

        let ts = self.time_codec.truncate(ts);
        for entry in self.db.range(txn, &bounds)? {
            let (raw, _) = entry?;
            // Longer string keys sharing this prefix fall inside the scan
            // bounds; the length check rules them out.
            if raw.len() != record_len || !raw.starts_with(prefix) {
                continue;
            }
            let (start, rest) = self.time_codec.read(&raw[key.len()..]);
            let (end, _) = self.time_codec.read(rest);
            if start <= ts && ts <= end {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Removes the session record `(key, start, end)`.
    pub fn delete(
        &mut self,
        txn: &mut RwTxn,
        key: &str,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<bool> {
        Self::encode_key(self.time_codec, key, start, end, &mut self.scratch_key)?;
        Ok(self.db.delete(txn, &self.scratch_key)?)
    }

    /// Number of session records in the store.
    pub fn len(&self, txn: &RoTxn) -> Result<u64> {
        Ok(self.db.len(txn)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::StateEnvOptions;
    use tempfile::TempDir;

    const BASE_SECONDS: i64 = 1_748_736_000; // 2025-06-01T00:00:00Z

    fn open_store(time_codec: TimeCodec) -> (TempDir, StateEnv, SessionStore) {
        let dir = TempDir::new().unwrap();
        let env = StateEnv::open(dir.path(), StateEnvOptions::default()).unwrap();
        let store = env.session_store("sessions", time_codec).unwrap();
        (dir, env, store)
    }

    fn at(seconds: i64) -> Timestamp {
        Timestamp::from_epoch_seconds(BASE_SECONDS + seconds)
    }

    #[test]
    fn session_membership() {
        let (_dir, env, mut store) = open_store(TimeCodec::Millis);
        let mut txn = env.write_txn().unwrap();
        store.put(&mut txn, "user-1", at(0), at(600)).unwrap();
        store.put(&mut txn, "user-1", at(3600), at(4200)).unwrap();
        txn.commit().unwrap();

        let rtxn = env.read_txn().unwrap();
        assert!(store.in_session(&rtxn, "user-1", at(0)).unwrap());
        assert!(store.in_session(&rtxn, "user-1", at(300)).unwrap());
        assert!(store.in_session(&rtxn, "user-1", at(600)).unwrap());
        assert!(!store.in_session(&rtxn, "user-1", at(601)).unwrap());
        assert!(store.in_session(&rtxn, "user-1", at(4000)).unwrap());
        assert!(!store.in_session(&rtxn, "user-2", at(300)).unwrap());
    }

    #[test]
    fn prefix_keys_do_not_bleed() {
        let (_dir, env, mut store) = open_store(TimeCodec::Millis);
        let mut txn = env.write_txn().unwrap();
        store.put(&mut txn, "abc", at(0), at(100)).unwrap();
        txn.commit().unwrap();

        let rtxn = env.read_txn().unwrap();
        assert!(store.in_session(&rtxn, "abc", at(50)).unwrap());
        assert!(!store.in_session(&rtxn, "ab", at(50)).unwrap());
        assert!(!store.in_session(&rtxn, "abcd", at(50)).unwrap());
    }

    #[test]
    fn key_length_limit_is_exact() {
        let (_dir, env, mut store) = open_store(TimeCodec::Millis);
        let limit = store.max_key_len();
        assert_eq!(limit, MAX_KEY_LENGTH - 12);

        let mut txn = env.write_txn().unwrap();
        let ok_key = "k".repeat(limit);
        store.put(&mut txn, &ok_key, at(0), at(10)).unwrap();

        let long_key = "k".repeat(limit + 1);
        let err = store.put(&mut txn, &long_key, at(0), at(10)).unwrap_err();
        assert!(matches!(err, StateStoreError::KeyTooLong { len, max }
            if len == limit + 1 && max == limit));
        txn.commit().unwrap();

        let rtxn = env.read_txn().unwrap();
        assert!(store.in_session(&rtxn, &ok_key, at(5)).unwrap());
    }

    #[test]
    fn day_codec_truncates_consistently() {
        let (_dir, env, mut store) = open_store(TimeCodec::Day);
        let mut txn = env.write_txn().unwrap();
        // Interval written mid-day truncates to whole days both directions.
        store.put(&mut txn, "s", at(3600), at(86_400 + 7200)).unwrap();
        txn.commit().unwrap();

        let rtxn = env.read_txn().unwrap();
        assert!(store.in_session(&rtxn, "s", at(0)).unwrap());
        assert!(store.in_session(&rtxn, "s", at(86_400)).unwrap());
        assert!(!store.in_session(&rtxn, "s", at(2 * 86_400)).unwrap());
    }

    #[test]
    fn delete_removes_one_interval() {
        let (_dir, env, mut store) = open_store(TimeCodec::Millis);
        let mut txn = env.write_txn().unwrap();
        store.put(&mut txn, "k", at(0), at(10)).unwrap();
        store.put(&mut txn, "k", at(20), at(30)).unwrap();
        assert!(store.delete(&mut txn, "k", at(0), at(10)).unwrap());
        txn.commit().unwrap();

        let rtxn = env.read_txn().unwrap();
        assert!(!store.in_session(&rtxn, "k", at(5)).unwrap());
        assert!(store.in_session(&rtxn, "k", at(25)).unwrap());
        assert_eq!(store.len(&rtxn).unwrap(), 1);
    }
}
