//! Unsigned key-range -> value state store.
//!
//! Keys are `[start:W][end:W]`, big-endian, with inclusive bounds. Point
//! lookups walk the table in reverse from [`RangeStateStore::to_key_start`],
//! so only ranges with `start <= point` are visited; the first visited range
//! whose `end` also covers the point wins, which is the covering range with
//! the greatest start.

use std::ops::Bound;

use heed::types::Bytes;
use heed::{Database, RoTxn, RwTxn};
use tracing::debug;

use crate::db::StateEnv;
use crate::error::Result;
use crate::gc::UsedLookups;
use crate::value::ValueCodec;

use super::RangeWidth;

/// A state store keyed by inclusive unsigned integer ranges.
#[derive(Debug)]
pub struct RangeStateStore {
    db: Database<Bytes, Bytes>,
    width: RangeWidth,
    values: ValueCodec,
    scratch_key: Vec<u8>,
    scratch_value: Vec<u8>,
}

impl RangeStateStore {
    pub(crate) fn open(env: &StateEnv, name: &str, width: RangeWidth) -> Result<Self> {
        let mut txn = env.write_txn()?;
        let db = env.env().create_database(&mut txn, Some(name))?;
        txn.commit()?;
        debug!(name, width = width.bytes(), "opened range state store");
        Ok(Self {
            db,
            width,
            values: env.value_codec(),
            scratch_key: Vec::new(),
            scratch_value: Vec::new(),
        })
    }

    /// The configured bound width.
    pub fn width(&self) -> RangeWidth {
        self.width
    }

    fn encode_key(width: RangeWidth, start: u64, end: u64, out: &mut Vec<u8>) {
        debug_assert!(start <= end, "range bounds out of order");
        let codec = width.codec();
        out.clear();
        codec.write(out, start);
        codec.write(out, end);
    }

    /// The seek key for a reverse scan over ranges that can contain `point`:
    /// the start bound followed by an end padded to the codec's maximum.
    pub fn to_key_start(&self, point: u64) -> Vec<u8> {
        let codec = self.width.codec();
        let mut key = Vec::with_capacity(codec.size() * 2);
        codec.write(&mut key, point);
        key.extend(std::iter::repeat(0xff).take(codec.size()));
        key
    }

    /// Writes or overwrites the value for the inclusive range `[start, end]`.
    pub fn put(&mut self, txn: &mut RwTxn, start: u64, end: u64, value: &[u8]) -> Result<()> {
        Self::encode_key(self.width, start, end, &mut self.scratch_key);
        self.scratch_value.clear();
        self.values
            .encode_for_put(txn, value, &mut self.scratch_value)?;
        self.db.put(txn, &self.scratch_key, &self.scratch_value)?;
        Ok(())
    }

    /// Fetches the value of the covering range with the greatest start, or
    /// `None` when no stored range contains `point`.
    pub fn get_containing(&self, txn: &RoTxn, point: u64) -> Result<Option<Vec<u8>>> {
        let codec = self.width.codec();
        let upper = self.to_key_start(point);
        let bounds = (Bound::Unbounded, Bound::Included(upper.as_slice()));
        for entry in self.db.rev_range(txn, &bounds)? {
            let (key, raw) = entry?;
            let (_, rest) = codec.read(key);
            let (end, _) = codec.read(rest);
            if end >= point {
                return Ok(Some(self.values.decode(txn, raw)?));
            }
        }
        Ok(None)
    }

    /// Removes the record for exactly `[start, end]`.
    pub fn delete(&mut self, txn: &mut RwTxn, start: u64, end: u64) -> Result<bool> {
        Self::encode_key(self.width, start, end, &mut self.scratch_key);
        Ok(self.db.delete(txn, &self.scratch_key)?)
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
    use crate::value::ValueTag;
    use tempfile::TempDir;

    fn open_store(width: RangeWidth) -> (TempDir, StateEnv, RangeStateStore) {
        let dir = TempDir::new().unwrap();
        let env = StateEnv::open(dir.path(), StateEnvOptions::default()).unwrap();
        let store = env.range_store("range", width).unwrap();
        (dir, env, store)
    }

    #[test]
    fn direct_and_hash_values_in_one_table() {
        let (_dir, env, mut store) = open_store(RangeWidth::U32);
        let small = b"fives".to_vec();
        let large = vec![0x42u8; 600];

        let mut txn = env.write_txn().unwrap();
        store.put(&mut txn, 10, 20, &small).unwrap();
        store.put(&mut txn, 30, 40, &large).unwrap();
        txn.commit().unwrap();

        let rtxn = env.read_txn().unwrap();
        assert_eq!(store.get_containing(&rtxn, 15).unwrap().unwrap(), small);
        assert_eq!(store.get_containing(&rtxn, 35).unwrap().unwrap(), large);
        assert!(store.get_containing(&rtxn, 25).unwrap().is_none());

        // The small value inlined, the large one went through the hash table.
        let mut tags = Vec::new();
        for entry in store.db.iter(&rtxn).unwrap() {
            let (_, raw) = entry.unwrap();
            tags.push(ValueTag::from_byte(raw[0]).unwrap());
        }
        assert_eq!(tags, vec![ValueTag::Direct, ValueTag::HashLookup]);
    }

    #[test]
    fn covering_range_with_greatest_start_wins() {
        let (_dir, env, mut store) = open_store(RangeWidth::U16);
        let mut txn = env.write_txn().unwrap();
        store.put(&mut txn, 0, 100, b"outer").unwrap();
        store.put(&mut txn, 50, 60, b"inner").unwrap();
        txn.commit().unwrap();

        let rtxn = env.read_txn().unwrap();
        assert_eq!(store.get_containing(&rtxn, 55).unwrap().unwrap(), b"inner");
        assert_eq!(store.get_containing(&rtxn, 70).unwrap().unwrap(), b"outer");
        assert_eq!(store.get_containing(&rtxn, 0).unwrap().unwrap(), b"outer");
        assert!(store.get_containing(&rtxn, 101).unwrap().is_none());
    }

    #[test]
    fn widths_cover_their_full_domain() {
        for width in [RangeWidth::U16, RangeWidth::U32, RangeWidth::U64] {
            let (_dir, env, mut store) = open_store(width);
            let max = width.codec().max_value();

            let mut txn = env.write_txn().unwrap();
            store.put(&mut txn, max - 1, max, b"top").unwrap();
            txn.commit().unwrap();

            let rtxn = env.read_txn().unwrap();
            assert_eq!(store.get_containing(&rtxn, max).unwrap().unwrap(), b"top");
            assert!(store.get_containing(&rtxn, max - 2).unwrap().is_none());
        }
    }

    #[test]
    fn delete_removes_exact_range() {
        let (_dir, env, mut store) = open_store(RangeWidth::U32);
        let mut txn = env.write_txn().unwrap();
        store.put(&mut txn, 10, 20, b"v").unwrap();
        assert!(store.delete(&mut txn, 10, 20).unwrap());
        assert!(!store.delete(&mut txn, 10, 20).unwrap());
        txn.commit().unwrap();

        let rtxn = env.read_txn().unwrap();
        assert!(store.get_containing(&rtxn, 15).unwrap().is_none());
    }
}
