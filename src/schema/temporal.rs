//! Temporal key-range -> value state store.
//!
//! Keys are `[start:W][end:W][effective_time]`: the range a record applies
//! to plus the instant it became effective. Within one range, later
//! effective times sort after earlier ones, so a reverse scan naturally
//! yields the newest version first.
//!
//! Values are `[tagged payload][insert day]`: the value codec's output with
//! a two-byte insert-time suffix recorded at write time, kept for age-based
//! retention by the external compaction collaborator. Reads slice the suffix
//! back off in exactly the order it was written.

use std::ops::Bound;

use heed::types::Bytes;
use heed::{Database, RoTxn, RwTxn};
use tracing::debug;

use crate::codec::{TimeCodec, Timestamp};
use crate::db::StateEnv;
use crate::error::{Result, StateStoreError};
use crate::gc::UsedLookups;
use crate::value::ValueCodec;

use super::RangeWidth;

/// Codec for the insert-time suffix carried by every value.
const INSERT_SUFFIX_CODEC: TimeCodec = TimeCodec::InsertDay;

/// A state store keyed by inclusive unsigned ranges and an effective time.
#[derive(Debug)]
pub struct TemporalRangeStateStore {
    db: Database<Bytes, Bytes>,
    width: RangeWidth,
    time_codec: TimeCodec,
    values: ValueCodec,
    scratch_key: Vec<u8>,
    scratch_value: Vec<u8>,
}

impl TemporalRangeStateStore {
    pub(crate) fn open(
        env: &StateEnv,
        name: &str,
        width: RangeWidth,
        time_codec: TimeCodec,
    ) -> Result<Self> {
        let mut txn = env.write_txn()?;
        let db = env.env().create_database(&mut txn, Some(name))?;
        txn.commit()?;
        debug!(
            name,
            width = width.bytes(),
            time_size = time_codec.size(),
            "opened temporal range state store"
        );
        Ok(Self {
            db,
            width,
            time_codec,
            values: env.value_codec(),
            scratch_key: Vec::new(),
            scratch_value: Vec::new(),
        })
    }

    /// The effective-time codec this table was created with.
    pub fn time_codec(&self) -> TimeCodec {
        self.time_codec
    }

    fn encode_key(
        width: RangeWidth,
        time_codec: TimeCodec,
        start: u64,
        end: u64,
        effective_time: Timestamp,
        out: &mut Vec<u8>,
    ) {
        debug_assert!(start <= end, "range bounds out of order");
        let codec = width.codec();
        out.clear();
        codec.write(out, start);
        codec.write(out, end);
        time_codec.write(out, effective_time);
    }

    /// The seek key for a reverse scan over versions visible at `time` of
    /// ranges that can contain `point`: start bound, end padded to maximum,
    /// then the time itself.
    pub fn to_key_start(&self, point: u64, time: Timestamp) -> Vec<u8> {
        let codec = self.width.codec();
        let mut key = Vec::with_capacity(codec.size() * 2 + self.time_codec.size());
        codec.write(&mut key, point);
        key.extend(std::iter::repeat(0xff).take(codec.size()));
        self.time_codec.write(&mut key, time);
        key
    }

    /// Writes a version of the range `[start, end]` effective from
    /// `effective_time`, stamping the value with today's insert day.
    pub fn put(
        &mut self,
        txn: &mut RwTxn,
        start: u64,
        end: u64,
        effective_time: Timestamp,
        value: &[u8],
    ) -> Result<()> {
        self.put_at(txn, start, end, effective_time, value, Timestamp::now())
    }

    /// Same as [`put`](Self::put) with an explicit insert time.
    pub fn put_at(
        &mut self,
        txn: &mut RwTxn,
        start: u64,
        end: u64,
        effective_time: Timestamp,
        value: &[u8],
        insert_time: Timestamp,
    ) -> Result<()> {
        Self::encode_key(
            self.width,
            self.time_codec,
            start,
            end,
            effective_time,
            &mut self.scratch_key,
        );
        self.scratch_value.clear();
        self.values
            .encode_for_put(txn, value, &mut self.scratch_value)?;
        INSERT_SUFFIX_CODEC.write(&mut self.scratch_value, insert_time);
        self.db.put(txn, &self.scratch_key, &self.scratch_value)?;
        Ok(())
    }

    /// Fetches the value effective at `time` for `point`: the newest version
    /// with `effective_time <= time` of the covering range with the greatest
    /// start. Returns `None` when nothing applies.
    pub fn get_effective(
        &self,
        txn: &RoTxn,
        point: u64,
        time: Timestamp,
    ) -> Result<Option<Vec<u8>>> {
        let codec = self.width.codec();
        let visible = self.time_codec.truncate(time);
        let upper = self.to_key_start(point, time);
        let bounds = (Bound::Unbounded, Bound::Included(upper.as_slice()));
        for entry in self.db.rev_range(txn, &bounds)? {
            let (key, raw) = entry?;
            let (_, rest) = codec.read(key);
            let (end, rest) = codec.read(rest);
            let (effective, _) = self.time_codec.read(rest);
            if end < point || effective > visible {
                continue;
            }
            let (payload, _) = split_value(raw)?;
            return Ok(Some(self.values.decode(txn, payload)?));
        }
        Ok(None)
    }

    /// Removes the version of `[start, end]` effective from `effective_time`.
    pub fn delete(
        &mut self,
        txn: &mut RwTxn,
        start: u64,
        end: u64,
        effective_time: Timestamp,
    ) -> Result<bool> {
        Self::encode_key(
            self.width,
            self.time_codec,
            start,
            end,
            effective_time,
            &mut self.scratch_key,
        );
        Ok(self.db.delete(txn, &self.scratch_key)?)
    }

    /// Number of records in the store.
    pub fn len(&self, txn: &RoTxn) -> Result<u64> {
        Ok(self.db.len(txn)?)
    }

    /// Marks every lookup row referenced by a live value as in use. The
    /// insert-time suffix is stripped before the tag byte is inspected.
    pub fn record_used_lookups(&self, txn: &RoTxn, used: &mut UsedLookups) -> Result<()> {
        for entry in self.db.iter(txn)? {
            let (_, raw) = entry?;
            used.record(raw, INSERT_SUFFIX_CODEC.size())?;
        }
        Ok(())
    }
}

/// Splits a stored value into its tagged payload and insert time.
fn split_value(raw: &[u8]) -> Result<(&[u8], Timestamp)> {
    let suffix = INSERT_SUFFIX_CODEC.size();
    if raw.len() < suffix + 1 {
        return Err(StateStoreError::TruncatedValue {
            needed: suffix + 1,
            got: raw.len(),
        });
    }
    let (payload, tail) = raw.split_at(raw.len() - suffix);
    let (insert_time, _) = INSERT_SUFFIX_CODEC.read(tail);
    Ok((payload, insert_time))
}
