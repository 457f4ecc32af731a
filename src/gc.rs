//! Used-lookup recording and unreferenced-row sweeping.
//!
//! Ordinary deletes never touch the lookup tables because a row may be
//! shared by many keys. Reclamation instead happens in two passes: every
//! value-bearing store records the lookup rows its live values reference
//! into a [`UsedLookups`] set, then [`sweep`] deletes the rows nothing
//! referenced. Scheduling of the sweep belongs to the external compaction
//! collaborator; this module only supplies the mechanism.

use std::collections::HashSet;

use heed::RwTxn;
use tracing::debug;

use crate::error::Result;
use crate::lookup::{LookupTables, ValueHash};
use crate::value::StateValue;

/// The set of lookup rows referenced by live keys.
#[derive(Debug, Default)]
pub struct UsedLookups {
    uids: HashSet<u32>,
    hashes: HashSet<ValueHash>,
}

impl UsedLookups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspects one stored value buffer and marks any lookup reference it
    /// carries. `value_time_suffix` is the number of trailing time bytes the
    /// owning schema appends after the tagged payload (zero for schemas that
    /// store the bare payload); they are stripped before the tag is read.
    pub fn record(&mut self, raw: &[u8], value_time_suffix: usize) -> Result<()> {
        let payload = &raw[..raw.len().saturating_sub(value_time_suffix)];
        match StateValue::parse(payload)? {
            StateValue::Direct(_) => {}
            StateValue::UidLookup(id) => {
                self.uids.insert(id);
            }
            StateValue::HashLookup(hash) => {
                self.hashes.insert(hash);
            }
        }
        Ok(())
    }

    /// Whether the given UID-table id was recorded as in use.
    pub fn contains_uid(&self, id: u32) -> bool {
        self.uids.contains(&id)
    }

    /// Whether the given hash-table row was recorded as in use.
    pub fn contains_hash(&self, hash: &ValueHash) -> bool {
        self.hashes.contains(hash)
    }

    /// Number of distinct rows recorded across both tables.
    pub fn len(&self) -> usize {
        self.uids.len() + self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uids.is_empty() && self.hashes.is_empty()
    }
}

/// Counts reported by a sweep pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    pub uid_kept: u64,
    pub uid_deleted: u64,
    pub hash_kept: u64,
    pub hash_deleted: u64,
}

/// Deletes every lookup row not present in `used`.
///
/// Callers must have recorded all stores that share these lookup tables
/// within the same snapshot, otherwise live references will be reclaimed.
pub fn sweep(txn: &mut RwTxn, lookups: &LookupTables, used: &UsedLookups) -> Result<SweepStats> {
    let mut stats = SweepStats::default();

    for id in lookups.uid.ids(txn)? {
        if used.contains_uid(id) {
            stats.uid_kept += 1;
        } else if lookups.uid.delete(txn, id)? {
            stats.uid_deleted += 1;
        }
    }

    for hash in lookups.hash.hashes(txn)? {
        if used.contains_hash(&hash) {
            stats.hash_kept += 1;
        } else if lookups.hash.delete(txn, &hash)? {
            stats.hash_deleted += 1;
        }
    }

    debug!(
        uid_kept = stats.uid_kept,
        uid_deleted = stats.uid_deleted,
        hash_kept = stats.hash_kept,
        hash_deleted = stats.hash_deleted,
        "swept lookup tables"
    );
    Ok(stats)
}
