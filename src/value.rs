//! Tagged value encoding with size-threshold indirection.
//!
//! Every stored value starts with a one-byte tag that says where the payload
//! lives. Small values inline directly; medium values are swapped for a
//! four-byte UID-table id; large values for a sixteen-byte content hash.
//! The thresholds are part of the on-disk format and must not change.

use heed::{RoTxn, RwTxn};

use crate::db::MAX_KEY_LENGTH;
use crate::error::{Result, StateStoreError};
use crate::lookup::{LookupTables, ValueHash};

/// Values of this length or shorter inline straight into the row.
pub const UID_VALUE_THRESHOLD: usize = 32;

/// Values longer than this go through the hash table. Matches the engine's
/// maximum key length because the UID table's forward database uses the
/// value bytes as its own key.
pub const HASH_VALUE_THRESHOLD: usize = MAX_KEY_LENGTH;

/// Tag byte ordinals. The exact mapping is part of the on-disk format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ValueTag {
    /// Payload follows the tag inline.
    Direct = 0,
    /// Payload is the big-endian u32 id of a UID-table row.
    UidLookup = 1,
    /// Payload is the 16-byte content hash of a hash-table row.
    HashLookup = 2,
}

impl ValueTag {
    /// Decodes a tag byte. Unknown bytes are a fatal decode error.
    pub fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            0 => Ok(ValueTag::Direct),
            1 => Ok(ValueTag::UidLookup),
            2 => Ok(ValueTag::HashLookup),
            other => Err(StateStoreError::UnknownValueTag(other)),
        }
    }
}

/// A decoded value reference: the tag plus its payload, before any lookup
/// table has been consulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateValue {
    Direct(Vec<u8>),
    UidLookup(u32),
    HashLookup(ValueHash),
}

impl StateValue {
    /// Parses an encoded value buffer into its tagged form without touching
    /// any lookup table. Truncated buffers are a fatal decode error.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let (&tag_byte, payload) = raw
            .split_first()
            .ok_or(StateStoreError::TruncatedValue { needed: 1, got: 0 })?;
        match ValueTag::from_byte(tag_byte)? {
            ValueTag::Direct => Ok(StateValue::Direct(payload.to_vec())),
            ValueTag::UidLookup => {
                let id: [u8; 4] =
                    payload
                        .try_into()
                        .map_err(|_| StateStoreError::TruncatedValue {
                            needed: 4,
                            got: payload.len(),
                        })?;
                Ok(StateValue::UidLookup(u32::from_be_bytes(id)))
            }
            ValueTag::HashLookup => {
                let hash: ValueHash =
                    payload
                        .try_into()
                        .map_err(|_| StateStoreError::TruncatedValue {
                            needed: 16,
                            got: payload.len(),
                        })?;
                Ok(StateValue::HashLookup(hash))
            }
        }
    }
}

/// Encodes and decodes tagged values against a pair of lookup tables.
#[derive(Debug, Clone)]
pub struct ValueCodec {
    lookups: LookupTables,
}

impl ValueCodec {
    pub(crate) fn new(lookups: LookupTables) -> Self {
        Self { lookups }
    }

    /// Encodes `value` for a write, inserting a lookup row when the size
    /// thresholds call for indirection, and appends `[tag][payload]` to `out`.
    pub fn encode_for_put(&self, txn: &mut RwTxn, value: &[u8], out: &mut Vec<u8>) -> Result<()> {
        if value.len() <= UID_VALUE_THRESHOLD {
            out.push(ValueTag::Direct as u8);
            out.extend_from_slice(value);
        } else if value.len() <= HASH_VALUE_THRESHOLD {
            let id = self.lookups.uid.put(txn, value)?;
            out.push(ValueTag::UidLookup as u8);
            out.extend_from_slice(&id.to_be_bytes());
        } else {
            let hash = self.lookups.hash.put(txn, value)?;
            out.push(ValueTag::HashLookup as u8);
            out.extend_from_slice(&hash);
        }
        Ok(())
    }

    /// Encodes `value` the way a write would, but without mutating any table.
    /// Returns `false` when the value would need a lookup row that does not
    /// exist, meaning the encoded form cannot be present in any schema table.
    pub fn encode_for_get(&self, txn: &RoTxn, value: &[u8], out: &mut Vec<u8>) -> Result<bool> {
        if value.len() <= UID_VALUE_THRESHOLD {
            out.push(ValueTag::Direct as u8);
            out.extend_from_slice(value);
        } else if value.len() <= HASH_VALUE_THRESHOLD {
            let Some(id) = self.lookups.uid.get(txn, value)? else {
                return Ok(false);
            };
            out.push(ValueTag::UidLookup as u8);
            out.extend_from_slice(&id.to_be_bytes());
        } else {
            let Some(hash) = self.lookups.hash.get(txn, value)? else {
                return Ok(false);
            };
            out.push(ValueTag::HashLookup as u8);
            out.extend_from_slice(&hash);
        }
        Ok(true)
    }

    /// Decodes an encoded value buffer back into the original bytes,
    /// dereferencing the lookup tables where indirection was used.
    pub fn decode(&self, txn: &RoTxn, raw: &[u8]) -> Result<Vec<u8>> {
        match StateValue::parse(raw)? {
            StateValue::Direct(bytes) => Ok(bytes),
            StateValue::UidLookup(id) => self.lookups.uid.get_value(txn, id),
            StateValue::HashLookup(hash) => self.lookups.hash.get_value(txn, &hash),
        }
    }
}
