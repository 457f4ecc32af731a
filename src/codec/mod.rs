//! Order-preserving binary codecs for keys and timestamps.
//!
//! Every codec in this module produces fixed-width big-endian bytes so that
//! numeric order and byte-lexicographic order agree. LMDB compares keys as
//! unsigned byte strings, so this property is what keeps range scans correct.

mod time;
mod unsigned;

pub use time::{TimeCodec, Timestamp, INSERT_TIME_EPOCH_SECONDS, SECONDS_PER_DAY};
pub use unsigned::UnsignedCodec;
