//! Timestamp representation and the three interchangeable time codecs.
//!
//! A table commits to exactly one codec when it is created; codecs are never
//! mixed within a table. All three encode big-endian so that earlier instants
//! sort before later ones, and all three round-trip losslessly at their own
//! granularity: `decode(encode(ts))` equals `ts` truncated to the codec's
//! precision, in both directions.

use std::time::{SystemTime, UNIX_EPOCH};

use super::unsigned::UnsignedCodec;

/// Seconds in one day, the granularity of the day-based codecs.
pub const SECONDS_PER_DAY: i64 = 86_400;

/// 2025-01-01T00:00:00Z. The insert-time codec counts days from here instead
/// of the Unix epoch so that two bytes cover a useful range of future dates.
pub const INSERT_TIME_EPOCH_SECONDS: i64 = 1_735_689_600;

const MILLIS_PER_DAY: i64 = SECONDS_PER_DAY * 1000;

/// A point in time, stored as milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Creates a timestamp from milliseconds since the Unix epoch.
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Creates a timestamp from whole seconds since the Unix epoch.
    pub const fn from_epoch_seconds(seconds: i64) -> Self {
        Self(seconds * 1000)
    }

    /// Milliseconds since the Unix epoch.
    pub const fn millis(&self) -> i64 {
        self.0
    }

    /// Whole seconds since the Unix epoch, rounded toward negative infinity.
    pub const fn epoch_seconds(&self) -> i64 {
        self.0.div_euclid(1000)
    }

    /// The current wall-clock time.
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as i64;
        Self(millis)
    }
}

/// The time encoding strategy used by one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeCodec {
    /// Two bytes holding days since the Unix epoch.
    Day,
    /// Six bytes holding milliseconds since the Unix epoch.
    Millis,
    /// Two bytes holding days since 2025-01-01T00:00:00Z.
    InsertDay,
}

impl TimeCodec {
    /// Number of bytes this codec writes and reads.
    pub const fn size(&self) -> usize {
        match self {
            TimeCodec::Day | TimeCodec::InsertDay => 2,
            TimeCodec::Millis => 6,
        }
    }

    fn unsigned(&self) -> UnsignedCodec {
        UnsignedCodec::new(self.size())
    }

    fn to_raw(&self, ts: Timestamp) -> u64 {
        let raw = match self {
            TimeCodec::Day => ts.epoch_seconds().div_euclid(SECONDS_PER_DAY),
            TimeCodec::Millis => ts.millis(),
            TimeCodec::InsertDay => (ts.epoch_seconds() - INSERT_TIME_EPOCH_SECONDS)
                .div_euclid(SECONDS_PER_DAY),
        };
        debug_assert!(
            raw >= 0 && (raw as u64) <= self.unsigned().max_value(),
            "timestamp {ts:?} is out of range for {self:?}"
        );
        raw as u64
    }

    /// Appends exactly `size()` bytes encoding `ts` at this codec's
    /// granularity. Callers must guarantee the instant is representable.
    pub fn write(&self, out: &mut Vec<u8>, ts: Timestamp) {
        self.unsigned().write(out, self.to_raw(ts));
    }

    /// Consumes exactly `size()` bytes and returns the decoded timestamp
    /// together with the remaining slice.
    pub fn read<'a>(&self, buf: &'a [u8]) -> (Timestamp, &'a [u8]) {
        let (raw, rest) = self.unsigned().read(buf);
        let ts = match self {
            TimeCodec::Day => Timestamp::from_millis(raw as i64 * MILLIS_PER_DAY),
            TimeCodec::Millis => Timestamp::from_millis(raw as i64),
            TimeCodec::InsertDay => Timestamp::from_epoch_seconds(
                raw as i64 * SECONDS_PER_DAY + INSERT_TIME_EPOCH_SECONDS,
            ),
        };
        (ts, rest)
    }

    /// Truncates `ts` to this codec's granularity without encoding it.
    /// `truncate(ts)` always equals `read(write(ts))`.
    pub fn truncate(&self, ts: Timestamp) -> Timestamp {
        let mut buf = Vec::with_capacity(self.size());
        self.write(&mut buf, ts);
        self.read(&buf).0
    }
}
