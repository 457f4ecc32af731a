//! Schema serializers and stores, one concrete type per record shape.
//!
//! Each store composes the key codecs, an optional time codec, and the value
//! codec into a single flat key buffer and value buffer per record. The four
//! shapes are:
//!
//! - [`StateStore`]: plain key -> value
//! - [`RangeStateStore`]: `[start][end]` unsigned range -> value
//! - [`TemporalRangeStateStore`]: `[start][end][effective time]` -> value
//! - [`SessionStore`]: `[utf8 key][start][end]` interval records
//!
//! Write operations take `&mut self`: every store owns a scratch buffer that
//! is reused across encodes within one write transaction and must never be
//! shared across threads or transactions.

mod range;
mod session;
mod state;
mod temporal;

pub use range::RangeStateStore;
pub use session::SessionStore;
pub use state::StateStore;
pub use temporal::TemporalRangeStateStore;

use crate::codec::UnsignedCodec;

/// Key width of a range store's start and end bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeWidth {
    /// Two bytes per bound.
    U16,
    /// Four bytes per bound.
    U32,
    /// Eight bytes per bound.
    U64,
}

impl RangeWidth {
    /// Bytes per encoded bound.
    pub const fn bytes(self) -> usize {
        match self {
            RangeWidth::U16 => 2,
            RangeWidth::U32 => 4,
            RangeWidth::U64 => 8,
        }
    }

    pub(crate) const fn codec(self) -> UnsignedCodec {
        UnsignedCodec::new(self.bytes())
    }
}
