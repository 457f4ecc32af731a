//! Fixed-width big-endian unsigned integer codec.
//!
//! Widths of 1 through 8 bytes are supported. Encoding is zero-padded
//! big-endian, so for any two values `a < b` that fit the width,
//! `encode(a)` sorts before `encode(b)` under unsigned byte comparison.

/// A fixed-width unsigned integer codec.
///
/// Callers must guarantee that encoded values fit the configured width;
/// overflow is a programming error, not a recoverable condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnsignedCodec {
    width: usize,
}

impl UnsignedCodec {
    /// Creates a codec for the given width in bytes (1..=8).
    pub const fn new(width: usize) -> Self {
        assert!(width >= 1 && width <= 8);
        Self { width }
    }

    /// Number of bytes this codec writes and reads.
    pub const fn size(&self) -> usize {
        self.width
    }

    /// Largest value representable at this width.
    pub const fn max_value(&self) -> u64 {
        if self.width == 8 {
            u64::MAX
        } else {
            (1u64 << (self.width * 8)) - 1
        }
    }

    /// Appends exactly `size()` bytes encoding `value`.
    pub fn write(&self, out: &mut Vec<u8>, value: u64) {
        debug_assert!(
            value <= self.max_value(),
            "value {value} does not fit in {} bytes",
            self.width
        );
        out.extend_from_slice(&value.to_be_bytes()[8 - self.width..]);
    }

    /// Consumes exactly `size()` bytes from the front of `buf` and returns
    /// the decoded value together with the remaining slice.
    pub fn read<'a>(&self, buf: &'a [u8]) -> (u64, &'a [u8]) {
        let (head, rest) = buf.split_at(self.width);
        let mut raw = [0u8; 8];
        raw[8 - self.width..].copy_from_slice(head);
        (u64::from_be_bytes(raw), rest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_all_widths() {
        for width in 1..=8 {
            let codec = UnsignedCodec::new(width);
            for value in [0, 1, 255, codec.max_value() / 2, codec.max_value()] {
                let mut buf = Vec::new();
                codec.write(&mut buf, value);
                assert_eq!(buf.len(), width);
                let (decoded, rest) = codec.read(&buf);
                assert_eq!(decoded, value);
                assert!(rest.is_empty());
            }
        }
    }

    #[test]
    fn encoding_preserves_order() {
        for width in [1usize, 2, 4, 8] {
            let codec = UnsignedCodec::new(width);
            let max = codec.max_value();
            let samples = [
                0,
                1,
                2,
                max / 7,
                max / 3,
                max / 2,
                max - 1,
                max,
            ];
            let mut encoded: Vec<(u64, Vec<u8>)> = samples
                .iter()
                .map(|&v| {
                    let mut buf = Vec::new();
                    codec.write(&mut buf, v);
                    (v, buf)
                })
                .collect();
            encoded.sort_by(|a, b| a.1.cmp(&b.1));
            let mut last = None;
            for (value, _) in encoded {
                if let Some(prev) = last {
                    assert!(prev <= value, "byte order disagreed with numeric order");
                }
                last = Some(value);
            }
        }
    }

    #[test]
    fn read_leaves_remainder() {
        let codec = UnsignedCodec::new(2);
        let mut buf = Vec::new();
        codec.write(&mut buf, 0x1234);
        buf.extend_from_slice(b"tail");
        let (value, rest) = codec.read(&buf);
        assert_eq!(value, 0x1234);
        assert_eq!(rest, b"tail");
    }
}
