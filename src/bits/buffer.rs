// Bit-addressable growable buffer.
//
// One contiguous byte region with two independent cursors measured in bits:
//   - write cursor: where the next `write_bits` lands
//   - read cursor:  where the next `read_bits` starts
//
// Bits are packed least-significant first: stream bit `n` is bit `n % 8` of
// byte `n / 8`.  A value written with width `w` occupies stream bits
// `p .. p + w`, low bit first.
//
// The backing store is kept zero-filled past the write cursor so partial
// trailing bytes never leak stale bits from a previous use.

use thiserror::Error;

use super::serialize::{BitDeserialize, BitSerialize};

/// Smallest allocation made on first growth.
const MIN_CAPACITY: usize = 32;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Runtime failures when reading from a [`BitBuffer`].
///
/// Invalid bit widths are programmer errors and panic instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BufferError {
    /// A read asked for more bits than remain before the write cursor.
    #[error("buffer underflow: requested {requested} bits, {available} available")]
    Underflow { requested: usize, available: usize },
    /// A length-prefixed string did not hold valid UTF-8.
    #[error("invalid utf-8 in string after {valid_up_to} bytes")]
    InvalidUtf8 { valid_up_to: usize },
}

// ---------------------------------------------------------------------------
// BitBuffer
// ---------------------------------------------------------------------------

/// Append/seek buffer addressable at bit granularity.
///
/// Written once, then rewound and read sequentially:
///
/// ```
/// use bitdelta::bits::BitBuffer;
///
/// let mut buf = BitBuffer::new();
/// buf.write_bits(0b101, 3);
/// buf.write_bits(0xABCD, 16);
/// assert_eq!(buf.len_bits(), 19);
///
/// buf.reset_read();
/// assert_eq!(buf.read_bits(3).unwrap(), 0b101);
/// assert_eq!(buf.read_bits(16).unwrap(), 0xABCD);
/// ```
#[derive(Debug, Clone, Default)]
pub struct BitBuffer {
    /// Backing store; `data.len()` is the byte capacity.
    data: Vec<u8>,
    /// Write cursor in bits.
    write_pos: usize,
    /// Read cursor in bits.  Never exceeds `write_pos` after a successful read.
    read_pos: usize,
}

impl BitBuffer {
    /// Create an empty buffer.  Nothing is allocated until the first write.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty buffer with room for `bytes` bytes.
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            data: vec![0; bytes],
            write_pos: 0,
            read_pos: 0,
        }
    }

    /// Wrap received bytes for reading.  The write cursor sits at the end.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            data: bytes.to_vec(),
            write_pos: bytes.len() * 8,
            read_pos: 0,
        }
    }

    // -----------------------------------------------------------------------
    // Cursors and sizes
    // -----------------------------------------------------------------------

    /// Number of bits written.
    #[inline]
    pub fn len_bits(&self) -> usize {
        self.write_pos
    }

    /// Number of bytes spanned by the written bits (last byte may be partial).
    #[inline]
    pub fn len_bytes(&self) -> usize {
        self.write_pos.div_ceil(8)
    }

    /// True if nothing has been written.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.write_pos == 0
    }

    /// Allocated byte capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Current read cursor in bits.
    #[inline]
    pub fn read_position(&self) -> usize {
        self.read_pos
    }

    /// Bits left between the read cursor and the write cursor.
    #[inline]
    pub fn remaining_bits(&self) -> usize {
        self.write_pos.saturating_sub(self.read_pos)
    }

    /// Move the read cursor to an absolute bit position.
    pub fn set_read_position(&mut self, bit: usize) -> Result<(), BufferError> {
        if bit > self.write_pos {
            return Err(BufferError::Underflow {
                requested: bit - self.read_pos,
                available: self.remaining_bits(),
            });
        }
        self.read_pos = bit;
        Ok(())
    }

    /// Rewind the read cursor to the start.
    #[inline]
    pub fn reset_read(&mut self) {
        self.read_pos = 0;
    }

    /// Reset both cursors for reuse.  The allocation is kept.
    pub fn clear(&mut self) {
        let used = self.len_bytes();
        self.data[..used].fill(0);
        self.write_pos = 0;
        self.read_pos = 0;
    }

    /// Finalized contents, bounded by the write cursor.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len_bytes()]
    }

    /// Consume the buffer, returning the finalized contents.
    pub fn into_bytes(mut self) -> Vec<u8> {
        let len = self.len_bytes();
        self.data.truncate(len);
        self.data
    }

    // -----------------------------------------------------------------------
    // Growth
    // -----------------------------------------------------------------------

    /// Make room for `extra_bits` more bits past the write cursor.
    /// Doubles the capacity until it fits.
    #[inline]
    fn reserve_bits(&mut self, extra_bits: usize) {
        let needed = (self.write_pos + extra_bits).div_ceil(8);
        if needed <= self.data.len() {
            return;
        }
        let mut cap = self.data.len().max(MIN_CAPACITY);
        while cap < needed {
            cap *= 2;
        }
        self.data.resize(cap, 0);
    }

    // -----------------------------------------------------------------------
    // Bit-level access
    // -----------------------------------------------------------------------

    /// Write the low `width` bits of `value` at the write cursor.
    ///
    /// # Panics
    /// If `width` is 0 or greater than 64.
    pub fn write_bits(&mut self, value: u64, width: u32) {
        assert!(
            (1..=64).contains(&width),
            "invalid bit width {width} (expected 1..=64)"
        );
        self.reserve_bits(width as usize);

        let mut value = if width == 64 {
            value
        } else {
            value & ((1u64 << width) - 1)
        };
        let mut remaining = width;
        let mut pos = self.write_pos;

        while remaining > 0 {
            let shift = (pos % 8) as u32;
            let take = (8 - shift).min(remaining);
            let mask = (((1u16 << take) - 1) as u8) << shift;
            let byte = &mut self.data[pos / 8];
            *byte = (*byte & !mask) | (((value as u8) << shift) & mask);
            value >>= take;
            remaining -= take;
            pos += take as usize;
        }

        self.write_pos = pos;
    }

    /// Read the next `width` bits from the read cursor.
    ///
    /// # Panics
    /// If `width` is 0 or greater than 64.
    pub fn read_bits(&mut self, width: u32) -> Result<u64, BufferError> {
        assert!(
            (1..=64).contains(&width),
            "invalid bit width {width} (expected 1..=64)"
        );
        self.check_available(width as usize)?;

        let mut value: u64 = 0;
        let mut filled = 0u32;
        let mut pos = self.read_pos;

        while filled < width {
            let shift = (pos % 8) as u32;
            let take = (8 - shift).min(width - filled);
            let bits = (self.data[pos / 8] >> shift) & (((1u16 << take) - 1) as u8);
            value |= (bits as u64) << filled;
            filled += take;
            pos += take as usize;
        }

        self.read_pos = pos;
        Ok(value)
    }

    /// Write a single bit.
    #[inline]
    pub fn write_bool(&mut self, bit: bool) {
        self.write_bits(bit as u64, 1);
    }

    /// Read a single bit.
    #[inline]
    pub fn read_bool(&mut self) -> Result<bool, BufferError> {
        Ok(self.read_bits(1)? != 0)
    }

    // -----------------------------------------------------------------------
    // Byte-level access
    // -----------------------------------------------------------------------

    /// Append `bytes`.  Byte-aligned writes are a single bulk copy; unaligned
    /// writes fall back to 8-bit packing.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        if self.write_pos % 8 == 0 {
            self.reserve_bits(bytes.len() * 8);
            let start = self.write_pos / 8;
            self.data[start..start + bytes.len()].copy_from_slice(bytes);
            self.write_pos += bytes.len() * 8;
        } else {
            for &b in bytes {
                self.write_bits(b as u64, 8);
            }
        }
    }

    /// Read `n` bytes into a new vector.
    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>, BufferError> {
        self.check_available(n * 8)?;
        if self.read_pos % 8 == 0 {
            let start = self.read_pos / 8;
            self.read_pos += n * 8;
            return Ok(self.data[start..start + n].to_vec());
        }
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            out.push(self.read_bits(8)? as u8);
        }
        Ok(out)
    }

    /// Advance the read cursor by `n` bytes without copying.
    pub fn skip_bytes(&mut self, n: usize) -> Result<(), BufferError> {
        self.check_available(n * 8)?;
        self.read_pos += n * 8;
        Ok(())
    }

    /// Pad the write cursor with zero bits up to the next byte boundary.
    pub fn align_write(&mut self) {
        let pad = (8 - self.write_pos % 8) % 8;
        if pad > 0 {
            self.write_bits(0, pad as u32);
        }
    }

    /// Advance the read cursor to the next byte boundary.
    pub fn align_read(&mut self) -> Result<(), BufferError> {
        let pad = (8 - self.read_pos % 8) % 8;
        self.check_available(pad)?;
        self.read_pos += pad;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Typed access
    // -----------------------------------------------------------------------

    /// Serialize `value` at the write cursor.
    #[inline]
    pub fn write<T: BitSerialize + ?Sized>(&mut self, value: &T) {
        value.write_to(self);
    }

    /// Deserialize a `T` from the read cursor.
    #[inline]
    pub fn read<T: BitDeserialize>(&mut self) -> Result<T, BufferError> {
        T::read_from(self)
    }

    #[inline]
    fn check_available(&self, bits: usize) -> Result<(), BufferError> {
        let available = self.remaining_bits();
        if bits > available {
            return Err(BufferError::Underflow {
                requested: bits,
                available,
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_buffer() {
        let buf = BitBuffer::new();
        assert!(buf.is_empty());
        assert_eq!(buf.len_bits(), 0);
        assert_eq!(buf.as_bytes(), &[] as &[u8]);
        assert_eq!(buf.capacity(), 0);
    }

    #[test]
    fn bits_are_packed_low_first() {
        let mut buf = BitBuffer::new();
        buf.write_bits(0b1, 1);
        buf.write_bits(0b10, 2);
        buf.write_bits(0b11111, 5);
        // bit0 = 1, bits1..3 = 0b10, bits3..8 = 0b11111
        assert_eq!(buf.as_bytes(), &[0b1111_1101]);
    }

    #[test]
    fn value_spanning_bytes() {
        let mut buf = BitBuffer::new();
        buf.write_bits(0, 3);
        buf.write_bits(0x1FF, 9);
        assert_eq!(buf.len_bits(), 12);
        assert_eq!(buf.as_bytes(), &[0b1111_1000, 0b0000_1111]);
        buf.reset_read();
        assert_eq!(buf.read_bits(3).unwrap(), 0);
        assert_eq!(buf.read_bits(9).unwrap(), 0x1FF);
    }

    #[test]
    fn full_width_values() {
        let mut buf = BitBuffer::new();
        buf.write_bits(u64::MAX, 64);
        buf.write_bits(1, 1);
        buf.write_bits(0xDEAD_BEEF_CAFE_F00D, 64);
        buf.reset_read();
        assert_eq!(buf.read_bits(64).unwrap(), u64::MAX);
        assert_eq!(buf.read_bits(1).unwrap(), 1);
        assert_eq!(buf.read_bits(64).unwrap(), 0xDEAD_BEEF_CAFE_F00D);
    }

    #[test]
    fn high_bits_beyond_width_are_ignored() {
        let mut buf = BitBuffer::new();
        buf.write_bits(0xFF, 4);
        buf.write_bits(0, 4);
        assert_eq!(buf.as_bytes(), &[0x0F]);
    }

    #[test]
    #[should_panic(expected = "invalid bit width")]
    fn zero_width_write_panics() {
        BitBuffer::new().write_bits(1, 0);
    }

    #[test]
    #[should_panic(expected = "invalid bit width")]
    fn oversized_width_read_panics() {
        let mut buf = BitBuffer::from_bytes(&[0; 16]);
        let _ = buf.read_bits(65);
    }

    #[test]
    fn read_past_write_cursor_is_underflow() {
        let mut buf = BitBuffer::new();
        buf.write_bits(3, 2);
        assert_eq!(
            buf.read_bits(3),
            Err(BufferError::Underflow {
                requested: 3,
                available: 2
            })
        );
        // Cursor untouched after the failed read.
        assert_eq!(buf.read_bits(2).unwrap(), 3);
    }

    #[test]
    fn capacity_doubles_on_growth() {
        let mut buf = BitBuffer::with_capacity(4);
        buf.write_bits(0, 32);
        assert_eq!(buf.capacity(), 4);
        buf.write_bits(0, 1);
        assert_eq!(buf.capacity(), 32);
        buf.write_bytes(&[7; 40]);
        assert_eq!(buf.capacity(), 64);
        assert_eq!(buf.len_bytes(), 45);
    }

    #[test]
    fn aligned_and_unaligned_byte_writes() {
        let mut buf = BitBuffer::new();
        buf.write_bytes(b"ab");
        buf.write_bits(1, 1);
        buf.write_bytes(b"cd");
        buf.reset_read();
        assert_eq!(buf.read_bytes(2).unwrap(), b"ab");
        assert!(buf.read_bool().unwrap());
        assert_eq!(buf.read_bytes(2).unwrap(), b"cd");
        assert_eq!(buf.remaining_bits(), 0);
    }

    #[test]
    fn skip_bytes_advances_read_cursor() {
        let mut buf = BitBuffer::from_bytes(b"hello world");
        buf.skip_bytes(6).unwrap();
        assert_eq!(buf.read_bytes(5).unwrap(), b"world");
        assert!(buf.skip_bytes(1).is_err());
    }

    #[test]
    fn clear_reuses_allocation_without_stale_bits() {
        let mut buf = BitBuffer::new();
        buf.write_bytes(&[0xFF; 8]);
        let cap = buf.capacity();
        buf.clear();
        assert_eq!(buf.capacity(), cap);
        assert!(buf.is_empty());
        buf.write_bits(0, 3);
        assert_eq!(buf.as_bytes(), &[0]);
    }

    #[test]
    fn alignment_helpers() {
        let mut buf = BitBuffer::new();
        buf.write_bits(1, 3);
        buf.align_write();
        assert_eq!(buf.len_bits(), 8);
        buf.align_write();
        assert_eq!(buf.len_bits(), 8);
        buf.write_bytes(b"x");

        buf.reset_read();
        buf.read_bits(1).unwrap();
        buf.align_read().unwrap();
        assert_eq!(buf.read_position(), 8);
        assert_eq!(buf.read_bytes(1).unwrap(), b"x");
    }

    #[test]
    fn set_read_position_bounds() {
        let mut buf = BitBuffer::from_bytes(&[0xAA, 0x55]);
        buf.set_read_position(8).unwrap();
        assert_eq!(buf.read_bits(8).unwrap(), 0x55);
        assert!(buf.set_read_position(17).is_err());
        buf.set_read_position(16).unwrap();
        assert_eq!(buf.remaining_bits(), 0);
    }

    #[test]
    fn into_bytes_truncates_to_written_extent() {
        let mut buf = BitBuffer::with_capacity(128);
        buf.write_bits(0x3FF, 10);
        let bytes = buf.into_bytes();
        assert_eq!(bytes, vec![0xFF, 0x03]);
    }
}
