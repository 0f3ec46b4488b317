// Variable-width integer codec.
//
// Most replicated integers are small, so each value is written as a short
// fixed prefix declaring how many chunks follow, then only those chunks:
//
//   u32: [2-bit bytes-1][bytes * 8 bits]      10..=34 bits
//   u16: [3-bit pairs-1][pairs * 2 bits]       5..=19 bits
//   i32: zigzag-mapped to u32, then as above
//
// Chunks hold the low bits of the value, low bit first (see `BitBuffer`).

use super::buffer::{BitBuffer, BufferError};

/// Prefix width for 32-bit values (4 possible byte counts).
const U32_PREFIX_BITS: u32 = 2;

/// Prefix width for 16-bit values (8 possible pair counts).
const U16_PREFIX_BITS: u32 = 3;

/// Chunk width for 16-bit values.
const U16_CHUNK_BITS: u32 = 2;

// ---------------------------------------------------------------------------
// Wrappers
// ---------------------------------------------------------------------------

/// `u32` serialized with the variable-width codec.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PackedU32(pub u32);

/// `i32` serialized through zigzag mapping and the `u32` codec.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PackedI32(pub i32);

/// `u16` serialized with the variable-width codec.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PackedU16(pub u16);

impl From<u32> for PackedU32 {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

impl From<PackedU32> for u32 {
    fn from(v: PackedU32) -> Self {
        v.0
    }
}

impl From<i32> for PackedI32 {
    fn from(v: i32) -> Self {
        Self(v)
    }
}

impl From<PackedI32> for i32 {
    fn from(v: PackedI32) -> Self {
        v.0
    }
}

impl From<u16> for PackedU16 {
    fn from(v: u16) -> Self {
        Self(v)
    }
}

impl From<PackedU16> for u16 {
    fn from(v: PackedU16) -> Self {
        v.0
    }
}

// ---------------------------------------------------------------------------
// Zigzag
// ---------------------------------------------------------------------------

/// Map a signed value to unsigned so small magnitudes stay small:
/// 0, -1, 1, -2, 2 ... become 0, 1, 2, 3, 4 ...
#[inline]
pub fn zigzag_encode(v: i32) -> u32 {
    ((v << 1) ^ (v >> 31)) as u32
}

/// Inverse of [`zigzag_encode`].
#[inline]
pub fn zigzag_decode(v: u32) -> i32 {
    ((v >> 1) as i32) ^ -((v & 1) as i32)
}

// ---------------------------------------------------------------------------
// Chunk counts
// ---------------------------------------------------------------------------

/// Number of significant bytes in `v`, at least 1.
#[inline]
fn u32_bytes(v: u32) -> u32 {
    let empty = v.leading_zeros() / 8;
    (4 - empty).clamp(1, 4)
}

/// Number of significant 2-bit pairs in `v`, at least 1.
#[inline]
fn u16_pairs(v: u16) -> u32 {
    // u16::leading_zeros already counts within 16 bits.
    let empty = v.leading_zeros() / U16_CHUNK_BITS;
    (8 - empty).clamp(1, 8)
}

/// Encoded size of a packed `u32`, in bits.
#[inline]
pub fn packed_u32_bits(v: u32) -> u32 {
    U32_PREFIX_BITS + u32_bytes(v) * 8
}

/// Encoded size of a packed `i32`, in bits.
#[inline]
pub fn packed_i32_bits(v: i32) -> u32 {
    packed_u32_bits(zigzag_encode(v))
}

/// Encoded size of a packed `u16`, in bits.
#[inline]
pub fn packed_u16_bits(v: u16) -> u32 {
    U16_PREFIX_BITS + u16_pairs(v) * U16_CHUNK_BITS
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Write `v` as a packed `u32`.
pub fn write_packed_u32(buf: &mut BitBuffer, v: u32) {
    let bytes = u32_bytes(v);
    buf.write_bits(u64::from(bytes - 1), U32_PREFIX_BITS);
    buf.write_bits(u64::from(v), bytes * 8);
}

/// Write `v` as a zigzag-mapped packed `u32`.
#[inline]
pub fn write_packed_i32(buf: &mut BitBuffer, v: i32) {
    write_packed_u32(buf, zigzag_encode(v));
}

/// Write `v` as a packed `u16`.
pub fn write_packed_u16(buf: &mut BitBuffer, v: u16) {
    let pairs = u16_pairs(v);
    buf.write_bits(u64::from(pairs - 1), U16_PREFIX_BITS);
    buf.write_bits(u64::from(v), pairs * U16_CHUNK_BITS);
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Read a packed `u32`.
pub fn read_packed_u32(buf: &mut BitBuffer) -> Result<u32, BufferError> {
    let bytes = buf.read_bits(U32_PREFIX_BITS)? as u32 + 1;
    Ok(buf.read_bits(bytes * 8)? as u32)
}

/// Read a zigzag-mapped packed `u32` back into an `i32`.
#[inline]
pub fn read_packed_i32(buf: &mut BitBuffer) -> Result<i32, BufferError> {
    read_packed_u32(buf).map(zigzag_decode)
}

/// Read a packed `u16`.
pub fn read_packed_u16(buf: &mut BitBuffer) -> Result<u16, BufferError> {
    let pairs = buf.read_bits(U16_PREFIX_BITS)? as u32 + 1;
    Ok(buf.read_bits(pairs * U16_CHUNK_BITS)? as u16)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
