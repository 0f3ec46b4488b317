// Bit-level wire encoding.
//
// This module provides:
// - `BitBuffer`, a growable buffer addressable at bit granularity
// - Variable-width packing for 16/32-bit integers (`packed`)
// - `BitSerialize` / `BitDeserialize` for typed values
// - `BufferPool` for scoped buffer reuse

pub mod buffer;
pub mod packed;
pub mod pool;
pub mod serialize;

pub use buffer::{BitBuffer, BufferError};
pub use packed::{PackedI32, PackedU16, PackedU32};
pub use pool::{BufferPool, PooledBuffer};
pub use serialize::{BitDeserialize, BitSerialize};
