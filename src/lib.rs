//! Bitdelta: bit-packed wire encoding and binary deltas for replicated state.
//!
//! The crate provides:
//! - A bit-addressable buffer with variable-width integer packing (`bits`)
//! - Rolling-hash block indexing (`hash`)
//! - Edit-script creation and application (`delta`)
//! - File-oriented helpers (`io`)
//! - An optional CLI (`cli` feature)
//!
//! # Quick Start
//!
//! ```
//! use bitdelta::bits::{BitBuffer, PackedI32, PackedU32};
//! use bitdelta::delta;
//!
//! let mut buf = BitBuffer::new();
//! buf.write(&PackedU32(5));
//! buf.write(&PackedI32(-3));
//! assert_eq!(buf.read::<PackedU32>().unwrap(), PackedU32(5));
//! assert_eq!(buf.read::<PackedI32>().unwrap(), PackedI32(-3));
//!
//! let origin = b"hello old world, hello old world";
//! let target = b"hello new world, hello old world";
//! let script = delta::create(origin, target);
//! assert_eq!(delta::apply(origin, &script).unwrap(), target);
//! ```

pub mod bits;
pub mod delta;
pub mod hash;
pub mod io;

#[cfg(feature = "cli")]
pub mod cli;
