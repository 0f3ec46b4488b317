// Typed (de)serialization through a `BitBuffer`.
//
// Callers replicating state implement these two traits for their own types
// by composing the impls below.  Primitive integers use their full native
// width; use the `Packed*` wrappers for the variable-width codec.

use super::buffer::{BitBuffer, BufferError};
use super::packed::{
    self, PackedI32, PackedU16, PackedU32, read_packed_u32, write_packed_u32,
};

/// A value that can be written into a [`BitBuffer`].
pub trait BitSerialize {
    fn write_to(&self, buf: &mut BitBuffer);
}

/// A value that can be read back from a [`BitBuffer`].
pub trait BitDeserialize: Sized {
    fn read_from(buf: &mut BitBuffer) -> Result<Self, BufferError>;
}

impl<T: BitSerialize + ?Sized> BitSerialize for &T {
    fn write_to(&self, buf: &mut BitBuffer) {
        (**self).write_to(buf);
    }
}

// ---------------------------------------------------------------------------
// Fixed-width primitives
// ---------------------------------------------------------------------------

macro_rules! impl_unsigned {
    ($($ty:ty),*) => {$(
        impl BitSerialize for $ty {
            #[inline]
            fn write_to(&self, buf: &mut BitBuffer) {
                buf.write_bits(*self as u64, <$ty>::BITS);
            }
        }

        impl BitDeserialize for $ty {
            #[inline]
            fn read_from(buf: &mut BitBuffer) -> Result<Self, BufferError> {
                Ok(buf.read_bits(<$ty>::BITS)? as $ty)
            }
        }
    )*};
}

macro_rules! impl_signed {
    ($($ty:ty => $uty:ty),*) => {$(
        impl BitSerialize for $ty {
            #[inline]
            fn write_to(&self, buf: &mut BitBuffer) {
                buf.write_bits(*self as $uty as u64, <$ty>::BITS);
            }
        }

        impl BitDeserialize for $ty {
            #[inline]
            fn read_from(buf: &mut BitBuffer) -> Result<Self, BufferError> {
                Ok(buf.read_bits(<$ty>::BITS)? as $uty as $ty)
            }
        }
    )*};
}

impl_unsigned!(u8, u16, u32, u64);
impl_signed!(i8 => u8, i16 => u16, i32 => u32, i64 => u64);

impl BitSerialize for bool {
    #[inline]
    fn write_to(&self, buf: &mut BitBuffer) {
        buf.write_bool(*self);
    }
}

impl BitDeserialize for bool {
    #[inline]
    fn read_from(buf: &mut BitBuffer) -> Result<Self, BufferError> {
        buf.read_bool()
    }
}

// ---------------------------------------------------------------------------
// Packed wrappers
// ---------------------------------------------------------------------------

impl BitSerialize for PackedU32 {
    fn write_to(&self, buf: &mut BitBuffer) {
        write_packed_u32(buf, self.0);
    }
}

impl BitDeserialize for PackedU32 {
    fn read_from(buf: &mut BitBuffer) -> Result<Self, BufferError> {
        read_packed_u32(buf).map(Self)
    }
}

impl BitSerialize for PackedI32 {
    fn write_to(&self, buf: &mut BitBuffer) {
        packed::write_packed_i32(buf, self.0);
    }
}

impl BitDeserialize for PackedI32 {
    fn read_from(buf: &mut BitBuffer) -> Result<Self, BufferError> {
        packed::read_packed_i32(buf).map(Self)
    }
}

impl BitSerialize for PackedU16 {
    fn write_to(&self, buf: &mut BitBuffer) {
        packed::write_packed_u16(buf, self.0);
    }
}

impl BitDeserialize for PackedU16 {
    fn read_from(buf: &mut BitBuffer) -> Result<Self, BufferError> {
        packed::read_packed_u16(buf).map(Self)
    }
}

// ---------------------------------------------------------------------------
// Composites
// ---------------------------------------------------------------------------

/// One presence bit, then the value if present.
impl<T: BitSerialize> BitSerialize for Option<T> {
    fn write_to(&self, buf: &mut BitBuffer) {
        buf.write_bool(self.is_some());
        if let Some(v) = self {
            v.write_to(buf);
        }
    }
}

impl<T: BitDeserialize> BitDeserialize for Option<T> {
    fn read_from(buf: &mut BitBuffer) -> Result<Self, BufferError> {
        if buf.read_bool()? {
            T::read_from(buf).map(Some)
        } else {
            Ok(None)
        }
    }
}

/// Length prefix for a byte payload.
///
/// # Panics
/// If `len` does not fit the packed `u32` prefix.
fn length_prefix(len: usize) -> u32 {
    match u32::try_from(len) {
        Ok(n) => n,
        Err(_) => panic!("payload of {len} bytes exceeds the 32-bit length prefix"),
    }
}

/// Packed `u32` length, then the raw bytes.
///
/// # Panics
/// If the slice is longer than `u32::MAX` bytes.
impl BitSerialize for [u8] {
    fn write_to(&self, buf: &mut BitBuffer) {
        write_packed_u32(buf, length_prefix(self.len()));
        buf.write_bytes(self);
    }
}

impl BitSerialize for Vec<u8> {
    fn write_to(&self, buf: &mut BitBuffer) {
        self.as_slice().write_to(buf);
    }
}

impl BitDeserialize for Vec<u8> {
    fn read_from(buf: &mut BitBuffer) -> Result<Self, BufferError> {
        let len = read_packed_u32(buf)? as usize;
        buf.read_bytes(len)
    }
}

impl BitSerialize for str {
    fn write_to(&self, buf: &mut BitBuffer) {
        self.as_bytes().write_to(buf);
    }
}

impl BitSerialize for String {
    fn write_to(&self, buf: &mut BitBuffer) {
        self.as_bytes().write_to(buf);
    }
}

impl BitDeserialize for String {
    fn read_from(buf: &mut BitBuffer) -> Result<Self, BufferError> {
        let bytes = Vec::<u8>::read_from(buf)?;
        String::from_utf8(bytes).map_err(|e| BufferError::InvalidUtf8 {
            valid_up_to: e.utf8_error().valid_up_to(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
