// Edit-script wire format.
//
//   script  := u32 target_len '\n' op* u32 checksum ';'
//   op      := u32 len ':' <len literal bytes>
//            | u32 len '@' u32 offset ','
//
// Integers are fixed 32-bit fields written through `BitBuffer::write_bits`
// (least-significant byte first); tags are single ASCII bytes.  The writer
// pads to a byte boundary before the header, so every field and literal is
// byte-aligned and literals can be bulk-copied and skipped.

use std::ops::Range;

use crate::bits::{BitBuffer, BufferError};

use super::decoder::ApplyError;

/// Terminates the target-length header.
pub const TAG_SIZE: u8 = b'\n';
/// Follows the length of a literal insert.
pub const TAG_INSERT: u8 = b':';
/// Follows the length of a copy, before its offset.
pub const TAG_COPY: u8 = b'@';
/// Terminates a copy offset.
pub const TAG_COPY_END: u8 = b',';
/// Follows the trailing checksum; ends the script.
pub const TAG_CHECKSUM: u8 = b';';

/// Width of every integer field.
pub const INT_BITS: u32 = 32;

/// One decoded script operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    /// `len` literal bytes; `payload` is their byte range within the script.
    Insert { len: u32, payload: Range<usize> },
    /// `len` bytes from `origin[offset..]`.
    Copy { len: u32, offset: u32 },
    /// Checksum of the full target.  Always the last op.
    Checksum(u32),
}

/// Operation counts and byte totals for one script.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScriptStats {
    /// Declared target length from the header.
    pub target_len: u32,
    pub copies: u64,
    pub inserts: u64,
    pub bytes_copied: u64,
    pub bytes_inserted: u64,
    /// Recorded target checksum.
    pub checksum: u32,
}

impl ScriptStats {
    /// Account for one operation.
    pub fn record(&mut self, op: &Op) {
        match *op {
            Op::Insert { len, .. } => {
                self.inserts += 1;
                self.bytes_inserted += u64::from(len);
            }
            Op::Copy { len, .. } => {
                self.copies += 1;
                self.bytes_copied += u64::from(len);
            }
            Op::Checksum(sum) => self.checksum = sum,
        }
    }
}

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

/// Appends script fields to a [`BitBuffer`].
///
/// Does not enforce the grammar; the encoder calls it in order.
pub struct ScriptWriter<'b> {
    buf: &'b mut BitBuffer,
    stats: ScriptStats,
}

impl<'b> ScriptWriter<'b> {
    /// Start a script at the next byte boundary of `buf`.
    pub fn new(buf: &'b mut BitBuffer) -> Self {
        buf.align_write();
        Self {
            buf,
            stats: ScriptStats::default(),
        }
    }

    #[inline]
    fn int(&mut self, v: u32) {
        self.buf.write_bits(u64::from(v), INT_BITS);
    }

    #[inline]
    fn tag(&mut self, t: u8) {
        self.buf.write_bits(u64::from(t), 8);
    }

    pub fn header(&mut self, target_len: u32) {
        self.int(target_len);
        self.tag(TAG_SIZE);
        self.stats.target_len = target_len;
    }

    pub fn insert(&mut self, literal: &[u8]) {
        let len = literal.len() as u32;
        self.int(len);
        self.tag(TAG_INSERT);
        let start = self.buf.len_bytes();
        self.buf.write_bytes(literal);
        self.stats.record(&Op::Insert {
            len,
            payload: start..start + literal.len(),
        });
    }

    pub fn copy(&mut self, len: u32, offset: u32) {
        self.int(len);
        self.tag(TAG_COPY);
        self.int(offset);
        self.tag(TAG_COPY_END);
        self.stats.record(&Op::Copy { len, offset });
    }

    /// Write the checksum trailer and return the totals for the script.
    pub fn finish(mut self, checksum: u32) -> ScriptStats {
        self.int(checksum);
        self.tag(TAG_CHECKSUM);
        self.stats.record(&Op::Checksum(checksum));
        self.stats
    }
}

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

/// Pulls operations from a script held in a [`BitBuffer`].
///
/// Literal payloads are skipped, not copied; use [`bytes`](Self::bytes) with
/// the returned range to reach them.
pub struct ScriptReader<'b> {
    buf: &'b mut BitBuffer,
    done: bool,
}

impl<'b> ScriptReader<'b> {
    /// Start reading at the next byte boundary of `buf`.
    pub fn new(buf: &'b mut BitBuffer) -> Result<Self, ApplyError> {
        buf.align_read().map_err(truncated)?;
        Ok(Self { buf, done: false })
    }

    /// Everything written to the underlying buffer.
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        self.buf.as_bytes()
    }

    /// Bytes left unread.  Zero after a well-formed standalone script.
    pub fn remaining_bytes(&self) -> usize {
        self.buf.remaining_bits().div_ceil(8)
    }

    #[inline]
    fn int(&mut self) -> Result<u32, ApplyError> {
        Ok(self.buf.read_bits(INT_BITS).map_err(truncated)? as u32)
    }

    #[inline]
    fn tag(&mut self) -> Result<u8, ApplyError> {
        Ok(self.buf.read_bits(8).map_err(truncated)? as u8)
    }

    /// Read the declared target length.
    pub fn header(&mut self) -> Result<u32, ApplyError> {
        let len = self.int()?;
        match self.tag()? {
            TAG_SIZE => Ok(len),
            _ => Err(ApplyError::MissingSizeTerminator),
        }
    }

    /// Read the next operation.
    ///
    /// Reading past the checksum, or running out of input at an operation
    /// boundary, is [`ApplyError::Unterminated`].
    pub fn next_op(&mut self) -> Result<Op, ApplyError> {
        if self.done || self.buf.remaining_bits() == 0 {
            return Err(ApplyError::Unterminated);
        }

        let value = self.int()?;
        match self.tag()? {
            TAG_COPY => {
                let offset = self.int()?;
                if self.tag()? != TAG_COPY_END {
                    return Err(ApplyError::UnterminatedCopy);
                }
                Ok(Op::Copy { len: value, offset })
            }
            TAG_INSERT => {
                let len = value as usize;
                let start = self.buf.read_position() / 8;
                self.buf.skip_bytes(len).map_err(truncated)?;
                Ok(Op::Insert {
                    len: value,
                    payload: start..start + len,
                })
            }
            TAG_CHECKSUM => {
                self.done = true;
                Ok(Op::Checksum(value))
            }
            other => Err(ApplyError::UnknownOperator(other)),
        }
    }
}

#[inline]
fn truncated(_: BufferError) -> ApplyError {
    ApplyError::Truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (BitBuffer, ScriptStats) {
        let mut buf = BitBuffer::new();
        let mut w = ScriptWriter::new(&mut buf);
        w.header(9);
        w.insert(b"abc");
        w.copy(6, 100);
        let stats = w.finish(0xDEAD_BEEF);
        (buf, stats)
    }

    #[test]
    fn fields_are_little_endian_with_ascii_tags() {
        let (buf, _) = sample();
        let mut expect = Vec::new();
        expect.extend_from_slice(&9u32.to_le_bytes());
        expect.push(b'\n');
        expect.extend_from_slice(&3u32.to_le_bytes());
        expect.extend_from_slice(b":abc");
        expect.extend_from_slice(&6u32.to_le_bytes());
        expect.push(b'@');
        expect.extend_from_slice(&100u32.to_le_bytes());
        expect.push(b',');
        expect.extend_from_slice(&0xDEAD_BEEFu32.to_le_bytes());
        expect.push(b';');
        assert_eq!(buf.as_bytes(), expect.as_slice());
    }

    #[test]
    fn writer_stats() {
        let (_, stats) = sample();
        assert_eq!(
            stats,
            ScriptStats {
                target_len: 9,
                copies: 1,
                inserts: 1,
                bytes_copied: 6,
                bytes_inserted: 3,
                checksum: 0xDEAD_BEEF,
            }
        );
    }

    #[test]
    fn reader_walks_ops() {
        let (mut buf, _) = sample();
        let mut r = ScriptReader::new(&mut buf).unwrap();
        assert_eq!(r.header().unwrap(), 9);

        let Op::Insert { len, payload } = r.next_op().unwrap() else {
            panic!("expected insert");
        };
        assert_eq!(len, 3);
        assert_eq!(&r.bytes()[payload], b"abc");

        assert_eq!(r.next_op().unwrap(), Op::Copy { len: 6, offset: 100 });
        assert_eq!(r.next_op().unwrap(), Op::Checksum(0xDEAD_BEEF));
        assert_eq!(r.remaining_bytes(), 0);
        assert_eq!(r.next_op(), Err(ApplyError::Unterminated));
    }

    #[test]
    fn writer_aligns_after_unaligned_prefix() {
        let mut buf = BitBuffer::new();
        buf.write_bits(0b101, 3);
        let mut w = ScriptWriter::new(&mut buf);
        w.header(0);
        w.finish(0);
        assert_eq!(buf.len_bytes(), 1 + 5 + 5);

        assert_eq!(buf.read_bits(3).unwrap(), 0b101);
        let mut r = ScriptReader::new(&mut buf).unwrap();
        assert_eq!(r.header().unwrap(), 0);
        assert_eq!(r.next_op().unwrap(), Op::Checksum(0));
    }

    #[test]
    fn bad_tags() {
        let mut bytes = 4u32.to_le_bytes().to_vec();
        bytes.push(b'!');
        let mut buf = BitBuffer::from_bytes(&bytes);
        let mut r = ScriptReader::new(&mut buf).unwrap();
        assert_eq!(r.header(), Err(ApplyError::MissingSizeTerminator));

        let mut bytes = 4u32.to_le_bytes().to_vec();
        bytes.push(b'?');
        let mut buf = BitBuffer::from_bytes(&bytes);
        let mut r = ScriptReader::new(&mut buf).unwrap();
        assert_eq!(r.next_op(), Err(ApplyError::UnknownOperator(b'?')));

        let mut bytes = 4u32.to_le_bytes().to_vec();
        bytes.push(b'@');
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.push(b';');
        let mut buf = BitBuffer::from_bytes(&bytes);
        let mut r = ScriptReader::new(&mut buf).unwrap();
        assert_eq!(r.next_op(), Err(ApplyError::UnterminatedCopy));
    }

    #[test]
    fn short_literal_is_truncated() {
        let mut bytes = 10u32.to_le_bytes().to_vec();
        bytes.extend_from_slice(b":abc");
        let mut buf = BitBuffer::from_bytes(&bytes);
        let mut r = ScriptReader::new(&mut buf).unwrap();
        assert_eq!(r.next_op(), Err(ApplyError::Truncated));

        let mut buf = BitBuffer::from_bytes(&[1, 0]);
        let mut r = ScriptReader::new(&mut buf).unwrap();
        assert_eq!(r.next_op(), Err(ApplyError::Truncated));
    }
}
