// Delta application: replay an edit script against its origin.
//
// The script is validated as it is replayed; any violation rejects the
// whole script and no partial output is returned.  Checks, in order of
// appearance:
//   - header: 32-bit size followed by '\n'
//   - copy:   ',' terminator, running total <= declared size,
//             offset + len <= origin length
//   - insert: running total <= declared size, literal fully present
//   - trailer: running total == declared size, checksum (if enabled),
//             no bytes after ';' (standalone scripts only)

use log::{debug, trace};
use thiserror::Error;

use crate::bits::BitBuffer;
use crate::hash::DeltaConfig;

use super::checksum::checksum;
use super::script::{Op, ScriptReader, ScriptStats};

/// Upper bound on the output reservation made from an untrusted header.
const MAX_PREALLOC: usize = 16 << 20;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Reasons a script is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    #[error("size header is not followed by a newline")]
    MissingSizeTerminator,
    #[error("unknown operator {0:#04x}")]
    UnknownOperator(u8),
    #[error("copy command is not terminated by ','")]
    UnterminatedCopy,
    #[error("copy of {len} bytes at offset {offset} exceeds origin length {origin_len}")]
    CopyOutOfRange {
        offset: u32,
        len: u32,
        origin_len: usize,
    },
    #[error("output of {total} bytes exceeds declared size {limit}")]
    SizeOverrun { limit: u32, total: u64 },
    #[error("output size {actual} does not match declared size {expected}")]
    SizeMismatch { expected: u32, actual: u64 },
    #[error("checksum mismatch: expected {expected:#010X}, got {actual:#010X}")]
    ChecksumMismatch { expected: u32, actual: u32 },
    #[error("script ends in the middle of a command")]
    Truncated,
    #[error("script is not terminated by a checksum")]
    Unterminated,
    #[error("{0} bytes of trailing data after the checksum")]
    TrailingData(usize),
}

// ---------------------------------------------------------------------------
// Apply
// ---------------------------------------------------------------------------

/// Rebuild the target from `origin` and a standalone `script`, verifying
/// the checksum.
pub fn apply(origin: &[u8], script: &[u8]) -> Result<Vec<u8>, ApplyError> {
    apply_with_config(origin, script, &DeltaConfig::default())
}

/// Like [`apply`], honouring `config.verify_checksum`.
pub fn apply_with_config(
    origin: &[u8],
    script: &[u8],
    config: &DeltaConfig,
) -> Result<Vec<u8>, ApplyError> {
    let mut buf = BitBuffer::from_bytes(script);
    let mut reader = ScriptReader::new(&mut buf)?;
    let out = replay(origin, &mut reader, config)?;

    let trailing = reader.remaining_bytes();
    if trailing != 0 {
        debug!("rejecting script: {trailing} bytes after checksum");
        return Err(ApplyError::TrailingData(trailing));
    }
    Ok(out)
}

/// Apply a script embedded in `buf` at its read cursor.
///
/// The read cursor is left just past the terminating ';', so further
/// fields may follow the script in the same buffer.
pub fn apply_from(
    origin: &[u8],
    buf: &mut BitBuffer,
    config: &DeltaConfig,
) -> Result<Vec<u8>, ApplyError> {
    let mut reader = ScriptReader::new(buf)?;
    replay(origin, &mut reader, config)
}

fn replay(
    origin: &[u8],
    reader: &mut ScriptReader<'_>,
    config: &DeltaConfig,
) -> Result<Vec<u8>, ApplyError> {
    let result = replay_inner(origin, reader, config);
    if let Err(ref e) = result {
        debug!("rejecting script: {e}");
    }
    result
}

fn replay_inner(
    origin: &[u8],
    reader: &mut ScriptReader<'_>,
    config: &DeltaConfig,
) -> Result<Vec<u8>, ApplyError> {
    let limit = reader.header()?;
    let mut out = Vec::with_capacity((limit as usize).min(MAX_PREALLOC));

    loop {
        match reader.next_op()? {
            Op::Copy { len, offset } => {
                check_total(out.len(), len, limit)?;
                let start = offset as usize;
                let end = start + len as usize;
                if end > origin.len() {
                    return Err(ApplyError::CopyOutOfRange {
                        offset,
                        len,
                        origin_len: origin.len(),
                    });
                }
                trace!("copy {len} @ {offset}");
                out.extend_from_slice(&origin[start..end]);
            }
            Op::Insert { len, payload } => {
                check_total(out.len(), len, limit)?;
                trace!("insert {len}");
                out.extend_from_slice(&reader.bytes()[payload]);
            }
            Op::Checksum(expected) => {
                if out.len() as u64 != u64::from(limit) {
                    return Err(ApplyError::SizeMismatch {
                        expected: limit,
                        actual: out.len() as u64,
                    });
                }
                if config.verify_checksum {
                    let actual = checksum(&out);
                    if actual != expected {
                        return Err(ApplyError::ChecksumMismatch { expected, actual });
                    }
                }
                return Ok(out);
            }
        }
    }
}

#[inline]
fn check_total(current: usize, len: u32, limit: u32) -> Result<(), ApplyError> {
    let total = current as u64 + u64::from(len);
    if total > u64::from(limit) {
        return Err(ApplyError::SizeOverrun { limit, total });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Inspection
// ---------------------------------------------------------------------------

/// Declared target length of `script`, read from its header alone.
pub fn output_size(script: &[u8]) -> Result<u32, ApplyError> {
    let mut buf = BitBuffer::from_bytes(script);
    ScriptReader::new(&mut buf)?.header()
}

/// Walk `script` without an origin and total its operations.
///
/// Validates everything [`apply`] can check without origin bytes: grammar,
/// size accounting and trailing data.  Copy ranges are not checked.
pub fn analyze(script: &[u8]) -> Result<ScriptStats, ApplyError> {
    let mut buf = BitBuffer::from_bytes(script);
    let mut reader = ScriptReader::new(&mut buf)?;
    let limit = reader.header()?;
    let mut stats = ScriptStats {
        target_len: limit,
        ..ScriptStats::default()
    };
    let mut total = 0usize;

    loop {
        let op = reader.next_op()?;
        match op {
            Op::Insert { len, .. } | Op::Copy { len, .. } => {
                check_total(total, len, limit)?;
                total += len as usize;
            }
            Op::Checksum(_) => {
                if total as u64 != u64::from(limit) {
                    return Err(ApplyError::SizeMismatch {
                        expected: limit,
                        actual: total as u64,
                    });
                }
                stats.record(&op);
                break;
            }
        }
        stats.record(&op);
    }

    let trailing = reader.remaining_bytes();
    if trailing != 0 {
        return Err(ApplyError::TrailingData(trailing));
    }
    Ok(stats)
}

/// Decode every operation of `script`, in order, without validating sizes.
///
/// Intended for display; use [`analyze`] or [`apply`] to validate.
pub fn ops(script: &[u8]) -> Result<(u32, Vec<Op>), ApplyError> {
    let mut buf = BitBuffer::from_bytes(script);
    let mut reader = ScriptReader::new(&mut buf)?;
    let limit = reader.header()?;
    let mut ops = Vec::new();
    loop {
        let op = reader.next_op()?;
        let last = matches!(op, Op::Checksum(_));
        ops.push(op);
        if last {
            return Ok((limit, ops));
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delta::script::ScriptWriter;

    fn script(build: impl FnOnce(&mut ScriptWriter<'_>), sum: u32) -> Vec<u8> {
        let mut buf = BitBuffer::new();
        let mut w = ScriptWriter::new(&mut buf);
        build(&mut w);
        w.finish(sum);
        buf.into_bytes()
    }

    const ORIGIN: &[u8] = b"0123456789abcdef";

    #[test]
    fn copy_and_insert() {
        let target = b"abcdXY0123";
        let s = script(
            |w| {
                w.header(10);
                w.copy(4, 10);
                w.insert(b"XY");
                w.copy(4, 0);
            },
            checksum(target),
        );
        assert_eq!(apply(ORIGIN, &s).unwrap(), target);
    }

    #[test]
    fn empty_script_body() {
        let s = script(|w| w.header(0), 0);
        assert_eq!(apply(ORIGIN, &s).unwrap(), b"");
        assert_eq!(apply(&[], &s).unwrap(), b"");
    }

    #[test]
    fn copy_past_origin_end() {
        let s = script(
            |w| {
                w.header(4);
                w.copy(4, 14);
            },
            0,
        );
        assert_eq!(
            apply(ORIGIN, &s),
            Err(ApplyError::CopyOutOfRange {
                offset: 14,
                len: 4,
                origin_len: 16
            })
        );
    }

    #[test]
    fn overrun_and_mismatch() {
        let s = script(
            |w| {
                w.header(3);
                w.insert(b"abcd");
            },
            0,
        );
        assert_eq!(
            apply(ORIGIN, &s),
            Err(ApplyError::SizeOverrun { limit: 3, total: 4 })
        );

        let s = script(
            |w| {
                w.header(5);
                w.insert(b"abcd");
            },
            checksum(b"abcd"),
        );
        assert_eq!(
            apply(ORIGIN, &s),
            Err(ApplyError::SizeMismatch {
                expected: 5,
                actual: 4
            })
        );
    }

    #[test]
    fn checksum_verification_is_configurable() {
        let s = script(
            |w| {
                w.header(2);
                w.insert(b"hi");
            },
            checksum(b"hi") ^ 1,
        );
        assert!(matches!(
            apply(ORIGIN, &s),
            Err(ApplyError::ChecksumMismatch { .. })
        ));
        let lenient = DeltaConfig::default().with_verify_checksum(false);
        assert_eq!(apply_with_config(ORIGIN, &s, &lenient).unwrap(), b"hi");
    }

    #[test]
    fn trailing_bytes_rejected_standalone_but_not_embedded() {
        let mut s = script(|w| w.header(0), 0);
        s.push(0x7F);
        assert_eq!(apply(ORIGIN, &s), Err(ApplyError::TrailingData(1)));

        let mut buf = BitBuffer::from_bytes(&s);
        let out = apply_from(ORIGIN, &mut buf, &DeltaConfig::default()).unwrap();
        assert!(out.is_empty());
        assert_eq!(buf.read_bits(8).unwrap(), 0x7F);
    }

    #[test]
    fn missing_terminator() {
        let mut s = script(
            |w| {
                w.header(2);
                w.insert(b"hi");
            },
            checksum(b"hi"),
        );
        s.truncate(s.len() - 5);
        assert_eq!(apply(ORIGIN, &s), Err(ApplyError::Unterminated));

        s.truncate(s.len() - 1);
        assert_eq!(apply(ORIGIN, &s), Err(ApplyError::Truncated));
        assert_eq!(apply(ORIGIN, &[]), Err(ApplyError::Truncated));
    }

    #[test]
    fn size_and_analysis() {
        let s = script(
            |w| {
                w.header(10);
                w.copy(4, 10);
                w.insert(b"XY");
                w.copy(4, 0);
            },
            7,
        );
        assert_eq!(output_size(&s).unwrap(), 10);

        let stats = analyze(&s).unwrap();
        assert_eq!(stats.target_len, 10);
        assert_eq!(stats.copies, 2);
        assert_eq!(stats.inserts, 1);
        assert_eq!(stats.bytes_copied, 8);
        assert_eq!(stats.bytes_inserted, 2);
        assert_eq!(stats.checksum, 7);

        let (limit, all) = ops(&s).unwrap();
        assert_eq!(limit, 10);
        assert_eq!(all.len(), 4);
        assert_eq!(all[3], Op::Checksum(7));
    }

    #[test]
    fn analysis_rejects_bad_totals() {
        let s = script(
            |w| {
                w.header(1);
                w.copy(2, 0);
            },
            0,
        );
        assert!(matches!(analyze(&s), Err(ApplyError::SizeOverrun { .. })));
    }
}
