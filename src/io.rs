// File-level helpers for creating and applying deltas.
//
// Provides `create_file()` and `apply_file()` which read their inputs fully
// into memory (scripts address the whole origin and target at once) and
// write results through a `BufWriter`.  Optionally computes SHA-256 digests
// (feature-gated behind `file-io`).

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

#[cfg(feature = "file-io")]
use sha2::Digest;
use thiserror::Error;

use crate::delta::{ApplyError, DeltaEncoder, apply_with_config};
use crate::hash::DeltaConfig;

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Statistics returned by `create_file()`.
#[derive(Debug, Clone)]
pub struct CreateStats {
    /// Origin file size in bytes.
    pub origin_size: u64,
    /// Target file size in bytes.
    pub target_size: u64,
    /// Script output size in bytes.
    pub script_size: u64,
    pub copies: u64,
    pub inserts: u64,
    pub bytes_copied: u64,
    pub bytes_inserted: u64,
    /// SHA-256 of the origin file (if `file-io` feature is enabled).
    pub origin_sha256: Option<[u8; 32]>,
    /// SHA-256 of the target file (if `file-io` feature is enabled).
    pub target_sha256: Option<[u8; 32]>,
}

/// Statistics returned by `apply_file()`.
#[derive(Debug, Clone)]
pub struct ApplyStats {
    /// Origin file size in bytes.
    pub origin_size: u64,
    /// Script file size in bytes.
    pub script_size: u64,
    /// Reconstructed output size in bytes.
    pub output_size: u64,
    /// SHA-256 of the reconstructed output (if `file-io` feature is enabled).
    pub output_sha256: Option<[u8; 32]>,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error type for file operations.
#[derive(Debug, Error)]
pub enum IoError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid delta script: {0}")]
    Apply(#[from] ApplyError),
    /// Scripts carry 32-bit lengths.
    #[error("{what} is {len} bytes; scripts are limited to {max} bytes", max = u32::MAX)]
    TooLarge { what: &'static str, len: u64 },
}

const BUF_SIZE: usize = 64 * 1024; // 64 KiB

fn check_len(what: &'static str, data: &[u8]) -> Result<u64, IoError> {
    let len = data.len() as u64;
    if len > u64::from(u32::MAX) {
        return Err(IoError::TooLarge { what, len });
    }
    Ok(len)
}

// ---------------------------------------------------------------------------
// create_file
// ---------------------------------------------------------------------------

/// Create a script turning `origin_path` into `target_path`, writing it to
/// `script_path`.
pub fn create_file(
    origin_path: &Path,
    target_path: &Path,
    script_path: &Path,
    config: &DeltaConfig,
) -> Result<CreateStats, IoError> {
    let origin = fs::read(origin_path)?;
    let target = fs::read(target_path)?;
    let origin_size = check_len("origin", &origin)?;
    let target_size = check_len("target", &target)?;

    let mut encoder = DeltaEncoder::with_config(*config);
    let mut buf = crate::bits::BitBuffer::with_capacity(target.len() / 4 + 64);
    let script = encoder.create_into(&origin, &target, &mut buf);

    let mut writer = BufWriter::with_capacity(BUF_SIZE, File::create(script_path)?);
    writer.write_all(buf.as_bytes())?;
    writer.flush()?;

    Ok(CreateStats {
        origin_size,
        target_size,
        script_size: buf.len_bytes() as u64,
        copies: script.copies,
        inserts: script.inserts,
        bytes_copied: script.bytes_copied,
        bytes_inserted: script.bytes_inserted,
        origin_sha256: sha256(&origin),
        target_sha256: sha256(&target),
    })
}

// ---------------------------------------------------------------------------
// apply_file
// ---------------------------------------------------------------------------

/// Apply the script at `script_path` to `origin_path`, writing the result to
/// `output_path`.
///
/// The output file is only created once the script has been fully validated.
pub fn apply_file(
    origin_path: &Path,
    script_path: &Path,
    output_path: &Path,
    config: &DeltaConfig,
) -> Result<ApplyStats, IoError> {
    let origin = fs::read(origin_path)?;
    let script = fs::read(script_path)?;

    let output = apply_with_config(&origin, &script, config)?;

    let output_file = File::create(output_path)?;
    let mut output_writer = BufWriter::with_capacity(BUF_SIZE, output_file);

    #[cfg(feature = "file-io")]
    let output_sha256 = {
        let mut hasher = sha2::Sha256::new();
        let mut hashing_writer = HashingWriter {
            inner: &mut output_writer,
            hasher: &mut hasher,
        };
        hashing_writer.write_all(&output)?;
        Some(hasher.finalize().into())
    };

    #[cfg(not(feature = "file-io"))]
    let output_sha256: Option<[u8; 32]> = {
        output_writer.write_all(&output)?;
        None
    };

    output_writer.flush()?;

    Ok(ApplyStats {
        origin_size: origin.len() as u64,
        script_size: script.len() as u64,
        output_size: output.len() as u64,
        output_sha256,
    })
}

// ---------------------------------------------------------------------------
// Digests (used with file-io feature)
// ---------------------------------------------------------------------------

#[cfg(feature = "file-io")]
fn sha256(data: &[u8]) -> Option<[u8; 32]> {
    Some(sha2::Sha256::digest(data).into())
}

#[cfg(not(feature = "file-io"))]
fn sha256(_data: &[u8]) -> Option<[u8; 32]> {
    None
}

#[cfg(feature = "file-io")]
struct HashingWriter<'a, W: Write> {
    inner: &'a mut W,
    hasher: &'a mut sha2::Sha256,
}

#[cfg(feature = "file-io")]
impl<W: Write> Write for HashingWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
