// Delta creation: greedy block matching against an indexed origin.
//
// The origin is cut into NHASH-byte blocks, each indexed by its rolling
// hash.  The target is scanned left to right with a rolling window; at each
// position the bucket's collision chain is probed (up to
// `config.probe_limit` candidates) and every candidate is extended forwards
// and backwards.  The longest extension that beats `config.min_copy_len`
// becomes a copy, preceded by an insert of any unmatched bytes before it.
//
// Output is fully determined by (origin, target, config).

use log::{debug, trace};

use crate::bits::BitBuffer;
use crate::hash::config::{DeltaConfig, NHASH};
use crate::hash::rolling::RollingHash;
use crate::hash::table::LandmarkTable;

use super::checksum::checksum;
use super::script::{ScriptStats, ScriptWriter};

/// Best copy candidate at one scan position.
#[derive(Debug, Clone, Copy, Default)]
struct Match {
    /// Total matched length (backward + forward).
    len: usize,
    /// Origin offset of the first matched byte.
    offset: usize,
    /// Target bytes between the scan base and the match start.
    literal: usize,
}

// ---------------------------------------------------------------------------
// Encoder
// ---------------------------------------------------------------------------

/// Reusable delta creator.
///
/// Keeps its landmark table between calls, so creating many scripts with
/// one encoder allocates only when an origin needs more blocks than any
/// before it.
#[derive(Debug, Clone, Default)]
pub struct DeltaEncoder {
    config: DeltaConfig,
    table: LandmarkTable,
}

impl DeltaEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: DeltaConfig) -> Self {
        Self {
            config,
            table: LandmarkTable::new(),
        }
    }

    pub fn config(&self) -> &DeltaConfig {
        &self.config
    }

    /// Create a standalone script turning `origin` into `target`.
    ///
    /// # Panics
    /// If either input is longer than `u32::MAX` bytes.
    pub fn create(&mut self, origin: &[u8], target: &[u8]) -> Vec<u8> {
        let mut buf = BitBuffer::with_capacity(target.len() / 4 + 64);
        self.create_into(origin, target, &mut buf);
        buf.into_bytes()
    }

    /// Append a script to `buf`, starting at its next byte boundary.
    ///
    /// # Panics
    /// If either input is longer than `u32::MAX` bytes.
    pub fn create_into(
        &mut self,
        origin: &[u8],
        target: &[u8],
        buf: &mut BitBuffer,
    ) -> ScriptStats {
        let target_len = wire_len(target.len(), "target");
        wire_len(origin.len(), "origin");

        let mut w = ScriptWriter::new(buf);
        w.header(target_len);

        if origin.len() <= NHASH {
            // No block of the origin can be indexed.
            w.insert(target);
        } else {
            self.index(origin);
            self.scan(origin, target, &mut w);
        }

        let stats = w.finish(checksum(target));
        debug!(
            "created delta: origin {} bytes, target {} bytes, {} copies ({} bytes), {} inserts ({} bytes)",
            origin.len(),
            target.len(),
            stats.copies,
            stats.bytes_copied,
            stats.inserts,
            stats.bytes_inserted
        );
        stats
    }

    /// Index every full block of `origin`.
    fn index(&mut self, origin: &[u8]) {
        let n_blocks = origin.len() / NHASH;
        self.table.reset(n_blocks);
        for block in 0..n_blocks {
            let h = RollingHash::init(origin, block * NHASH);
            self.table.insert(h.value(), block);
        }
    }

    fn scan(&self, origin: &[u8], target: &[u8], w: &mut ScriptWriter<'_>) {
        let mut base = 0usize;

        while base + NHASH < target.len() {
            let mut h = RollingHash::init(target, base);
            let mut i = 0usize;

            loop {
                if let Some(m) = self.best_match(origin, target, base, i, h.value()) {
                    if m.literal > 0 {
                        trace!("insert {} at {}", m.literal, base);
                        w.insert(&target[base..base + m.literal]);
                    }
                    trace!("copy {} from {} at {}", m.len, m.offset, base + m.literal);
                    w.copy(m.len as u32, m.offset as u32);
                    base += m.literal + m.len;
                    break;
                }

                if base + i + NHASH >= target.len() {
                    // Window reached the end without a match.
                    trace!("insert {} at {} (tail)", target.len() - base, base);
                    w.insert(&target[base..]);
                    base = target.len();
                    break;
                }

                h.next(target[base + i + NHASH]);
                i += 1;
            }
        }

        if base < target.len() {
            trace!("insert {} at {} (tail)", target.len() - base, base);
            w.insert(&target[base..]);
        }
    }

    /// Probe the chain for the window at `target[base + i..]`.
    ///
    /// Returns the longest extension strictly longer than the copy
    /// threshold; the first one found wins ties.
    fn best_match(
        &self,
        origin: &[u8],
        target: &[u8],
        base: usize,
        i: usize,
        hash: u32,
    ) -> Option<Match> {
        let pos = base + i;
        let mut best: Option<Match> = None;

        for block in self.table.chain(hash).take(self.config.probe_limit) {
            let src = block * NHASH;

            let forward = origin[src..]
                .iter()
                .zip(&target[pos..])
                .take_while(|(a, b)| a == b)
                .count();

            // Backwards, never past the scan base or the origin start.
            let back_limit = i.min(src);
            let backward = (1..=back_limit)
                .take_while(|&k| origin[src - k] == target[pos - k])
                .count();

            let len = forward + backward;
            if len > self.config.min_copy_len && len > best.map_or(0, |m| m.len) {
                best = Some(Match {
                    len,
                    offset: src - backward,
                    literal: i - backward,
                });
            }
        }

        best
    }
}

/// Length of `what` as a 32-bit wire field.
fn wire_len(len: usize, what: &str) -> u32 {
    match u32::try_from(len) {
        Ok(n) => n,
        Err(_) => panic!("{what} of {len} bytes exceeds the 32-bit script limit"),
    }
}

// ---------------------------------------------------------------------------
// One-shot helpers
// ---------------------------------------------------------------------------

/// Create a script with the default profile.
pub fn create(origin: &[u8], target: &[u8]) -> Vec<u8> {
    DeltaEncoder::new().create(origin, target)
}

/// Create a script with an explicit profile.
pub fn create_with_config(origin: &[u8], target: &[u8], config: &DeltaConfig) -> Vec<u8> {
    DeltaEncoder::with_config(*config).create(origin, target)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
