// Rolling hash over an NHASH-byte window.
//
// Adler-style pair of 16-bit sums:
//   a = sum of the window bytes
//   b = sum of the running values of `a` (position-weighted sum)
// combined as `(b << 16) | a`.  Sliding the window by one byte is O(1):
//   a' = a - out + in
//   b' = b - NHASH * out + a'
//
// The arithmetic wraps at 16 bits on purpose; bucket selection depends on
// the exact value, so scripts are only reproducible if this stays bit-exact.

use super::config::NHASH;

/// Sliding-window hash state.
///
/// Holds a copy of the current window so `next` only needs the incoming byte.
#[derive(Debug, Clone)]
pub struct RollingHash {
    a: u16,
    b: u16,
    /// Index in `window` of the byte that leaves on the next slide.
    i: usize,
    window: [u8; NHASH],
}

impl RollingHash {
    /// Hash `data[offset .. offset + NHASH]`.
    ///
    /// # Panics
    /// If fewer than `NHASH` bytes are available at `offset`.
    pub fn init(data: &[u8], offset: usize) -> Self {
        let mut window = [0u8; NHASH];
        window.copy_from_slice(&data[offset..offset + NHASH]);

        let mut a = u16::from(window[0]);
        let mut b = a;
        for &byte in &window[1..] {
            a = a.wrapping_add(u16::from(byte));
            b = b.wrapping_add(a);
        }

        Self { a, b, i: 0, window }
    }

    /// Slide the window forward by one byte, appending `incoming`.
    #[inline]
    pub fn next(&mut self, incoming: u8) {
        let old = u16::from(self.window[self.i]);
        self.window[self.i] = incoming;
        self.i = (self.i + 1) % NHASH;
        self.a = self.a.wrapping_sub(old).wrapping_add(u16::from(incoming));
        self.b = self
            .b
            .wrapping_sub((NHASH as u16).wrapping_mul(old))
            .wrapping_add(self.a);
    }

    /// Combined 32-bit hash of the current window.
    #[inline]
    pub fn value(&self) -> u32 {
        u32::from(self.a) | (u32::from(self.b) << 16)
    }
}

/// Hash of a single block without keeping rolling state.
#[inline]
pub fn hash_once(block: &[u8]) -> u32 {
    RollingHash::init(block, 0).value()
}
