// Four-lane additive checksum over the full target.
//
// Bytes are summed into four lanes by position mod 4; the lanes are then
// folded so lane 0 lands in the top byte and lane 3 in the bottom.  A tail
// of 1-3 bytes is added as a big-endian partial word.  Not a cryptographic
// hash: it only catches accidental corruption.

/// 32-bit checksum of `data`.
pub fn checksum(data: &[u8]) -> u32 {
    let mut sum = [0u32; 4];

    let mut words = data.chunks_exact(4);
    for w in &mut words {
        for (lane, &byte) in sum.iter_mut().zip(w) {
            *lane = lane.wrapping_add(u32::from(byte));
        }
    }

    let mut total = sum[3]
        .wrapping_add(sum[2] << 8)
        .wrapping_add(sum[1] << 16)
        .wrapping_add(sum[0] << 24);

    for (i, &byte) in words.remainder().iter().enumerate() {
        total = total.wrapping_add(u32::from(byte) << (24 - 8 * i));
    }
    total
}
