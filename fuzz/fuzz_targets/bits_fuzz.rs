#![no_main]
use bitdelta::bits::{BitBuffer, PackedI32, PackedU16, PackedU32};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Decoding arbitrary bytes must fail cleanly, never panic.
    let mut buf = BitBuffer::from_bytes(data);
    while buf.remaining_bits() > 0 {
        let ok = match buf.read_position() % 3 {
            0 => buf.read::<PackedU32>().is_ok(),
            1 => buf.read::<PackedI32>().is_ok(),
            _ => buf.read::<PackedU16>().is_ok(),
        };
        if !ok {
            break;
        }
    }

    // Re-encoding the input as packed words must round-trip.
    let words: Vec<u32> = data
        .chunks(4)
        .map(|c| {
            let mut w = [0u8; 4];
            w[..c.len()].copy_from_slice(c);
            u32::from_le_bytes(w)
        })
        .collect();
    let mut out = BitBuffer::new();
    for &w in &words {
        out.write(&PackedU32(w));
        out.write(&PackedI32(w as i32));
        out.write(&PackedU16(w as u16));
    }
    for &w in &words {
        assert_eq!(out.read::<PackedU32>().unwrap().0, w);
        assert_eq!(out.read::<PackedI32>().unwrap().0, w as i32);
        assert_eq!(out.read::<PackedU16>().unwrap().0, w as u16);
    }
});
