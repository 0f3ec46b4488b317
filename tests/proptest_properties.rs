use bitdelta::bits::packed::{self, packed_i32_bits, packed_u16_bits, packed_u32_bits};
use bitdelta::bits::{BitBuffer, PackedI32, PackedU16, PackedU32};
use bitdelta::delta;
use bitdelta::hash::config;
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_packed_u32_roundtrip(v in any::<u32>()) {
        let mut buf = BitBuffer::new();
        buf.write(&PackedU32(v));
        prop_assert_eq!(buf.len_bits() as u32, packed_u32_bits(v));
        prop_assert_eq!(buf.read::<PackedU32>().unwrap().0, v);
        prop_assert_eq!(buf.remaining_bits(), 0);
    }

    #[test]
    fn prop_packed_i32_roundtrip(v in any::<i32>()) {
        let mut buf = BitBuffer::new();
        buf.write(&PackedI32(v));
        prop_assert_eq!(buf.len_bits() as u32, packed_i32_bits(v));
        prop_assert_eq!(buf.read::<PackedI32>().unwrap().0, v);
    }

    #[test]
    fn prop_packed_u16_roundtrip(v in any::<u16>()) {
        let mut buf = BitBuffer::new();
        buf.write(&PackedU16(v));
        prop_assert_eq!(buf.len_bits() as u32, packed_u16_bits(v));
        prop_assert_eq!(buf.read::<PackedU16>().unwrap().0, v);
    }

    #[test]
    fn prop_small_magnitudes_stay_small(v in -128i32..128) {
        // Zigzag keeps |v| < 128 within one byte of payload.
        prop_assert_eq!(packed_i32_bits(v), 10);
        prop_assert_eq!(packed::zigzag_decode(packed::zigzag_encode(v)), v);
    }

    #[test]
    fn prop_mixed_width_fields_roundtrip(
        fields in proptest::collection::vec((any::<u64>(), 1u32..=64), 0..64)
    ) {
        let mut buf = BitBuffer::new();
        for &(v, w) in &fields {
            buf.write_bits(v, w);
        }
        let total: u32 = fields.iter().map(|&(_, w)| w).sum();
        prop_assert_eq!(buf.len_bits() as u32, total);

        for &(v, w) in &fields {
            let mask = if w == 64 { u64::MAX } else { (1u64 << w) - 1 };
            prop_assert_eq!(buf.read_bits(w).unwrap(), v & mask);
        }
        prop_assert!(buf.read_bits(1).is_err());
    }

    #[test]
    fn prop_unaligned_bytes_roundtrip(
        prefix in 1u32..8,
        bytes in proptest::collection::vec(any::<u8>(), 0..256)
    ) {
        let mut buf = BitBuffer::new();
        buf.write_bits(0, prefix);
        buf.write_bytes(&bytes);
        buf.read_bits(prefix).unwrap();
        prop_assert_eq!(buf.read_bytes(bytes.len()).unwrap(), bytes);
    }

    #[test]
    fn prop_delta_roundtrip(
        origin in proptest::collection::vec(any::<u8>(), 0..4096),
        target in proptest::collection::vec(any::<u8>(), 0..4096),
        level in 0u32..=9u32
    ) {
        let cfg = config::config_for_level(level);
        let script = delta::create_with_config(&origin, &target, &cfg);
        prop_assert_eq!(delta::apply(&origin, &script).unwrap(), target);
    }

    #[test]
    fn prop_edited_copy_roundtrip_and_accounting(
        origin in proptest::collection::vec(any::<u8>(), 64..8192),
        edits in proptest::collection::vec((any::<prop::sample::Index>(), any::<u8>()), 0..16)
    ) {
        let mut target = origin.clone();
        for (idx, b) in &edits {
            let i = idx.index(target.len());
            target[i] = *b;
        }
        let script = delta::create(&origin, &target);
        prop_assert_eq!(delta::apply(&origin, &script).unwrap(), target.clone());

        let stats = delta::analyze(&script).unwrap();
        prop_assert_eq!(stats.bytes_copied + stats.bytes_inserted, target.len() as u64);
        prop_assert_eq!(script.clone(), delta::create(&origin, &target));
    }

    #[test]
    fn prop_identical_data_is_highly_compressible(
        origin in proptest::collection::vec(any::<u8>(), 32..8192)
    ) {
        let script = delta::create(&origin, &origin);
        // One copy plus header and checksum.
        prop_assert_eq!(script.len(), 5 + 10 + 5);
    }

    #[test]
    fn prop_arbitrary_scripts_never_panic(
        origin in proptest::collection::vec(any::<u8>(), 0..256),
        script in proptest::collection::vec(any::<u8>(), 0..256)
    ) {
        let _ = delta::apply(&origin, &script);
        let _ = delta::analyze(&script);
        let _ = delta::output_size(&script);
    }
}

#[test]
fn packed_u32_five_is_prefix_then_one_byte() {
    let mut buf = BitBuffer::new();
    buf.write(&PackedU32(5));
    assert_eq!(buf.len_bits(), 10);

    buf.reset_read();
    assert_eq!(buf.read_bits(2).unwrap(), 0b00);
    assert_eq!(buf.read_bits(8).unwrap(), 0b0000_0101);

    buf.reset_read();
    assert_eq!(buf.read::<PackedU32>().unwrap(), PackedU32(5));
}

#[test]
fn packed_extremes() {
    let mut buf = BitBuffer::new();
    for v in [0, 1, u32::MAX, u32::MAX / 2, 1 << 24, (1 << 24) - 1] {
        buf.write(&PackedU32(v));
    }
    for v in [0, -1, i32::MIN, i32::MAX] {
        buf.write(&PackedI32(v));
    }
    for v in [0, 1, u16::MAX, 0x3FFF, 0x4000] {
        buf.write(&PackedU16(v));
    }

    for v in [0, 1, u32::MAX, u32::MAX / 2, 1 << 24, (1 << 24) - 1] {
        assert_eq!(buf.read::<PackedU32>().unwrap().0, v);
    }
    for v in [0, -1, i32::MIN, i32::MAX] {
        assert_eq!(buf.read::<PackedI32>().unwrap().0, v);
    }
    for v in [0, 1, u16::MAX, 0x3FFF, 0x4000] {
        assert_eq!(buf.read::<PackedU16>().unwrap().0, v);
    }
    assert_eq!(buf.remaining_bits(), 0);
}
