#![no_main]
use bitdelta::delta;
use bitdelta::hash::config;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    // Use first byte as control: low nibble is the level, the rest selects the split.
    let flags = data[0];
    let payload = &data[1..];
    let level = u32::from(flags & 0x0F).min(9);
    let split = payload.len() * usize::from(flags >> 4) / 16;
    let (origin, target) = payload.split_at(split);

    let cfg = config::config_for_level(level);
    let script = delta::create_with_config(origin, target, &cfg);
    let out = delta::apply(origin, &script).unwrap();
    assert_eq!(out, target);

    let stats = delta::analyze(&script).unwrap();
    assert_eq!(stats.bytes_copied + stats.bytes_inserted, target.len() as u64);
});
