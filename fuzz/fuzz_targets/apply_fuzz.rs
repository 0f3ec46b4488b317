#![no_main]
use bitdelta::bits::BitBuffer;
use bitdelta::delta;
use bitdelta::hash::DeltaConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    // First byte picks how much of the input serves as origin.
    let split = (data[0] as usize).min(data.len() - 1);
    let origin = &data[1..1 + split];
    let script = &data[1 + split..];

    // Must never panic, regardless of input.
    let _ = delta::output_size(script);
    let _ = delta::analyze(script);
    if let Ok(out) = delta::apply(origin, script) {
        assert_eq!(delta::output_size(script).unwrap() as usize, out.len());
    }

    let lenient = DeltaConfig::default().with_verify_checksum(false);
    let mut buf = BitBuffer::from_bytes(script);
    let _ = delta::apply_from(origin, &mut buf, &lenient);
});
