// Batch helpers over many independent (origin, target/script) pairs.
//
// With the `parallel` feature each rayon worker owns its own encoder; the
// sequential path reuses one encoder for the whole batch.  Results are in
// input order and identical either way.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::hash::DeltaConfig;

use super::decoder::{ApplyError, apply_with_config};
use super::encoder::DeltaEncoder;

/// Create one script per `(origin, target)` pair.
pub fn create_batch(pairs: &[(&[u8], &[u8])], config: &DeltaConfig) -> Vec<Vec<u8>> {
    #[cfg(feature = "parallel")]
    {
        pairs
            .par_iter()
            .map_init(
                || DeltaEncoder::with_config(*config),
                |enc, (origin, target)| enc.create(origin, target),
            )
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        let mut enc = DeltaEncoder::with_config(*config);
        pairs
            .iter()
            .map(|(origin, target)| enc.create(origin, target))
            .collect()
    }
}

/// Apply one script per `(origin, script)` pair.  Each result is
/// independent; one rejected script does not affect the others.
pub fn apply_batch(
    pairs: &[(&[u8], &[u8])],
    config: &DeltaConfig,
) -> Vec<Result<Vec<u8>, ApplyError>> {
    #[cfg(feature = "parallel")]
    let iter = pairs.par_iter();
    #[cfg(not(feature = "parallel"))]
    let iter = pairs.iter();

    iter.map(|(origin, script)| apply_with_config(origin, script, config))
        .collect()
}
