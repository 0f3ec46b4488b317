// Content-addressed binary deltas.
//
// This module provides:
// - `create*` / `DeltaEncoder`: build an edit script from (origin, target)
// - `apply*`: replay an edit script against its origin
// - `output_size` / `analyze` / `ops`: inspect a script without an origin
// - Batch helpers (parallel with the `parallel` feature)

pub mod batch;
pub mod checksum;
pub mod decoder;
pub mod encoder;
pub mod script;

pub use batch::{apply_batch, create_batch};
pub use checksum::checksum;
pub use decoder::{ApplyError, analyze, apply, apply_from, apply_with_config, ops, output_size};
pub use encoder::{DeltaEncoder, create, create_with_config};
pub use script::{Op, ScriptStats};
