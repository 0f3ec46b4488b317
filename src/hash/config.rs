// Matcher tuning for delta creation.
//
// The probe limit and copy threshold have no derivation beyond benchmarks,
// so they are carried in a config value with named profiles rather than
// hard-coded in the matcher.

/// Width of the rolling-hash window and of each indexed origin block.
pub const NHASH: usize = 16;

/// Collision-chain candidates examined per scan position in the default profile.
///
/// Large enough to walk the whole chain of a uniform 16 KiB origin, so a
/// single edit in a run of identical bytes costs one copy on each side.
pub const DEFAULT_PROBE_LIMIT: usize = 1024;

/// Bytes needed to encode an insert header plus a copy command:
/// three 32-bit integers and three 1-byte tags.
pub const COPY_OVERHEAD: usize = 3 * 4 + 3;

/// Delta creation/application settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeltaConfig {
    /// Name for display purposes.
    pub name: &'static str,
    /// Maximum collision-chain candidates probed at each target position.
    pub probe_limit: usize,
    /// A copy is emitted only when the match is strictly longer than this.
    pub min_copy_len: usize,
    /// Verify the trailing checksum when applying a script.
    pub verify_checksum: bool,
}

impl Default for DeltaConfig {
    fn default() -> Self {
        DEFAULT
    }
}

impl DeltaConfig {
    /// Same profile with a different probe limit.
    pub const fn with_probe_limit(mut self, probe_limit: usize) -> Self {
        self.probe_limit = probe_limit;
        self
    }

    /// Same profile with checksum verification switched on or off.
    pub const fn with_verify_checksum(mut self, verify: bool) -> Self {
        self.verify_checksum = verify;
        self
    }
}

/// Levels map onto profiles:
///
/// - Levels 0-3: fast
/// - Levels 4-6: default
/// - Levels 7-9: thorough
pub fn config_for_level(level: u32) -> DeltaConfig {
    match level {
        0..=3 => FAST,
        4..=6 => DEFAULT,
        _ => THOROUGH,
    }
}

// ---------------------------------------------------------------------------
// Profiles
// ---------------------------------------------------------------------------

pub const FAST: DeltaConfig = DeltaConfig {
    name: "fast",
    probe_limit: 32,
    min_copy_len: COPY_OVERHEAD,
    verify_checksum: true,
};

pub const DEFAULT: DeltaConfig = DeltaConfig {
    name: "default",
    probe_limit: DEFAULT_PROBE_LIMIT,
    min_copy_len: COPY_OVERHEAD,
    verify_checksum: true,
};

pub const THOROUGH: DeltaConfig = DeltaConfig {
    name: "thorough",
    probe_limit: 4096,
    min_copy_len: COPY_OVERHEAD,
    verify_checksum: true,
};

/// All named profiles, fastest first.
pub const PROFILES: [DeltaConfig; 3] = [FAST, DEFAULT, THOROUGH];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_overhead_is_fifteen_bytes() {
        assert_eq!(COPY_OVERHEAD, 15);
        for p in PROFILES {
            assert_eq!(p.min_copy_len, COPY_OVERHEAD, "profile {}", p.name);
            assert!(p.verify_checksum, "profile {}", p.name);
        }
    }

    #[test]
    fn profiles_probe_more_as_they_slow_down() {
        assert!(FAST.probe_limit < DEFAULT.probe_limit);
        assert!(DEFAULT.probe_limit < THOROUGH.probe_limit);
        assert_eq!(DeltaConfig::default().probe_limit, DEFAULT_PROBE_LIMIT);
    }

    #[test]
    fn level_mapping() {
        assert_eq!(config_for_level(0).name, "fast");
        assert_eq!(config_for_level(3).name, "fast");
        assert_eq!(config_for_level(4).name, "default");
        assert_eq!(config_for_level(6).name, "default");
        assert_eq!(config_for_level(7).name, "thorough");
        assert_eq!(config_for_level(9).name, "thorough");
    }

    #[test]
    fn builders_override_single_fields() {
        let c = DEFAULT.with_probe_limit(7).with_verify_checksum(false);
        assert_eq!(c.probe_limit, 7);
        assert!(!c.verify_checksum);
        assert_eq!(c.min_copy_len, DEFAULT.min_copy_len);
    }
}
