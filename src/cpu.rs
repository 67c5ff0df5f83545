use std::fmt;
use std::ops::BitOr;
use std::sync::OnceLock;

/// Host acceleration features as a bitmask. `BASELINE` is always present;
/// the optional bits are set only when the corresponding hardware feature is
/// detected at runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CpuFeatures(u32);

impl CpuFeatures {
    /// Portable scalar execution; always available.
    pub const BASELINE: CpuFeatures = CpuFeatures(1 << 0);
    /// x86-64 128-bit integer SIMD.
    pub const SSE2: CpuFeatures = CpuFeatures(1 << 1);
    /// x86-64 256-bit integer SIMD.
    pub const AVX2: CpuFeatures = CpuFeatures(1 << 2);
    /// aarch64 128-bit SIMD.
    pub const NEON: CpuFeatures = CpuFeatures(1 << 3);

    pub const fn empty() -> CpuFeatures {
        CpuFeatures(0)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: CpuFeatures) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: CpuFeatures) {
        self.0 |= other.0;
    }
}

impl BitOr for CpuFeatures {
    type Output = CpuFeatures;

    fn bitor(self, rhs: CpuFeatures) -> CpuFeatures {
        CpuFeatures(self.0 | rhs.0)
    }
}

impl fmt::Display for CpuFeatures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(CpuFeatures, &str); 4] = [
            (CpuFeatures::BASELINE, "baseline"),
            (CpuFeatures::SSE2, "sse2"),
            (CpuFeatures::AVX2, "avx2"),
            (CpuFeatures::NEON, "neon"),
        ];
        let mut first = true;
        for (bit, name) in NAMES {
            if self.contains(bit) {
                if !first {
                    f.write_str("+")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        if first {
            f.write_str("none")?;
        }
        Ok(())
    }
}

static PROBE: OnceLock<CpuFeatures> = OnceLock::new();

/// Detect host acceleration features, once per process. Later calls return
/// the cached set; concurrent first calls race only on who fills the cache.
pub fn probe() -> CpuFeatures {
    *PROBE.get_or_init(detect)
}

fn detect() -> CpuFeatures {
    let mut features = CpuFeatures::BASELINE;

    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("sse2") {
            features.insert(CpuFeatures::SSE2);
        }
        if is_x86_feature_detected!("avx2") {
            features.insert(CpuFeatures::AVX2);
        }
    }

    // NEON is part of the aarch64 base profile.
    #[cfg(target_arch = "aarch64")]
    features.insert(CpuFeatures::NEON);

    features
}
