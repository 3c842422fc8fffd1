//! Hardware configuration.
//!
//! The configuration is an explicit object passed by reference into
//! [`crate::compile`]; there is no process-wide singleton. Set it up once
//! before compiling and do not mutate it while descriptors derived from it
//! are in use; that precondition is documented, not enforced.

use gna_hw::{engine, Generation};

/// Micro-architecture feature toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Features {
    /// 2-D pooling stage present (3.0+ datapath).
    pub pooling_2d: bool,
    /// Single-row convolution buffer fast path enabled.
    pub cmem_fast_path: bool,
    /// Pooling-pack mode: accumulators interleaved across banks.
    pub pmem_pack: bool,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            pooling_2d: true,
            cmem_fast_path: true,
            pmem_pack: false,
        }
    }
}

/// Device configuration consumed by validation and compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HwConfig {
    generation: Generation,
    engine_count: u32,
    umem_size_kb: u32,
    device_present: bool,
    features: Features,
}

impl HwConfig {
    /// Configuration with the silicon defaults for a generation.
    ///
    /// The device is assumed absent until [`Self::with_device_present`]
    /// says otherwise; compilation in that state still succeeds but marks
    /// descriptors invalid for hardware dispatch.
    #[must_use]
    pub fn new(generation: Generation) -> Self {
        Self {
            generation,
            engine_count: engine::DEFAULT_ENGINE_COUNT,
            umem_size_kb: engine::default_umem_kb(generation),
            device_present: false,
            features: Features::default(),
        }
    }

    /// Override the compute-engine count.
    #[must_use]
    pub const fn with_engine_count(mut self, engines: u32) -> Self {
        self.engine_count = engines;
        self
    }

    /// Override the unified-memory size in KiB.
    #[must_use]
    pub const fn with_umem_size_kb(mut self, kb: u32) -> Self {
        self.umem_size_kb = kb;
        self
    }

    /// Record whether a physical device is present in this process.
    #[must_use]
    pub const fn with_device_present(mut self, present: bool) -> Self {
        self.device_present = present;
        self
    }

    /// Override the feature toggles.
    #[must_use]
    pub const fn with_features(mut self, features: Features) -> Self {
        self.features = features;
        self
    }

    /// Hardware generation compilation targets.
    #[must_use]
    pub const fn generation(&self) -> Generation {
        self.generation
    }

    /// Number of parallel compute engines.
    #[must_use]
    pub const fn engine_count(&self) -> u32 {
        self.engine_count
    }

    /// Unified-memory size in KiB.
    #[must_use]
    pub const fn umem_size_kb(&self) -> u32 {
        self.umem_size_kb
    }

    /// Unified-memory size in bytes.
    #[must_use]
    pub const fn umem_bytes(&self) -> u64 {
        self.umem_size_kb as u64 * 1024
    }

    /// True when a physical device is present.
    #[must_use]
    pub const fn device_present(&self) -> bool {
        self.device_present
    }

    /// Feature toggles.
    #[must_use]
    pub const fn features(&self) -> &Features {
        &self.features
    }
}

impl Default for HwConfig {
    fn default() -> Self {
        Self::new(Generation::Gna3_0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_generation() {
        let cfg = HwConfig::new(Generation::Gna3_0);
        assert_eq!(cfg.umem_size_kb(), 64);
        assert_eq!(cfg.engine_count(), 8);
        assert!(!cfg.device_present());

        let old = HwConfig::new(Generation::Gna1_0);
        assert_eq!(old.umem_size_kb(), 16);
    }

    #[test]
    fn umem_bytes_scales_kb() {
        let cfg = HwConfig::default().with_umem_size_kb(8);
        assert_eq!(cfg.umem_bytes(), 8192);
    }
}
