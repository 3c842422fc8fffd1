//! Unified-memory region planning.
//!
//! The final gate before a descriptor is considered deployable: the three
//! gross region sizes must fit the configured unified-memory budget, byte
//! exact. A violating configuration is rejected outright, never truncated.

use crate::config::HwConfig;
use gna_model::{ErrorReason, ModelError, Result};

/// Byte-exact placement of the three regions within unified memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionPlan {
    /// Base offsets of KMEM, CMEM and PMEM.
    pub base_offsets: [u32; 3],
    /// Gross KMEM bytes.
    pub kmem_bytes: u32,
    /// Gross CMEM bytes.
    pub cmem_bytes: u32,
    /// Gross PMEM bytes.
    pub pmem_bytes: u32,
    /// Sum of the three regions.
    pub total_bytes: u32,
}

/// Place the three regions back to back and assert they fit the budget.
///
/// # Errors
///
/// Returns `MemoryBudgetExceeded` when the sum exceeds the configured
/// unified-memory size.
pub fn plan_regions(kmem: u64, cmem: u64, pmem: u64, cfg: &HwConfig) -> Result<RegionPlan> {
    let total = kmem + cmem + pmem;
    let budget = cfg.umem_bytes();
    if total > budget {
        return Err(ModelError::new(ErrorReason::MemoryBudgetExceeded {
            requested: total,
            budget,
        }));
    }
    let narrow = |bytes: u64| {
        u32::try_from(bytes).map_err(|_| {
            ModelError::new(ErrorReason::MemoryBudgetExceeded {
                requested: bytes,
                budget,
            })
        })
    };
    let kmem = narrow(kmem)?;
    let cmem = narrow(cmem)?;
    let pmem = narrow(pmem)?;
    Ok(RegionPlan {
        base_offsets: [0, kmem, kmem + cmem],
        kmem_bytes: kmem,
        cmem_bytes: cmem,
        pmem_bytes: pmem,
        total_bytes: kmem + cmem + pmem,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use gna_hw::Generation;

    #[test]
    fn regions_pack_back_to_back() {
        let cfg = HwConfig::new(Generation::Gna3_0);
        let plan = plan_regions(256, 48, 320, &cfg).unwrap();
        assert_eq!(plan.base_offsets, [0, 256, 304]);
        assert_eq!(plan.total_bytes, 624);
    }

    #[test]
    fn over_budget_is_rejected_not_truncated() {
        let cfg = HwConfig::new(Generation::Gna3_0).with_umem_size_kb(1);
        let err = plan_regions(1024, 512, 0, &cfg).unwrap_err();
        assert!(matches!(
            err.reason,
            ErrorReason::MemoryBudgetExceeded {
                requested: 1536,
                budget: 1024
            }
        ));
    }

    #[test]
    fn exact_fit_is_accepted() {
        let cfg = HwConfig::new(Generation::Gna3_0).with_umem_size_kb(1);
        assert!(plan_regions(512, 256, 256, &cfg).is_ok());
    }
}
