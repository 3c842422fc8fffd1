//! Narrow-memory capacity table.
//!
//! The narrow memory is the smallest on-chip buffer: nominally 2 KiB, but the
//! usable capacity has been revised twice by fixed reservations tied to
//! hardware errata. The reserved amounts are **table entries, not a formula**:
//! each value comes from the errata sheet of the generation it applies to.
//!
//! ```text
//! pre-3.0:  2048 B                         (full SRAM usable)
//! 3.0:      2048 − 16 B                    (row-tag reservation)
//! 3.5:      2048 − 16 − 128 B              (row-tag + prefetch shadow)
//! ```

use crate::generation::Generation;

/// Nominal narrow-memory SRAM size in bytes.
pub const NOMINAL_BYTES: u32 = 2048;

/// Row-tag reservation introduced with GNA 3.0.
pub const ROW_TAG_RESERVED_BYTES: u32 = 16;

/// Prefetch-shadow reservation introduced with GNA 3.5.
pub const PREFETCH_RESERVED_BYTES: u32 = 128;

/// Usable narrow-memory capacity for a generation, in bytes.
///
/// This is the budget the kernel-working-group sizing must fit within.
#[must_use]
pub const fn capacity_bytes(generation: Generation) -> u32 {
    match generation {
        Generation::Gna0_9 | Generation::Gna1_0 | Generation::Gna2_0 => NOMINAL_BYTES,
        Generation::Gna3_0 => NOMINAL_BYTES - ROW_TAG_RESERVED_BYTES,
        Generation::Gna3_5 => NOMINAL_BYTES - ROW_TAG_RESERVED_BYTES - PREFETCH_RESERVED_BYTES,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_never_exceeds_nominal() {
        for &gen in Generation::ALL {
            assert!(capacity_bytes(gen) <= NOMINAL_BYTES);
        }
    }

    #[test]
    fn errata_reservations_accumulate() {
        assert_eq!(capacity_bytes(Generation::Gna2_0), 2048);
        assert_eq!(capacity_bytes(Generation::Gna3_0), 2032);
        assert_eq!(capacity_bytes(Generation::Gna3_5), 1904);
    }
}
