//! Compute-engine and datapath constants.
//!
//! Kernel-working-group (KWG) limits, kernel-count alignment rules, and the
//! micro-thread valid set. The KWG errata table encodes documented corner
//! cases where the hardware cannot sustain the nominal group size; these are
//! exceptions recorded per generation, not derivable from the datapath width.

use crate::generation::Generation;

/// Default number of parallel compute engines.
pub const DEFAULT_ENGINE_COUNT: u32 = 8;

/// Micro-thread count is stored in a 4-bit descriptor field.
pub const UTHREAD_MAX: u8 = 15;

/// Micro-thread counts the sequencer accepts.
///
/// Only power-of-two splits are implemented in the iteration hardware.
pub const UTHREAD_VALID: &[u8] = &[1, 2, 4, 8];

/// Datapath width in bytes (MAC array input lane width).
pub const DATAPATH_WIDTH_BYTES: u32 = 64;

/// Maximum kernel-working-group size for a generation.
#[must_use]
pub const fn kwg_max(generation: Generation) -> u32 {
    match generation {
        Generation::Gna0_9 | Generation::Gna1_0 => 8,
        Generation::Gna2_0 => 12,
        Generation::Gna3_0 | Generation::Gna3_5 => 16,
    }
}

/// KWG errata: reduced group maxima for specific weight/activation width
/// pairs, as documented in the per-generation errata sheets.
///
/// Entries are `(generation, weight_bytes, activation_bytes, reduced_max)`.
/// The reductions encode hardware bugs in the unaligned fetch path; they are
/// looked up, never computed.
pub const KWG_ERRATA: &[(Generation, u32, u32, u32)] = &[
    // 3.0: 1-byte weights with 2-byte activations trip the unaligned
    // weight-row fetch; group size capped at 12.
    (Generation::Gna3_0, 1, 2, 12),
    // 3.0: 2-byte weights with 1-byte activations cap at 14.
    (Generation::Gna3_0, 2, 1, 14),
    // 3.5 inherits the first erratum only.
    (Generation::Gna3_5, 1, 2, 12),
];

/// Effective KWG maximum after applying the errata table.
#[must_use]
pub fn kwg_max_effective(generation: Generation, weight_bytes: u32, activation_bytes: u32) -> u32 {
    let nominal = kwg_max(generation);
    KWG_ERRATA
        .iter()
        .find(|&&(g, w, a, _)| g == generation && w == weight_bytes && a == activation_bytes)
        .map_or(nominal, |&(_, _, _, reduced)| reduced.min(nominal))
}

/// Required kernel-count alignment for a given activation width in bytes.
///
/// 1-byte activations feed four MAC lanes per engine pass, 2-byte feed two;
/// anything wider runs one kernel per pass.
#[must_use]
pub const fn kernel_alignment(activation_bytes: u32) -> u32 {
    match activation_bytes {
        1 => 4,
        2 => 2,
        _ => 1,
    }
}

/// Largest pooling window extent the pooling datapath accepts, per axis.
pub const POOL_WINDOW_MAX: u32 = 6;

/// Largest zero-padding accepted on either edge of a 2-D convolution.
///
/// One less than the largest kernel extent; rows beyond that can never be
/// covered by any kernel position.
pub const CONV_PAD_MAX: u32 = 254;

/// MAC accumulator width in bytes for a given activation width.
///
/// 2-byte activations accumulate into the wide 8-byte path (MAC8B); all
/// narrower activations use the 4-byte path (MAC4B). This is also the
/// element width of the convolution *output*, which is what the pooling
/// memory is sized in.
#[must_use]
pub const fn mac_accumulator_bytes(activation_bytes: u32) -> u32 {
    if activation_bytes == 2 {
        8
    } else {
        4
    }
}

/// PMEM pad errata: pooling-window widths that require one extra
/// accumulator element per row, per generation.
///
/// The pooling writeback engine over-fetches one element when the window
/// width is odd and greater than one; documented for both 3.x steppings.
pub const PMEM_PAD_ERRATA: &[(Generation, u32)] = &[
    (Generation::Gna3_0, 3),
    (Generation::Gna3_0, 5),
    (Generation::Gna3_5, 3),
    (Generation::Gna3_5, 5),
];

/// Extra PMEM elements required for a pooling window width, from the errata
/// table. Zero for configurations the writeback engine handles exactly.
#[must_use]
pub fn pmem_pad_elements(generation: Generation, pool_window_w: u32) -> u64 {
    u64::from(
        PMEM_PAD_ERRATA
            .iter()
            .any(|&(g, w)| g == generation && w == pool_window_w),
    )
}

/// Default unified-memory size in KiB for a generation.
#[must_use]
pub const fn default_umem_kb(generation: Generation) -> u32 {
    match generation {
        Generation::Gna0_9 | Generation::Gna1_0 => 16,
        Generation::Gna2_0 => 32,
        Generation::Gna3_0 | Generation::Gna3_5 => 64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kwg_max_grows_with_generation() {
        let maxima: Vec<u32> = Generation::ALL.iter().map(|&g| kwg_max(g)).collect();
        for pair in maxima.windows(2) {
            assert!(pair[0] <= pair[1]);
        }
    }

    #[test]
    fn errata_only_ever_reduce() {
        for &(gen, w, a, _) in KWG_ERRATA {
            assert!(kwg_max_effective(gen, w, a) <= kwg_max(gen));
        }
        // The documented 3.0 corner case.
        assert_eq!(kwg_max_effective(Generation::Gna3_0, 1, 2), 12);
        // Non-errata pairs keep the nominal maximum.
        assert_eq!(kwg_max_effective(Generation::Gna3_0, 1, 1), 16);
    }

    #[test]
    fn alignment_by_activation_width() {
        assert_eq!(kernel_alignment(1), 4);
        assert_eq!(kernel_alignment(2), 2);
        assert_eq!(kernel_alignment(4), 1);
    }

    #[test]
    fn accumulator_width_by_activation() {
        assert_eq!(mac_accumulator_bytes(1), 4);
        assert_eq!(mac_accumulator_bytes(2), 8);
        assert_eq!(mac_accumulator_bytes(4), 4);
    }

    #[test]
    fn pmem_pad_only_for_listed_windows() {
        assert_eq!(pmem_pad_elements(Generation::Gna3_0, 3), 1);
        assert_eq!(pmem_pad_elements(Generation::Gna3_0, 2), 0);
        assert_eq!(pmem_pad_elements(Generation::Gna2_0, 3), 0);
    }

    #[test]
    fn uthread_set_fits_descriptor_field() {
        for &t in UTHREAD_VALID {
            assert!(t <= UTHREAD_MAX);
        }
    }
}
