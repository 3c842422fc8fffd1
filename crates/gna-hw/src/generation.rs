//! Hardware generation identifiers.
//!
//! Generations are totally ordered. Capability tables are keyed by the
//! generation that introduced an entry; later generations inherit it unless
//! they register an override ("nearest preceding generation wins").

/// GNA hardware generation.
///
/// The discriminants encode the ordering used for capability inheritance;
/// they are not register values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Generation {
    /// GNA 0.9, the affine-only embedded part.
    Gna0_9,
    /// GNA 1.0: adds the 1-D convolution datapath.
    Gna1_0,
    /// GNA 2.0: adds de-interleave and wider affine limits.
    Gna2_0,
    /// GNA 3.0: adds the 2-D convolution datapath and pooling memory.
    Gna3_0,
    /// GNA 3.5: the 3.0 datapath with revised narrow-memory reservation.
    Gna3_5,
}

impl Generation {
    /// All generations, oldest first.
    pub const ALL: &'static [Self] = &[
        Self::Gna0_9,
        Self::Gna1_0,
        Self::Gna2_0,
        Self::Gna3_0,
        Self::Gna3_5,
    ];

    /// True if this generation carries the 2-D convolution datapath.
    #[must_use]
    pub const fn has_cnn2d(self) -> bool {
        matches!(self, Self::Gna3_0 | Self::Gna3_5)
    }
}

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gna0_9 => write!(f, "GNA 0.9"),
            Self::Gna1_0 => write!(f, "GNA 1.0"),
            Self::Gna2_0 => write!(f, "GNA 2.0"),
            Self::Gna3_0 => write!(f, "GNA 3.0"),
            Self::Gna3_5 => write!(f, "GNA 3.5"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generations_are_totally_ordered() {
        for pair in Generation::ALL.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn cnn2d_datapath_appears_in_3_0() {
        assert!(!Generation::Gna2_0.has_cnn2d());
        assert!(Generation::Gna3_0.has_cnn2d());
        assert!(Generation::Gna3_5.has_cnn2d());
    }
}
