//! Axis selectors and layout orders.
//!
//! A [`LayoutOrder`] is the canonical axis order of a [`crate::Shape`]: a
//! short sequence of axis letters (e.g. `"NHWD"`), or [`LayoutOrder::Any`]
//! when no concrete order has been fixed yet.

use crate::error::{ErrorReason, ModelError, Result};

/// Maximum number of axes a shape may carry.
pub const MAX_AXES: usize = 8;

/// Named axis selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Batch / grouping dimension.
    N,
    /// Width.
    W,
    /// Height.
    H,
    /// Depth / channel.
    D,
    /// Generic axis.
    X,
    /// Generic axis.
    Y,
    /// Generic axis.
    Z,
}

impl Axis {
    /// Single-letter name of the axis.
    #[must_use]
    pub const fn letter(self) -> char {
        match self {
            Self::N => 'N',
            Self::W => 'W',
            Self::H => 'H',
            Self::D => 'D',
            Self::X => 'X',
            Self::Y => 'Y',
            Self::Z => 'Z',
        }
    }

    /// Parse an axis from its letter (case-insensitive).
    #[must_use]
    pub const fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'N' | 'n' => Some(Self::N),
            'W' | 'w' => Some(Self::W),
            'H' | 'h' => Some(Self::H),
            'D' | 'd' => Some(Self::D),
            'X' | 'x' => Some(Self::X),
            'Y' | 'y' => Some(Self::Y),
            'Z' | 'z' => Some(Self::Z),
            _ => None,
        }
    }
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// Canonical axis order of a shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LayoutOrder {
    /// No concrete order fixed yet; axes are addressed positionally.
    Any,
    /// Concrete ordered axis sequence. Letters are unique.
    Ordered(Vec<Axis>),
}

impl LayoutOrder {
    /// Build a concrete order from an axis slice.
    ///
    /// # Errors
    ///
    /// Returns an error if the slice exceeds [`MAX_AXES`] or repeats an axis.
    pub fn of(axes: &[Axis]) -> Result<Self> {
        if axes.len() > MAX_AXES {
            return Err(ModelError::new(ErrorReason::ValueAboveRange {
                value: axes.len() as u64,
                max: MAX_AXES as u64,
            }));
        }
        for (i, axis) in axes.iter().enumerate() {
            if axes[..i].contains(axis) {
                return Err(
                    ModelError::new(ErrorReason::NotInAllowedSet).with_axis(i)
                );
            }
        }
        Ok(Self::Ordered(axes.to_vec()))
    }

    /// True when no concrete order is fixed.
    #[must_use]
    pub const fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }

    /// Ordered axes, or `None` for [`LayoutOrder::Any`].
    #[must_use]
    pub fn axes(&self) -> Option<&[Axis]> {
        match self {
            Self::Any => None,
            Self::Ordered(axes) => Some(axes),
        }
    }

    /// Number of axes in a concrete order; 0 for `Any`.
    #[must_use]
    pub fn len(&self) -> usize {
        self.axes().map_or(0, <[Axis]>::len)
    }

    /// True when the order carries no axes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Position of an axis within a concrete order.
    #[must_use]
    pub fn position(&self, axis: Axis) -> Option<usize> {
        self.axes()?.iter().position(|&a| a == axis)
    }
}

impl std::str::FromStr for LayoutOrder {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("any") {
            return Ok(Self::Any);
        }
        let mut axes = Vec::with_capacity(s.len());
        for (i, letter) in s.chars().enumerate() {
            let axis = Axis::from_letter(letter)
                .ok_or_else(|| ModelError::new(ErrorReason::NotInAllowedSet).with_axis(i))?;
            axes.push(axis);
        }
        Self::of(&axes)
    }
}

impl std::fmt::Display for LayoutOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Any => write!(f, "any"),
            Self::Ordered(axes) => {
                for axis in axes {
                    write!(f, "{axis}")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_concrete_order() {
        let order: LayoutOrder = "NHWD".parse().expect("valid order");
        assert_eq!(
            order.axes().unwrap(),
            &[Axis::N, Axis::H, Axis::W, Axis::D]
        );
        assert_eq!(format!("{order}"), "NHWD");
    }

    #[test]
    fn parse_any() {
        let order: LayoutOrder = "any".parse().expect("valid order");
        assert!(order.is_any());
        assert_eq!(order.len(), 0);
    }

    #[test]
    fn reject_unknown_letter() {
        assert!("NQ".parse::<LayoutOrder>().is_err());
    }

    #[test]
    fn reject_repeated_axis() {
        assert!("NHH".parse::<LayoutOrder>().is_err());
    }

    #[test]
    fn reject_too_many_axes() {
        assert!(LayoutOrder::of(&[Axis::N; 9]).is_err());
    }

    #[test]
    fn position_lookup() {
        let order: LayoutOrder = "HWD".parse().unwrap();
        assert_eq!(order.position(Axis::W), Some(1));
        assert_eq!(order.position(Axis::N), None);
        assert_eq!(LayoutOrder::Any.position(Axis::N), None);
    }
}
