//! Dimension-indexed tensor shapes.

use crate::error::{ErrorReason, ModelError, Result};
use crate::layout::{Axis, LayoutOrder, MAX_AXES};

/// An ordered mapping from axis selectors to extents, paired with the
/// canonical [`LayoutOrder`] of this shape instance.
///
/// Shapes are immutable once accepted by the validator. The all-zero extent
/// vector denotes a hardware scalar and has zero elements.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shape {
    order: LayoutOrder,
    extents: Vec<u32>,
}

impl Shape {
    /// Build a shape from a flat extent array and a requested order.
    ///
    /// With a concrete order the array length must equal the order's axis
    /// count; with [`LayoutOrder::Any`] the extents stay positional.
    ///
    /// # Errors
    ///
    /// Returns a range error when the counts disagree or exceed
    /// [`MAX_AXES`].
    pub fn from_flat(extents: &[u32], order: LayoutOrder) -> Result<Self> {
        if extents.len() > MAX_AXES {
            return Err(ModelError::new(ErrorReason::ValueAboveRange {
                value: extents.len() as u64,
                max: MAX_AXES as u64,
            }));
        }
        if !order.is_any() && extents.len() != order.len() {
            return Err(ModelError::out_of_range(
                extents.len() as u64,
                order.len() as u64,
                order.len() as u64,
            ));
        }
        Ok(Self {
            order,
            extents: extents.to_vec(),
        })
    }

    /// Scalar shape: no axes, zero elements.
    #[must_use]
    pub const fn scalar() -> Self {
        Self {
            order: LayoutOrder::Any,
            extents: Vec::new(),
        }
    }

    /// The canonical axis order.
    #[must_use]
    pub const fn order(&self) -> &LayoutOrder {
        &self.order
    }

    /// Extents in layout order.
    #[must_use]
    pub fn extents(&self) -> &[u32] {
        &self.extents
    }

    /// Number of axes.
    #[must_use]
    pub fn num_axes(&self) -> usize {
        self.extents.len()
    }

    /// Extent of a named axis.
    ///
    /// # Errors
    ///
    /// Returns `DimensionNotFound` when the axis is absent or the order is
    /// [`LayoutOrder::Any`].
    pub fn at(&self, axis: Axis) -> Result<u32> {
        self.order
            .position(axis)
            .map(|i| self.extents[i])
            .ok_or_else(|| ModelError::new(ErrorReason::DimensionNotFound { axis }))
    }

    /// Extent by position in layout order.
    #[must_use]
    pub fn extent(&self, index: usize) -> Option<u32> {
        self.extents.get(index).copied()
    }

    /// Total element count: the product of all non-zero extents, or 0 when
    /// every extent is zero (the hardware's all-zero-means-scalar rule).
    #[must_use]
    pub fn num_elements(&self) -> u64 {
        if self.extents.iter().all(|&e| e == 0) {
            return 0;
        }
        self.extents
            .iter()
            .filter(|&&e| e != 0)
            .map(|&e| u64::from(e))
            .product()
    }

    /// Re-key this shape into a new order.
    ///
    /// Concrete-to-concrete reshapes match axis letters 1:1; a shape whose
    /// order is [`LayoutOrder::Any`] is re-keyed by positional
    /// correspondence.
    ///
    /// # Errors
    ///
    /// Returns a range error when the axis counts differ, or
    /// `DimensionNotFound` when the new order names an axis this shape does
    /// not carry.
    pub fn reshape(&self, new_order: LayoutOrder) -> Result<Self> {
        if new_order.is_any() {
            return Ok(Self {
                order: LayoutOrder::Any,
                extents: self.extents.clone(),
            });
        }
        if new_order.len() != self.extents.len() {
            return Err(ModelError::out_of_range(
                new_order.len() as u64,
                self.extents.len() as u64,
                self.extents.len() as u64,
            ));
        }
        if self.order.is_any() {
            // Positional correspondence: extents keep their slots, the new
            // order supplies the axis letters.
            return Ok(Self {
                order: new_order,
                extents: self.extents.clone(),
            });
        }
        let axes = new_order.axes().unwrap_or(&[]);
        let mut extents = Vec::with_capacity(axes.len());
        for &axis in axes {
            extents.push(self.at(axis)?);
        }
        Ok(Self {
            order: new_order,
            extents,
        })
    }

    /// Assert this shape equals `other` on every shared axis.
    ///
    /// Walks axes pairwise; the first mismatch raises a range error carrying
    /// the axis index, which the validator threads into its error location.
    ///
    /// # Errors
    ///
    /// Returns a positioned range error on the first differing extent.
    pub fn expect_equal(&self, other: &Self) -> Result<()> {
        self.walk_shared(other, |index, mine, theirs| {
            if mine == theirs {
                Ok(())
            } else {
                Err(
                    ModelError::out_of_range(u64::from(mine), u64::from(theirs), u64::from(theirs))
                        .with_axis(index),
                )
            }
        })
    }

    /// Assert every shared extent of this shape fits within `other`.
    ///
    /// # Errors
    ///
    /// Returns a positioned `ValueAboveRange` on the first overflowing
    /// extent.
    pub fn expect_fits(&self, other: &Self) -> Result<()> {
        self.walk_shared(other, |index, mine, theirs| {
            if mine <= theirs {
                Ok(())
            } else {
                Err(ModelError::new(ErrorReason::ValueAboveRange {
                    value: u64::from(mine),
                    max: u64::from(theirs),
                })
                .with_axis(index))
            }
        })
    }

    /// Walk axes shared with `other`. For two concrete orders the shared
    /// axes are matched by letter; otherwise comparison is positional over
    /// the shorter extent vector.
    fn walk_shared<F>(&self, other: &Self, mut check: F) -> Result<()>
    where
        F: FnMut(usize, u32, u32) -> Result<()>,
    {
        if let (Some(mine), Some(_)) = (self.order.axes(), other.order.axes()) {
            for (index, &axis) in mine.iter().enumerate() {
                if let Ok(theirs) = other.at(axis) {
                    check(index, self.extents[index], theirs)?;
                }
            }
            return Ok(());
        }
        let shared = self.extents.len().min(other.extents.len());
        for index in 0..shared {
            check(index, self.extents[index], other.extents[index])?;
        }
        Ok(())
    }
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[", self.order)?;
        for (i, e) in self.extents.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{e}")?;
        }
        write!(f, "]")
    }
}
