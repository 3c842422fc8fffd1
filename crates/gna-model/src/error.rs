//! Structured, positioned errors.
//!
//! Every validation or compilation failure carries a [`ErrorLocation`]:
//! operation index, operand, parameter index and axis index where known.
//! The location is how a caller pinpoints which of potentially hundreds of
//! tensors and dimensions failed; it is part of the contract, not
//! diagnostic sugar.

use crate::layout::{Axis, LayoutOrder};
use crate::operation::Operand;
use gna_hw::Generation;
use thiserror::Error;

/// Result type alias for model and compiler operations.
pub type Result<T> = std::result::Result<T, ModelError>;

/// The rule that was violated.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ErrorReason {
    /// A required buffer or parameter was null.
    #[error("null not allowed")]
    NullNotAllowed,

    /// A value fell below the permitted minimum.
    #[error("value {value} below minimum {min}")]
    ValueBelowRange {
        /// Offending value.
        value: u64,
        /// Permitted minimum.
        min: u64,
    },

    /// A value exceeded the permitted maximum.
    #[error("value {value} above maximum {max}")]
    ValueAboveRange {
        /// Offending value.
        value: u64,
        /// Permitted maximum.
        max: u64,
    },

    /// A value was not a multiple of the required step.
    #[error("value {value} is not a multiple of {multiple}")]
    NotMultipleOf {
        /// Offending value.
        value: u64,
        /// Required multiple.
        multiple: u64,
    },

    /// A value was outside the allowed set for this capability entry.
    #[error("value not in the allowed set")]
    NotInAllowedSet,

    /// The tensor's layout order differs from the required one.
    #[error("layout order mismatch: expected {expected}, got {actual}")]
    ShapeOrderMismatch {
        /// Order the capability entry requires.
        expected: LayoutOrder,
        /// Order the tensor declared.
        actual: LayoutOrder,
    },

    /// A shape was queried for an axis it does not carry.
    #[error("dimension {axis} not present in shape")]
    DimensionNotFound {
        /// Missing axis.
        axis: Axis,
    },

    /// A buffer pointer violated the required alignment.
    #[error("buffer address {addr:#x} is not {align}-byte aligned")]
    BufferMisaligned {
        /// Numeric buffer address.
        addr: usize,
        /// Required alignment in bytes.
        align: usize,
    },

    /// A buffer is too small for the tensor it backs.
    #[error("buffer of {size} bytes cannot hold the required {required} bytes")]
    BufferOutOfBounds {
        /// Declared buffer size.
        size: u64,
        /// Bytes the tensor needs.
        required: u64,
    },

    /// The operation has no capability entry at or below this generation.
    #[error("operation unsupported on {generation}")]
    UnsupportedOnGeneration {
        /// Generation the lookup was made for.
        generation: Generation,
    },

    /// The three on-chip regions do not fit the unified-memory budget.
    #[error("memory budget exceeded: {requested} bytes requested, {budget} available")]
    MemoryBudgetExceeded {
        /// Gross bytes the descriptor needs.
        requested: u64,
        /// Configured unified-memory budget.
        budget: u64,
    },

    /// No physical device is present; software fallback only.
    ///
    /// This reason is never thrown from `compile`; it degrades
    /// `AdaptHw::valid` instead. It exists so downstream consumers can
    /// report the condition uniformly.
    #[error("no device available, software fallback only")]
    DeviceUnavailable,
}

/// Where in the model a rule was violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ErrorLocation {
    /// Index of the operation within the model, if known.
    pub operation: Option<u32>,
    /// Operand (one of the four descriptor tensors), if known.
    pub operand: Option<Operand>,
    /// Scalar parameter index within the operation, if known.
    pub parameter: Option<u32>,
    /// Axis index within the operand's shape, if known.
    pub axis: Option<usize>,
}

impl std::fmt::Display for ErrorLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut wrote = false;
        if let Some(op) = self.operation {
            write!(f, "operation {op}")?;
            wrote = true;
        }
        if let Some(operand) = self.operand {
            if wrote {
                write!(f, ", ")?;
            }
            write!(f, "{operand}")?;
            wrote = true;
        }
        if let Some(parameter) = self.parameter {
            if wrote {
                write!(f, ", ")?;
            }
            write!(f, "parameter {parameter}")?;
            wrote = true;
        }
        if let Some(axis) = self.axis {
            if wrote {
                write!(f, ", ")?;
            }
            write!(f, "axis {axis}")?;
            wrote = true;
        }
        if !wrote {
            write!(f, "unlocated")?;
        }
        Ok(())
    }
}

/// A violated rule plus its location in the model.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("{reason} ({location})")]
pub struct ModelError {
    /// The rule that was violated.
    pub reason: ErrorReason,
    /// Position of the violation.
    pub location: ErrorLocation,
}

impl ModelError {
    /// Wrap a reason with an empty location.
    #[must_use]
    pub fn new(reason: ErrorReason) -> Self {
        Self {
            reason,
            location: ErrorLocation::default(),
        }
    }

    /// Attach an axis index if none is set (innermost context wins).
    #[must_use]
    pub fn with_axis(mut self, axis: usize) -> Self {
        self.location.axis.get_or_insert(axis);
        self
    }

    /// Attach an operand if none is set.
    #[must_use]
    pub fn with_operand(mut self, operand: Operand) -> Self {
        self.location.operand.get_or_insert(operand);
        self
    }

    /// Attach a parameter index if none is set.
    #[must_use]
    pub fn with_parameter(mut self, parameter: u32) -> Self {
        self.location.parameter.get_or_insert(parameter);
        self
    }

    /// Attach an operation index if none is set.
    #[must_use]
    pub fn with_operation(mut self, operation: u32) -> Self {
        self.location.operation.get_or_insert(operation);
        self
    }

    /// Create a range error, choosing below/above from the bounds.
    #[must_use]
    pub fn out_of_range(value: u64, min: u64, max: u64) -> Self {
        if value < min {
            Self::new(ErrorReason::ValueBelowRange { value, min })
        } else {
            Self::new(ErrorReason::ValueAboveRange { value, max })
        }
    }

    /// Create a multiplier violation.
    #[must_use]
    pub fn not_multiple_of(value: u64, multiple: u64) -> Self {
        Self::new(ErrorReason::NotMultipleOf { value, multiple })
    }

    /// Create an unsupported-generation error.
    #[must_use]
    pub fn unsupported_on(generation: Generation) -> Self {
        Self::new(ErrorReason::UnsupportedOnGeneration { generation })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_display_composes() {
        let err = ModelError::not_multiple_of(16, 32)
            .with_axis(0)
            .with_operand(Operand::Weights)
            .with_operation(3);
        assert_eq!(
            format!("{err}"),
            "value 16 is not a multiple of 32 (operation 3, weights, axis 0)"
        );
    }

    #[test]
    fn innermost_location_wins() {
        let err = ModelError::new(ErrorReason::NullNotAllowed)
            .with_axis(2)
            .with_axis(5);
        assert_eq!(err.location.axis, Some(2));
    }

    #[test]
    fn out_of_range_picks_direction() {
        assert!(matches!(
            ModelError::out_of_range(0, 1, 10).reason,
            ErrorReason::ValueBelowRange { .. }
        ));
        assert!(matches!(
            ModelError::out_of_range(11, 1, 10).reason,
            ErrorReason::ValueAboveRange { .. }
        ));
    }
}
