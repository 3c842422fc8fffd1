//! Capability-based operation validation.
//!
//! Applies a capability envelope to each operand of an operation, in the
//! fixed rule order: layout order, per-axis range and multiplier, element
//! type membership, buffer null/alignment/containment, then scalar
//! parameters. The first violated rule aborts with a positioned error; no
//! partial validation is attempted. Validation is pure: the operation is
//! only accepted or rejected, never changed.

use crate::caps::{self, TensorCaps};
use crate::config::HwConfig;
use gna_model::{
    ErrorReason, ModelError, Operand, Operation, OperationParams, Result, Tensor, TensorMode,
};
use gna_hw::engine;

/// Validate an operation against the capability envelope for the configured
/// generation.
///
/// # Errors
///
/// Returns the first violated rule with operand/axis/parameter location.
pub fn validate_operation(op: &Operation, cfg: &HwConfig) -> Result<()> {
    let caps = caps::lookup(op.op_type(), cfg.generation())?;
    for &operand in Operand::ALL {
        if let Some(tensor_caps) = caps.operand(operand) {
            validate_tensor(op.tensor(operand), tensor_caps)
                .map_err(|e| e.with_operand(operand))?;
        }
    }
    validate_params(op.params())?;
    tracing::debug!(op = %op.op_type(), generation = %cfg.generation(), "operation validated");
    Ok(())
}

/// Validate a single tensor against one operand's envelope.
///
/// # Errors
///
/// Returns the first violated rule; the caller attaches the operand.
pub fn validate_tensor(tensor: &Tensor, caps: &TensorCaps) -> Result<()> {
    match tensor.mode().mode() {
        TensorMode::Disabled => {
            return if caps.allow_disabled {
                Ok(())
            } else {
                Err(ModelError::new(ErrorReason::NotInAllowedSet))
            };
        }
        TensorMode::ConstantScalar => {
            if !caps.allow_constant_scalar {
                return Err(ModelError::new(ErrorReason::NotInAllowedSet));
            }
            // A scalar substitutes for the whole tensor; shape and range
            // rules do not apply, the buffer rules below still do.
            return validate_buffer(tensor, caps);
        }
        TensorMode::Default => {}
    }

    // (a) layout order
    if let Some(required) = &caps.order {
        if tensor.shape().order() != required {
            return Err(ModelError::new(ErrorReason::ShapeOrderMismatch {
                expected: required.clone(),
                actual: tensor.shape().order().clone(),
            }));
        }
    }

    // (b) per-axis range and multiplier
    for limits in &caps.limits {
        let axis_index = tensor
            .shape()
            .order()
            .position(limits.axis)
            .ok_or_else(|| {
                ModelError::new(ErrorReason::DimensionNotFound { axis: limits.axis })
            })?;
        let value = tensor.shape().at(limits.axis)?;
        if value < limits.min || value > limits.max {
            return Err(
                ModelError::out_of_range(value.into(), limits.min.into(), limits.max.into())
                    .with_axis(axis_index),
            );
        }
        let multiplier = limits.effective_multiplier(tensor.mode());
        if multiplier > 1 && value % multiplier != 0 {
            return Err(
                ModelError::not_multiple_of(value.into(), multiplier.into())
                    .with_axis(axis_index),
            );
        }
    }

    // (c) element type membership
    if !caps.types.contains(&tensor.mode().data_type()) {
        return Err(ModelError::new(ErrorReason::NotInAllowedSet));
    }

    // (d) buffer rules
    validate_buffer(tensor, caps)
}

fn validate_buffer(tensor: &Tensor, caps: &TensorCaps) -> Result<()> {
    let buffer = tensor.buffer();
    if buffer.is_null() {
        return Err(ModelError::new(ErrorReason::NullNotAllowed));
    }
    if let Some(align) = caps.align_bytes {
        if buffer.addr() % align != 0 {
            return Err(ModelError::new(ErrorReason::BufferMisaligned {
                addr: buffer.addr(),
                align,
            }));
        }
    }
    let required = tensor.required_bytes();
    if required > buffer.size_bytes() {
        return Err(ModelError::new(ErrorReason::BufferOutOfBounds {
            size: buffer.size_bytes(),
            required,
        }));
    }
    Ok(())
}

/// Validate scalar parameters. Parameter indices are positional within the
/// operation's parameter variant and are reported in the error location.
fn validate_params(params: &OperationParams) -> Result<()> {
    match params {
        OperationParams::Affine(_) | OperationParams::Deinterleave(_) => Ok(()),
        OperationParams::Cnn1D(p) => {
            require_at_least(p.stride.into(), 1, 0)?;
            if let Some(pool) = &p.pooling {
                require_window(pool.window, 1)?;
                require_at_least(pool.stride.into(), 1, 2)?;
            }
            Ok(())
        }
        OperationParams::Cnn2D(p) => {
            require_at_least(p.stride_h.into(), 1, 0)?;
            require_at_least(p.stride_w.into(), 1, 1)?;
            require_at_most(p.pad_h.into(), engine::CONV_PAD_MAX.into(), 2)?;
            require_at_most(p.pad_w.into(), engine::CONV_PAD_MAX.into(), 3)?;
            if let Some(pool) = &p.pooling {
                require_window(pool.window_h, 4)?;
                require_window(pool.window_w, 5)?;
                require_at_least(pool.stride_h.into(), 1, 6)?;
                require_at_least(pool.stride_w.into(), 1, 7)?;
            }
            Ok(())
        }
    }
}

fn require_at_least(value: u64, min: u64, parameter: u32) -> Result<()> {
    if value < min {
        return Err(ModelError::new(ErrorReason::ValueBelowRange { value, min })
            .with_parameter(parameter));
    }
    Ok(())
}

fn require_at_most(value: u64, max: u64, parameter: u32) -> Result<()> {
    if value > max {
        return Err(ModelError::new(ErrorReason::ValueAboveRange { value, max })
            .with_parameter(parameter));
    }
    Ok(())
}

fn require_window(window: u32, parameter: u32) -> Result<()> {
    if window < 1 || window > engine::POOL_WINDOW_MAX {
        return Err(ModelError::out_of_range(
            window.into(),
            1,
            engine::POOL_WINDOW_MAX.into(),
        )
        .with_parameter(parameter));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gna_hw::Generation;
    use gna_model::{Buffer, Cnn1DParams, Cnn2DParams, DataMode, DataType, Shape};

    fn shape(extents: &[u32], order: &str) -> Shape {
        Shape::from_flat(extents, order.parse().unwrap()).unwrap()
    }

    fn cnn1d(input_len: u32, kernels: u32, coefs: u32, ty: DataType) -> Operation {
        let elem = u64::from(ty.size_bytes());
        Operation::new(
            OperationParams::Cnn1D(Cnn1DParams {
                stride: 1,
                pooling: None,
            }),
            Tensor::new(
                shape(&[input_len], "W"),
                DataMode::new(DataType::I16),
                Buffer::new(0x1000, u64::from(input_len) * 2),
            ),
            Tensor::new(
                shape(&[kernels, coefs], "NW"),
                DataMode::new(ty),
                Buffer::new(0x4000, u64::from(kernels) * u64::from(coefs) * elem),
            ),
            Tensor::new(
                shape(&[kernels], "N"),
                DataMode::new(DataType::I32),
                Buffer::new(0x8000, u64::from(kernels) * 4),
            ),
            Tensor::new(
                shape(&[kernels, (input_len - coefs) + 1], "NW"),
                DataMode::new(DataType::I32),
                Buffer::new(0xC000, u64::from(kernels) * u64::from(input_len) * 4),
            ),
        )
    }

    fn cfg() -> HwConfig {
        HwConfig::new(Generation::Gna3_0)
    }

    #[test]
    fn accepts_multiples_within_range() {
        // 64 coefficients: in [8, 768] and a multiple of 32.
        assert!(validate_operation(&cnn1d(256, 4, 64, DataType::I16), &cfg()).is_ok());
    }

    #[test]
    fn rejects_non_multiple_even_inside_range() {
        // 16 is inside [8, 768] but not a multiple of 32.
        let err = validate_operation(&cnn1d(256, 4, 16, DataType::I16), &cfg()).unwrap_err();
        assert!(matches!(
            err.reason,
            ErrorReason::NotMultipleOf { value: 16, multiple: 32 }
        ));
        assert_eq!(err.location.operand, Some(Operand::Weights));
        assert_eq!(err.location.axis, Some(1));
    }

    #[test]
    fn narrower_weights_halve_the_multiple() {
        // 16 8-bit coefficients pass: the override drops the multiple to 16.
        assert!(validate_operation(&cnn1d(256, 4, 16, DataType::I8), &cfg()).is_ok());
    }

    #[test]
    fn multiplier_boundaries() {
        let run = |coefs| validate_operation(&cnn1d(2048, 4, coefs, DataType::I16), &cfg());
        assert!(run(32).is_ok()); // lowest accepted multiple
        assert!(run(768).is_ok()); // max
        assert!(run(7).is_err()); // below min
        assert!(run(769).is_err()); // above max (and non-multiple)
        assert!(run(800).is_err()); // above max, multiple of 32
    }

    #[test]
    fn rejects_wrong_layout_order() {
        let mut op = cnn1d(256, 4, 64, DataType::I16);
        // Rebuild the weights with the transposed order.
        op = Operation::new(
            *op.params(),
            op.input().clone(),
            Tensor::new(
                shape(&[64, 4], "WN"),
                DataMode::new(DataType::I16),
                Buffer::new(0x4000, 512),
            ),
            op.biases().clone(),
            op.output().clone(),
        );
        let err = validate_operation(&op, &cfg()).unwrap_err();
        assert!(matches!(err.reason, ErrorReason::ShapeOrderMismatch { .. }));
        assert_eq!(err.location.operand, Some(Operand::Weights));
    }

    #[test]
    fn rejects_disallowed_type() {
        let err = validate_operation(&cnn1d(256, 4, 64, DataType::I64), &cfg()).unwrap_err();
        assert!(matches!(err.reason, ErrorReason::NotInAllowedSet));
    }

    #[test]
    fn rejects_null_and_misaligned_buffers() {
        let op = cnn1d(256, 4, 64, DataType::I16);
        let bad = Operation::new(
            *op.params(),
            Tensor::new(
                shape(&[256], "W"),
                DataMode::new(DataType::I16),
                Buffer::NONE,
            ),
            op.weights().clone(),
            op.biases().clone(),
            op.output().clone(),
        );
        let err = validate_operation(&bad, &cfg()).unwrap_err();
        assert!(matches!(err.reason, ErrorReason::NullNotAllowed));
        assert_eq!(err.location.operand, Some(Operand::Input));

        let misaligned = Operation::new(
            *op.params(),
            Tensor::new(
                shape(&[256], "W"),
                DataMode::new(DataType::I16),
                Buffer::new(0x1001, 512),
            ),
            op.weights().clone(),
            op.biases().clone(),
            op.output().clone(),
        );
        let err = validate_operation(&misaligned, &cfg()).unwrap_err();
        assert!(matches!(
            err.reason,
            ErrorReason::BufferMisaligned { addr: 0x1001, align: 64 }
        ));
    }

    #[test]
    fn rejects_undersized_buffer() {
        let op = cnn1d(256, 4, 64, DataType::I16);
        let small = Operation::new(
            *op.params(),
            Tensor::new(
                shape(&[256], "W"),
                DataMode::new(DataType::I16),
                Buffer::new(0x1000, 100),
            ),
            op.weights().clone(),
            op.biases().clone(),
            op.output().clone(),
        );
        let err = validate_operation(&small, &cfg()).unwrap_err();
        assert!(matches!(
            err.reason,
            ErrorReason::BufferOutOfBounds { size: 100, required: 512 }
        ));
    }

    #[test]
    fn disabled_bias_is_accepted_where_allowed() {
        let op = cnn1d(256, 4, 64, DataType::I16);
        let no_bias = Operation::new(
            *op.params(),
            op.input().clone(),
            op.weights().clone(),
            Tensor::disabled(),
            op.output().clone(),
        );
        assert!(validate_operation(&no_bias, &cfg()).is_ok());
    }

    #[test]
    fn zero_stride_is_a_parameter_error() {
        let op = cnn1d(256, 4, 64, DataType::I16);
        let bad = Operation::new(
            OperationParams::Cnn1D(Cnn1DParams {
                stride: 0,
                pooling: None,
            }),
            op.input().clone(),
            op.weights().clone(),
            op.biases().clone(),
            op.output().clone(),
        );
        let err = validate_operation(&bad, &cfg()).unwrap_err();
        assert_eq!(err.location.parameter, Some(0));
        assert!(matches!(err.reason, ErrorReason::ValueBelowRange { .. }));
    }

    #[test]
    fn oversized_padding_is_a_parameter_error() {
        let cnn2d = |pad_h, pad_w| {
            Operation::new(
                OperationParams::Cnn2D(Cnn2DParams {
                    stride_h: 1,
                    stride_w: 1,
                    pad_h,
                    pad_w,
                    pooling: None,
                }),
                Tensor::new(
                    shape(&[1, 8, 6, 1], "NHWD"),
                    DataMode::new(DataType::I8),
                    Buffer::new(0x1000, 1 << 16),
                ),
                Tensor::new(
                    shape(&[3, 2, 2, 1], "NHWD"),
                    DataMode::new(DataType::I8),
                    Buffer::new(0x4000, 1 << 16),
                ),
                Tensor::new(
                    shape(&[3], "N"),
                    DataMode::new(DataType::I32),
                    Buffer::new(0x8000, 1 << 16),
                ),
                Tensor::new(
                    shape(&[1, 7, 5, 3], "NHWD"),
                    DataMode::new(DataType::I32),
                    Buffer::new(0xC000, 1 << 16),
                ),
            )
        };
        assert!(validate_operation(&cnn2d(engine::CONV_PAD_MAX, 0), &cfg()).is_ok());

        let err =
            validate_operation(&cnn2d(u32::MAX / 2 + 1, 0), &cfg()).unwrap_err();
        assert_eq!(err.location.parameter, Some(2));
        assert!(matches!(err.reason, ErrorReason::ValueAboveRange { .. }));

        let err =
            validate_operation(&cnn2d(0, engine::CONV_PAD_MAX + 1), &cfg()).unwrap_err();
        assert_eq!(err.location.parameter, Some(3));
    }
}
