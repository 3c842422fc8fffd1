//! Operation declarations.
//!
//! An [`Operation`] owns the four tensors the hardware descriptor consumes
//! (input feature volume, kernels, biases, output volume) plus an
//! operation-specific parameter variant. The variant is a sum type; the
//! source hardware ABI uses a raw union here, which does not survive
//! translation into a safe API.

use crate::tensor::Tensor;

/// Identifies one of the four descriptor tensors for error attribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operand {
    /// Input feature volume.
    Input,
    /// Kernel / weight volume.
    Weights,
    /// Bias volume.
    Biases,
    /// Output volume.
    Output,
}

impl Operand {
    /// All operands in descriptor order.
    pub const ALL: &'static [Self] = &[Self::Input, Self::Weights, Self::Biases, Self::Output];

    /// Stable index within the descriptor record.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Input => 0,
            Self::Weights => 1,
            Self::Biases => 2,
            Self::Output => 3,
        }
    }
}

impl std::fmt::Display for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Input => write!(f, "input"),
            Self::Weights => write!(f, "weights"),
            Self::Biases => write!(f, "biases"),
            Self::Output => write!(f, "output"),
        }
    }
}

/// Operation type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationType {
    /// Fully connected affine transform.
    Affine,
    /// 1-D convolution (legacy datapath).
    Cnn1D,
    /// 2-D convolution (GNA 3.0+ datapath).
    Cnn2D,
    /// De-interleave (tensor transpose between grouping layouts).
    Deinterleave,
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Affine => write!(f, "Affine"),
            Self::Cnn1D => write!(f, "Cnn1D"),
            Self::Cnn2D => write!(f, "Cnn2D"),
            Self::Deinterleave => write!(f, "Deinterleave"),
        }
    }
}

/// Pooling reduction function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolingMode {
    /// Maximum over the window.
    Max,
    /// Sum over the window.
    Sum,
}

/// Pooling stage appended to a 1-D convolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pooling1DParams {
    /// Reduction function.
    pub mode: PoolingMode,
    /// Window extent along the convolved axis.
    pub window: u32,
    /// Window step.
    pub stride: u32,
}

/// Pooling stage appended to a 2-D convolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pooling2DParams {
    /// Reduction function.
    pub mode: PoolingMode,
    /// Window height.
    pub window_h: u32,
    /// Window width.
    pub window_w: u32,
    /// Vertical window step.
    pub stride_h: u32,
    /// Horizontal window step.
    pub stride_w: u32,
}

/// Affine operations carry no scalar parameters; grouping comes from the
/// tensor shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AffineParams;

/// De-interleave carries no scalar parameters; row/column counts come from
/// the tensor shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeinterleaveParams;

/// 1-D convolution parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cnn1DParams {
    /// Kernel step along the input vector.
    pub stride: u32,
    /// Optional pooling stage.
    pub pooling: Option<Pooling1DParams>,
}

/// 2-D convolution parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cnn2DParams {
    /// Vertical kernel step.
    pub stride_h: u32,
    /// Horizontal kernel step.
    pub stride_w: u32,
    /// Zero padding added to the input height before convolution.
    pub pad_h: u32,
    /// Zero padding added to the input width before convolution.
    pub pad_w: u32,
    /// Optional pooling stage.
    pub pooling: Option<Pooling2DParams>,
}

/// Operation-specific parameters, tagged by operation type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationParams {
    /// Fully connected affine transform.
    Affine(AffineParams),
    /// 1-D convolution.
    Cnn1D(Cnn1DParams),
    /// 2-D convolution.
    Cnn2D(Cnn2DParams),
    /// De-interleave.
    Deinterleave(DeinterleaveParams),
}

impl OperationParams {
    /// The type tag of this parameter variant.
    #[must_use]
    pub const fn op_type(&self) -> OperationType {
        match self {
            Self::Affine(_) => OperationType::Affine,
            Self::Cnn1D(_) => OperationType::Cnn1D,
            Self::Cnn2D(_) => OperationType::Cnn2D,
            Self::Deinterleave(_) => OperationType::Deinterleave,
        }
    }
}

/// A user-declared dataflow-graph operation.
///
/// The operation owns its tensors; each tensor's buffer stays owned by the
/// caller and is never freed here.
#[derive(Debug, Clone)]
pub struct Operation {
    params: OperationParams,
    input: Tensor,
    weights: Tensor,
    biases: Tensor,
    output: Tensor,
}

impl Operation {
    /// Assemble an operation from its parameter variant and four tensors.
    #[must_use]
    pub fn new(
        params: OperationParams,
        input: Tensor,
        weights: Tensor,
        biases: Tensor,
        output: Tensor,
    ) -> Self {
        Self {
            params,
            input,
            weights,
            biases,
            output,
        }
    }

    /// The operation type tag.
    #[must_use]
    pub const fn op_type(&self) -> OperationType {
        self.params.op_type()
    }

    /// The parameter variant.
    #[must_use]
    pub const fn params(&self) -> &OperationParams {
        &self.params
    }

    /// Tensor for a given operand.
    #[must_use]
    pub const fn tensor(&self, operand: Operand) -> &Tensor {
        match operand {
            Operand::Input => &self.input,
            Operand::Weights => &self.weights,
            Operand::Biases => &self.biases,
            Operand::Output => &self.output,
        }
    }

    /// Input feature volume.
    #[must_use]
    pub const fn input(&self) -> &Tensor {
        &self.input
    }

    /// Kernel / weight volume.
    #[must_use]
    pub const fn weights(&self) -> &Tensor {
        &self.weights
    }

    /// Bias volume.
    #[must_use]
    pub const fn biases(&self) -> &Tensor {
        &self.biases
    }

    /// Output volume.
    #[must_use]
    pub const fn output(&self) -> &Tensor {
        &self.output
    }
}
