//! Capability registry.
//!
//! Static, per-operation, per-generation tables of allowed layout orders,
//! per-axis range limits, and allowed element types. Lookup follows
//! "nearest preceding generation wins": an entry registered for generation
//! G applies to every generation ≥ G until a later entry overrides it.
//! An operation with no entry at or below the requested generation is
//! unsupported there.
//!
//! The registry is read-only static data; concurrent lookups from many
//! compiling threads need no synchronisation.

use gna_model::{
    Axis, DataMode, DataType, LayoutOrder, ModelError, Operand, OperationType, Result,
};
use gna_hw::Generation;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Buffer alignment the DMA engine requires, in bytes.
pub const BUFFER_ALIGN_BYTES: usize = 64;

/// Per-axis range constraint as exposed to capability-discovery tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeLimits {
    /// Smallest accepted extent.
    pub min: u32,
    /// Largest accepted extent.
    pub max: u32,
    /// Extents must be a multiple of this (for the default element type).
    pub multiplier: u32,
}

/// Range and multiplier constraints for one axis of one operand.
#[derive(Debug, Clone)]
pub struct AxisLimits {
    /// Constrained axis.
    pub axis: Axis,
    /// Smallest accepted extent.
    pub min: u32,
    /// Largest accepted extent.
    pub max: u32,
    /// Base multiplier.
    pub multiplier: u32,
    /// Per-element-type multiplier overrides. Narrower precisions halve the
    /// required multiple on most datapaths; the table says which.
    pub overrides: &'static [(DataType, u32)],
}

impl AxisLimits {
    /// Multiplier in effect for a tensor's data mode.
    #[must_use]
    pub fn effective_multiplier(&self, mode: &DataMode) -> u32 {
        self.overrides
            .iter()
            .find(|&&(t, _)| t == mode.data_type())
            .map_or(self.multiplier, |&(_, m)| m)
    }

    /// The tooling-facing view (base multiplier).
    #[must_use]
    pub const fn as_range(&self) -> RangeLimits {
        RangeLimits {
            min: self.min,
            max: self.max,
            multiplier: self.multiplier,
        }
    }
}

/// Capability envelope for a single operand.
#[derive(Debug, Clone)]
pub struct TensorCaps {
    /// Required layout order, or `None` to skip the order check.
    pub order: Option<LayoutOrder>,
    /// Per-axis constraints.
    pub limits: Vec<AxisLimits>,
    /// Element types accepted in default mode. Empty means the operand
    /// must be disabled.
    pub types: &'static [DataType],
    /// Whether the operand may be declared disabled.
    pub allow_disabled: bool,
    /// Whether the operand may be declared constant-scalar.
    pub allow_constant_scalar: bool,
    /// Buffer alignment requirement in bytes, if any.
    pub align_bytes: Option<usize>,
}

impl TensorCaps {
    fn new(order: &'static [Axis], limits: Vec<AxisLimits>, types: &'static [DataType]) -> Self {
        Self {
            order: Some(LayoutOrder::Ordered(order.to_vec())),
            limits,
            types,
            allow_disabled: false,
            allow_constant_scalar: false,
            align_bytes: Some(BUFFER_ALIGN_BYTES),
        }
    }

    fn disabled_only() -> Self {
        Self {
            order: None,
            limits: Vec::new(),
            types: &[],
            allow_disabled: true,
            allow_constant_scalar: false,
            align_bytes: None,
        }
    }

    fn or_disabled(mut self) -> Self {
        self.allow_disabled = true;
        self
    }

    fn or_constant_scalar(mut self) -> Self {
        self.allow_constant_scalar = true;
        self
    }
}

/// Capability envelope for one operation on one generation.
#[derive(Debug, Clone)]
pub struct OperationCaps {
    operands: [Option<TensorCaps>; 4],
}

impl OperationCaps {
    fn new(
        input: TensorCaps,
        weights: TensorCaps,
        biases: TensorCaps,
        output: TensorCaps,
    ) -> Self {
        Self {
            operands: [Some(input), Some(weights), Some(biases), Some(output)],
        }
    }

    /// Envelope for one operand, if the operation uses it.
    #[must_use]
    pub fn operand(&self, operand: Operand) -> Option<&TensorCaps> {
        self.operands[operand.index()].as_ref()
    }
}

fn lim(axis: Axis, min: u32, max: u32) -> AxisLimits {
    AxisLimits {
        axis,
        min,
        max,
        multiplier: 1,
        overrides: &[],
    }
}

fn lim_mult(
    axis: Axis,
    min: u32,
    max: u32,
    multiplier: u32,
    overrides: &'static [(DataType, u32)],
) -> AxisLimits {
    AxisLimits {
        axis,
        min,
        max,
        multiplier,
        overrides,
    }
}

// Layout orders are fixed at compile time; the registry never parses.
const ORDER_H: &[Axis] = &[Axis::H];
const ORDER_N: &[Axis] = &[Axis::N];
const ORDER_W: &[Axis] = &[Axis::W];
const ORDER_HN: &[Axis] = &[Axis::H, Axis::N];
const ORDER_NH: &[Axis] = &[Axis::N, Axis::H];
const ORDER_HW: &[Axis] = &[Axis::H, Axis::W];
const ORDER_NW: &[Axis] = &[Axis::N, Axis::W];
const ORDER_NHWD: &[Axis] = &[Axis::N, Axis::H, Axis::W, Axis::D];

const INT_ACT: &[DataType] = &[DataType::I8, DataType::I16];
const INT_ACT_16: &[DataType] = &[DataType::I16];
const BIAS_TYPES: &[DataType] = &[DataType::I32, DataType::CompoundBias];
const OUT_TYPES: &[DataType] = &[DataType::I8, DataType::I16, DataType::I32];
const OUT_TYPES_WIDE: &[DataType] = &[DataType::I16, DataType::I32];

// Narrower precision halves the required multiple on the affine fetch path.
const AFFINE_ROW_MULT: &[(DataType, u32)] = &[(DataType::I8, 4)];
// The 1-D kernel row is fetched in 32-element bursts at 16-bit, 16 at 8-bit.
const CNN1D_COEF_MULT: &[(DataType, u32)] = &[(DataType::I8, 16)];

fn affine_caps(group_max: u32, out_types: &'static [DataType]) -> OperationCaps {
    OperationCaps::new(
        TensorCaps::new(
            ORDER_HN,
            vec![
                lim_mult(Axis::H, 8, 65536, 8, AFFINE_ROW_MULT),
                lim(Axis::N, 1, group_max),
            ],
            INT_ACT,
        ),
        TensorCaps::new(
            ORDER_HW,
            vec![
                lim(Axis::H, 1, 65536),
                lim_mult(Axis::W, 8, 65536, 8, AFFINE_ROW_MULT),
            ],
            INT_ACT,
        ),
        TensorCaps::new(ORDER_H, vec![lim(Axis::H, 1, 65536)], BIAS_TYPES)
            .or_disabled()
            .or_constant_scalar(),
        TensorCaps::new(
            ORDER_HN,
            vec![lim(Axis::H, 1, 65536), lim(Axis::N, 1, group_max)],
            out_types,
        ),
    )
}

fn cnn1d_caps() -> OperationCaps {
    OperationCaps::new(
        TensorCaps::new(
            ORDER_W,
            vec![lim_mult(Axis::W, 8, 49152, 8, AFFINE_ROW_MULT)],
            INT_ACT_16,
        ),
        TensorCaps::new(
            ORDER_NW,
            vec![
                lim_mult(Axis::N, 4, 2048, 4, &[]),
                lim_mult(Axis::W, 8, 768, 32, CNN1D_COEF_MULT),
            ],
            INT_ACT,
        ),
        TensorCaps::new(ORDER_N, vec![lim(Axis::N, 4, 2048)], BIAS_TYPES).or_disabled(),
        TensorCaps::new(
            ORDER_NW,
            vec![lim(Axis::N, 4, 2048), lim(Axis::W, 1, 49152)],
            OUT_TYPES_WIDE,
        ),
    )
}

fn cnn2d_caps() -> OperationCaps {
    OperationCaps::new(
        TensorCaps::new(
            ORDER_NHWD,
            vec![
                lim(Axis::N, 1, 1),
                lim(Axis::H, 1, 4096),
                lim(Axis::W, 1, 4096),
                lim(Axis::D, 1, 2048),
            ],
            INT_ACT,
        ),
        TensorCaps::new(
            ORDER_NHWD,
            vec![
                lim(Axis::N, 1, 2048),
                lim(Axis::H, 1, 255),
                lim(Axis::W, 1, 255),
                lim(Axis::D, 1, 2048),
            ],
            INT_ACT,
        ),
        TensorCaps::new(ORDER_N, vec![lim(Axis::N, 1, 2048)], BIAS_TYPES)
            .or_disabled()
            .or_constant_scalar(),
        TensorCaps::new(
            ORDER_NHWD,
            vec![
                lim(Axis::N, 1, 1),
                lim(Axis::H, 1, 4096),
                lim(Axis::W, 1, 4096),
                lim(Axis::D, 1, 2048),
            ],
            OUT_TYPES,
        ),
    )
}

fn deinterleave_caps() -> OperationCaps {
    OperationCaps::new(
        TensorCaps::new(
            ORDER_NH,
            vec![lim(Axis::N, 1, 8), lim(Axis::H, 1, 65536)],
            INT_ACT,
        ),
        TensorCaps::disabled_only(),
        TensorCaps::disabled_only(),
        TensorCaps::new(
            ORDER_HN,
            vec![lim(Axis::H, 1, 65536), lim(Axis::N, 1, 8)],
            INT_ACT,
        ),
    )
}

type Registry = HashMap<OperationType, Vec<(Generation, OperationCaps)>>;

/// Per-operation capability tables, sorted ascending by generation.
static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let mut map: Registry = HashMap::new();
    map.insert(
        OperationType::Affine,
        vec![
            // 0.9 datapath groups at most 4 vectors and writes wide outputs.
            (Generation::Gna0_9, affine_caps(4, OUT_TYPES_WIDE)),
            // 2.0 widens grouping to 8 and adds 8-bit writeback.
            (Generation::Gna2_0, affine_caps(8, OUT_TYPES)),
        ],
    );
    map.insert(OperationType::Cnn1D, vec![(Generation::Gna1_0, cnn1d_caps())]);
    map.insert(OperationType::Cnn2D, vec![(Generation::Gna3_0, cnn2d_caps())]);
    map.insert(
        OperationType::Deinterleave,
        vec![(Generation::Gna2_0, deinterleave_caps())],
    );
    map
});

/// Find the capability envelope for an operation on a generation.
///
/// Selects the entry with the greatest registered generation ≤ `generation`.
///
/// # Errors
///
/// Returns `UnsupportedOnGeneration` when no such entry exists.
pub fn lookup(op: OperationType, generation: Generation) -> Result<&'static OperationCaps> {
    REGISTRY
        .get(&op)
        .and_then(|entries| {
            entries
                .iter()
                .rev()
                .find(|&&(g, _)| g <= generation)
                .map(|(_, caps)| caps)
        })
        .ok_or_else(|| ModelError::unsupported_on(generation))
}

/// Tooling query: range limits for one axis of one operand, or `None` when
/// the combination is unsupported or unconstrained.
#[must_use]
pub fn axis_limits(
    op: OperationType,
    generation: Generation,
    operand: Operand,
    axis: Axis,
) -> Option<RangeLimits> {
    let caps = lookup(op, generation).ok()?;
    caps.operand(operand)?
        .limits
        .iter()
        .find(|l| l.axis == axis)
        .map(AxisLimits::as_range)
}

/// Tooling query: element types accepted for one operand, or `None` when
/// the operation is unsupported on the generation.
#[must_use]
pub fn allowed_types(
    op: OperationType,
    generation: Generation,
    operand: Operand,
) -> Option<&'static [DataType]> {
    let caps = lookup(op, generation).ok()?;
    caps.operand(operand).map(|c| c.types)
}
