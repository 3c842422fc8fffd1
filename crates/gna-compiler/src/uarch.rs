//! Micro-architecture descriptor compilation.
//!
//! Turns an accepted [`Operation`] into a [`LayerDescriptor`]: derive the
//! convolution and pooling output volumes, size the kernel working group
//! against the narrow-memory budget, pick a micro-thread split, partition
//! unified memory into the three regions, and estimate bank-conflict
//! probabilities. Everything here is a pure function of the operation, the
//! configuration and the static capability tables; compiling the same
//! operation twice yields identical descriptors.
//!
//! An absent device never fails compilation. The descriptor is produced
//! with every derived field populated and `AdaptHw::valid` cleared, so the
//! software fallback can still consume it.

use crate::config::HwConfig;
use crate::descriptor::{AdaptHw, LayerDescriptor, Region, UMemAlloc, VolumeKind};
use crate::{planner, validator};
use gna_hw::{engine, narrow_mem};
use gna_model::{
    Axis, ErrorReason, LayoutOrder, ModelError, Operand, Operation, OperationParams, Result,
    Shape,
};

/// Validate and compile one operation into a hardware descriptor.
///
/// Ordering is fixed: capability validation first, then volume derivation
/// and cross-tensor consistency, then kernel-working-group sizing against
/// narrow memory, then the unified-memory partition as the final gate.
///
/// # Errors
///
/// Propagates validation errors, cross-tensor shape mismatches, and
/// `MemoryBudgetExceeded` from either memory gate. A missing device is not
/// an error; it clears [`AdaptHw::valid`] instead.
pub fn compile(op: &Operation, cfg: &HwConfig) -> Result<LayerDescriptor> {
    validator::validate_operation(op, cfg)?;

    let conv = conv_volume(op)?;
    let pooled = pool_volume(op, &conv)?;
    pooled
        .expect_equal(op.output().shape())
        .map_err(|e| e.with_operand(Operand::Output))?;

    let kn = kn_elements(op)?;
    let (cn, fast_path) = cn_elements(op, cfg)?;
    let pn = pn_elements(op, cfg, &conv)?;
    let (kwg, kwg_iter) = kwg_sizing(op, cfg, kn)?;

    let act = u64::from(activation_bytes(op));
    let acc = u64::from(engine::mac_accumulator_bytes(activation_bytes(op)));
    let kmem = kn * u64::from(weight_bytes(op)) * u64::from(kwg);
    let (uthreads, cmem, pmem) = select_uthreads(cfg, kmem, cn * act, pn * acc);
    let plan = planner::plan_regions(kmem, cmem, pmem, cfg)?;
    let (prb_kp, prb_cp) = conflict_probabilities(cfg, kmem, cmem, pmem, fast_path);

    let representable = hardware_representable(op, cfg);
    if !representable {
        tracing::debug!(op = %op.op_type(), "not hardware-representable, software fallback");
    }
    let valid = cfg.device_present() && representable;

    tracing::debug!(
        op = %op.op_type(),
        kwg,
        kwg_iter,
        uthreads,
        kmem_bytes = plan.kmem_bytes,
        cmem_bytes = plan.cmem_bytes,
        pmem_bytes = plan.pmem_bytes,
        valid,
        "compiled layer descriptor"
    );

    let adapt = AdaptHw {
        valid,
        datapath_width: engine::DATAPATH_WIDTH_BYTES,
        kwg,
        kwg_iter,
        uthreads,
        base_offsets: plan.base_offsets,
        alloc: UMemAlloc {
            kmem_bytes: plan.kmem_bytes,
            cmem_bytes: plan.cmem_bytes,
            pmem_bytes: plan.pmem_bytes,
            total_bytes: plan.total_bytes,
            prb_kp_conflict: prb_kp,
            prb_cp_conflict: prb_cp,
        },
    };
    Ok(LayerDescriptor::new(op.clone(), adapt))
}

/// The post-convolution output volume, derived from the input and weight
/// shapes and the operation parameters.
///
/// For operations without a convolution stage this is the natural output
/// volume: the affine product shape, or the transposed de-interleave shape.
/// Cross-tensor consistency (kernel depth matches input depth, kernel fits
/// the padded input, affine row count matches the weight columns) is
/// checked here because it only becomes decidable once both shapes are
/// known.
///
/// # Errors
///
/// Returns positioned errors attributed to the weights operand on
/// cross-tensor mismatch.
pub fn conv_volume(op: &Operation) -> Result<Shape> {
    match op.params() {
        OperationParams::Affine(_) => {
            let in_rows = op.input().shape().at(Axis::H)?;
            let groups = op.input().shape().at(Axis::N)?;
            let w_rows = op.weights().shape().at(Axis::H)?;
            let w_cols = op.weights().shape().at(Axis::W)?;
            if w_cols != in_rows {
                return Err(ModelError::out_of_range(
                    u64::from(w_cols),
                    u64::from(in_rows),
                    u64::from(in_rows),
                )
                .with_operand(Operand::Weights)
                .with_axis(1));
            }
            Shape::from_flat(
                &[w_rows, groups],
                LayoutOrder::Ordered(vec![Axis::H, Axis::N]),
            )
        }
        OperationParams::Deinterleave(_) => {
            let groups = op.input().shape().at(Axis::N)?;
            let rows = op.input().shape().at(Axis::H)?;
            Shape::from_flat(
                &[rows, groups],
                LayoutOrder::Ordered(vec![Axis::H, Axis::N]),
            )
        }
        OperationParams::Cnn1D(p) => {
            let in_w = op.input().shape().at(Axis::W)?;
            let k_n = op.weights().shape().at(Axis::N)?;
            let k_w = op.weights().shape().at(Axis::W)?;
            require_nonzero(p.stride, 0)?;
            if k_w > in_w {
                return Err(ModelError::new(ErrorReason::ValueAboveRange {
                    value: u64::from(k_w),
                    max: u64::from(in_w),
                })
                .with_operand(Operand::Weights)
                .with_axis(1));
            }
            let out_w = (in_w - k_w) / p.stride + 1;
            Shape::from_flat(
                &[k_n, out_w],
                LayoutOrder::Ordered(vec![Axis::N, Axis::W]),
            )
        }
        OperationParams::Cnn2D(p) => {
            let in_n = op.input().shape().at(Axis::N)?;
            let in_h = op.input().shape().at(Axis::H)?;
            let in_w = op.input().shape().at(Axis::W)?;
            let in_d = op.input().shape().at(Axis::D)?;
            let k_n = op.weights().shape().at(Axis::N)?;
            let k_h = op.weights().shape().at(Axis::H)?;
            let k_w = op.weights().shape().at(Axis::W)?;
            let k_d = op.weights().shape().at(Axis::D)?;
            require_nonzero(p.stride_h, 0)?;
            require_nonzero(p.stride_w, 1)?;
            if k_d != in_d {
                return Err(ModelError::out_of_range(
                    u64::from(k_d),
                    u64::from(in_d),
                    u64::from(in_d),
                )
                .with_operand(Operand::Weights)
                .with_axis(3));
            }
            // Padded extents are widened so absurd padding surfaces as a
            // range error instead of wrapping.
            let padded_h = u64::from(in_h) + 2 * u64::from(p.pad_h);
            let padded_w = u64::from(in_w) + 2 * u64::from(p.pad_w);
            if u64::from(k_h) > padded_h {
                return Err(ModelError::new(ErrorReason::ValueAboveRange {
                    value: u64::from(k_h),
                    max: padded_h,
                })
                .with_operand(Operand::Weights)
                .with_axis(1));
            }
            if u64::from(k_w) > padded_w {
                return Err(ModelError::new(ErrorReason::ValueAboveRange {
                    value: u64::from(k_w),
                    max: padded_w,
                })
                .with_operand(Operand::Weights)
                .with_axis(2));
            }
            let out_h = (padded_h - u64::from(k_h)) / u64::from(p.stride_h) + 1;
            let out_w = (padded_w - u64::from(k_w)) / u64::from(p.stride_w) + 1;
            Shape::from_flat(
                &[in_n, narrow_extent(out_h)?, narrow_extent(out_w)?, k_n],
                LayoutOrder::Ordered(vec![Axis::N, Axis::H, Axis::W, Axis::D]),
            )
        }
    }
}

/// The post-pooling output volume.
///
/// Identical to the convolution volume when no pooling stage is configured.
///
/// # Errors
///
/// Returns a parameter-positioned error when a pooling window exceeds the
/// convolution volume it reduces.
pub fn pool_volume(op: &Operation, conv: &Shape) -> Result<Shape> {
    match op.params() {
        OperationParams::Cnn1D(p) => {
            let Some(pool) = p.pooling else {
                return Ok(conv.clone());
            };
            require_nonzero(pool.stride, 2)?;
            let conv_w = conv.at(Axis::W)?;
            if pool.window > conv_w {
                return Err(ModelError::new(ErrorReason::ValueAboveRange {
                    value: u64::from(pool.window),
                    max: u64::from(conv_w),
                })
                .with_parameter(1));
            }
            let out_w = (conv_w - pool.window) / pool.stride + 1;
            let k_n = conv.at(Axis::N)?;
            Shape::from_flat(
                &[k_n, out_w],
                LayoutOrder::Ordered(vec![Axis::N, Axis::W]),
            )
        }
        OperationParams::Cnn2D(p) => {
            let Some(pool) = p.pooling else {
                return Ok(conv.clone());
            };
            require_nonzero(pool.stride_h, 6)?;
            require_nonzero(pool.stride_w, 7)?;
            let conv_h = conv.at(Axis::H)?;
            let conv_w = conv.at(Axis::W)?;
            if pool.window_h > conv_h {
                return Err(ModelError::new(ErrorReason::ValueAboveRange {
                    value: u64::from(pool.window_h),
                    max: u64::from(conv_h),
                })
                .with_parameter(4));
            }
            if pool.window_w > conv_w {
                return Err(ModelError::new(ErrorReason::ValueAboveRange {
                    value: u64::from(pool.window_w),
                    max: u64::from(conv_w),
                })
                .with_parameter(5));
            }
            let out_h = (conv_h - pool.window_h) / pool.stride_h + 1;
            let out_w = (conv_w - pool.window_w) / pool.stride_w + 1;
            Shape::from_flat(
                &[conv.at(Axis::N)?, out_h, out_w, conv.at(Axis::D)?],
                LayoutOrder::Ordered(vec![Axis::N, Axis::H, Axis::W, Axis::D]),
            )
        }
        OperationParams::Affine(_) | OperationParams::Deinterleave(_) => Ok(conv.clone()),
    }
}

/// Derived output volume of a compiled descriptor.
///
/// # Errors
///
/// Never fails for descriptors produced by [`compile`]; the `Result` exists
/// because the derivation re-runs on the stored operation.
pub fn derived_volume(desc: &LayerDescriptor, kind: VolumeKind) -> Result<Shape> {
    let conv = conv_volume(desc.operation())?;
    match kind {
        VolumeKind::Convolution => Ok(conv),
        VolumeKind::Pooling => pool_volume(desc.operation(), &conv),
    }
}

/// Net element count of one region for a compiled descriptor.
///
/// Counts are per micro-thread and exclude the working-group and thread
/// replication applied when the gross byte sizes were computed. Regions the
/// operation does not use report zero.
#[must_use]
pub fn region_element_count(desc: &LayerDescriptor, region: Region, cfg: &HwConfig) -> u64 {
    let op = desc.operation();
    match region {
        Region::Kmem => kn_elements(op).unwrap_or(0),
        Region::Cmem => cn_elements(op, cfg).map_or(0, |(n, _)| n),
        Region::Pmem => conv_volume(op)
            .and_then(|conv| pn_elements(op, cfg, &conv))
            .unwrap_or(0),
    }
}

fn activation_bytes(op: &Operation) -> u32 {
    op.input().mode().size_bytes()
}

fn weight_bytes(op: &Operation) -> u32 {
    op.weights().mode().size_bytes()
}

/// Narrow a derived extent back to the descriptor field width.
fn narrow_extent(value: u64) -> Result<u32> {
    u32::try_from(value).map_err(|_| {
        ModelError::new(ErrorReason::ValueAboveRange {
            value,
            max: u64::from(u32::MAX),
        })
    })
}

fn require_nonzero(value: u32, parameter: u32) -> Result<()> {
    if value == 0 {
        return Err(ModelError::new(ErrorReason::ValueBelowRange { value: 0, min: 1 })
            .with_parameter(parameter));
    }
    Ok(())
}

/// Coefficients each kernel contributes to KMEM, before lane rounding.
fn kernel_coefficients(op: &Operation) -> Result<u64> {
    match op.params() {
        // One affine "kernel" is one weight-matrix row.
        OperationParams::Affine(_) => Ok(u64::from(op.weights().shape().at(Axis::W)?)),
        OperationParams::Cnn1D(_) => Ok(u64::from(op.weights().shape().at(Axis::W)?)),
        OperationParams::Cnn2D(_) => {
            let shape = op.weights().shape();
            Ok(u64::from(shape.at(Axis::H)?)
                * u64::from(shape.at(Axis::W)?)
                * u64::from(shape.at(Axis::D)?))
        }
        OperationParams::Deinterleave(_) => Ok(0),
    }
}

/// Kernels the working group must eventually cover.
fn total_kernels(op: &Operation) -> Result<u64> {
    match op.params() {
        OperationParams::Affine(_) => Ok(u64::from(op.weights().shape().at(Axis::H)?)),
        OperationParams::Cnn1D(_) | OperationParams::Cnn2D(_) => {
            Ok(u64::from(op.weights().shape().at(Axis::N)?))
        }
        OperationParams::Deinterleave(_) => Ok(0),
    }
}

/// Per-kernel KMEM element count: coefficients rounded up to a whole
/// datapath fetch lane.
fn kn_elements(op: &Operation) -> Result<u64> {
    let wt = weight_bytes(op);
    if wt == 0 {
        return Ok(0);
    }
    let lane = u64::from(engine::DATAPATH_WIDTH_BYTES / wt);
    Ok(kernel_coefficients(op)?.div_ceil(lane) * lane)
}

/// Per-thread CMEM element count, plus whether the single-row fast path was
/// taken.
///
/// A 2-D convolution normally stages `kernel_h` padded input rows; when the
/// full working set fits narrow memory and the fast path is enabled, one
/// row suffices because the fetch engine streams the rest in place.
fn cn_elements(op: &Operation, cfg: &HwConfig) -> Result<(u64, bool)> {
    match op.params() {
        OperationParams::Affine(_) | OperationParams::Deinterleave(_) => {
            Ok((u64::from(op.input().shape().at(Axis::H)?), false))
        }
        OperationParams::Cnn1D(_) => Ok((u64::from(op.input().shape().at(Axis::W)?), false)),
        OperationParams::Cnn2D(p) => {
            let in_w = op.input().shape().at(Axis::W)?;
            let in_d = op.input().shape().at(Axis::D)?;
            let k_h = op.weights().shape().at(Axis::H)?;
            let row =
                (u64::from(in_w) + 2 * u64::from(p.pad_w)) * u64::from(in_d);
            let full = u64::from(k_h) * row;
            let act = u64::from(activation_bytes(op));
            let narrow = u64::from(narrow_mem::capacity_bytes(cfg.generation()));
            if cfg.features().cmem_fast_path && full * act <= narrow {
                Ok((row, true))
            } else {
                Ok((full, false))
            }
        }
    }
}

/// Per-thread PMEM element count, including the errata pad. Zero without a
/// pooling stage.
fn pn_elements(op: &Operation, cfg: &HwConfig, conv: &Shape) -> Result<u64> {
    match op.params() {
        OperationParams::Cnn1D(p) => p.pooling.map_or(Ok(0), |pool| {
            Ok(u64::from(pool.window)
                + engine::pmem_pad_elements(cfg.generation(), pool.window))
        }),
        OperationParams::Cnn2D(p) => match p.pooling {
            Some(pool) => Ok(u64::from(pool.window_h) * u64::from(conv.at(Axis::W)?)
                + engine::pmem_pad_elements(cfg.generation(), pool.window_w)),
            None => Ok(0),
        },
        OperationParams::Affine(_) | OperationParams::Deinterleave(_) => Ok(0),
    }
}

/// Size the kernel working group against narrow memory.
///
/// The group is the largest kernel count that (a) respects the generation
/// maximum after errata, (b) fits narrow memory at the per-kernel KMEM
/// footprint, and (c) stays a multiple of the activation-width alignment.
/// Operations without kernels compile with a unit group.
#[allow(clippy::cast_possible_truncation)] // kwg ≤ 16, iterations ≤ kernel count ≤ 65536
fn kwg_sizing(op: &Operation, cfg: &HwConfig, kn: u64) -> Result<(u32, u32)> {
    let total = total_kernels(op)?;
    if total == 0 || kn == 0 {
        return Ok((1, 1));
    }
    let act = activation_bytes(op);
    let align = u64::from(engine::kernel_alignment(act));
    let max = u64::from(engine::kwg_max_effective(
        cfg.generation(),
        weight_bytes(op),
        act,
    ));
    let capacity = u64::from(narrow_mem::capacity_bytes(cfg.generation()));
    let per_kernel = kn * u64::from(weight_bytes(op));
    let fit = capacity / per_kernel;
    let needed = total.div_ceil(align) * align;
    let mut kwg = max.min(fit).min(needed);
    kwg -= kwg % align;
    if kwg == 0 {
        // Not even one aligned group of kernels fits narrow memory.
        return Err(ModelError::new(ErrorReason::MemoryBudgetExceeded {
            requested: per_kernel * align,
            budget: capacity,
        })
        .with_operand(Operand::Weights));
    }
    Ok((kwg as u32, total.div_ceil(kwg) as u32))
}

/// Pick the largest valid micro-thread split whose gross allocation fits
/// unified memory. KMEM is shared across threads; CMEM and PMEM replicate
/// per thread. Falls back to a single thread and lets the planner reject
/// the allocation if even that is over budget.
fn select_uthreads(
    cfg: &HwConfig,
    kmem: u64,
    cmem_per_thread: u64,
    pmem_per_thread: u64,
) -> (u8, u64, u64) {
    for &t in engine::UTHREAD_VALID.iter().rev() {
        let cmem = cmem_per_thread * u64::from(t);
        let pmem = pmem_per_thread * u64::from(t);
        if kmem + cmem + pmem <= cfg.umem_bytes() {
            return (t, cmem, pmem);
        }
    }
    (1, cmem_per_thread, pmem_per_thread)
}

/// Bank-conflict probability estimates for the two PMEM pairings.
///
/// Occupancy heuristic: the chance a pooling access collides with a
/// kernel or convolution access grows with the fraction of unified memory
/// the pair occupies. The fast path halves CMEM traffic; pooling-pack mode
/// interleaves accumulators across banks and halves both. Estimates never
/// gate compilation.
#[allow(clippy::cast_precision_loss)]
fn conflict_probabilities(
    cfg: &HwConfig,
    kmem: u64,
    cmem: u64,
    pmem: u64,
    fast_path: bool,
) -> (f32, f32) {
    if pmem == 0 {
        return (0.0, 0.0);
    }
    let umem = cfg.umem_bytes() as f32;
    let mut kp = ((kmem + pmem) as f32 / umem).clamp(0.0, 1.0);
    let mut cp = ((cmem + pmem) as f32 / umem).clamp(0.0, 1.0);
    if fast_path {
        cp *= 0.5;
    }
    if cfg.features().pmem_pack {
        kp *= 0.5;
        cp *= 0.5;
    }
    (kp, cp)
}

/// Whether the hardware datapath can run this configuration at all.
///
/// A 16-bit-by-16-bit 2-D convolution exceeds the MAC input precision and
/// runs in software only, as does 2-D pooling when the pooling stage is
/// fused off.
fn hardware_representable(op: &Operation, cfg: &HwConfig) -> bool {
    match op.params() {
        OperationParams::Cnn2D(p) => {
            if activation_bytes(op) == 2 && weight_bytes(op) == 2 {
                return false;
            }
            p.pooling.is_none() || cfg.features().pooling_2d
        }
        _ => true,
    }
}
