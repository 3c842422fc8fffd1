//! Compiled layer descriptors.
//!
//! A [`LayerDescriptor`] is created once per accepted operation and is
//! immutable after compilation, which makes it safe to share read-only
//! across software worker threads evaluating the model.

use gna_model::{Operand, Operation, OperationParams, OperationType, Tensor};

/// One of the three disjoint on-chip memory regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    /// Kernel weight rows.
    Kmem,
    /// Convolution working buffers.
    Cmem,
    /// Pooling accumulators.
    Pmem,
}

impl Region {
    /// All regions in allocation order.
    pub const ALL: &'static [Self] = &[Self::Kmem, Self::Cmem, Self::Pmem];
}

/// Which derived volume to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeKind {
    /// Post-convolution volume (`GetCNV`).
    Convolution,
    /// Post-pooling volume (`GetPLV`); equals the convolution volume when
    /// no pooling stage is configured.
    Pooling,
}

/// Gross unified-memory allocation across the three regions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UMemAlloc {
    /// Bytes for all live kernel rows.
    pub kmem_bytes: u32,
    /// Bytes for all live convolution working-buffer rows.
    pub cmem_bytes: u32,
    /// Bytes for all live pooling-accumulator rows.
    pub pmem_bytes: u32,
    /// Sum of the three regions.
    pub total_bytes: u32,
    /// Estimated probability of KMEM/PMEM bank overlap, in [0, 1].
    pub prb_kp_conflict: f32,
    /// Estimated probability of CMEM/PMEM bank overlap, in [0, 1].
    pub prb_cp_conflict: f32,
}

impl UMemAlloc {
    /// Gross bytes for one region.
    #[must_use]
    pub const fn region_bytes(&self, region: Region) -> u32 {
        match region {
            Region::Kmem => self.kmem_bytes,
            Region::Cmem => self.cmem_bytes,
            Region::Pmem => self.pmem_bytes,
        }
    }
}

/// Hardware-adaptation record attached to a compiled descriptor.
///
/// When `valid` is false the descriptor cannot be dispatched to hardware;
/// the derived fields are still populated so software fallback execution
/// can reuse them, but hardware paths must not consume the record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdaptHw {
    /// True when the descriptor is executable on the configured device.
    pub valid: bool,
    /// MAC-array datapath width in bytes.
    pub datapath_width: u32,
    /// Kernels processed together per iteration.
    pub kwg: u32,
    /// Iterations needed to cover all kernels.
    pub kwg_iter: u32,
    /// Micro-threads the iteration is split across (4-bit field, ≤ 15).
    pub uthreads: u8,
    /// Base offsets of KMEM, CMEM and PMEM within unified memory.
    pub base_offsets: [u32; 3],
    /// Gross region allocation and conflict estimates.
    pub alloc: UMemAlloc,
}

/// The compiled, hardware-facing record for one operation.
#[derive(Debug, Clone)]
pub struct LayerDescriptor {
    operation: Operation,
    adapt: AdaptHw,
}

impl LayerDescriptor {
    pub(crate) fn new(operation: Operation, adapt: AdaptHw) -> Self {
        Self { operation, adapt }
    }

    /// Operation type tag.
    #[must_use]
    pub const fn op_type(&self) -> OperationType {
        self.operation.op_type()
    }

    /// Operation parameters.
    #[must_use]
    pub const fn params(&self) -> &OperationParams {
        self.operation.params()
    }

    /// One of the four descriptor tensors.
    #[must_use]
    pub const fn tensor(&self, operand: Operand) -> &Tensor {
        self.operation.tensor(operand)
    }

    /// The validated operation this descriptor was compiled from.
    #[must_use]
    pub const fn operation(&self) -> &Operation {
        &self.operation
    }

    /// The hardware-adaptation record.
    #[must_use]
    pub const fn adapt(&self) -> &AdaptHw {
        &self.adapt
    }
}
