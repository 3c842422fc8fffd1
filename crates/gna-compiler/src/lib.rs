//! Capability validation and descriptor compilation for GNA accelerators.
//!
//! The crate takes declared operations from `gna-model`, validates them
//! against per-generation capability tables, and lowers accepted operations
//! into hardware descriptors: derived output volumes, a kernel working
//! group sized against narrow memory, a micro-thread split, and a
//! unified-memory partition across the KMEM/CMEM/PMEM regions.
//!
//! # Pipeline
//!
//! ```text
//! Operation ──▶ validator (capability tables, positioned errors)
//!           ──▶ uarch     (volumes, KWG sizing, micro-threads)
//!           ──▶ planner   (unified-memory budget, region offsets)
//!           ──▶ LayerDescriptor (+ optional abi wire blob)
//! ```
//!
//! # Quick start
//!
//! ```
//! use gna_compiler::{compile, HwConfig, Region, VolumeKind};
//! use gna_hw::Generation;
//! use gna_model::{
//!     AffineParams, Buffer, DataMode, DataType, Operation, OperationParams, Shape, Tensor,
//! };
//!
//! # fn main() -> gna_model::Result<()> {
//! let tensor = |extents: &[u32], order: &str, ty| -> gna_model::Result<Tensor> {
//!     let shape = Shape::from_flat(extents, order.parse()?)?;
//!     Ok(Tensor::new(shape, DataMode::new(ty), Buffer::new(0x1000, 1 << 20)))
//! };
//! let op = Operation::new(
//!     OperationParams::Affine(AffineParams),
//!     tensor(&[16, 1], "HN", DataType::I16)?,
//!     tensor(&[8, 16], "HW", DataType::I16)?,
//!     tensor(&[8], "H", DataType::I32)?,
//!     tensor(&[8, 1], "HN", DataType::I32)?,
//! );
//!
//! let cfg = HwConfig::new(Generation::Gna3_0);
//! let desc = compile(&op, &cfg)?;
//! assert_eq!(desc.adapt().kwg, 8);
//! # Ok(())
//! # }
//! ```
//!
//! A missing device never fails compilation; the descriptor comes back
//! with [`AdaptHw::valid`] cleared and every derived field populated for
//! the software fallback.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod abi;
mod caps;
mod config;
mod descriptor;
mod perf;
mod planner;
mod uarch;
mod validator;

pub use caps::{
    allowed_types, axis_limits, lookup, AxisLimits, OperationCaps, RangeLimits, TensorCaps,
    BUFFER_ALIGN_BYTES,
};
pub use config::{Features, HwConfig};
pub use descriptor::{AdaptHw, LayerDescriptor, Region, UMemAlloc, VolumeKind};
pub use perf::{PerfEstimate, PerfModel, ReferencePerfModel};
pub use planner::{plan_regions, RegionPlan};
pub use uarch::{compile, conv_volume, derived_volume, pool_volume, region_element_count};
pub use validator::validate_operation;

/// Commonly used types.
pub mod prelude {
    pub use crate::{
        compile, derived_volume, region_element_count, validate_operation, AdaptHw, Features,
        HwConfig, LayerDescriptor, PerfEstimate, PerfModel, ReferencePerfModel, Region,
        VolumeKind,
    };
    pub use gna_hw::Generation;
    pub use gna_model::{Operation, OperationParams, Result};
}
