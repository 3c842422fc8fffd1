//! Performance estimation seam.
//!
//! Estimation is a trait so callers can swap the built-in reference model
//! for one calibrated against measured silicon. The reference model is a
//! first-order throughput estimate from the descriptor's derived fields; it
//! never influences compilation.

use crate::config::HwConfig;
use crate::descriptor::LayerDescriptor;
use gna_hw::engine;
use gna_model::{Axis, OperationParams};

/// Cost estimate for executing one compiled layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PerfEstimate {
    /// Estimated compute cycles.
    pub cycles: u64,
    /// Bytes streamed in from system memory, including kernel re-fetches
    /// across working-group iterations.
    pub bytes_read: u64,
    /// Bytes written back to system memory.
    pub bytes_written: u64,
}

/// A model that prices compiled descriptors.
pub trait PerfModel {
    /// Estimate the cost of one layer on the configured device.
    fn estimate(&self, desc: &LayerDescriptor, cfg: &HwConfig) -> PerfEstimate;
}

/// First-order reference model: MAC throughput bound by datapath lanes,
/// traffic from the declared tensor footprints.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferencePerfModel;

impl PerfModel for ReferencePerfModel {
    fn estimate(&self, desc: &LayerDescriptor, cfg: &HwConfig) -> PerfEstimate {
        let op = desc.operation();
        let macs = mac_count(desc);
        let act = u64::from(op.input().mode().size_bytes().max(1));
        let lanes =
            u64::from(engine::DATAPATH_WIDTH_BYTES) / act * u64::from(cfg.engine_count());
        let cycles = if macs == 0 {
            // Pure data movement prices one element per cycle.
            op.input().shape().num_elements()
        } else {
            macs.div_ceil(lanes.max(1))
        };

        // The input volume is re-streamed once per working-group iteration.
        let iters = u64::from(desc.adapt().kwg_iter);
        let bytes_read = op.input().required_bytes() * iters
            + op.weights().required_bytes()
            + op.biases().required_bytes();
        PerfEstimate {
            cycles,
            bytes_read,
            bytes_written: op.output().required_bytes(),
        }
    }
}

/// Multiply-accumulate operations the layer performs.
fn mac_count(desc: &LayerDescriptor) -> u64 {
    let op = desc.operation();
    let weights = op.weights().shape();
    match op.params() {
        OperationParams::Affine(_) => {
            weights.num_elements() * u64::from(op.input().shape().at(Axis::N).unwrap_or(1))
        }
        OperationParams::Cnn1D(_) | OperationParams::Cnn2D(_) => {
            let conv = crate::uarch::derived_volume(desc, crate::descriptor::VolumeKind::Convolution);
            let per_kernel = match op.params() {
                OperationParams::Cnn2D(_) => {
                    weights.num_elements() / u64::from(weights.at(Axis::N).unwrap_or(1)).max(1)
                }
                _ => u64::from(weights.at(Axis::W).unwrap_or(0)),
            };
            conv.map_or(0, |v| v.num_elements() * per_kernel)
        }
        OperationParams::Deinterleave(_) => 0,
    }
}
