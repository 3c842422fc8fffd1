//! Wire encoding of compiled descriptors.
//!
//! Fixed-layout little-endian blob consumed by the kernel-mode driver and
//! by offline inspection tooling. Every field has a fixed offset; optional
//! stages encode as zeroed space rather than variable length, so the blob
//! size is a constant.
//!
//! ```text
//! offset  size  field
//! ──────────────────────────────────────────────
//!      0     4  magic "GNA1"
//!      4     1  operation tag
//!      5     1  valid flag
//!      6     1  micro-thread count
//!      7     1  reserved
//!      8   240  four tensor records, 60 B each
//!    248    40  operation parameters
//!    288    48  hardware-adaptation record
//!    336     8  performance-extension pointer (reserved)
//! ──────────────────────────────────────────────
//!    344 total
//! ```
//!
//! Each tensor record: 8 B of axis letters (zero padded), eight u32
//! extents, one byte each of element-type code, mode code, axis count and
//! reserved, then the buffer address and size as u64.

use crate::descriptor::LayerDescriptor;
use bytes::{BufMut, Bytes, BytesMut};
use gna_model::{
    DataType, LayoutOrder, Operand, OperationParams, OperationType, PoolingMode, Tensor,
    TensorMode,
};

/// Blob magic, "GNA1" in byte order.
pub const MAGIC: [u8; 4] = *b"GNA1";

/// Header size in bytes.
pub const HEADER_BYTES: usize = 8;
/// Size of one encoded tensor record.
pub const TENSOR_RECORD_BYTES: usize = 60;
/// Size of the operation-parameter block.
pub const PARAMS_BYTES: usize = 40;
/// Size of the hardware-adaptation block.
pub const ADAPT_BYTES: usize = 48;
/// Total blob size.
pub const BLOB_BYTES: usize =
    HEADER_BYTES + 4 * TENSOR_RECORD_BYTES + PARAMS_BYTES + ADAPT_BYTES + 8;

/// Encode a compiled descriptor into its wire blob.
#[must_use]
pub fn encode(desc: &LayerDescriptor) -> Bytes {
    let mut buf = BytesMut::with_capacity(BLOB_BYTES);
    buf.put_slice(&MAGIC);
    buf.put_u8(op_code(desc.op_type()));
    buf.put_u8(u8::from(desc.adapt().valid));
    buf.put_u8(desc.adapt().uthreads);
    buf.put_u8(0);

    for &operand in Operand::ALL {
        put_tensor(&mut buf, desc.tensor(operand));
    }
    put_params(&mut buf, desc.params());
    put_adapt(&mut buf, desc);

    // Performance-extension pointer, filled in by the dispatch layer.
    buf.put_u64_le(0);
    debug_assert_eq!(buf.len(), BLOB_BYTES);
    buf.freeze()
}

fn put_tensor(buf: &mut BytesMut, tensor: &Tensor) {
    let mut letters = [0u8; 8];
    if let LayoutOrder::Ordered(axes) = tensor.shape().order() {
        for (slot, axis) in letters.iter_mut().zip(axes) {
            *slot = axis.letter() as u8;
        }
    }
    buf.put_slice(&letters);

    let extents = tensor.shape().extents();
    for i in 0..8 {
        buf.put_u32_le(extents.get(i).copied().unwrap_or(0));
    }

    buf.put_u8(type_code(tensor.mode().data_type()));
    buf.put_u8(mode_code(tensor.mode().mode()));
    buf.put_u8(u8::try_from(tensor.shape().num_axes()).unwrap_or(u8::MAX));
    buf.put_u8(0);
    buf.put_u64_le(tensor.buffer().addr() as u64);
    buf.put_u64_le(tensor.buffer().size_bytes());
}

fn put_params(buf: &mut BytesMut, params: &OperationParams) {
    let start = buf.len();
    match params {
        OperationParams::Affine(_) | OperationParams::Deinterleave(_) => {}
        OperationParams::Cnn1D(p) => {
            buf.put_u32_le(p.stride);
            if let Some(pool) = p.pooling {
                buf.put_u32_le(pooling_code(pool.mode));
                buf.put_u32_le(pool.window);
                buf.put_u32_le(pool.stride);
            }
        }
        OperationParams::Cnn2D(p) => {
            buf.put_u32_le(p.stride_h);
            buf.put_u32_le(p.stride_w);
            buf.put_u32_le(p.pad_h);
            buf.put_u32_le(p.pad_w);
            if let Some(pool) = p.pooling {
                buf.put_u32_le(pooling_code(pool.mode));
                buf.put_u32_le(pool.window_h);
                buf.put_u32_le(pool.window_w);
                buf.put_u32_le(pool.stride_h);
                buf.put_u32_le(pool.stride_w);
            }
        }
    }
    buf.put_bytes(0, PARAMS_BYTES - (buf.len() - start));
}

fn put_adapt(buf: &mut BytesMut, desc: &LayerDescriptor) {
    let adapt = desc.adapt();
    buf.put_u32_le(adapt.datapath_width);
    buf.put_u32_le(adapt.kwg);
    buf.put_u32_le(adapt.kwg_iter);
    for offset in adapt.base_offsets {
        buf.put_u32_le(offset);
    }
    buf.put_u32_le(adapt.alloc.kmem_bytes);
    buf.put_u32_le(adapt.alloc.cmem_bytes);
    buf.put_u32_le(adapt.alloc.pmem_bytes);
    buf.put_u32_le(adapt.alloc.total_bytes);
    buf.put_f32_le(adapt.alloc.prb_kp_conflict);
    buf.put_f32_le(adapt.alloc.prb_cp_conflict);
}

const fn op_code(op: OperationType) -> u8 {
    match op {
        OperationType::Affine => 0,
        OperationType::Cnn1D => 1,
        OperationType::Cnn2D => 2,
        OperationType::Deinterleave => 3,
    }
}

const fn type_code(ty: DataType) -> u8 {
    match ty {
        DataType::None => 0,
        DataType::I4 => 1,
        DataType::I8 => 2,
        DataType::I16 => 3,
        DataType::I32 => 4,
        DataType::I64 => 5,
        DataType::U4 => 6,
        DataType::U8 => 7,
        DataType::U16 => 8,
        DataType::U32 => 9,
        DataType::U64 => 10,
        DataType::CompoundBias => 11,
        DataType::PwlSegment => 12,
        DataType::WeightScaleFactor => 13,
    }
}

const fn mode_code(mode: TensorMode) -> u8 {
    match mode {
        TensorMode::Default => 0,
        TensorMode::Disabled => 1,
        TensorMode::ConstantScalar => 2,
    }
}

const fn pooling_code(mode: PoolingMode) -> u32 {
    match mode {
        PoolingMode::Max => 1,
        PoolingMode::Sum => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HwConfig;
    use crate::uarch::compile;
    use gna_hw::Generation;
    use gna_model::{
        Buffer, Cnn2DParams, DataMode, Operation, Pooling2DParams, Shape,
    };

    fn tensor(extents: &[u32], order: &str, ty: DataType) -> Tensor {
        let shape = Shape::from_flat(extents, order.parse().unwrap()).unwrap();
        Tensor::new(shape, DataMode::new(ty), Buffer::new(0x1000, 1 << 24))
    }

    fn example() -> LayerDescriptor {
        let op = Operation::new(
            OperationParams::Cnn2D(Cnn2DParams {
                stride_h: 1,
                stride_w: 1,
                pad_h: 0,
                pad_w: 0,
                pooling: Some(Pooling2DParams {
                    mode: PoolingMode::Max,
                    window_h: 2,
                    window_w: 2,
                    stride_h: 1,
                    stride_w: 1,
                }),
            }),
            tensor(&[1, 8, 6, 1], "NHWD", DataType::I8),
            tensor(&[3, 2, 2, 1], "NHWD", DataType::I8),
            tensor(&[3], "N", DataType::I32),
            tensor(&[1, 6, 4, 3], "NHWD", DataType::I32),
        );
        let cfg = HwConfig::new(Generation::Gna3_0).with_device_present(true);
        compile(&op, &cfg).unwrap()
    }

    #[test]
    fn blob_is_fixed_size() {
        assert_eq!(BLOB_BYTES, 344);
        assert_eq!(encode(&example()).len(), BLOB_BYTES);
    }

    #[test]
    fn header_fields() {
        let blob = encode(&example());
        assert_eq!(&blob[0..4], b"GNA1");
        assert_eq!(blob[4], 2); // Cnn2D
        assert_eq!(blob[5], 1); // valid
        assert_eq!(blob[6], 8); // uthreads
        assert_eq!(blob[7], 0);
    }

    #[test]
    fn input_record_layout() {
        let blob = encode(&example());
        // First tensor record starts right after the header.
        assert_eq!(&blob[8..12], b"NHWD");
        assert_eq!(&blob[12..16], &[0, 0, 0, 0]);
        let extents: Vec<u32> = blob[16..32]
            .chunks(4)
            .map(|c| u32::from_le_bytes(c.try_into().unwrap()))
            .collect();
        assert_eq!(extents, vec![1, 8, 6, 1]);
        assert_eq!(blob[48], 2); // int8 type code
        assert_eq!(blob[49], 0); // default mode
        assert_eq!(blob[50], 4); // four axes
    }

    #[test]
    fn adapt_block_layout() {
        let blob = encode(&example());
        let at = |offset: usize| {
            u32::from_le_bytes(blob[offset..offset + 4].try_into().unwrap())
        };
        let adapt = HEADER_BYTES + 4 * TENSOR_RECORD_BYTES + PARAMS_BYTES;
        assert_eq!(at(adapt), 64); // datapath width
        assert_eq!(at(adapt + 4), 4); // kwg
        assert_eq!(at(adapt + 8), 1); // kwg_iter
        assert_eq!(at(adapt + 12), 0); // kmem base
        assert_eq!(at(adapt + 16), 256); // cmem base
        assert_eq!(at(adapt + 20), 304); // pmem base
        assert_eq!(at(adapt + 36), 624); // total bytes
    }

    #[test]
    fn extension_pointer_is_reserved() {
        let blob = encode(&example());
        assert_eq!(&blob[BLOB_BYTES - 8..], &[0u8; 8]);
    }

    #[test]
    fn encoding_is_deterministic() {
        let a = encode(&example());
        let b = encode(&example());
        assert_eq!(a, b);
    }
}
