//! Tensors and caller-owned buffer handles.

use crate::data_mode::{DataMode, TensorMode};
use crate::shape::Shape;

/// Opaque reference to a caller-owned data buffer.
///
/// The library never dereferences or frees this memory; the numeric address
/// exists only for alignment and containment checks at validation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Buffer {
    addr: usize,
    size_bytes: u64,
}

impl Buffer {
    /// The null buffer, used with disabled tensors.
    pub const NONE: Self = Self {
        addr: 0,
        size_bytes: 0,
    };

    /// Wrap a caller-owned region.
    #[must_use]
    pub const fn new(addr: usize, size_bytes: u64) -> Self {
        Self { addr, size_bytes }
    }

    /// Numeric address of the region.
    #[must_use]
    pub const fn addr(&self) -> usize {
        self.addr
    }

    /// Declared size of the region in bytes.
    #[must_use]
    pub const fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// True for the null buffer.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        self.addr == 0
    }
}

/// Shape + data mode + caller-owned buffer.
///
/// A tensor is logically owned by the [`crate::Operation`] that declares it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tensor {
    shape: Shape,
    mode: DataMode,
    buffer: Buffer,
}

impl Tensor {
    /// Assemble a tensor. No checks happen here; the validator applies the
    /// capability envelope later.
    #[must_use]
    pub const fn new(shape: Shape, mode: DataMode, buffer: Buffer) -> Self {
        Self {
            shape,
            mode,
            buffer,
        }
    }

    /// Disabled placeholder tensor: scalar shape, no data, null buffer.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            shape: Shape::scalar(),
            mode: DataMode::DISABLED,
            buffer: Buffer::NONE,
        }
    }

    /// The tensor's shape.
    #[must_use]
    pub const fn shape(&self) -> &Shape {
        &self.shape
    }

    /// The tensor's data mode.
    #[must_use]
    pub const fn mode(&self) -> &DataMode {
        &self.mode
    }

    /// The caller-owned buffer handle.
    #[must_use]
    pub const fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    /// Bytes of buffer the hardware will consume for this tensor.
    ///
    /// Bit-packed types round up to whole bytes; disabled tensors consume
    /// nothing and constant-scalar tensors consume a single element.
    #[must_use]
    pub fn required_bytes(&self) -> u64 {
        match self.mode.mode() {
            TensorMode::Disabled => 0,
            TensorMode::ConstantScalar => u64::from(self.mode.data_type().size_bytes()),
            TensorMode::Default => {
                let bits = self.shape.num_elements() * u64::from(self.mode.data_type().bits());
                bits.div_ceil(8)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_mode::DataType;
    use crate::layout::LayoutOrder;

    fn shape(extents: &[u32], order: &str) -> Shape {
        Shape::from_flat(extents, order.parse().unwrap()).unwrap()
    }

    #[test]
    fn required_bytes_follow_precision() {
        let s = shape(&[4, 8], "NH");
        let t16 = Tensor::new(s.clone(), DataMode::new(DataType::I16), Buffer::new(64, 64));
        assert_eq!(t16.required_bytes(), 64);
        let t4 = Tensor::new(s, DataMode::new(DataType::I4), Buffer::new(64, 16));
        assert_eq!(t4.required_bytes(), 16);
    }

    #[test]
    fn packed_bits_round_up() {
        let s = shape(&[3], "H");
        let t = Tensor::new(s, DataMode::new(DataType::I4), Buffer::new(64, 2));
        assert_eq!(t.required_bytes(), 2);
    }

    #[test]
    fn disabled_consumes_nothing() {
        let t = Tensor::disabled();
        assert_eq!(t.required_bytes(), 0);
        assert!(t.buffer().is_null());
        assert_eq!(t.shape().num_elements(), 0);
    }

    #[test]
    fn constant_scalar_consumes_one_element() {
        let s = shape(&[128], "H");
        let t = Tensor::new(s, DataMode::constant_scalar(), Buffer::new(64, 1));
        assert_eq!(t.required_bytes(), 1);
    }

    #[test]
    fn any_order_tensor_builds() {
        let s = Shape::from_flat(&[8, 6, 1], LayoutOrder::Any).unwrap();
        let t = Tensor::new(s, DataMode::new(DataType::I8), Buffer::new(64, 48));
        assert_eq!(t.required_bytes(), 48);
    }
}
