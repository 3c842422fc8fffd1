//! Element precision and tensor interpretation modes.

use crate::error::{ErrorReason, ModelError, Result};

/// Element type required when a tensor is declared constant-scalar.
pub const CONSTANT_SCALAR_TYPE: DataType = DataType::I8;

/// Element precision / format tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// Signed 4-bit integer (packed two per byte).
    I4,
    /// Signed 8-bit integer.
    I8,
    /// Signed 16-bit integer.
    I16,
    /// Signed 32-bit integer.
    I32,
    /// Signed 64-bit integer.
    I64,
    /// Unsigned 4-bit integer (packed two per byte).
    U4,
    /// Unsigned 8-bit integer.
    U8,
    /// Unsigned 16-bit integer.
    U16,
    /// Unsigned 32-bit integer.
    U32,
    /// Unsigned 64-bit integer.
    U64,
    /// Compound bias record (bias value + scale + padding), 8 bytes.
    CompoundBias,
    /// Piecewise-linear activation segment, 8 bytes.
    PwlSegment,
    /// Per-kernel weight scale factor, 8 bytes.
    WeightScaleFactor,
    /// No data. Only legal with [`TensorMode::Disabled`].
    None,
}

impl DataType {
    /// Element width in bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        match self {
            Self::I4 | Self::U4 => 4,
            Self::I8 | Self::U8 => 8,
            Self::I16 | Self::U16 => 16,
            Self::I32 | Self::U32 => 32,
            Self::I64 | Self::U64 | Self::CompoundBias | Self::PwlSegment
            | Self::WeightScaleFactor => 64,
            Self::None => 0,
        }
    }

    /// Element footprint in bytes as the hardware addresses it.
    ///
    /// 4-bit types occupy a whole byte from the addressing point of view;
    /// packing is handled by the element-count math in the compiler.
    #[must_use]
    pub const fn size_bytes(self) -> u32 {
        match self.bits() {
            0 => 0,
            bits => bits.div_ceil(8),
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::I4 => "int4",
            Self::I8 => "int8",
            Self::I16 => "int16",
            Self::I32 => "int32",
            Self::I64 => "int64",
            Self::U4 => "uint4",
            Self::U8 => "uint8",
            Self::U16 => "uint16",
            Self::U32 => "uint32",
            Self::U64 => "uint64",
            Self::CompoundBias => "compound-bias",
            Self::PwlSegment => "pwl-segment",
            Self::WeightScaleFactor => "weight-scale-factor",
            Self::None => "none",
        };
        f.write_str(name)
    }
}

/// How a tensor's data is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TensorMode {
    /// Full tensor data consumed from the buffer.
    Default,
    /// No data consumed; the tensor is a placeholder.
    Disabled,
    /// A single scalar value substitutes for the whole tensor.
    ConstantScalar,
}

/// Element type + interpretation mode + derived element size.
///
/// The size is derived from the type at construction and always matches the
/// footprint the hardware expects; it is never set independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DataMode {
    data_type: DataType,
    mode: TensorMode,
    size_bytes: u32,
}

impl DataMode {
    /// Disabled placeholder mode: no type, no data.
    pub const DISABLED: Self = Self {
        data_type: DataType::None,
        mode: TensorMode::Disabled,
        size_bytes: 0,
    };

    /// Default-mode tensor of the given element type.
    #[must_use]
    pub const fn new(data_type: DataType) -> Self {
        Self {
            data_type,
            mode: TensorMode::Default,
            size_bytes: data_type.size_bytes(),
        }
    }

    /// Constant-scalar mode. The element type is fixed to
    /// [`CONSTANT_SCALAR_TYPE`] by the hardware.
    #[must_use]
    pub const fn constant_scalar() -> Self {
        Self {
            data_type: CONSTANT_SCALAR_TYPE,
            mode: TensorMode::ConstantScalar,
            size_bytes: CONSTANT_SCALAR_TYPE.size_bytes(),
        }
    }

    /// Build a mode/type pair, enforcing the co-constraints:
    /// `Disabled` forces `DataType::None`, `ConstantScalar` forces
    /// [`CONSTANT_SCALAR_TYPE`].
    ///
    /// # Errors
    ///
    /// Returns `NotInAllowedSet` when the pair violates a co-constraint.
    pub fn with_mode(data_type: DataType, mode: TensorMode) -> Result<Self> {
        match mode {
            TensorMode::Default => {
                if data_type == DataType::None {
                    return Err(ModelError::new(ErrorReason::NotInAllowedSet));
                }
                Ok(Self::new(data_type))
            }
            TensorMode::Disabled => {
                if data_type != DataType::None {
                    return Err(ModelError::new(ErrorReason::NotInAllowedSet));
                }
                Ok(Self::DISABLED)
            }
            TensorMode::ConstantScalar => {
                if data_type != CONSTANT_SCALAR_TYPE {
                    return Err(ModelError::new(ErrorReason::NotInAllowedSet));
                }
                Ok(Self::constant_scalar())
            }
        }
    }

    /// Element type tag.
    #[must_use]
    pub const fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Interpretation mode.
    #[must_use]
    pub const fn mode(&self) -> TensorMode {
        self.mode
    }

    /// Element footprint in bytes.
    #[must_use]
    pub const fn size_bytes(&self) -> u32 {
        self.size_bytes
    }

    /// True when no buffer data is consumed.
    #[must_use]
    pub const fn is_disabled(&self) -> bool {
        matches!(self.mode, TensorMode::Disabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_follows_type() {
        assert_eq!(DataMode::new(DataType::I16).size_bytes(), 2);
        assert_eq!(DataMode::new(DataType::CompoundBias).size_bytes(), 8);
        assert_eq!(DataMode::new(DataType::I4).size_bytes(), 1);
        assert_eq!(DataMode::DISABLED.size_bytes(), 0);
    }

    #[test]
    fn disabled_forces_none_type() {
        assert!(DataMode::with_mode(DataType::I8, TensorMode::Disabled).is_err());
        let m = DataMode::with_mode(DataType::None, TensorMode::Disabled).unwrap();
        assert_eq!(m, DataMode::DISABLED);
    }

    #[test]
    fn constant_scalar_forces_narrow_type() {
        assert!(DataMode::with_mode(DataType::I32, TensorMode::ConstantScalar).is_err());
        let m = DataMode::with_mode(CONSTANT_SCALAR_TYPE, TensorMode::ConstantScalar).unwrap();
        assert_eq!(m.data_type(), DataType::I8);
        assert_eq!(m.size_bytes(), 1);
    }

    #[test]
    fn default_rejects_none_type() {
        assert!(DataMode::with_mode(DataType::None, TensorMode::Default).is_err());
    }

    #[test]
    fn four_bit_types_pack_two_per_byte() {
        assert_eq!(DataType::I4.bits(), 4);
        assert_eq!(DataType::I4.size_bytes(), 1);
    }
}
