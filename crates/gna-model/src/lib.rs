#![deny(unsafe_code)]

//! Value types for the GNA accelerator library.
//!
//! A user-declared operation is a set of [`Tensor`]s (shape + data mode +
//! caller-owned buffer handle) plus an operation-specific parameter variant.
//! Everything in this crate is a plain value: construction never touches
//! hardware, and validation lives in `gna-compiler`.
//!
//! # Example
//!
//! ```
//! use gna_model::{DataMode, DataType, LayoutOrder, Shape, Tensor, Buffer};
//!
//! # fn main() -> gna_model::Result<()> {
//! let order: LayoutOrder = "NHW".parse()?;
//! let shape = Shape::from_flat(&[1, 8, 6], order)?;
//! let input = Tensor::new(shape, DataMode::new(DataType::I16), Buffer::new(0x1000, 96));
//! assert_eq!(input.shape().num_elements(), 48);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

mod data_mode;
mod error;
mod layout;
mod operation;
mod shape;
mod tensor;

pub use data_mode::{DataMode, DataType, TensorMode, CONSTANT_SCALAR_TYPE};
pub use error::{ErrorLocation, ErrorReason, ModelError, Result};
pub use layout::{Axis, LayoutOrder, MAX_AXES};
pub use operation::{
    AffineParams, Cnn1DParams, Cnn2DParams, DeinterleaveParams, Operand, Operation,
    OperationParams, OperationType, Pooling1DParams, Pooling2DParams, PoolingMode,
};
pub use shape::Shape;
pub use tensor::{Buffer, Tensor};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::{
        Axis, Buffer, DataMode, DataType, LayoutOrder, ModelError, Operand, Operation,
        OperationParams, OperationType, Result, Shape, Tensor, TensorMode,
    };
}
