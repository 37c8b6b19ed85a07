//! # RNN Layers
//!
//! Recurrent cells and the layers that run them, on top of the Burn
//! framework.
//!
//! ## Features
//!
//! - **Cells**: basic (tanh / relu / sigmoid / LeCun tanh), GRU and LSTM
//! - **StackedCell**: chains cells into one; each cell keeps its own state
//! - **ResidualCell**: adds a cell's input back onto its output
//! - **BidirectionalRnn**: forward and backward cell over the same sequence,
//!   optionally with outputs concatenated on the feature axis
//! - **Variable lengths**: per-row sequence lengths mask outputs and freeze
//!   states past the end of each row
//! - **Lazy instantiation**: cell blueprints are built against the first input
//!   width a layer sees
//!
//! ## Quick Start
//!
//! ```rust
//! use burn::backend::NdArray;
//! use burn::tensor::Tensor;
//! use rnn_layers::prelude::*;
//!
//! type Backend = NdArray<f32>;
//! let device = Default::default();
//!
//! let birnn = BidirectionalRnn::<Backend, _, _>::new(
//!     "encoder",
//!     LstmCellConfig::new(16),
//!     LstmCellConfig::new(16),
//! )
//! .with_concatenated_outputs();
//!
//! // [batch=2, seq=5, features=8]
//! let input = Tensor::<Backend, 3>::zeros([2, 5, 8], &device);
//! let result = birnn.forward(input).unwrap();
//!
//! assert_eq!(result.output.dims(), [2, 5, 32]);
//! ```
//!
//! ## Cell-level Usage
//!
//! ```ignore
//! use rnn_layers::cells::{GruCell, LstmCell, RnnCell, StackedCell};
//!
//! let stack = StackedCell::<Backend, _>::new(
//!     "stack",
//!     vec![GruCell::new(16, 32, &device), GruCell::new(32, 8, &device)],
//! )?;
//! let step = stack.step(input, stack.zero_state(batch, &device))?;
//! // step.output: [batch, 8], step.state: one state per cell
//! ```

pub mod activation;
pub mod cells;
pub mod error;
pub mod rnn;
pub mod scope;
pub mod structure;

pub use error::{Result, RnnError};

pub mod prelude {
    pub use crate::activation::{Activation, LeCun};
    pub use crate::cells::{
        BasicRnnCell, BasicRnnCellConfig, CellBuilder, GruCell, GruCellConfig, LazyCell,
        LstmCell, LstmCellConfig, Prebuilt, ResidualCell, ResidualCellConfig, RnnCell,
        StackedCell, StackedCellConfig,
    };
    pub use crate::error::RnnError;
    pub use crate::rnn::{BidirectionalRnn, ConcatenatedBidirectionalRnn, Rnn, RnnOptions};
    pub use crate::structure::{CellState, RnnOutput};
}
