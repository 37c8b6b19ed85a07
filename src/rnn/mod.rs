//! # RNN Layers for Sequence Processing
//!
//! This module provides the layers that unroll cells over whole sequences,
//! and the [`engine`] primitives they delegate to.
//!
//! ## Available Layers
//!
//! | Layer | Description |
//! |-------|-------------|
//! | [`Rnn`] | One cell, front to back |
//! | [`BidirectionalRnn`] | Forward and backward cell, results kept apart |
//! | [`ConcatenatedBidirectionalRnn`] | Bidirectional with outputs joined on the feature axis |
//!
//! ## Tensor Shapes
//!
//! | Format | Shape | Default |
//! |--------|-------|---------|
//! | Batch-major | `[batch, seq_len, features]` | ✓ Yes |
//! | Time-major | `[seq_len, batch, features]` | No |
//!
//! Use `.with_time_major(true)` to switch. Outputs keep the input's layout.
//!
//! ## Variable-Length Batches
//!
//! ```ignore
//! let birnn = BidirectionalRnn::<Backend, _, _>::new(
//!     "encoder",
//!     LstmCellConfig::new(32),
//!     LstmCellConfig::new(32),
//! )
//! .with_sequence_lengths(vec![10, 7, 3, 10]);
//!
//! let (fw, bw) = birnn.forward(input)?; // input: [4, 10, features]
//! // Row 2 emits zeros from step 3 on; its final states are those after step 2.
//! // The backward cell reads row 2 as steps 2, 1, 0.
//! ```
//!
//! ## Initial States
//!
//! Both directions start from zeros unless a producer is supplied:
//!
//! ```ignore
//! let birnn = BidirectionalRnn::from_cells("encoder", fw_cell, bw_cell)
//!     .with_forward_initial_state(move || Tensor::ones([4, 32], &device));
//! ```

pub mod bidirectional;
pub mod engine;
pub mod unidirectional;

pub use bidirectional::{
    concat_outputs, BidirectionalOutput, BidirectionalRnn, ConcatenatedBidirectionalRnn,
};
pub use engine::{bidirectional_dynamic_rnn, dynamic_rnn, reverse_sequence, RnnOptions};
pub use unidirectional::Rnn;

/// Zero-argument producer of an initial state.
pub type StateFn<S> = Box<dyn Fn() -> S + Send>;
