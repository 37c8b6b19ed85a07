//! # RNN Cell Implementations
//!
//! This module provides single-timestep RNN cells and the traits that let
//! them be chained, wrapped and unrolled by the layers in [`crate::rnn`].
//!
//! ## Cell Types
//!
//! | Cell | State | Description |
//! |------|-------|-------------|
//! | [`BasicRnnCell`] | `h` | `h' = act(W x + U h + b)` |
//! | [`GruCell`] | `h` | Gated recurrent unit |
//! | [`LstmCell`] | `(h, c)` | Long short-term memory |
//! | [`StackedCell`] | `Vec<S>` | Chains cells, output of one feeds the next |
//! | [`ResidualCell`] | `S` | Adds the input back onto the inner cell's output |
//!
//! ## Blueprints and Lazy Instantiation
//!
//! Each cell has a blueprint ([`CellBuilder`]) that knows everything except
//! the input width. Layers keep the blueprint in a [`LazyCell`] and finalise
//! it against the first input they see:
//!
//! ```ignore
//! let lazy = LazyCell::new(LstmCellConfig::new(32));
//! let cell = lazy.get_or_build(16, &device)?; // LstmCell: 16 -> 32
//! ```
//!
//! A cell that already exists becomes a blueprint through [`Prebuilt`].
//!
//! ## Tensor Shapes
//!
//! | Tensor | Shape |
//! |--------|-------|
//! | `input` | `[batch, input_size]` |
//! | `output` | `[batch, output_size]` |
//! | state leaves | `[batch, state_sizes()[i]]` |

pub mod basic_cell;
pub mod gru_cell;
pub mod lstm_cell;
pub mod residual_cell;
pub mod stacked_cell;

pub use basic_cell::{BasicRnnCell, BasicRnnCellConfig};
pub use gru_cell::{GruCell, GruCellConfig};
pub use lstm_cell::{LstmCell, LstmCellConfig};
pub use residual_cell::{ResidualCell, ResidualCellConfig};
pub use stacked_cell::{StackedCell, StackedCellConfig};

use crate::error::{Result, RnnError};
use crate::scope;
use crate::structure::{CellState, RnnOutput};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use log::debug;
use std::marker::PhantomData;
use std::sync::OnceLock;

/// A unit that advances one time step.
pub trait RnnCell<B: Backend> {
    type State: CellState<B>;

    /// Width of the input this cell consumes.
    fn input_size(&self) -> usize;

    /// Width of the output this cell emits.
    fn output_size(&self) -> usize;

    /// Width of every state leaf, in [`CellState::leaves`] order.
    fn state_sizes(&self) -> Vec<usize>;

    /// All-zero state for `batch_size` rows.
    fn zero_state(&self, batch_size: usize, device: &B::Device) -> Self::State;

    /// Advances the cell by one step.
    ///
    /// # Arguments
    /// * `input` - Tensor of shape `[batch, input_size]`
    /// * `state` - State carried from the previous step
    fn step(
        &self,
        input: Tensor<B, 2>,
        state: Self::State,
    ) -> Result<RnnOutput<Tensor<B, 2>, Self::State>>;

    /// Expected state leaf shapes for `batch_size` rows.
    fn state_shapes(&self, batch_size: usize) -> Vec<[usize; 2]> {
        self.state_sizes()
            .into_iter()
            .map(|width| [batch_size, width])
            .collect()
    }
}

/// State type of the cell a blueprint builds.
pub type BuiltState<B, C> = <<C as CellBuilder<B>>::Cell as RnnCell<B>>::State;

/// A cell blueprint, finalised once the input width is known.
pub trait CellBuilder<B: Backend> {
    type Cell: RnnCell<B>;

    fn build(&self, input_size: usize, device: &B::Device) -> Result<Self::Cell>;
}

/// Checks that `state` has the leaf shapes `cell` expects for `batch_size` rows.
pub fn check_state_shapes<B: Backend, C: RnnCell<B>>(
    cell: &C,
    batch_size: usize,
    state: &C::State,
) -> Result<()> {
    let expected = cell.state_shapes(batch_size);
    let actual = state.shapes();
    if expected != actual {
        return Err(RnnError::StateShapeMismatch { expected, actual });
    }
    Ok(())
}

/// Checks a step's input width and state shapes against `cell`.
pub(crate) fn check_step<B: Backend, C: RnnCell<B>>(
    cell: &C,
    input: &Tensor<B, 2>,
    state: &C::State,
) -> Result<()> {
    let [batch, actual] = input.dims();
    if actual != cell.input_size() {
        return Err(RnnError::InputSizeMismatch {
            expected: cell.input_size(),
            actual,
        });
    }
    check_state_shapes(cell, batch, state)
}

/// Turns an existing cell into a blueprint that hands out clones of it.
#[derive(Debug, Clone)]
pub struct Prebuilt<C>(pub C);

impl<B: Backend, C: RnnCell<B> + Clone> CellBuilder<B> for Prebuilt<C> {
    type Cell = C;

    fn build(&self, input_size: usize, _device: &B::Device) -> Result<C> {
        if self.0.input_size() != input_size {
            return Err(RnnError::InputSizeMismatch {
                expected: self.0.input_size(),
                actual: input_size,
            });
        }
        Ok(self.0.clone())
    }
}

/// A blueprint whose cell is built on first use and then reused.
pub struct LazyCell<B: Backend, C: CellBuilder<B>> {
    builder: C,
    cell: OnceLock<C::Cell>,
    _backend: PhantomData<B>,
}

impl<B: Backend, C: CellBuilder<B>> LazyCell<B, C> {
    pub fn new(builder: C) -> Self {
        Self {
            builder,
            cell: OnceLock::new(),
            _backend: PhantomData,
        }
    }

    pub fn builder(&self) -> &C {
        &self.builder
    }

    /// The cell, if it has been built already.
    pub fn get(&self) -> Option<&C::Cell> {
        self.cell.get()
    }

    /// Returns the cached cell, building it for `input_size` on first call.
    ///
    /// A cached cell is only returned for the width it was built for.
    pub fn get_or_build(&self, input_size: usize, device: &B::Device) -> Result<&C::Cell> {
        if let Some(cell) = self.cell.get() {
            if cell.input_size() != input_size {
                return Err(RnnError::InputSizeMismatch {
                    expected: cell.input_size(),
                    actual: input_size,
                });
            }
            return Ok(cell);
        }

        let cell = self.builder.build(input_size, device)?;
        debug!(
            "instantiated cell `{}` for input size {} ({} -> {})",
            scope::current_scope(),
            input_size,
            cell.input_size(),
            cell.output_size()
        );
        Ok(self.cell.get_or_init(|| cell))
    }
}

impl<B: Backend, C: CellBuilder<B> + core::fmt::Debug> core::fmt::Debug for LazyCell<B, C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LazyCell")
            .field("builder", &self.builder)
            .field("built", &self.cell.get().is_some())
            .finish()
    }
}
