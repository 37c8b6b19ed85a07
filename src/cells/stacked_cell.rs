//! Stacked (multi-layer) cell
//!
//! Chains an ordered list of cells into a single cell. At every step the
//! output of cell `i` is the input of cell `i + 1`; each cell keeps its own
//! state, so the stack's state is the list of per-cell states in cell order.

use crate::cells::{check_step, CellBuilder, RnnCell};
use crate::error::{Result, RnnError};
use crate::scope;
use crate::structure::RnnOutput;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;

/// Blueprint for a [`StackedCell`].
///
/// Layer `0` is built for the stack's input width, every later layer for the
/// output width of the layer before it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackedCellConfig<C> {
    pub name: String,
    pub layers: Vec<C>,
}

impl<C> StackedCellConfig<C> {
    pub fn new(name: impl Into<String>, layers: Vec<C>) -> Self {
        Self {
            name: name.into(),
            layers,
        }
    }
}

impl<B: Backend, C: CellBuilder<B>> CellBuilder<B> for StackedCellConfig<C> {
    type Cell = StackedCell<B, C::Cell>;

    fn build(&self, input_size: usize, device: &B::Device) -> Result<Self::Cell> {
        scope::with_scope(&self.name, || {
            let mut cells = Vec::with_capacity(self.layers.len());
            let mut width = input_size;
            for (index, layer) in self.layers.iter().enumerate() {
                let cell = scope::with_scope(&format!("cell_{index}"), || {
                    layer.build(width, device)
                })?;
                width = cell.output_size();
                cells.push(cell);
            }
            StackedCell::new(self.name.clone(), cells)
        })
    }
}

/// Cell composed of an ordered list of cells.
#[derive(Debug, Clone)]
pub struct StackedCell<B: Backend, C> {
    name: String,
    cells: Vec<C>,
    _backend: PhantomData<B>,
}

impl<B: Backend, C: RnnCell<B>> StackedCell<B, C> {
    /// Create a stack from `cells`, outermost input first.
    ///
    /// Fails when the list is empty or when a cell's output width differs
    /// from the next cell's input width.
    pub fn new(name: impl Into<String>, cells: Vec<C>) -> Result<Self> {
        let name = name.into();
        if cells.is_empty() {
            return Err(RnnError::EmptyStack { name });
        }
        for (index, pair) in cells.windows(2).enumerate() {
            let (output_size, input_size) = (pair[0].output_size(), pair[1].input_size());
            if output_size != input_size {
                return Err(RnnError::IncompatibleCells {
                    index,
                    output_size,
                    input_size,
                });
            }
        }
        Ok(Self {
            name,
            cells,
            _backend: PhantomData,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cells(&self) -> &[C] {
        &self.cells
    }

    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn into_cells(self) -> Vec<C> {
        self.cells
    }
}

impl<B: Backend, C: RnnCell<B>> RnnCell<B> for StackedCell<B, C> {
    type State = Vec<C::State>;

    fn input_size(&self) -> usize {
        self.cells[0].input_size()
    }

    fn output_size(&self) -> usize {
        self.cells[self.cells.len() - 1].output_size()
    }

    fn state_sizes(&self) -> Vec<usize> {
        self.cells.iter().flat_map(|cell| cell.state_sizes()).collect()
    }

    fn zero_state(&self, batch_size: usize, device: &B::Device) -> Self::State {
        self.cells
            .iter()
            .map(|cell| cell.zero_state(batch_size, device))
            .collect()
    }

    fn step(
        &self,
        input: Tensor<B, 2>,
        states: Self::State,
    ) -> Result<RnnOutput<Tensor<B, 2>, Self::State>> {
        if states.len() != self.cells.len() {
            return Err(RnnError::StateCountMismatch {
                expected: self.cells.len(),
                actual: states.len(),
            });
        }
        check_step(self, &input, &states)?;

        scope::with_scope(&self.name, || {
            let mut current_input = input;
            let mut next_states = Vec::with_capacity(self.cells.len());
            for (cell, state) in self.cells.iter().zip(states) {
                let RnnOutput { output, state } = cell.step(current_input, state)?;
                current_input = output;
                next_states.push(state);
            }
            Ok(RnnOutput::new(current_input, next_states))
        })
    }
}
