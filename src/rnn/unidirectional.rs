//! Single-direction RNN layer

use crate::cells::{BuiltState, CellBuilder, LazyCell, Prebuilt, RnnCell};
use crate::error::Result;
use crate::rnn::engine::{self, RnnOptions};
use crate::rnn::StateFn;
use crate::scope;
use crate::structure::RnnOutput;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// RNN layer that unrolls one cell over a sequence.
///
/// The cell is built from its blueprint on the first call, for the feature
/// width of that call's input.
pub struct Rnn<B: Backend, C: CellBuilder<B>> {
    name: String,
    cell: LazyCell<B, C>,
    initial_state: Option<StateFn<BuiltState<B, C>>>,
    options: RnnOptions,
}

impl<B: Backend, C: CellBuilder<B>> Rnn<B, C> {
    pub fn new(name: impl Into<String>, builder: C) -> Self {
        Self {
            name: name.into(),
            cell: LazyCell::new(builder),
            initial_state: None,
            options: RnnOptions::default(),
        }
    }

    /// Set whether input is time-major (default: false)
    pub fn with_time_major(mut self, time_major: bool) -> Self {
        self.options.time_major = time_major;
        self
    }

    pub fn with_parallel_iterations(mut self, parallel_iterations: usize) -> Self {
        self.options.parallel_iterations = parallel_iterations;
        self
    }

    pub fn with_swap_memory(mut self, swap_memory: bool) -> Self {
        self.options.swap_memory = swap_memory;
        self
    }

    /// True length of every batch row
    pub fn with_sequence_lengths(mut self, lengths: Vec<usize>) -> Self {
        self.options.sequence_lengths = Some(lengths);
        self
    }

    pub fn with_options(mut self, options: RnnOptions) -> Self {
        self.options = options;
        self
    }

    /// Produce the initial state with `initial_state` instead of zeros
    pub fn with_initial_state<F>(mut self, initial_state: F) -> Self
    where
        F: Fn() -> BuiltState<B, C> + Send + 'static,
    {
        self.initial_state = Some(Box::new(initial_state));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> &RnnOptions {
        &self.options
    }

    /// The cell, once the first call has built it
    pub fn cell(&self) -> Option<&C::Cell> {
        self.cell.get()
    }

    /// Forward pass through the layer
    ///
    /// # Arguments
    /// * `input` - `[batch, seq, features]`, or `[seq, batch, features]` when time-major
    ///
    /// # Returns
    /// Outputs in the input's layout and the final state
    pub fn forward(
        &self,
        input: Tensor<B, 3>,
    ) -> Result<RnnOutput<Tensor<B, 3>, BuiltState<B, C>>> {
        self.options.check_input(input.dims())?;
        scope::with_scope(&self.name, || {
            let [_, _, features] = input.dims();
            let cell = self.cell.get_or_build(features, &input.device())?;
            let initial_state = self.initial_state.as_ref().map(|produce| produce());
            engine::dynamic_rnn(cell, input, initial_state, &self.options)
        })
    }
}

impl<B: Backend, C: RnnCell<B> + Clone> Rnn<B, Prebuilt<C>> {
    /// Create a layer around an existing cell
    pub fn from_cell(name: impl Into<String>, cell: C) -> Self {
        Self::new(name, Prebuilt(cell))
    }
}

impl<B: Backend, C: CellBuilder<B> + core::fmt::Debug> core::fmt::Debug for Rnn<B, C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Rnn")
            .field("name", &self.name)
            .field("cell", &self.cell)
            .field("has_initial_state", &self.initial_state.is_some())
            .field("options", &self.options)
            .finish()
    }
}
