//! Bidirectional RNN layer
//!
//! Runs a forward cell over the sequence and a backward cell over the
//! sequence reversed (per row, within its length), keeping the two results
//! apart. [`BidirectionalRnn::with_concatenated_outputs`] turns the layer into
//! one that joins the outputs along the feature axis.

use crate::cells::{BuiltState, CellBuilder, LazyCell, Prebuilt, RnnCell};
use crate::error::{Result, RnnError};
use crate::rnn::engine::{self, RnnOptions};
use crate::rnn::StateFn;
use crate::scope;
use crate::structure::{concat_states, RnnOutput};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Per-direction results of a bidirectional pass.
pub type BidirectionalOutput<B, F, W> = (
    RnnOutput<Tensor<B, 3>, BuiltState<B, F>>,
    RnnOutput<Tensor<B, 3>, BuiltState<B, W>>,
);

/// Bidirectional RNN layer
///
/// # Type Parameters
/// * `B` - The backend type
/// * `F` - Blueprint of the forward cell
/// * `W` - Blueprint of the backward cell
pub struct BidirectionalRnn<B: Backend, F: CellBuilder<B>, W: CellBuilder<B>> {
    name: String,
    forward_cell: LazyCell<B, F>,
    backward_cell: LazyCell<B, W>,
    forward_initial_state: Option<StateFn<BuiltState<B, F>>>,
    backward_initial_state: Option<StateFn<BuiltState<B, W>>>,
    options: RnnOptions,
}

impl<B: Backend, F: CellBuilder<B>, W: CellBuilder<B>> BidirectionalRnn<B, F, W> {
    /// Create a layer whose cells are built on the first call
    ///
    /// # Arguments
    /// * `name` - Scope the cells are built and run under
    /// * `forward` - Blueprint of the cell reading the sequence front to back
    /// * `backward` - Blueprint of the cell reading it back to front
    pub fn new(name: impl Into<String>, forward: F, backward: W) -> Self {
        Self {
            name: name.into(),
            forward_cell: LazyCell::new(forward),
            backward_cell: LazyCell::new(backward),
            forward_initial_state: None,
            backward_initial_state: None,
            options: RnnOptions::default(),
        }
    }

    /// Set whether input is time-major (default: false)
    ///
    /// When true: input shape is [seq, batch, features]
    /// When false: input shape is [batch, seq, features]
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

    /// True length of every batch row; steps past it are masked
    pub fn with_sequence_lengths(mut self, lengths: Vec<usize>) -> Self {
        self.options.sequence_lengths = Some(lengths);
        self
    }

    pub fn with_options(mut self, options: RnnOptions) -> Self {
        self.options = options;
        self
    }

    /// Produce the forward cell's initial state instead of using zeros
    pub fn with_forward_initial_state<P>(mut self, initial_state: P) -> Self
    where
        P: Fn() -> BuiltState<B, F> + Send + 'static,
    {
        self.forward_initial_state = Some(Box::new(initial_state));
        self
    }

    /// Produce the backward cell's initial state instead of using zeros
    pub fn with_backward_initial_state<P>(mut self, initial_state: P) -> Self
    where
        P: Fn() -> BuiltState<B, W> + Send + 'static,
    {
        self.backward_initial_state = Some(Box::new(initial_state));
        self
    }

    /// Join forward and backward outputs along the feature axis
    pub fn with_concatenated_outputs(self) -> ConcatenatedBidirectionalRnn<B, F, W> {
        ConcatenatedBidirectionalRnn { inner: self }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> &RnnOptions {
        &self.options
    }

    /// Forward cell, once the first call has built it
    pub fn forward_cell(&self) -> Option<&F::Cell> {
        self.forward_cell.get()
    }

    /// Backward cell, once the first call has built it
    pub fn backward_cell(&self) -> Option<&W::Cell> {
        self.backward_cell.get()
    }

    /// Forward pass through both directions
    ///
    /// # Arguments
    /// * `input` - `[batch, seq, features]`, or `[seq, batch, features]` when time-major
    ///
    /// # Returns
    /// `(forward, backward)` results; outputs keep the input's layout and
    /// position `t` of both refers to input step `t`
    pub fn forward(&self, input: Tensor<B, 3>) -> Result<BidirectionalOutput<B, F, W>> {
        self.options.check_input(input.dims())?;
        let [_, _, features] = input.dims();
        let device = input.device();

        let (forward_cell, backward_cell) = scope::with_scope(&self.name, || -> Result<_> {
            let forward_cell =
                scope::with_scope("fw", || self.forward_cell.get_or_build(features, &device))?;
            let backward_cell =
                scope::with_scope("bw", || self.backward_cell.get_or_build(features, &device))?;
            Ok((forward_cell, backward_cell))
        })?;

        let forward_initial_state = self.forward_initial_state.as_ref().map(|produce| produce());
        let backward_initial_state = self.backward_initial_state.as_ref().map(|produce| produce());

        engine::bidirectional_dynamic_rnn(
            &self.name,
            forward_cell,
            backward_cell,
            input,
            forward_initial_state,
            backward_initial_state,
            &self.options,
        )
    }
}

impl<B, C1, C2> BidirectionalRnn<B, Prebuilt<C1>, Prebuilt<C2>>
where
    B: Backend,
    C1: RnnCell<B> + Clone,
    C2: RnnCell<B> + Clone,
{
    /// Create a layer around two existing cells
    pub fn from_cells(name: impl Into<String>, forward: C1, backward: C2) -> Self {
        Self::new(name, Prebuilt(forward), Prebuilt(backward))
    }
}

impl<B, F, W> core::fmt::Debug for BidirectionalRnn<B, F, W>
where
    B: Backend,
    F: CellBuilder<B> + core::fmt::Debug,
    W: CellBuilder<B> + core::fmt::Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BidirectionalRnn")
            .field("name", &self.name)
            .field("forward_cell", &self.forward_cell)
            .field("backward_cell", &self.backward_cell)
            .field("has_forward_initial_state", &self.forward_initial_state.is_some())
            .field("has_backward_initial_state", &self.backward_initial_state.is_some())
            .field("options", &self.options)
            .finish()
    }
}

/// Bidirectional layer whose outputs are concatenated on the feature axis.
///
/// The state is the pair `(forward_state, backward_state)`.
pub struct ConcatenatedBidirectionalRnn<B: Backend, F: CellBuilder<B>, W: CellBuilder<B>> {
    inner: BidirectionalRnn<B, F, W>,
}

impl<B: Backend, F: CellBuilder<B>, W: CellBuilder<B>> ConcatenatedBidirectionalRnn<B, F, W> {
    pub fn inner(&self) -> &BidirectionalRnn<B, F, W> {
        &self.inner
    }

    pub fn into_inner(self) -> BidirectionalRnn<B, F, W> {
        self.inner
    }

    /// Width of the concatenated output, once both cells are built
    pub fn output_size(&self) -> Option<usize> {
        let forward = self.inner.forward_cell()?.output_size();
        let backward = self.inner.backward_cell()?.output_size();
        Some(forward + backward)
    }

    #[allow(clippy::type_complexity)]
    pub fn forward(
        &self,
        input: Tensor<B, 3>,
    ) -> Result<RnnOutput<Tensor<B, 3>, (BuiltState<B, F>, BuiltState<B, W>)>> {
        let (forward, backward) = self.inner.forward(input)?;
        let output = concat_outputs(forward.output, backward.output)?;
        Ok(RnnOutput::new(output, (forward.state, backward.state)))
    }
}

impl<B, F, W> ConcatenatedBidirectionalRnn<B, F, W>
where
    B: Backend,
    F: CellBuilder<B>,
    W: CellBuilder<B>,
    W::Cell: RnnCell<B, State = BuiltState<B, F>>,
{
    /// Like [`forward`](Self::forward), but with the two final states joined
    /// leaf by leaf along the feature axis.
    ///
    /// Both cells must carry states of the same structure; list states of
    /// different lengths fail with [`RnnError::StructureMismatch`].
    pub fn forward_merged(
        &self,
        input: Tensor<B, 3>,
    ) -> Result<RnnOutput<Tensor<B, 3>, BuiltState<B, F>>> {
        let (output, (forward, backward)) = self.forward(input)?.into_parts();
        Ok(RnnOutput::new(output, concat_states(forward, backward)?))
    }
}

impl<B, F, W> core::fmt::Debug for ConcatenatedBidirectionalRnn<B, F, W>
where
    B: Backend,
    F: CellBuilder<B> + core::fmt::Debug,
    W: CellBuilder<B> + core::fmt::Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("ConcatenatedBidirectionalRnn")
            .field(&self.inner)
            .finish()
    }
}

/// Concatenates forward and backward outputs along the trailing axis.
///
/// Both outputs must agree on their two leading (time and batch) dims.
pub fn concat_outputs<B: Backend>(
    forward: Tensor<B, 3>,
    backward: Tensor<B, 3>,
) -> Result<Tensor<B, 3>> {
    let [f0, f1, _] = forward.dims();
    let [b0, b1, _] = backward.dims();
    if [f0, f1] != [b0, b1] {
        return Err(RnnError::OutputMismatch {
            forward: [f0, f1],
            backward: [b0, b1],
        });
    }
    Ok(Tensor::cat(vec![forward, backward], 2))
}
