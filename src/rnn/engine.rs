//! Dynamic unrolling of cells over a sequence.
//!
//! These are the execution primitives the layers delegate to: a
//! single-direction unroll with optional per-row sequence lengths, and the
//! bidirectional variant that runs a second cell over the per-row reversed
//! sequence.
//!
//! Internally everything runs batch-major (`[batch, time, features]`); a
//! time-major input is transposed on the way in and the outputs are
//! transposed back on the way out.

use crate::cells::{check_state_shapes, RnnCell};
use crate::error::{Result, RnnError};
use crate::scope;
use crate::structure::{CellState, RnnOutput};
use burn::tensor::backend::Backend;
use burn::tensor::{Int, Tensor, TensorData};
use log::{debug, trace};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PARALLEL_ITERATIONS: usize = 32;

/// Execution settings shared by the single and bidirectional unrolls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RnnOptions {
    /// Input is `[time, batch, features]` instead of `[batch, time, features]`
    pub time_major: bool,
    /// Iterations the loop may run concurrently; must be positive
    pub parallel_iterations: usize,
    /// Allow intermediate activations to be moved off the device
    pub swap_memory: bool,
    /// True length of every batch row
    pub sequence_lengths: Option<Vec<usize>>,
}

impl Default for RnnOptions {
    fn default() -> Self {
        Self {
            time_major: false,
            parallel_iterations: DEFAULT_PARALLEL_ITERATIONS,
            swap_memory: false,
            sequence_lengths: None,
        }
    }
}

impl RnnOptions {
    pub fn validate(&self) -> Result<()> {
        if self.parallel_iterations == 0 {
            return Err(RnnError::InvalidParallelIterations);
        }
        Ok(())
    }

    /// Sequence lengths, checked against the batch and time dimensions.
    pub fn checked_lengths(&self, batch: usize, max_time: usize) -> Result<Option<&[usize]>> {
        let Some(lengths) = self.sequence_lengths.as_deref() else {
            return Ok(None);
        };
        check_lengths(lengths, batch, max_time)?;
        Ok(Some(lengths))
    }

    /// Checks these options against the dims of an input before any cell is
    /// built or run.
    pub fn check_input(&self, dims: [usize; 3]) -> Result<()> {
        self.validate()?;
        let [outer, inner, _] = dims;
        let (batch, max_time) = if self.time_major {
            (inner, outer)
        } else {
            (outer, inner)
        };
        self.checked_lengths(batch, max_time)?;
        Ok(())
    }

    fn to_batch_major<B: Backend>(&self, input: Tensor<B, 3>) -> Tensor<B, 3> {
        if self.time_major {
            input.swap_dims(0, 1)
        } else {
            input
        }
    }

    fn restore_layout<B: Backend>(&self, output: Tensor<B, 3>) -> Tensor<B, 3> {
        // Swapping the two leading axes is its own inverse
        self.to_batch_major(output)
    }
}

fn check_lengths(lengths: &[usize], batch: usize, max_time: usize) -> Result<()> {
    if lengths.len() != batch {
        return Err(RnnError::SequenceLengthCount {
            expected: batch,
            actual: lengths.len(),
        });
    }
    if let Some((row, &length)) = lengths
        .iter()
        .enumerate()
        .find(|&(_, &length)| length > max_time)
    {
        return Err(RnnError::SequenceLengthOutOfRange {
            row,
            length,
            max_time,
        });
    }
    Ok(())
}

/// Materialises sequence lengths as a constant integer tensor.
pub fn lengths_tensor<B: Backend>(lengths: &[usize], device: &B::Device) -> Tensor<B, 1, Int> {
    let data: Vec<i64> = lengths.iter().map(|&length| length as i64).collect();
    Tensor::from_data(TensorData::new(data, [lengths.len()]), device)
}

/// Reverses every row of a batch-major tensor within its valid prefix.
///
/// Without lengths the whole time axis is reversed. Steps past a row's length
/// stay where they are.
pub fn reverse_sequence<B: Backend>(
    input: Tensor<B, 3>,
    lengths: Option<&[usize]>,
) -> Result<Tensor<B, 3>> {
    let [batch, max_time, features] = input.dims();
    let full;
    let lengths = match lengths {
        Some(lengths) => {
            check_lengths(lengths, batch, max_time)?;
            lengths
        }
        None => {
            full = vec![max_time; batch];
            &full
        }
    };

    let mut indices = Vec::with_capacity(batch * max_time);
    for &length in lengths {
        for t in 0..max_time {
            let source = if t < length { length - 1 - t } else { t };
            indices.push(source as i64);
        }
    }

    let device = input.device();
    let indices = TensorData::new(indices, [batch, max_time]);
    let indices = Tensor::<B, 2, Int>::from_data(indices, &device)
        .reshape([batch, max_time, 1])
        .expand([batch, max_time, features]);
    Ok(input.gather(1, indices))
}

/// Unrolls `cell` over `input`.
///
/// # Arguments
/// * `cell` - Cell advanced once per time step
/// * `input` - `[batch, time, features]`, or `[time, batch, features]` when time-major
/// * `initial_state` - Starting state; zeros when `None`
/// * `options` - Layout, sequence lengths and pass-through loop settings
///
/// # Returns
/// The per-step outputs in the input's layout and the final state. With
/// sequence lengths, rows emit zeros past their length and keep the state
/// reached at their last valid step.
pub fn dynamic_rnn<B: Backend, C: RnnCell<B>>(
    cell: &C,
    input: Tensor<B, 3>,
    initial_state: Option<C::State>,
    options: &RnnOptions,
) -> Result<RnnOutput<Tensor<B, 3>, C::State>> {
    options.validate()?;
    let input = options.to_batch_major(input);
    let [batch, max_time, _] = input.dims();
    let lengths = options.checked_lengths(batch, max_time)?;
    debug!(
        "unrolling `{}`: batch {}, max_time {}, parallel_iterations {}, swap_memory {}",
        scope::current_scope(),
        batch,
        max_time,
        options.parallel_iterations,
        options.swap_memory
    );

    let RnnOutput { output, state } = unroll(cell, input, initial_state, lengths)?;
    Ok(RnnOutput::new(options.restore_layout(output), state))
}

/// Runs `forward_cell` over the input and `backward_cell` over its per-row
/// reversal, under the scope `name`.
///
/// The backward outputs are reversed back, so position `t` of both outputs
/// refers to the same input step.
#[allow(clippy::type_complexity)]
pub fn bidirectional_dynamic_rnn<B, F, W>(
    name: &str,
    forward_cell: &F,
    backward_cell: &W,
    input: Tensor<B, 3>,
    forward_initial_state: Option<F::State>,
    backward_initial_state: Option<W::State>,
    options: &RnnOptions,
) -> Result<(
    RnnOutput<Tensor<B, 3>, F::State>,
    RnnOutput<Tensor<B, 3>, W::State>,
)>
where
    B: Backend,
    F: RnnCell<B>,
    W: RnnCell<B>,
{
    options.validate()?;
    scope::with_scope(name, || {
        let input = options.to_batch_major(input);
        let [batch, max_time, _] = input.dims();
        let lengths = options.checked_lengths(batch, max_time)?;
        debug!(
            "bidirectional `{}`: batch {}, max_time {}, parallel_iterations {}, swap_memory {}",
            scope::current_scope(),
            batch,
            max_time,
            options.parallel_iterations,
            options.swap_memory
        );

        let forward = scope::with_scope("fw", || {
            unroll(forward_cell, input.clone(), forward_initial_state, lengths)
        })?;
        let backward = scope::with_scope("bw", || -> Result<_> {
            let reversed = reverse_sequence(input, lengths)?;
            let RnnOutput { output, state } =
                unroll(backward_cell, reversed, backward_initial_state, lengths)?;
            Ok(RnnOutput::new(reverse_sequence(output, lengths)?, state))
        })?;

        Ok((
            RnnOutput::new(options.restore_layout(forward.output), forward.state),
            RnnOutput::new(options.restore_layout(backward.output), backward.state),
        ))
    })
}

fn unroll<B: Backend, C: RnnCell<B>>(
    cell: &C,
    input: Tensor<B, 3>,
    initial_state: Option<C::State>,
    lengths: Option<&[usize]>,
) -> Result<RnnOutput<Tensor<B, 3>, C::State>> {
    let [batch, max_time, features] = input.dims();
    if features != cell.input_size() {
        return Err(RnnError::InputSizeMismatch {
            expected: cell.input_size(),
            actual: features,
        });
    }
    if max_time == 0 {
        return Err(RnnError::EmptySequence);
    }

    let device = input.device();
    let mut state = match initial_state {
        Some(state) => {
            check_state_shapes(cell, batch, &state)?;
            state
        }
        None => cell.zero_state(batch, &device),
    };

    let output_size = cell.output_size();
    // Nothing changes once every row is past its length
    let (steps, lengths) = match lengths {
        Some(lengths) => (
            lengths.iter().copied().max().unwrap_or(0),
            Some(lengths_tensor::<B>(lengths, &device)),
        ),
        None => (max_time, None),
    };

    let mut outputs: Vec<Tensor<B, 2>> = Vec::with_capacity(max_time);
    for t in 0..steps {
        trace!("`{}` step {}/{}", scope::current_scope(), t + 1, steps);
        let step_input = input.clone().narrow(1, t, 1).reshape([batch, features]);

        match &lengths {
            None => {
                let RnnOutput { output, state: next } = cell.step(step_input, state)?;
                state = next;
                outputs.push(output);
            }
            Some(lengths) => {
                let previous = state.clone();
                let RnnOutput { output, state: next } = cell.step(step_input, state)?;
                let valid = lengths.clone().greater_elem(t as i64).reshape([batch, 1]);
                let mask = |width: usize| valid.clone().expand([batch, width]);

                outputs.push(output.zeros_like().mask_where(mask(output_size), output));
                state = previous.zip_with(next, &mut |old: Tensor<B, 2>, new: Tensor<B, 2>| {
                    let [_, width] = old.dims();
                    old.mask_where(mask(width), new)
                })?;
            }
        }
    }
    for _ in steps..max_time {
        outputs.push(Tensor::zeros([batch, output_size], &device));
    }

    let output: Tensor<B, 3> = Tensor::stack(outputs, 1);
    Ok(RnnOutput::new(output, state))
}
