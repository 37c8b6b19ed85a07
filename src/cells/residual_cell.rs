use crate::cells::{CellBuilder, RnnCell};
use crate::error::{Result, RnnError};
use crate::structure::RnnOutput;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use serde::{Deserialize, Serialize};

/// Blueprint for a [`ResidualCell`]; the inner cell must keep the width.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResidualCellConfig<C> {
    pub inner: C,
}

impl<C> ResidualCellConfig<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }
}

impl<B: Backend, C: CellBuilder<B>> CellBuilder<B> for ResidualCellConfig<C> {
    type Cell = ResidualCell<C::Cell>;

    fn build(&self, input_size: usize, device: &B::Device) -> Result<Self::Cell> {
        ResidualCell::new::<B>(self.inner.build(input_size, device)?)
    }
}

/// Wraps a cell so that its input is added to its output.
///
/// State passes through untouched.
#[derive(Debug, Clone)]
pub struct ResidualCell<C> {
    inner: C,
}

impl<C> ResidualCell<C> {
    pub fn new<B: Backend>(inner: C) -> Result<Self>
    where
        C: RnnCell<B>,
    {
        if inner.input_size() != inner.output_size() {
            return Err(RnnError::ResidualSizeMismatch {
                input_size: inner.input_size(),
                output_size: inner.output_size(),
            });
        }
        Ok(Self { inner })
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }
}

impl<B: Backend, C: RnnCell<B>> RnnCell<B> for ResidualCell<C> {
    type State = C::State;

    fn input_size(&self) -> usize {
        self.inner.input_size()
    }

    fn output_size(&self) -> usize {
        self.inner.output_size()
    }

    fn state_sizes(&self) -> Vec<usize> {
        self.inner.state_sizes()
    }

    fn zero_state(&self, batch_size: usize, device: &B::Device) -> Self::State {
        self.inner.zero_state(batch_size, device)
    }

    fn step(
        &self,
        input: Tensor<B, 2>,
        state: Self::State,
    ) -> Result<RnnOutput<Tensor<B, 2>, Self::State>> {
        let RnnOutput { output, state } = self.inner.step(input.clone(), state)?;
        Ok(RnnOutput::new(output + input, state))
    }
}
