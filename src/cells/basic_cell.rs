use crate::activation::Activation;
use crate::cells::{check_step, CellBuilder, RnnCell};
use crate::error;
use crate::structure::RnnOutput;
use burn::config::Config;
use burn::module::{Ignored, Module};
use burn::nn::{Linear, LinearConfig};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Blueprint for a [`BasicRnnCell`].
#[derive(Config, Debug)]
pub struct BasicRnnCellConfig {
    pub hidden_size: usize,
    #[config(default = "Activation::Tanh")]
    pub activation: Activation,
}

impl BasicRnnCellConfig {
    pub fn init<B: Backend>(&self, input_size: usize, device: &B::Device) -> BasicRnnCell<B> {
        BasicRnnCell {
            input_size,
            hidden_size: self.hidden_size,
            activation: Ignored(self.activation),
            input_map: LinearConfig::new(input_size, self.hidden_size)
                .with_bias(true)
                .init(device),
            recurrent_map: LinearConfig::new(self.hidden_size, self.hidden_size)
                .with_bias(false)
                .init(device),
        }
    }
}

impl<B: Backend> CellBuilder<B> for BasicRnnCellConfig {
    type Cell = BasicRnnCell<B>;

    fn build(&self, input_size: usize, device: &B::Device) -> error::Result<BasicRnnCell<B>> {
        Ok(self.init(input_size, device))
    }
}

/// Plain recurrent cell: `h' = act(W x + b + U h)`, output `h'`.
#[derive(Module, Debug)]
pub struct BasicRnnCell<B: Backend> {
    input_size: usize,
    hidden_size: usize,
    activation: Ignored<Activation>,
    input_map: Linear<B>,
    recurrent_map: Linear<B>,
}

impl<B: Backend> BasicRnnCell<B> {
    pub fn new(input_size: usize, hidden_size: usize, device: &B::Device) -> Self {
        BasicRnnCellConfig::new(hidden_size).init(input_size, device)
    }

    pub fn activation(&self) -> Activation {
        self.activation.0
    }

    /// Single step without width checks.
    pub fn forward(&self, input: Tensor<B, 2>, hidden: Tensor<B, 2>) -> Tensor<B, 2> {
        let z = self.input_map.forward(input) + self.recurrent_map.forward(hidden);
        self.activation.0.apply(z)
    }
}

impl<B: Backend> RnnCell<B> for BasicRnnCell<B> {
    type State = Tensor<B, 2>;

    fn input_size(&self) -> usize {
        self.input_size
    }

    fn output_size(&self) -> usize {
        self.hidden_size
    }

    fn state_sizes(&self) -> Vec<usize> {
        vec![self.hidden_size]
    }

    fn zero_state(&self, batch_size: usize, device: &B::Device) -> Tensor<B, 2> {
        Tensor::zeros([batch_size, self.hidden_size], device)
    }

    fn step(
        &self,
        input: Tensor<B, 2>,
        state: Tensor<B, 2>,
    ) -> error::Result<RnnOutput<Tensor<B, 2>, Tensor<B, 2>>> {
        check_step(self, &input, &state)?;
        let hidden = self.forward(input, state);
        Ok(RnnOutput::new(hidden.clone(), hidden))
    }
}
