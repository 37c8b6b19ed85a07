use crate::cells::{check_step, CellBuilder, RnnCell};
use crate::error;
use crate::structure::RnnOutput;
use burn::config::Config;
use burn::module::Module;
use burn::nn::{Linear, LinearConfig};
use burn::tensor::activation;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Blueprint for an [`LstmCell`].
#[derive(Config, Debug)]
pub struct LstmCellConfig {
    /// Size of the hidden and cell state
    pub hidden_size: usize,
    /// Added to the forget gate pre-activation
    #[config(default = 1.0)]
    pub forget_bias: f32,
}

impl LstmCellConfig {
    pub fn init<B: Backend>(&self, input_size: usize, device: &B::Device) -> LstmCell<B> {
        let input_map = LinearConfig::new(input_size, 4 * self.hidden_size)
            .with_bias(true)
            .init(device);

        let recurrent_map = LinearConfig::new(self.hidden_size, 4 * self.hidden_size)
            .with_bias(false)
            .init(device);

        LstmCell {
            input_size,
            hidden_size: self.hidden_size,
            forget_bias: self.forget_bias,
            input_map,
            recurrent_map,
        }
    }
}

impl<B: Backend> CellBuilder<B> for LstmCellConfig {
    type Cell = LstmCell<B>;

    fn build(&self, input_size: usize, device: &B::Device) -> error::Result<LstmCell<B>> {
        Ok(self.init(input_size, device))
    }
}

/// Standard LSTM cell
///
/// Implements the standard LSTM equations:
/// - i = tanh(W_ii @ x + b_ii + W_hi @ h)
/// - g = sigmoid(W_ig @ x + b_ig + W_hg @ h)
/// - f = sigmoid(W_if @ x + b_if + W_hf @ h + forget_bias)
/// - o = sigmoid(W_io @ x + b_io + W_ho @ h)
/// - c' = f * c + i * g
/// - h' = o * tanh(c')
///
/// The state is the pair `(h, c)`; the output is `h'`.
#[derive(Module, Debug)]
pub struct LstmCell<B: Backend> {
    input_size: usize,
    hidden_size: usize,
    forget_bias: f32,
    input_map: Linear<B>,     // Maps input to 4 * hidden_size (with bias)
    recurrent_map: Linear<B>, // Maps hidden state to 4 * hidden_size (no bias)
}

impl<B: Backend> LstmCell<B> {
    /// Create a new LSTM cell with the default forget bias
    pub fn new(input_size: usize, hidden_size: usize, device: &B::Device) -> Self {
        LstmCellConfig::new(hidden_size).init(input_size, device)
    }

    /// Get the hidden size
    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    /// Perform a forward pass through the LSTM cell
    ///
    /// # Arguments
    /// * `input` - Input tensor of shape `[batch_size, input_size]`
    /// * `states` - Tuple of (hidden_state, cell_state), each of shape `[batch_size, hidden_size]`
    ///
    /// # Returns
    /// Tuple of (new_hidden_state, new_cell_state)
    pub fn forward(
        &self,
        input: Tensor<B, 2>,
        states: (Tensor<B, 2>, Tensor<B, 2>),
    ) -> (Tensor<B, 2>, Tensor<B, 2>) {
        let (hidden_state, cell_state) = states;

        let z = self.input_map.forward(input) + self.recurrent_map.forward(hidden_state);

        let chunks = z.chunk(4, 1);
        let input_activation = chunks[0].clone().tanh();
        let input_gate = activation::sigmoid(chunks[1].clone());
        let forget_gate = activation::sigmoid(chunks[2].clone() + self.forget_bias);
        let output_gate = activation::sigmoid(chunks[3].clone());

        let new_cell = cell_state * forget_gate + input_activation * input_gate;
        let new_hidden = new_cell.clone().tanh() * output_gate;

        (new_hidden, new_cell)
    }
}

impl<B: Backend> RnnCell<B> for LstmCell<B> {
    type State = (Tensor<B, 2>, Tensor<B, 2>);

    fn input_size(&self) -> usize {
        self.input_size
    }

    fn output_size(&self) -> usize {
        self.hidden_size
    }

    fn state_sizes(&self) -> Vec<usize> {
        vec![self.hidden_size, self.hidden_size]
    }

    fn zero_state(&self, batch_size: usize, device: &B::Device) -> Self::State {
        (
            Tensor::zeros([batch_size, self.hidden_size], device),
            Tensor::zeros([batch_size, self.hidden_size], device),
        )
    }

    fn step(
        &self,
        input: Tensor<B, 2>,
        state: Self::State,
    ) -> error::Result<RnnOutput<Tensor<B, 2>, Self::State>> {
        check_step(self, &input, &state)?;
        let (hidden, cell) = self.forward(input, state);
        Ok(RnnOutput::new(hidden.clone(), (hidden, cell)))
    }
}
