use crate::cells::{check_step, CellBuilder, RnnCell};
use crate::error;
use crate::structure::RnnOutput;
use burn::config::Config;
use burn::module::Module;
use burn::nn::{Linear, LinearConfig};
use burn::tensor::activation;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Blueprint for a [`GruCell`].
#[derive(Config, Debug)]
pub struct GruCellConfig {
    pub hidden_size: usize,
}

impl GruCellConfig {
    pub fn init<B: Backend>(&self, input_size: usize, device: &B::Device) -> GruCell<B> {
        let joint = input_size + self.hidden_size;
        GruCell {
            input_size,
            hidden_size: self.hidden_size,
            gates: LinearConfig::new(joint, 2 * self.hidden_size)
                .with_bias(true)
                .init(device),
            candidate: LinearConfig::new(joint, self.hidden_size)
                .with_bias(true)
                .init(device),
        }
    }
}

impl<B: Backend> CellBuilder<B> for GruCellConfig {
    type Cell = GruCell<B>;

    fn build(&self, input_size: usize, device: &B::Device) -> error::Result<GruCell<B>> {
        Ok(self.init(input_size, device))
    }
}

/// Gated recurrent unit
///
/// - [r, u] = sigmoid(W_g @ [x, h] + b_g)
/// - c = tanh(W_c @ [x, r * h] + b_c)
/// - h' = u * h + (1 - u) * c
#[derive(Module, Debug)]
pub struct GruCell<B: Backend> {
    input_size: usize,
    hidden_size: usize,
    gates: Linear<B>,     // [x, h] -> 2 * hidden_size
    candidate: Linear<B>, // [x, r * h] -> hidden_size
}

impl<B: Backend> GruCell<B> {
    pub fn new(input_size: usize, hidden_size: usize, device: &B::Device) -> Self {
        GruCellConfig::new(hidden_size).init(input_size, device)
    }

    pub fn forward(&self, input: Tensor<B, 2>, hidden: Tensor<B, 2>) -> Tensor<B, 2> {
        let gates = activation::sigmoid(
            self.gates
                .forward(Tensor::cat(vec![input.clone(), hidden.clone()], 1)),
        );
        let chunks = gates.chunk(2, 1);
        let reset = chunks[0].clone();
        let update = chunks[1].clone();

        let candidate = self
            .candidate
            .forward(Tensor::cat(vec![input, reset * hidden.clone()], 1))
            .tanh();

        update.clone() * hidden + (update.neg() + 1.0) * candidate
    }
}

impl<B: Backend> RnnCell<B> for GruCell<B> {
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

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_gru_shapes() {
        let device = Default::default();
        let cell = GruCell::<TestBackend>::new(5, 7, &device);

        let input = Tensor::<TestBackend, 2>::ones([4, 5], &device);
        let step = cell.step(input, cell.zero_state(4, &device)).unwrap();
        assert_eq!(step.output.dims(), [4, 7]);
        assert_eq!(cell.state_sizes(), vec![7]);
    }

    #[test]
    fn test_gru_state_evolves() {
        let device = Default::default();
        let cell = GruCell::<TestBackend>::new(5, 7, &device);

        let mut state = cell.zero_state(1, &device);
        for _ in 0..3 {
            let input = Tensor::<TestBackend, 2>::random(
                [1, 5],
                burn::tensor::Distribution::Uniform(0.0, 1.0),
                &device,
            );
            state = cell.step(input, state).unwrap().state;
        }
        let total: f32 = state.abs().sum().into_scalar();
        assert!(total > 0.0, "State should have changed after processing sequence");
    }
}
