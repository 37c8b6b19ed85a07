//! Stacked and residual cells
//!
//! Builds a multi-layer cell from blueprints, steps it by hand and then runs
//! it inside a single-direction layer.

use burn::backend::NdArray;
use burn::tensor::{Distribution, Tensor};
use rnn_layers::prelude::*;

type Backend = NdArray<f32>;

fn main() -> rnn_layers::Result<()> {
    println!("=== Stacked Cell Example ===\n");

    let device = Default::default();

    // Example 1: building and stepping a stack
    println!("Example 1: Three-layer GRU stack");
    let config = StackedCellConfig::new(
        "gru_stack",
        vec![
            GruCellConfig::new(32),
            GruCellConfig::new(32),
            GruCellConfig::new(8),
        ],
    );
    let stack = CellBuilder::<Backend>::build(&config, 16, &device)?;

    println!("  Cells:       {}", stack.num_cells());
    println!("  Input size:  {}", stack.input_size());
    println!("  Output size: {}", stack.output_size());
    println!("  State sizes: {:?}", stack.state_sizes());

    let input = Tensor::<Backend, 2>::random([2, 16], Distribution::Uniform(-1.0, 1.0), &device);
    let step = stack.step(input, stack.zero_state(2, &device))?;
    println!("  Step output: {:?}", step.output.dims());
    println!("  Step states: {:?}", step.state.shapes());
    println!();

    // Example 2: residual layers inside a layer
    println!("Example 2: Residual LSTM stack in an RNN layer");
    let rnn = Rnn::<Backend, _>::new(
        "residual_rnn",
        StackedCellConfig::new(
            "residual_stack",
            vec![
                ResidualCellConfig::new(LstmCellConfig::new(16)),
                ResidualCellConfig::new(LstmCellConfig::new(16)),
            ],
        ),
    );

    // Input shape: [batch=3, seq=6, features=16]
    let sequence =
        Tensor::<Backend, 3>::random([3, 6, 16], Distribution::Uniform(-1.0, 1.0), &device);
    let result = rnn.forward(sequence)?;
    println!("  Output shape: {:?}", result.output.dims());
    println!("  Final states: {}", result.state.len());
    println!();

    // Example 3: width mismatch
    println!("Example 3: Incompatible stack");
    let bad = StackedCell::<Backend, _>::new(
        "bad",
        vec![GruCell::new(4, 8, &device), GruCell::new(6, 2, &device)],
    );
    if let Err(err) = bad {
        println!("  Error: {err}");
    }
    println!();

    println!("=== Done ===");
    Ok(())
}
