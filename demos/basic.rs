//! Basic usage of the bidirectional layer
//!
//! Runs an LSTM forward cell and a GRU backward cell over a padded batch and
//! shows the separate and concatenated results.

use burn::backend::NdArray;
use burn::tensor::{Distribution, Tensor};
use rnn_layers::prelude::*;

type Backend = NdArray<f32>;

fn main() -> rnn_layers::Result<()> {
    println!("=== Bidirectional RNN Example ===\n");

    let device = Default::default();

    // Example 1: separate outputs per direction
    println!("Example 1: Separate outputs");
    let birnn = BidirectionalRnn::<Backend, _, _>::new(
        "encoder",
        LstmCellConfig::new(32),
        GruCellConfig::new(16),
    );

    // Input shape: [batch=4, seq=10, features=20]
    let input =
        Tensor::<Backend, 3>::random([4, 10, 20], Distribution::Uniform(-1.0, 1.0), &device);
    let (forward, backward) = birnn.forward(input.clone())?;

    println!("  Input shape:           [4, 10, 20]");
    println!("  Forward output shape:  {:?}", forward.output.dims());
    println!("  Forward state shapes:  {:?}", forward.state.shapes());
    println!("  Backward output shape: {:?}", backward.output.dims());
    println!("  Backward state shape:  {:?}", backward.state.dims());
    println!();

    // Example 2: padded rows
    println!("Example 2: Variable sequence lengths");
    let lengths = vec![10, 7, 3, 1];
    let padded = BidirectionalRnn::<Backend, _, _>::new(
        "padded",
        GruCellConfig::new(8),
        GruCellConfig::new(8),
    )
    .with_sequence_lengths(lengths.clone());

    let (forward, _) = padded.forward(input.clone())?;
    for (row, &length) in lengths.iter().enumerate().filter(|&(_, &length)| length < 10) {
        let tail: f32 = forward
            .output
            .clone()
            .narrow(0, row, 1)
            .narrow(1, length, 10 - length)
            .abs()
            .sum()
            .into_scalar();
        println!("  Row {row}: length {length:2}, |output| past length = {tail}");
    }
    println!();

    // Example 3: concatenated outputs, time-major input
    println!("Example 3: Concatenated outputs (time-major)");
    let joined = BidirectionalRnn::<Backend, _, _>::new(
        "joined",
        BasicRnnCellConfig::new(12).with_activation(Activation::LecunTanh),
        BasicRnnCellConfig::new(12),
    )
    .with_time_major(true)
    .with_concatenated_outputs();

    // Input shape: [seq=10, batch=4, features=20]
    let result = joined.forward(input.swap_dims(0, 1))?;
    println!("  Output shape: {:?}", result.output.dims());
    println!("  Output width: {:?}", joined.output_size());
    println!();

    println!("=== Done ===");
    Ok(())
}
