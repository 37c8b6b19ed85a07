//! Bidirectional layer integration tests

use approx::assert_abs_diff_eq;
use burn::backend::NdArray;
use burn::tensor::{Distribution, Tensor};
use rand::prelude::*;
use rnn_layers::prelude::*;
use rnn_layers::rnn::reverse_sequence;

type Backend = NdArray<f32>;

fn assert_tensors_close<const D: usize>(actual: Tensor<Backend, D>, expected: Tensor<Backend, D>) {
    assert_eq!(actual.dims(), expected.dims());
    let actual = actual.to_data().to_vec::<f32>().unwrap();
    let expected = expected.to_data().to_vec::<f32>().unwrap();
    for (a, e) in actual.iter().zip(expected.iter()) {
        assert_abs_diff_eq!(*a, *e, epsilon = 1e-5);
    }
}

fn random_input(shape: [usize; 3]) -> Tensor<Backend, 3> {
    Tensor::random(shape, Distribution::Uniform(-1.0, 1.0), &Default::default())
}

fn row(input: &Tensor<Backend, 3>, index: usize, length: usize) -> Tensor<Backend, 3> {
    input.clone().narrow(0, index, 1).narrow(1, 0, length)
}

#[test]
fn test_identical_cells_give_matching_state_shapes() {
    let device = Default::default();
    let cell = LstmCell::<Backend>::new(4, 6, &device);
    let birnn = BidirectionalRnn::from_cells("birnn", cell.clone(), cell);

    let (forward, backward) = birnn.forward(random_input([3, 7, 4])).unwrap();

    assert_eq!(forward.output.dims(), backward.output.dims());
    assert_eq!(forward.state.shapes(), backward.state.shapes());
    assert_eq!(forward.state.shapes(), vec![[3, 6], [3, 6]]);
}

#[test]
fn test_concatenated_width_is_sum_of_directions() {
    let device = Default::default();
    for (forward_size, backward_size) in [(1, 1), (4, 9), (16, 3)] {
        let birnn = BidirectionalRnn::<Backend, _, _>::new(
            "birnn",
            GruCellConfig::new(forward_size),
            LstmCellConfig::new(backward_size),
        )
        .with_concatenated_outputs();

        let input = Tensor::<Backend, 3>::ones([2, 5, 3], &device);
        let result = birnn.forward(input).unwrap();

        assert_eq!(result.output.dims(), [2, 5, forward_size + backward_size]);
        assert_eq!(result.state.0.dims(), [2, forward_size]);
        assert_eq!(result.state.1 .0.dims(), [2, backward_size]);
    }
}

#[test]
fn test_concatenated_output_halves_match_directions() {
    let device = Default::default();
    let forward_cell = GruCell::<Backend>::new(3, 5, &device);
    let backward_cell = BasicRnnCell::<Backend>::new(3, 2, &device);
    let input = random_input([2, 4, 3]);

    let separate =
        BidirectionalRnn::from_cells("birnn", forward_cell.clone(), backward_cell.clone());
    let (forward, backward) = separate.forward(input.clone()).unwrap();

    let joined = BidirectionalRnn::from_cells("birnn", forward_cell, backward_cell)
        .with_concatenated_outputs()
        .forward(input)
        .unwrap();

    assert_tensors_close(joined.output.clone().narrow(2, 0, 5), forward.output);
    assert_tensors_close(joined.output.narrow(2, 5, 2), backward.output);
}

#[test]
fn test_merged_state_joins_directions() {
    let device = Default::default();
    let forward_cell = LstmCell::<Backend>::new(3, 5, &device);
    let backward_cell = LstmCell::<Backend>::new(3, 2, &device);
    let input = random_input([2, 4, 3]);

    let birnn = BidirectionalRnn::from_cells("birnn", forward_cell, backward_cell)
        .with_concatenated_outputs();
    let separate = birnn.forward(input.clone()).unwrap();
    let merged = birnn.forward_merged(input).unwrap();

    assert_eq!(merged.state.shapes(), vec![[2, 7], [2, 7]]);
    assert_tensors_close(merged.output, separate.output);

    let ((forward_h, _), (backward_h, _)) = separate.state;
    let (merged_h, _) = merged.state;
    assert_tensors_close(merged_h.clone().narrow(1, 0, 5), forward_h);
    assert_tensors_close(merged_h.narrow(1, 5, 2), backward_h);
}

#[test]
fn test_merged_state_rejects_different_stack_depths() {
    let birnn = BidirectionalRnn::<Backend, _, _>::new(
        "birnn",
        StackedCellConfig::new("fw", vec![GruCellConfig::new(4)]),
        StackedCellConfig::new("bw", vec![GruCellConfig::new(4), GruCellConfig::new(4)]),
    )
    .with_concatenated_outputs();

    let err = birnn.forward_merged(random_input([2, 3, 3])).unwrap_err();
    assert_eq!(err, RnnError::StructureMismatch { left: 1, right: 2 });
}

#[test]
fn test_omitted_initial_state_equals_zero_producer() {
    let device: <Backend as burn::tensor::backend::Backend>::Device = Default::default();
    let forward_cell = LstmCell::<Backend>::new(3, 6, &device);
    let backward_cell = GruCell::<Backend>::new(3, 4, &device);
    let input = random_input([2, 5, 3]);

    let implicit =
        BidirectionalRnn::from_cells("birnn", forward_cell.clone(), backward_cell.clone());

    let (zero_forward, zero_backward) = (forward_cell.clone(), backward_cell.clone());
    let (forward_device, backward_device) = (device.clone(), device.clone());
    let explicit = BidirectionalRnn::from_cells("birnn", forward_cell, backward_cell)
        .with_forward_initial_state(move || zero_forward.zero_state(2, &forward_device))
        .with_backward_initial_state(move || zero_backward.zero_state(2, &backward_device));

    let (implicit_fw, implicit_bw) = implicit.forward(input.clone()).unwrap();
    let (explicit_fw, explicit_bw) = explicit.forward(input).unwrap();

    assert_tensors_close(implicit_fw.output, explicit_fw.output);
    assert_tensors_close(implicit_fw.state.1, explicit_fw.state.1);
    assert_tensors_close(implicit_bw.output, explicit_bw.output);
    assert_tensors_close(implicit_bw.state, explicit_bw.state);
}

#[test]
fn test_initial_state_producer_is_used() {
    let device: <Backend as burn::tensor::backend::Backend>::Device = Default::default();
    let cell = GruCell::<Backend>::new(3, 4, &device);
    let input = random_input([2, 1, 3]);

    let zero = BidirectionalRnn::from_cells("birnn", cell.clone(), cell.clone());
    let ones = BidirectionalRnn::from_cells("birnn", cell.clone(), cell)
        .with_forward_initial_state(move || Tensor::ones([2, 4], &device));

    let (zero_fw, zero_bw) = zero.forward(input.clone()).unwrap();
    let (ones_fw, ones_bw) = ones.forward(input).unwrap();

    let forward_diff: f32 = (zero_fw.state - ones_fw.state).abs().sum().into_scalar();
    assert!(forward_diff > 1e-4);
    assert_tensors_close(zero_bw.state, ones_bw.state);
}

#[test]
fn test_malformed_sequence_lengths_are_rejected() {
    let mut rng = StdRng::seed_from_u64(7);
    let batch = 4;

    for _ in 0..8 {
        let mut count = rng.gen_range(0..2 * batch);
        if count == batch {
            count += 1;
        }
        let lengths: Vec<usize> = (0..count).map(|_| rng.gen_range(0..=6)).collect();

        let birnn = BidirectionalRnn::<Backend, _, _>::new(
            "birnn",
            GruCellConfig::new(3),
            GruCellConfig::new(3),
        )
        .with_sequence_lengths(lengths);

        let err = birnn.forward(random_input([batch, 6, 2])).unwrap_err();
        assert_eq!(
            err,
            RnnError::SequenceLengthCount {
                expected: batch,
                actual: count
            }
        );
    }
}

#[test]
fn test_sequence_length_beyond_time_axis_is_rejected() {
    let birnn = BidirectionalRnn::<Backend, _, _>::new(
        "birnn",
        GruCellConfig::new(3),
        GruCellConfig::new(3),
    )
    .with_sequence_lengths(vec![2, 7]);

    let err = birnn.forward(random_input([2, 6, 2])).unwrap_err();
    assert_eq!(
        err,
        RnnError::SequenceLengthOutOfRange {
            row: 1,
            length: 7,
            max_time: 6
        }
    );
}

#[test]
fn test_masked_rows_match_truncated_runs() {
    let device = Default::default();
    let forward_cell = LstmCell::<Backend>::new(3, 5, &device);
    let backward_cell = GruCell::<Backend>::new(3, 4, &device);
    let lengths = vec![6, 3, 1];
    let input = random_input([3, 6, 3]);

    let masked = BidirectionalRnn::from_cells("birnn", forward_cell.clone(), backward_cell.clone())
        .with_sequence_lengths(lengths.clone());
    let (forward, backward) = masked.forward(input.clone()).unwrap();

    let unmasked = BidirectionalRnn::from_cells("birnn", forward_cell, backward_cell);

    for (index, &length) in lengths.iter().enumerate() {
        let (row_fw, row_bw) = unmasked.forward(row(&input, index, length)).unwrap();

        assert_tensors_close(row(&forward.output, index, length), row_fw.output);
        assert_tensors_close(row(&backward.output, index, length), row_bw.output);
        assert_tensors_close(
            forward.state.0.clone().narrow(0, index, 1),
            row_fw.state.0,
        );
        assert_tensors_close(forward.state.1.clone().narrow(0, index, 1), row_fw.state.1);
        assert_tensors_close(backward.state.clone().narrow(0, index, 1), row_bw.state);

        if length < 6 {
            let padding = forward.output.clone().narrow(0, index, 1).narrow(1, length, 6 - length);
            let total: f32 = padding.abs().sum().into_scalar();
            assert_eq!(total, 0.0);
            let padding = backward.output.clone().narrow(0, index, 1).narrow(1, length, 6 - length);
            let total: f32 = padding.abs().sum().into_scalar();
            assert_eq!(total, 0.0);
        }
    }
}

#[test]
fn test_zero_length_row_keeps_initial_state() {
    let device = Default::default();
    let birnn = BidirectionalRnn::<Backend, _, _>::new(
        "birnn",
        BasicRnnCellConfig::new(4),
        BasicRnnCellConfig::new(4),
    )
    .with_sequence_lengths(vec![0, 3]);

    let input = Tensor::<Backend, 3>::ones([2, 3, 2], &device);
    let (forward, backward) = birnn.forward(input).unwrap();

    let first_row_output: f32 = forward.output.narrow(0, 0, 1).abs().sum().into_scalar();
    let first_row_state: f32 = forward.state.narrow(0, 0, 1).abs().sum().into_scalar();
    let backward_state: f32 = backward.state.narrow(0, 0, 1).abs().sum().into_scalar();
    assert_eq!(first_row_output, 0.0);
    assert_eq!(first_row_state, 0.0);
    assert_eq!(backward_state, 0.0);
}

#[test]
fn test_backward_direction_reads_reversed_sequence() {
    let device = Default::default();
    let forward_cell = BasicRnnCell::<Backend>::new(3, 4, &device);
    let backward_cell = GruCell::<Backend>::new(3, 4, &device);
    let input = random_input([2, 5, 3]);

    let birnn = BidirectionalRnn::from_cells("birnn", forward_cell, backward_cell.clone());
    let (_, backward) = birnn.forward(input.clone()).unwrap();

    let reversed = reverse_sequence(input, None).unwrap();
    let single = Rnn::from_cell("bw", backward_cell).forward(reversed).unwrap();

    assert_tensors_close(backward.state, single.state);
    assert_tensors_close(
        backward.output,
        reverse_sequence(single.output, None).unwrap(),
    );
}

#[test]
fn test_time_major_matches_batch_major() {
    let device = Default::default();
    let forward_cell = LstmCell::<Backend>::new(3, 5, &device);
    let backward_cell = LstmCell::<Backend>::new(3, 5, &device);
    let input = random_input([2, 4, 3]);

    let batch_major =
        BidirectionalRnn::from_cells("birnn", forward_cell.clone(), backward_cell.clone())
            .with_sequence_lengths(vec![4, 2]);
    let time_major = BidirectionalRnn::from_cells("birnn", forward_cell, backward_cell)
        .with_sequence_lengths(vec![4, 2])
        .with_time_major(true);

    let (bm_fw, bm_bw) = batch_major.forward(input.clone()).unwrap();
    let (tm_fw, tm_bw) = time_major.forward(input.swap_dims(0, 1)).unwrap();

    assert_eq!(tm_fw.output.dims(), [4, 2, 5]);
    assert_tensors_close(tm_fw.output.swap_dims(0, 1), bm_fw.output);
    assert_tensors_close(tm_bw.output.swap_dims(0, 1), bm_bw.output);
    assert_tensors_close(tm_fw.state.1, bm_fw.state.1);
    assert_tensors_close(tm_bw.state.1, bm_bw.state.1);
}

#[test]
fn test_pass_through_settings_do_not_change_values() {
    let device = Default::default();
    let forward_cell = GruCell::<Backend>::new(3, 4, &device);
    let backward_cell = GruCell::<Backend>::new(3, 4, &device);
    let input = random_input([2, 4, 3]);

    let default =
        BidirectionalRnn::from_cells("birnn", forward_cell.clone(), backward_cell.clone());
    let tuned = BidirectionalRnn::from_cells("birnn", forward_cell, backward_cell)
        .with_parallel_iterations(1)
        .with_swap_memory(true);

    let (default_fw, default_bw) = default.forward(input.clone()).unwrap();
    let (tuned_fw, tuned_bw) = tuned.forward(input).unwrap();
    assert_tensors_close(default_fw.output, tuned_fw.output);
    assert_tensors_close(default_bw.output, tuned_bw.output);
}

#[test]
fn test_input_width_mismatch_after_build() {
    let birnn = BidirectionalRnn::<Backend, _, _>::new(
        "birnn",
        GruCellConfig::new(3),
        GruCellConfig::new(3),
    );
    birnn.forward(random_input([1, 2, 4])).unwrap();

    let err = birnn.forward(random_input([1, 2, 5])).unwrap_err();
    assert_eq!(
        err,
        RnnError::InputSizeMismatch {
            expected: 4,
            actual: 5
        }
    );
}
