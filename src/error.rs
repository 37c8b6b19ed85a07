//! Error type shared by cells, layers and the execution engine.

use thiserror::Error;

/// Errors raised while composing cells or running them over a sequence.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RnnError {
    #[error("stacked cell `{name}` needs at least one cell")]
    EmptyStack { name: String },

    #[error(
        "cell {index} emits {output_size} features but cell {next} expects {input_size}",
        next = .index + 1
    )]
    IncompatibleCells {
        index: usize,
        output_size: usize,
        input_size: usize,
    },

    #[error("residual connection needs matching widths, cell maps {input_size} to {output_size}")]
    ResidualSizeMismatch {
        input_size: usize,
        output_size: usize,
    },

    #[error("expected {expected} states (one per cell), got {actual}")]
    StateCountMismatch { expected: usize, actual: usize },

    #[error("expected input with {expected} features, got {actual}")]
    InputSizeMismatch { expected: usize, actual: usize },

    #[error("initial state shapes {actual:?} do not match expected {expected:?}")]
    StateShapeMismatch {
        expected: Vec<[usize; 2]>,
        actual: Vec<[usize; 2]>,
    },

    #[error("state structures differ: {left} leaves against {right}")]
    StructureMismatch { left: usize, right: usize },

    #[error("cannot concatenate outputs with leading dims {forward:?} and {backward:?}")]
    OutputMismatch {
        forward: [usize; 2],
        backward: [usize; 2],
    },

    #[error("sequence lengths cover {actual} rows but the batch has {expected}")]
    SequenceLengthCount { expected: usize, actual: usize },

    #[error("sequence length {length} of row {row} exceeds the {max_time} available time steps")]
    SequenceLengthOutOfRange {
        row: usize,
        length: usize,
        max_time: usize,
    },

    #[error("parallel iterations must be at least 1")]
    InvalidParallelIterations,

    #[error("input sequence has no time steps")]
    EmptySequence,
}

pub type Result<T> = std::result::Result<T, RnnError>;
