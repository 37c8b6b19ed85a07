//! Recurrent state structures and the output/state pair.
//!
//! A cell's state is a small tree (a single tensor, a pair, or a list of
//! per-layer states) whose leaves are `[batch, width]` tensors. The engine
//! never looks inside a state beyond these leaves: masking, shape checks and
//! concatenation all go through [`CellState`].

use crate::error::{Result, RnnError};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Output and state produced by one step or one full pass over a sequence.
#[derive(Debug, Clone)]
pub struct RnnOutput<O, S> {
    pub output: O,
    pub state: S,
}

impl<O, S> RnnOutput<O, S> {
    pub fn new(output: O, state: S) -> Self {
        Self { output, state }
    }

    pub fn into_parts(self) -> (O, S) {
        (self.output, self.state)
    }
}

/// A state tree with `[batch, width]` tensor leaves.
pub trait CellState<B: Backend>: Clone + core::fmt::Debug + Sized {
    /// Leaves in a fixed depth-first order.
    fn leaves(&self) -> Vec<Tensor<B, 2>>;

    /// Rebuilds the tree with `f` applied to every leaf.
    fn map_leaves<F>(self, f: &mut F) -> Self
    where
        F: FnMut(Tensor<B, 2>) -> Tensor<B, 2>;

    /// Combines two trees of the same structure leaf by leaf.
    ///
    /// Fails with [`RnnError::StructureMismatch`] when the trees differ.
    fn zip_with<F>(self, other: Self, f: &mut F) -> Result<Self>
    where
        F: FnMut(Tensor<B, 2>, Tensor<B, 2>) -> Tensor<B, 2>;

    fn num_leaves(&self) -> usize {
        self.leaves().len()
    }

    fn shapes(&self) -> Vec<[usize; 2]> {
        self.leaves().iter().map(|leaf| leaf.dims()).collect()
    }
}

impl<B: Backend> CellState<B> for Tensor<B, 2> {
    fn leaves(&self) -> Vec<Tensor<B, 2>> {
        vec![self.clone()]
    }

    fn map_leaves<F>(self, f: &mut F) -> Self
    where
        F: FnMut(Tensor<B, 2>) -> Tensor<B, 2>,
    {
        f(self)
    }

    fn zip_with<F>(self, other: Self, f: &mut F) -> Result<Self>
    where
        F: FnMut(Tensor<B, 2>, Tensor<B, 2>) -> Tensor<B, 2>,
    {
        Ok(f(self, other))
    }

    fn num_leaves(&self) -> usize {
        1
    }
}

impl<B: Backend, S1: CellState<B>, S2: CellState<B>> CellState<B> for (S1, S2) {
    fn leaves(&self) -> Vec<Tensor<B, 2>> {
        let mut leaves = self.0.leaves();
        leaves.extend(self.1.leaves());
        leaves
    }

    fn map_leaves<F>(self, f: &mut F) -> Self
    where
        F: FnMut(Tensor<B, 2>) -> Tensor<B, 2>,
    {
        (self.0.map_leaves(f), self.1.map_leaves(f))
    }

    fn zip_with<F>(self, other: Self, f: &mut F) -> Result<Self>
    where
        F: FnMut(Tensor<B, 2>, Tensor<B, 2>) -> Tensor<B, 2>,
    {
        Ok((self.0.zip_with(other.0, f)?, self.1.zip_with(other.1, f)?))
    }
}

impl<B: Backend, S: CellState<B>> CellState<B> for Vec<S> {
    fn leaves(&self) -> Vec<Tensor<B, 2>> {
        self.iter().flat_map(|state| state.leaves()).collect()
    }

    fn map_leaves<F>(self, f: &mut F) -> Self
    where
        F: FnMut(Tensor<B, 2>) -> Tensor<B, 2>,
    {
        self.into_iter().map(|state| state.map_leaves(f)).collect()
    }

    fn zip_with<F>(self, other: Self, f: &mut F) -> Result<Self>
    where
        F: FnMut(Tensor<B, 2>, Tensor<B, 2>) -> Tensor<B, 2>,
    {
        if self.len() != other.len() {
            return Err(RnnError::StructureMismatch {
                left: self.num_leaves(),
                right: other.num_leaves(),
            });
        }
        self.into_iter()
            .zip(other)
            .map(|(left, right)| left.zip_with(right, f))
            .collect()
    }
}

/// Concatenates two isomorphic state trees along the feature axis.
pub fn concat_states<B: Backend, S: CellState<B>>(left: S, right: S) -> Result<S> {
    left.zip_with(right, &mut |l: Tensor<B, 2>, r: Tensor<B, 2>| {
        Tensor::cat(vec![l, r], 1)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    fn leaf(width: usize, value: f32) -> Tensor<TestBackend, 2> {
        Tensor::<TestBackend, 2>::ones([2, width], &Default::default()) * value
    }

    #[test]
    fn test_nested_leaves_are_depth_first() {
        let state = vec![(leaf(3, 1.0), leaf(4, 2.0)), (leaf(5, 3.0), leaf(6, 4.0))];
        assert_eq!(state.num_leaves(), 4);
        assert_eq!(state.shapes(), vec![[2, 3], [2, 4], [2, 5], [2, 6]]);
    }

    #[test]
    fn test_map_leaves_keeps_structure() {
        let state = (leaf(3, 1.0), vec![leaf(2, 1.0)]);
        let doubled = state.map_leaves(&mut |t: Tensor<TestBackend, 2>| t * 2.0);
        assert_eq!(doubled.shapes(), vec![[2, 3], [2, 2]]);
        let total: f32 = doubled.1[0].clone().sum().into_scalar();
        assert!((total - 8.0).abs() < 1e-6);
    }

    #[test]
    fn test_zip_rejects_different_list_lengths() {
        let left = vec![leaf(3, 1.0), leaf(3, 1.0)];
        let right = vec![leaf(3, 1.0)];
        let err = left
            .zip_with(right, &mut |l: Tensor<TestBackend, 2>, _r: Tensor<TestBackend, 2>| l)
            .unwrap_err();
        assert_eq!(err, RnnError::StructureMismatch { left: 2, right: 1 });
    }

    #[test]
    fn test_concat_states_widens_every_leaf() {
        let merged = concat_states((leaf(3, 1.0), leaf(2, 1.0)), (leaf(4, 1.0), leaf(1, 1.0)))
            .unwrap();
        assert_eq!(merged.shapes(), vec![[2, 7], [2, 3]]);
    }
}
