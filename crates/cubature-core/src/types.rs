//! Core point-set type.

use alloc::vec;
use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

/// A batch of `n` points in `dimension` dimensions, stored row-major.
///
/// Integrands and measures consume whole batches; a point is never passed on
/// its own through the public interfaces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Points {
    n: usize,
    dimension: usize,
    data: Vec<f64>,
}

impl Points {
    /// Create `n` points at the origin.
    pub fn zeros(n: usize, dimension: usize) -> Self {
        assert!(dimension > 0, "dimension must be > 0");
        Self {
            n,
            dimension,
            data: vec![0.0; n * dimension],
        }
    }

    /// Wrap row-major data.
    ///
    /// # Panics
    ///
    /// Panics if `data.len() != n * dimension` or `dimension == 0`.
    pub fn from_vec(n: usize, dimension: usize, data: Vec<f64>) -> Self {
        assert!(dimension > 0, "dimension must be > 0");
        assert_eq!(
            data.len(),
            n * dimension,
            "point data length must equal n * dimension"
        );
        Self { n, dimension, data }
    }

    /// An empty batch with the given dimension.
    pub fn empty(dimension: usize) -> Self {
        Self::zeros(0, dimension)
    }

    /// Number of points.
    pub fn n(&self) -> usize {
        self.n
    }

    /// Dimension of each point.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// True if the batch holds no points.
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Coordinates of point `i`.
    pub fn row(&self, i: usize) -> &[f64] {
        let start = i * self.dimension;
        &self.data[start..start + self.dimension]
    }

    /// Mutable coordinates of point `i`.
    pub fn row_mut(&mut self, i: usize) -> &mut [f64] {
        let start = i * self.dimension;
        &mut self.data[start..start + self.dimension]
    }

    /// Iterate over points.
    pub fn rows(&self) -> core::slice::ChunksExact<'_, f64> {
        self.data.chunks_exact(self.dimension)
    }

    /// Iterate mutably over points.
    pub fn rows_mut(&mut self) -> core::slice::ChunksExactMut<'_, f64> {
        self.data.chunks_exact_mut(self.dimension)
    }

    /// Raw row-major coordinates.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Consume the batch and return its row-major coordinates.
    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    /// Interleave two equally sized batches: `even` lands on even rows and
    /// `odd` on odd rows of a fresh batch.
    ///
    /// Both inputs are consumed so no caller keeps a view of either half.
    pub fn interleave(even: Points, odd: Points) -> Points {
        assert_eq!(even.dimension, odd.dimension, "dimension mismatch");
        assert_eq!(even.n, odd.n, "interleaved halves must have equal size");
        let d = even.dimension;
        let mut data = Vec::with_capacity(2 * even.data.len());
        for (e, o) in even.rows().zip(odd.rows()) {
            data.extend_from_slice(e);
            data.extend_from_slice(o);
        }
        Points {
            n: 2 * even.n,
            dimension: d,
            data,
        }
    }

    /// Reorder rows so that output row `i` is input row `index(i)`.
    pub fn permuted(&self, index: impl Fn(usize) -> usize) -> Points {
        let mut data = Vec::with_capacity(self.data.len());
        for i in 0..self.n {
            data.extend_from_slice(self.row(index(i)));
        }
        Points {
            n: self.n,
            dimension: self.dimension,
            data,
        }
    }
}
