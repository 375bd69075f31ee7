//! Batch promotion and broadcasting.
//!
//! A batch is a 2-D view whose rows are vectors of the ball's dimension.
//! Pairing two batches follows leading-axis broadcasting: equal sizes pair
//! row by row, and a batch of one pairs with every row of the other side.
//! Output rows keep input order.

use ndarray::{Array2, ArrayView1, ArrayView2, Axis};

use crate::error::BallError;

/// Promote a lone vector to a batch of one.
#[inline]
pub fn promote(v: &[f64]) -> ArrayView2<'_, f64> {
    ArrayView1::from(v).insert_axis(Axis(0))
}

/// Stack equally sized vectors into an owned batch.
///
/// # Errors
///
/// Returns [`BallError::DimensionMismatch`] if the vectors differ in length.
pub fn stack(vectors: &[Vec<f64>]) -> Result<Array2<f64>, BallError> {
    let dim = vectors.first().map(Vec::len).unwrap_or(0);
    let mut out = Array2::zeros((vectors.len(), dim));
    for (mut dst, v) in out.outer_iter_mut().zip(vectors) {
        if v.len() != dim {
            return Err(BallError::DimensionMismatch { expected: dim, got: v.len() });
        }
        dst.assign(&ArrayView1::from(v.as_slice()));
    }
    Ok(out)
}

/// Size of the broadcast batch for operand sizes `left` and `right`.
pub fn broadcast_len(left: usize, right: usize) -> Result<usize, BallError> {
    match (left, right) {
        (l, r) if l == r => Ok(l),
        (1, r) => Ok(r),
        (l, 1) => Ok(l),
        (left, right) => Err(BallError::BatchMismatch { left, right }),
    }
}

/// Check that two batches share a dimension and return their broadcast size.
pub fn paired_len(left: &ArrayView2<'_, f64>, right: &ArrayView2<'_, f64>) -> Result<usize, BallError> {
    if left.ncols() != right.ncols() {
        return Err(BallError::DimensionMismatch {
            expected: left.ncols(),
            got: right.ncols(),
        });
    }
    broadcast_len(left.nrows(), right.nrows())
}

/// Row `i` of the broadcast view of `batch`.
#[inline]
pub fn row<'b>(batch: &'b ArrayView2<'_, f64>, i: usize) -> ArrayView1<'b, f64> {
    if batch.nrows() == 1 {
        batch.row(0)
    } else {
        batch.row(i)
    }
}
