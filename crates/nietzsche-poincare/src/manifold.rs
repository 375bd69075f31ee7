//! # Capability interfaces
//!
//! Two small traits describe what a geometry must offer:
//!
//! - [`Manifold`]: a domain with a membership predicate.
//! - [`RiemannianMetric`]: the metric operations `exp`, `log`, `dist` and
//!   `inner_product_matrix`. Inner products, norms and squared distances are
//!   derived from those.
//!
//! All batch arguments are 2-D views (rows are batch elements) and broadcast
//! on the leading axis as described in [`crate::batch`].

use ndarray::{Array1, Array2, Array3, ArrayView2, Axis};

use crate::batch;
use crate::error::BallError;

/// A space of points with a membership test.
pub trait Manifold {
    /// Dimension of the points.
    fn dimension(&self) -> usize;

    /// One flag per row: does the point lie in the domain within `tolerance`?
    fn belongs(&self, points: ArrayView2<'_, f64>, tolerance: f64) -> Array1<bool>;
}

/// Metric operations on a Riemannian manifold.
pub trait RiemannianMetric {
    /// Dimension of points and tangent vectors.
    fn dimension(&self) -> usize;

    /// Riemannian exponential of `tangent_vec` at `base_point`.
    fn exp(
        &self,
        tangent_vec: ArrayView2<'_, f64>,
        base_point: ArrayView2<'_, f64>,
    ) -> Result<Array2<f64>, BallError>;

    /// Riemannian logarithm of `point` at `base_point`.
    fn log(
        &self,
        point: ArrayView2<'_, f64>,
        base_point: ArrayView2<'_, f64>,
    ) -> Result<Array2<f64>, BallError>;

    /// Geodesic distance, one value per broadcast row.
    fn dist(
        &self,
        point_a: ArrayView2<'_, f64>,
        point_b: ArrayView2<'_, f64>,
    ) -> Result<Array1<f64>, BallError>;

    /// Metric tensor at each base point, shaped `[n, d, d]`.
    ///
    /// `None` means the origin.
    fn inner_product_matrix(&self, base_point: Option<ArrayView2<'_, f64>>) -> Array3<f64>;

    /// ⟨u, v⟩ at `base_point`: `uᵀ G(base_point) v` per broadcast row.
    fn inner_product(
        &self,
        tangent_vec_a: ArrayView2<'_, f64>,
        tangent_vec_b: ArrayView2<'_, f64>,
        base_point: Option<ArrayView2<'_, f64>>,
    ) -> Result<Array1<f64>, BallError> {
        let dim = self.dimension();
        let widths = [tangent_vec_a.ncols(), tangent_vec_b.ncols()]
            .into_iter()
            .chain(base_point.map(|b| b.ncols()));
        for got in widths {
            if got != dim {
                return Err(BallError::DimensionMismatch { expected: dim, got });
            }
        }
        let n = batch::paired_len(&tangent_vec_a, &tangent_vec_b)?;
        let gram = self.inner_product_matrix(base_point);
        let n = batch::broadcast_len(n, gram.len_of(Axis(0)))?;

        let single = gram.len_of(Axis(0)) == 1;
        let values = (0..n).map(|i| {
            let g = gram.index_axis(Axis(0), if single { 0 } else { i });
            let u = batch::row(&tangent_vec_a, i);
            let v = batch::row(&tangent_vec_b, i);
            u.dot(&g).dot(&v)
        });
        Ok(Array1::from_iter(values))
    }

    /// Squared Riemannian norm of tangent vectors.
    fn squared_norm(
        &self,
        tangent_vec: ArrayView2<'_, f64>,
        base_point: Option<ArrayView2<'_, f64>>,
    ) -> Result<Array1<f64>, BallError> {
        self.inner_product(tangent_vec, tangent_vec, base_point)
    }

    /// Riemannian norm of tangent vectors.
    fn norm(
        &self,
        tangent_vec: ArrayView2<'_, f64>,
        base_point: Option<ArrayView2<'_, f64>>,
    ) -> Result<Array1<f64>, BallError> {
        Ok(self.squared_norm(tangent_vec, base_point)?.mapv(f64::sqrt))
    }

    fn squared_dist(
        &self,
        point_a: ArrayView2<'_, f64>,
        point_b: ArrayView2<'_, f64>,
    ) -> Result<Array1<f64>, BallError> {
        Ok(self.dist(point_a, point_b)?.mapv(|d| d * d))
    }
}
