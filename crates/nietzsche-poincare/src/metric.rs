//! # Poincaré ball metric
//!
//! Curvature-aware replacements for vector arithmetic on the ball. Möbius
//! addition is the primitive; `exp` and `log` are built on it.
//!
//! ```text
//! exp_x(v) = x ⊕ tanh(‖v‖ / (1 − ‖x‖²)) · v / ‖v‖
//! log_x(y) = (1 − ‖x‖²) · atanh(‖u‖) · u / ‖u‖,      u = (−x) ⊕ y
//! d(a, b)  = scale · acosh(1 + 2‖a − b‖² / ((1 − ‖a‖²)(1 − ‖b‖²)))
//! R_x(v)   = x − ((1 − ‖x‖²)² / 4) · v
//! G(x)     = λ_x² · I,                             λ_x = 2 / (1 − ‖x‖²)
//! ```
//!
//! ## Degenerate inputs
//!
//! A zero tangent vector in `exp` and coincident points in `log` are not
//! errors. The division is first guarded (the zero norm is replaced by
//! [`EPSILON`](crate::EPSILON) in `exp`), then the affected rows are
//! overwritten with the exact limit: the base point for `exp`, the zero vector
//! for `log`. Zero detection uses the fixed absolute threshold
//! [`ZERO_ATOL`](crate::ZERO_ATOL).

use ndarray::{Array1, Array2, Array3, ArrayView2};

use crate::ball::PoincareBall;
use crate::batch::{self, promote};
use crate::config::BallConfig;
use crate::error::BallError;
use crate::manifold::{Manifold, RiemannianMetric};
use crate::{conformal_factor, is_near_zero, l2_norm, squared_norm};

/// Riemannian metric of the Poincaré ball.
///
/// Holds the [`PoincareBall`] it validates against; its scale multiplies
/// every distance.
#[derive(Debug, Clone, PartialEq)]
pub struct PoincareBallMetric {
    ball: PoincareBall,
    epsilon: f64,
}

impl PoincareBallMetric {
    pub fn new(dimension: usize, scale: f64) -> Result<Self, BallError> {
        Self::from_config(&BallConfig::new(dimension, scale))
    }

    pub fn from_config(config: &BallConfig) -> Result<Self, BallError> {
        Ok(Self::with_ball(PoincareBall::from_config(config)?, config.epsilon))
    }

    pub fn with_ball(ball: PoincareBall, epsilon: f64) -> Self {
        Self { ball, epsilon }
    }

    #[inline]
    pub fn ball(&self) -> &PoincareBall {
        &self.ball
    }

    #[inline]
    pub fn scale(&self) -> f64 {
        self.ball.scale()
    }

    // ─────────────────────────────────────────────
    // Möbius addition
    // ─────────────────────────────────────────────

    /// Row-wise Möbius addition `a ⊕ b`.
    ///
    /// # Errors
    ///
    /// [`BallError::PointNotInDomain`] if any row of `a` or `b` fails the
    /// membership test; shape errors if the batches cannot be paired.
    pub fn mobius_add(
        &self,
        point_a: ArrayView2<'_, f64>,
        point_b: ArrayView2<'_, f64>,
    ) -> Result<Array2<f64>, BallError> {
        self.ball.check_domain("mobius_add", point_a)?;
        self.ball.check_domain("mobius_add", point_b)?;
        let n = batch::paired_len(&point_a, &point_b)?;

        let mut out = Array2::zeros((n, point_a.ncols()));
        for (i, mut dst) in out.outer_iter_mut().enumerate() {
            let sum = crate::mobius_add(batch::row(&point_a, i), batch::row(&point_b, i));
            dst.assign(&sum);
        }
        Ok(out)
    }

    // ─────────────────────────────────────────────
    // Retraction
    // ─────────────────────────────────────────────

    /// First-order approximation of `exp`:
    ///
    /// ```text
    /// R_x(v) = x − ((1 − ‖x‖²)² / 4) · v
    /// ```
    ///
    /// The result is not projected back onto the ball; see
    /// [`PoincareBall::projection`].
    ///
    /// # Errors
    ///
    /// [`BallError::PointNotInDomain`] if a base point is outside the ball.
    pub fn retraction(
        &self,
        tangent_vec: ArrayView2<'_, f64>,
        base_point: ArrayView2<'_, f64>,
    ) -> Result<Array2<f64>, BallError> {
        self.ball.check_domain("retraction", base_point)?;
        let n = batch::paired_len(&tangent_vec, &base_point)?;

        let mut out = Array2::zeros((n, base_point.ncols()));
        for (i, mut dst) in out.outer_iter_mut().enumerate() {
            let x = batch::row(&base_point, i);
            let v = batch::row(&tangent_vec, i);
            let factor = (1.0 - squared_norm(x)).powi(2) / 4.0;
            dst.assign(&(&x - &(&v * factor)));
        }
        Ok(out)
    }

    /// λ_x = 2 / (1 − ‖x‖²) for every row.
    pub fn conformal_factor(&self, base_point: ArrayView2<'_, f64>) -> Array1<f64> {
        base_point.outer_iter().map(conformal_factor).collect()
    }

    /// Points along the geodesic from `base_point` with initial velocity
    /// `tangent_vec`, one row per entry of `times`: `exp(t · v, x)`.
    pub fn geodesic(
        &self,
        base_point: &[f64],
        tangent_vec: &[f64],
        times: &[f64],
    ) -> Result<Array2<f64>, BallError> {
        let velocities = batch::stack(
            &times
                .iter()
                .map(|&t| tangent_vec.iter().map(|v| v * t).collect())
                .collect::<Vec<Vec<f64>>>(),
        )?;
        if velocities.nrows() == 0 {
            return Ok(Array2::zeros((0, base_point.len())));
        }
        self.exp(velocities.view(), promote(base_point))
    }

    // ─────────────────────────────────────────────
    // Single-vector wrappers
    // ─────────────────────────────────────────────

    pub fn mobius_add_single(&self, point_a: &[f64], point_b: &[f64]) -> Result<Vec<f64>, BallError> {
        Ok(self.mobius_add(promote(point_a), promote(point_b))?.row(0).to_vec())
    }

    pub fn exp_single(&self, tangent_vec: &[f64], base_point: &[f64]) -> Result<Vec<f64>, BallError> {
        Ok(self.exp(promote(tangent_vec), promote(base_point))?.row(0).to_vec())
    }

    pub fn log_single(&self, point: &[f64], base_point: &[f64]) -> Result<Vec<f64>, BallError> {
        Ok(self.log(promote(point), promote(base_point))?.row(0).to_vec())
    }

    pub fn dist_single(&self, point_a: &[f64], point_b: &[f64]) -> Result<f64, BallError> {
        Ok(self.dist(promote(point_a), promote(point_b))?[0])
    }

    pub fn retraction_single(&self, tangent_vec: &[f64], base_point: &[f64]) -> Result<Vec<f64>, BallError> {
        Ok(self.retraction(promote(tangent_vec), promote(base_point))?.row(0).to_vec())
    }

    /// Metric tensor at a single point, shaped `[d, d]`.
    pub fn inner_product_matrix_single(&self, base_point: &[f64]) -> Array2<f64> {
        let gram = self.inner_product_matrix(Some(promote(base_point)));
        gram.index_axis_move(ndarray::Axis(0), 0)
    }
}

impl RiemannianMetric for PoincareBallMetric {
    fn dimension(&self) -> usize {
        self.ball.dimension()
    }

    fn exp(
        &self,
        tangent_vec: ArrayView2<'_, f64>,
        base_point: ArrayView2<'_, f64>,
    ) -> Result<Array2<f64>, BallError> {
        let n = batch::paired_len(&tangent_vec, &base_point)?;

        // Pass 1: guard zero norms so the direction stays finite.
        let mut zero_tan = Vec::with_capacity(n);
        let mut step = Array2::zeros((n, tangent_vec.ncols()));
        for (i, mut dst) in step.outer_iter_mut().enumerate() {
            let v = batch::row(&tangent_vec, i);
            let x = batch::row(&base_point, i);

            let lambda = 1.0 / (1.0 - squared_norm(x));
            let norm_sq = squared_norm(v);
            let is_zero = is_near_zero(norm_sq);
            let norm_tan = if is_zero { self.epsilon } else { norm_sq.sqrt() };

            let factor = (lambda * norm_tan).tanh();
            dst.assign(&v.mapv(|c| c / norm_tan * factor));
            zero_tan.push(is_zero);
        }

        let mut exp = self
            .mobius_add(base_point, step.view())
            .map_err(|e| e.with_operation("exp"))?;

        // Pass 2: snap degenerate rows to the exact limit.
        let mut snapped = 0usize;
        for (i, mut dst) in exp.outer_iter_mut().enumerate() {
            if zero_tan[i] {
                dst.assign(&batch::row(&base_point, i));
                snapped += 1;
            }
        }
        if snapped > 0 {
            tracing::debug!(snapped, batch = n, "exp: zero tangent vectors mapped to base point");
        }
        Ok(exp)
    }

    fn log(
        &self,
        point: ArrayView2<'_, f64>,
        base_point: ArrayView2<'_, f64>,
    ) -> Result<Array2<f64>, BallError> {
        let neg_base = base_point.mapv(|c| -c);
        let diff = self
            .mobius_add(neg_base.view(), point)
            .map_err(|e| e.with_operation("log"))?;

        let mut zero_diff = Vec::with_capacity(diff.nrows());
        let mut log = Array2::zeros(diff.raw_dim());
        for (i, mut dst) in log.outer_iter_mut().enumerate() {
            let u = diff.row(i);
            let x = batch::row(&base_point, i);

            let norm_u = l2_norm(u);
            let is_zero = is_near_zero(norm_u);
            let guarded = if is_zero { self.epsilon } else { norm_u };

            let coeff = (1.0 - squared_norm(x)) * norm_u.atanh() / guarded;
            dst.assign(&u.mapv(|c| c * coeff));
            zero_diff.push(is_zero);
        }

        let mut snapped = 0usize;
        for (i, mut dst) in log.outer_iter_mut().enumerate() {
            if zero_diff[i] {
                dst.fill(0.0);
                snapped += 1;
            }
        }
        if snapped > 0 {
            tracing::debug!(snapped, batch = diff.nrows(), "log: coincident points mapped to zero vector");
        }
        Ok(log)
    }

    fn dist(
        &self,
        point_a: ArrayView2<'_, f64>,
        point_b: ArrayView2<'_, f64>,
    ) -> Result<Array1<f64>, BallError> {
        let n = batch::paired_len(&point_a, &point_b)?;
        let max_norm_sq = 1.0 - self.epsilon;
        let scale = self.scale();

        let dists = (0..n).map(|i| {
            let a = batch::row(&point_a, i);
            let b = batch::row(&point_b, i);

            let norm_a = squared_norm(a).clamp(0.0, max_norm_sq);
            let norm_b = squared_norm(b).clamp(0.0, max_norm_sq);
            let diff_norm: f64 = a.iter().zip(b.iter()).map(|(p, q)| (p - q).powi(2)).sum();

            let t = 1.0 + 2.0 * diff_norm / ((1.0 - norm_a) * (1.0 - norm_b));
            scale * (t + (t * t - 1.0).sqrt()).ln()
        });
        Ok(Array1::from_iter(dists))
    }

    fn inner_product_matrix(&self, base_point: Option<ArrayView2<'_, f64>>) -> Array3<f64> {
        let dim = self.dimension();
        let origin = Array2::<f64>::zeros((1, dim));
        let base_point = match base_point {
            Some(b) => b.reborrow(),
            None => origin.view(),
        };

        let mut out = Array3::zeros((base_point.nrows(), dim, dim));
        for (i, x) in base_point.outer_iter().enumerate() {
            let lambda = conformal_factor(x);
            for k in 0..dim {
                out[[i, k, k]] = lambda * lambda;
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn metric() -> PoincareBallMetric {
        PoincareBallMetric::new(2, 1.0).unwrap()
    }

    fn assert_close(actual: &[f64], expected: &[f64], tol: f64) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected.iter()) {
            assert!((a - e).abs() < tol, "expected {expected:?}, got {actual:?}");
        }
    }

    // ── mobius_add ──────────────────────────────

    #[test]
    fn mobius_add_zero_is_identity() {
        let b = [0.3, -0.5];
        let result = metric().mobius_add_single(&[0.0, 0.0], &b).unwrap();
        assert_close(&result, &b, 1e-12);
    }

    #[test]
    fn mobius_add_rejects_points_outside_ball() {
        let m = metric();
        for bad in [[1.0, 0.0], [0.8, 0.8], [0.0, -1.5]] {
            let err = m.mobius_add_single(&bad, &[0.1, 0.1]).unwrap_err();
            assert!(matches!(err, BallError::PointNotInDomain { operation: "mobius_add", .. }));
            let err = m.mobius_add_single(&[0.1, 0.1], &bad).unwrap_err();
            assert_eq!(err.rejected_points()[0].coords, bad.to_vec());
        }
    }

    #[test]
    fn mobius_add_broadcasts_single_row() {
        let a = array![[0.1, 0.2]];
        let b = array![[0.0, 0.0], [0.3, 0.0], [-0.2, 0.4]];
        let out = metric().mobius_add(a.view(), b.view()).unwrap();
        assert_eq!(out.nrows(), 3);
        assert_close(&out.row(0).to_vec(), &[0.1, 0.2], 1e-12);
        for i in 0..3 {
            let single = metric().mobius_add_single(&[0.1, 0.2], &b.row(i).to_vec()).unwrap();
            assert_close(&out.row(i).to_vec(), &single, 1e-15);
        }
    }

    #[test]
    fn mobius_add_rejects_unpairable_batches() {
        let a = array![[0.1, 0.2], [0.0, 0.1]];
        let b = array![[0.0, 0.0], [0.3, 0.0], [-0.2, 0.4]];
        assert!(matches!(
            metric().mobius_add(a.view(), b.view()),
            Err(BallError::BatchMismatch { left: 2, right: 3 })
        ));
    }

    // ── exp ─────────────────────────────────────

    #[test]
    fn exp_at_origin_matches_tanh() {
        // λ = 1, direction = (1, 0), factor = tanh(0.5)
        let result = metric().exp_single(&[0.5, 0.0], &[0.0, 0.0]).unwrap();
        assert_close(&result, &[0.5_f64.tanh(), 0.0], 1e-12);
        assert!((result[0] - 0.4621).abs() < 1e-4);
    }

    #[test]
    fn exp_of_zero_is_base_point_exactly() {
        let base = [0.3, -0.4];
        let result = metric().exp_single(&[0.0, 0.0], &base).unwrap();
        assert_eq!(result, base.to_vec());
    }

    #[test]
    fn exp_snaps_only_degenerate_rows() {
        let tangents = array![[0.0, 0.0], [0.2, 0.1], [1e-5, 0.0]];
        let base = array![[0.1, 0.2]];
        let out = metric().exp(tangents.view(), base.view()).unwrap();
        assert_eq!(out.row(0).to_vec(), vec![0.1, 0.2]);
        assert_eq!(out.row(2).to_vec(), vec![0.1, 0.2]);
        assert!((out[[1, 0]] - 0.1).abs() > 1e-3);
    }

    #[test]
    fn exp_rejects_base_point_outside_ball() {
        let err = metric().exp_single(&[0.1, 0.0], &[0.9, 0.9]).unwrap_err();
        assert!(matches!(err, BallError::PointNotInDomain { .. }));
    }

    #[test]
    fn exp_errors_name_exp() {
        let m = metric();
        let err = m.exp_single(&[0.1, 0.0], &[0.9, 0.9]).unwrap_err();
        assert!(matches!(err, BallError::PointNotInDomain { operation: "exp", .. }));

        // tanh saturates to 1.0, so the step itself leaves the ball.
        let err = m.exp_single(&[50.0, 0.0], &[0.0, 0.0]).unwrap_err();
        assert!(matches!(err, BallError::PointNotInDomain { operation: "exp", .. }));
        assert_eq!(err.rejected_points()[0].index, 0);
    }

    #[test]
    fn log_errors_name_log() {
        let err = metric().log_single(&[0.9, 0.9], &[0.0, 0.0]).unwrap_err();
        assert!(matches!(err, BallError::PointNotInDomain { operation: "log", .. }));
    }

    // ── log ─────────────────────────────────────

    #[test]
    fn log_of_base_point_is_zero() {
        let base = [0.3, -0.4];
        let result = metric().log_single(&base, &base).unwrap();
        assert_eq!(result, vec![0.0, 0.0]);
    }

    #[test]
    fn log_at_origin_inverts_exp() {
        let p = [0.5_f64.tanh(), 0.0];
        let result = metric().log_single(&p, &[0.0, 0.0]).unwrap();
        assert_close(&result, &[0.5, 0.0], 1e-12);
    }

    #[test]
    fn log_exp_roundtrip() {
        let m = metric();
        let base = [0.2, -0.3];
        let v = [0.05, 0.12];
        let mapped = m.exp_single(&v, &base).unwrap();
        let recovered = m.log_single(&mapped, &base).unwrap();
        assert_close(&recovered, &v, 1e-10);
    }

    // ── dist ────────────────────────────────────

    #[test]
    fn dist_from_origin_known_value() {
        let d = metric().dist_single(&[0.0, 0.0], &[0.5, 0.0]).unwrap();
        assert!((d - 2.0 * 0.5_f64.atanh()).abs() < 1e-12);
        assert!((d - 1.0986).abs() < 1e-4);
    }

    #[test]
    fn dist_self_is_zero() {
        let p = [0.3, 0.4];
        assert_eq!(metric().dist_single(&p, &p).unwrap(), 0.0);
    }

    #[test]
    fn dist_scales_linearly() {
        let a = [0.1, 0.2];
        let b = [-0.4, 0.3];
        let d1 = metric().dist_single(&a, &b).unwrap();
        let d3 = PoincareBallMetric::new(2, 3.0).unwrap().dist_single(&a, &b).unwrap();
        assert!((d3 - 3.0 * d1).abs() < 1e-12);
    }

    #[test]
    fn dist_clips_boundary_points() {
        let d = metric().dist_single(&[1.0, 0.0], &[0.0, 0.0]).unwrap();
        assert!(d.is_finite() && d > 0.0, "boundary distance {d}");
    }

    // ── retraction ──────────────────────────────

    #[test]
    fn retraction_at_origin_is_quarter_step() {
        let result = metric().retraction_single(&[0.4, -0.8], &[0.0, 0.0]).unwrap();
        assert_close(&result, &[-0.1, 0.2], 1e-15);
    }

    #[test]
    fn retraction_rejects_base_outside_ball() {
        let err = metric().retraction_single(&[0.1, 0.0], &[1.0, 0.0]).unwrap_err();
        assert!(matches!(err, BallError::PointNotInDomain { operation: "retraction", .. }));
    }

    #[test]
    fn retraction_does_not_project() {
        // Large step from the origin leaves the ball; that is the caller's concern.
        let result = metric().retraction_single(&[-8.0, 0.0], &[0.0, 0.0]).unwrap();
        assert_close(&result, &[2.0, 0.0], 1e-15);
    }

    // ── inner_product_matrix ────────────────────

    #[test]
    fn inner_product_matrix_defaults_to_origin() {
        let g = metric().inner_product_matrix(None);
        assert_eq!(g.dim(), (1, 2, 2));
        assert_eq!(g.index_axis(ndarray::Axis(0), 0), array![[4.0, 0.0], [0.0, 4.0]]);
    }

    #[test]
    fn inner_product_matrix_uses_conformal_factor() {
        // ‖x‖² = 0.25 → λ = 2 / 0.75, λ² = 64 / 9
        let g = metric().inner_product_matrix_single(&[0.5, 0.0]);
        assert!((g[[0, 0]] - 64.0 / 9.0).abs() < 1e-12);
        assert!((g[[1, 1]] - 64.0 / 9.0).abs() < 1e-12);
        assert_eq!(g[[0, 1]], 0.0);
    }

    #[test]
    fn inner_product_matrix_one_per_row() {
        let base = array![[0.0, 0.0], [0.5, 0.0], [0.0, 0.1]];
        let g = metric().inner_product_matrix(Some(base.view()));
        assert_eq!(g.dim(), (3, 2, 2));
        assert_eq!(g[[0, 0, 0]], 4.0);
    }

    // ── derived metric operations ───────────────

    #[test]
    fn riemannian_norm_at_origin_is_twice_euclidean() {
        let v = array![[0.3, 0.4]];
        let norm = metric().norm(v.view(), None).unwrap();
        assert!((norm[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn inner_product_rejects_wrong_width() {
        let m = metric();
        let wide = array![[0.1, 0.2, 0.3]];
        assert!(matches!(
            m.inner_product(wide.view(), wide.view(), None),
            Err(BallError::DimensionMismatch { expected: 2, got: 3 })
        ));
        assert!(matches!(
            m.norm(wide.view(), None),
            Err(BallError::DimensionMismatch { expected: 2, got: 3 })
        ));

        let v = array![[0.1, 0.2]];
        let base = array![[0.1]];
        assert!(matches!(
            m.inner_product(v.view(), v.view(), Some(base.view())),
            Err(BallError::DimensionMismatch { expected: 2, got: 1 })
        ));
    }

    #[test]
    fn inner_product_broadcasts_base_points() {
        let v = array![[0.3, 0.4]];
        let base = array![[0.0, 0.0], [0.5, 0.0]];
        let ip = metric().inner_product(v.view(), v.view(), Some(base.view())).unwrap();
        assert_eq!(ip.len(), 2);
        assert!((ip[0] - 1.0).abs() < 1e-12);
        assert!((ip[1] - (8.0_f64 / 3.0).powi(2) * 0.25).abs() < 1e-12);
    }

    #[test]
    fn squared_dist_is_dist_squared() {
        let a = array![[0.1, 0.2], [0.0, 0.0]];
        let b = array![[-0.3, 0.1]];
        let m = metric();
        let d = m.dist(a.view(), b.view()).unwrap();
        let d2 = m.squared_dist(a.view(), b.view()).unwrap();
        for (x, y) in d.iter().zip(d2.iter()) {
            assert!((x * x - y).abs() < 1e-12);
        }
    }

    #[test]
    fn geodesic_starts_at_base_and_follows_exp() {
        let m = metric();
        let base = [0.1, 0.0];
        let v = [0.0, 0.3];
        let path = m.geodesic(&base, &v, &[0.0, 0.5, 1.0]).unwrap();
        assert_eq!(path.row(0).to_vec(), base.to_vec());
        let end = m.exp_single(&v, &base).unwrap();
        assert_close(&path.row(2).to_vec(), &end, 1e-15);
    }

    #[test]
    fn conformal_factor_per_row() {
        let base = array![[0.0, 0.0], [0.5, 0.0]];
        let lambda = metric().conformal_factor(base.view());
        assert!((lambda[0] - 2.0).abs() < 1e-15);
        assert!((lambda[1] - 8.0 / 3.0).abs() < 1e-12);
    }
}
