//! # The Poincaré ball domain
//!
//! ```text
//! 𝔹ᵈ = { x ∈ ℝᵈ : ‖x‖² < 1 }
//! ```
//!
//! Membership is tested with a tolerance: a point belongs iff
//! `‖x‖² < 1 − tolerance`. Points on or beyond that shell are rejected by
//! every metric operation that requires valid inputs.

use ndarray::{Array1, Array2, ArrayView2};
use rand::Rng;

use crate::config::BallConfig;
use crate::error::{BallError, RejectedPoint};
use crate::manifold::Manifold;
use crate::metric::PoincareBallMetric;
use crate::{squared_norm, EPSILON};

/// The open unit ball of dimension `d`, scaled by a curvature parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct PoincareBall {
    dimension: usize,
    scale: f64,
    tolerance: f64,
    epsilon: f64,
}

impl PoincareBall {
    /// # Errors
    ///
    /// [`BallError::InvalidDimension`] if `dimension == 0`,
    /// [`BallError::InvalidScale`] if `scale` is not finite and positive.
    pub fn new(dimension: usize, scale: f64) -> Result<Self, BallError> {
        Self::from_config(&BallConfig::new(dimension, scale))
    }

    pub fn from_config(config: &BallConfig) -> Result<Self, BallError> {
        if config.dimension == 0 {
            return Err(BallError::InvalidDimension);
        }
        if !config.scale.is_finite() || config.scale <= 0.0 {
            return Err(BallError::InvalidScale { scale: config.scale });
        }
        Ok(Self {
            dimension: config.dimension,
            scale: config.scale,
            tolerance: config.tolerance,
            epsilon: config.epsilon,
        })
    }

    #[inline]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Tolerance used by [`check_domain`](Self::check_domain).
    #[inline]
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Numerical clamp handed to [`metric`](Self::metric).
    #[inline]
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// The Riemannian metric of this ball.
    pub fn metric(&self) -> PoincareBallMetric {
        PoincareBallMetric::with_ball(self.clone(), self.epsilon)
    }

    /// Membership of a single vector.
    pub fn belongs_single(&self, point: &[f64], tolerance: f64) -> bool {
        self.belongs(crate::batch::promote(point), tolerance)[0]
    }

    /// Reject the call if any row of `points` lies outside the ball.
    ///
    /// # Errors
    ///
    /// [`BallError::PointNotInDomain`] listing every offending row.
    pub fn check_domain(
        &self,
        operation: &'static str,
        points: ArrayView2<'_, f64>,
    ) -> Result<(), BallError> {
        let inside = self.belongs(points, self.tolerance);
        let mut rejected = Vec::new();
        for (index, (ok, p)) in inside.iter().zip(points.outer_iter()).enumerate() {
            if !*ok {
                rejected.push(RejectedPoint {
                    index,
                    squared_norm: squared_norm(p),
                    coords: p.to_vec(),
                });
            }
        }

        if rejected.is_empty() {
            return Ok(());
        }
        tracing::warn!(
            operation,
            rejected = rejected.len(),
            batch = points.nrows(),
            "points not in the Poincaré ball"
        );
        Err(BallError::PointNotInDomain {
            operation,
            tolerance: self.tolerance,
            points: rejected,
        })
    }

    /// Pull every row back inside the ball.
    ///
    /// Rows that already belong are copied unchanged. Rows on or beyond the
    /// tolerance shell are rescaled to norm `√(1 − tolerance) − EPSILON`.
    /// Rows containing NaN or Inf are reset to the origin.
    ///
    /// `retraction` does not project its output; use this when a caller needs
    /// the result back in the domain.
    pub fn projection(&self, points: ArrayView2<'_, f64>) -> Array2<f64> {
        let max_norm = (1.0 - self.tolerance).sqrt() - EPSILON;
        let mut out = points.to_owned();
        for mut row in out.outer_iter_mut() {
            if row.iter().any(|v| !v.is_finite()) {
                row.fill(0.0);
                continue;
            }
            let norm_sq = squared_norm(row.view());
            if norm_sq >= 1.0 - self.tolerance {
                let scale = max_norm / norm_sq.sqrt();
                row.mapv_inplace(|v| v * scale);
            }
        }
        out
    }

    /// Sample `n_samples` points inside the ball.
    ///
    /// The direction is a normalized draw from the coordinate cube, the radius
    /// is drawn with density ∝ r^(d−1) so that points fill the ball's volume
    /// instead of crowding the centre.
    pub fn random_uniform(&self, n_samples: usize, rng: &mut impl Rng) -> Array2<f64> {
        let dim = self.dimension;
        let max_norm = (1.0 - self.tolerance).sqrt() - EPSILON;
        let mut out = Array2::zeros((n_samples, dim));
        for mut row in out.outer_iter_mut() {
            row.mapv_inplace(|_| rng.gen::<f64>() * 2.0 - 1.0);
            let norm = squared_norm(row.view()).sqrt().max(1e-12);
            let radius = max_norm * rng.gen::<f64>().powf(1.0 / dim as f64);
            row.mapv_inplace(|v| v / norm * radius);
        }
        out
    }
}

impl Manifold for PoincareBall {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn belongs(&self, points: ArrayView2<'_, f64>, tolerance: f64) -> Array1<bool> {
        points
            .outer_iter()
            .map(|p| squared_norm(p) < 1.0 - tolerance)
            .collect()
    }
}
