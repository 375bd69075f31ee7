//! # nietzsche-poincare
//!
//! Riemannian geometry of the Poincaré ball model of hyperbolic space.
//!
//! Embedding code that optimizes points on the ball must not use Euclidean
//! vector arithmetic. This crate provides the curvature-aware replacements.
//!
//! ## Components
//!
//! | Type | Role |
//! |---|---|
//! | [`PoincareBall`] | Domain `{x : ‖x‖² < 1}`: membership, projection, sampling |
//! | [`PoincareBallMetric`] | Möbius addition, exp/log maps, distance, retraction, metric tensor |
//!
//! Both implement the capability traits in [`manifold`]: [`Manifold`] and
//! [`RiemannianMetric`].
//!
//! ## Operations
//!
//! | Operation | Signature | Fails on domain violation |
//! |---|---|---|
//! | `mobius_add` | Point × Point → Point | yes |
//! | `exp` | Tangent × Point → Point | yes (via `mobius_add`) |
//! | `log` | Point × Point → Tangent | yes (via `mobius_add`) |
//! | `dist` | Point × Point → ℝ⁺ | no, norms are clipped |
//! | `retraction` | Tangent × Point → Point | yes |
//! | `inner_product_matrix` | Point → ℝ^{d×d} | no |
//!
//! ## Batches
//!
//! Every operation works on batches: an [`ndarray::ArrayView2`] whose rows are
//! the batch elements. A single-row operand pairs with every row of the other
//! operand. The `*_single` wrappers accept plain slices and promote them to a
//! batch of one (see [`batch::promote`]).

pub mod ball;
pub mod batch;
pub mod config;
pub mod error;
pub mod manifold;
pub mod metric;

use ndarray::{Array1, ArrayView1};

pub use ball::PoincareBall;
pub use config::BallConfig;
pub use error::{BallError, RejectedPoint};
pub use manifold::{Manifold, RiemannianMetric};
pub use metric::PoincareBallMetric;

/// Default membership tolerance: a point belongs iff ‖x‖² < 1 − `TOLERANCE`.
pub const TOLERANCE: f64 = 1e-6;

/// Substituted for zero tangent norms in `exp`; also the squared-norm clip
/// margin in `dist`.
pub const EPSILON: f64 = 1e-6;

/// Absolute threshold below which a squared tangent norm (`exp`) or a Möbius
/// difference norm (`log`) counts as zero.
pub const ZERO_ATOL: f64 = 1e-8;

// ─────────────────────────────────────────────
// Row kernels
// ─────────────────────────────────────────────

/// Euclidean inner product ⟨u, v⟩.
#[inline]
pub fn dot(u: ArrayView1<'_, f64>, v: ArrayView1<'_, f64>) -> f64 {
    debug_assert_eq!(u.len(), v.len(), "dimension mismatch in dot");
    u.dot(&v)
}

/// Squared Euclidean norm ‖x‖².
#[inline]
pub fn squared_norm(x: ArrayView1<'_, f64>) -> f64 {
    x.dot(&x)
}

/// Euclidean norm ‖x‖.
#[inline]
pub fn l2_norm(x: ArrayView1<'_, f64>) -> f64 {
    squared_norm(x).sqrt()
}

/// Möbius addition u ⊕ v of two vectors, without domain validation.
///
/// ```text
/// u ⊕ v = [(1 + 2⟨u,v⟩ + ‖v‖²) · u  +  (1 − ‖u‖²) · v]
///          ───────────────────────────────────────────────
///                   1 + 2⟨u,v⟩ + ‖u‖²·‖v‖²
/// ```
///
/// [`PoincareBallMetric::mobius_add`] is the checked, batched form.
pub fn mobius_add(u: ArrayView1<'_, f64>, v: ArrayView1<'_, f64>) -> Array1<f64> {
    let dot_uv = dot(u, v);
    let norm_u_sq = squared_norm(u);
    let norm_v_sq = squared_norm(v);

    let denom = 1.0 + 2.0 * dot_uv + norm_u_sq * norm_v_sq;
    let coeff_u = (1.0 + 2.0 * dot_uv + norm_v_sq) / denom;
    let coeff_v = (1.0 - norm_u_sq) / denom;

    &u * coeff_u + &v * coeff_v
}

/// λ_x = 2 / (1 − ‖x‖²), the conformal factor of the ball metric at `x`.
#[inline]
pub fn conformal_factor(x: ArrayView1<'_, f64>) -> f64 {
    2.0 / (1.0 - squared_norm(x))
}

/// `true` when `value` is within [`ZERO_ATOL`] of zero.
#[inline]
pub(crate) fn is_near_zero(value: f64) -> bool {
    value.abs() <= ZERO_ATOL
}
