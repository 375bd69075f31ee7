//! Ball configuration loaded from environment variables.
//!
//! | Variable                   | Default | Description                                   |
//! |----------------------------|---------|-----------------------------------------------|
//! | `NIETZSCHE_BALL_DIM`       | `2`     | Dimension of the ball                         |
//! | `NIETZSCHE_BALL_SCALE`     | `1.0`   | Curvature scale, multiplies distances         |
//! | `NIETZSCHE_BALL_TOLERANCE` | `1e-6`  | Membership tolerance used by domain checks    |
//! | `NIETZSCHE_BALL_EPSILON`   | `1e-6`  | Norm clamp in `exp`, squared-norm clip in `dist` |

use serde::{Deserialize, Serialize};

use crate::{EPSILON, TOLERANCE};

/// Construction parameters shared by [`crate::PoincareBall`] and
/// [`crate::PoincareBallMetric`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BallConfig {
    /// Dimension `d` of every point and tangent vector.
    pub dimension: usize,
    /// Curvature scale (must be > 0).
    pub scale: f64,
    /// Default tolerance of the membership predicate.
    pub tolerance: f64,
    /// Numerical clamp for zero-norm tangents and boundary norms.
    pub epsilon: f64,
}

impl Default for BallConfig {
    fn default() -> Self {
        Self {
            dimension: 2,
            scale: 1.0,
            tolerance: TOLERANCE,
            epsilon: EPSILON,
        }
    }
}

impl BallConfig {
    pub fn new(dimension: usize, scale: f64) -> Self {
        Self { dimension, scale, ..Default::default() }
    }

    /// Load configuration from environment variables, applying defaults where
    /// a variable is absent or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let cfg = Self {
            dimension: env_parse("NIETZSCHE_BALL_DIM", defaults.dimension),
            scale:     env_parse("NIETZSCHE_BALL_SCALE", defaults.scale),
            tolerance: env_parse("NIETZSCHE_BALL_TOLERANCE", defaults.tolerance),
            epsilon:   env_parse("NIETZSCHE_BALL_EPSILON", defaults.epsilon),
        };
        tracing::debug!(
            dimension = cfg.dimension,
            scale = cfg.scale,
            tolerance = cfg.tolerance,
            epsilon = cfg.epsilon,
            "loaded ball config from environment"
        );
        cfg
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
