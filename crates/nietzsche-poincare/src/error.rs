//! Error types for Poincaré ball operations.

/// A batch element rejected by the ball membership test.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedPoint {
    /// Position of the point in its batch.
    pub index: usize,
    /// Squared Euclidean norm ‖x‖² of the point.
    pub squared_norm: f64,
    /// The offending coordinates.
    pub coords: Vec<f64>,
}

/// Errors that can occur during Poincaré ball operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BallError {
    /// One or more inputs failed `‖x‖² < 1 − tolerance`.
    #[error(
        "points not in the Poincaré ball: {operation} rejected {} point(s){} (tolerance {tolerance:e})",
        .points.len(),
        first_offender(.points)
    )]
    PointNotInDomain {
        operation: &'static str,
        tolerance: f64,
        points: Vec<RejectedPoint>,
    },

    /// Two inputs had incompatible vector dimensions.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Two batches cannot be paired: sizes differ and neither is a single vector.
    #[error("batch size mismatch: {left} vs {right}")]
    BatchMismatch { left: usize, right: usize },

    /// The curvature scale must be finite and strictly positive.
    #[error("invalid scale {scale}: must be finite and > 0")]
    InvalidScale { scale: f64 },

    /// The ball needs at least one dimension.
    #[error("invalid dimension: a Poincaré ball needs at least one dimension")]
    InvalidDimension,
}

fn first_offender(points: &[RejectedPoint]) -> String {
    match points.first() {
        Some(p) => format!(", first at index {} with ‖x‖² = {:.6}", p.index, p.squared_norm),
        None => String::new(),
    }
}

impl BallError {
    /// Attribute a domain violation to the public operation that triggered it.
    pub fn with_operation(self, name: &'static str) -> Self {
        match self {
            BallError::PointNotInDomain { tolerance, points, .. } => BallError::PointNotInDomain {
                operation: name,
                tolerance,
                points,
            },
            other => other,
        }
    }

    /// The rejected points of a domain violation, empty for every other kind.
    pub fn rejected_points(&self) -> &[RejectedPoint] {
        match self {
            BallError::PointNotInDomain { points, .. } => points,
            _ => &[],
        }
    }
}
